//! Embedded schema for the crawl database (spec.md §3).
//!
//! Applied idempotently on `db setup` and on every pool open via
//! `CREATE TABLE IF NOT EXISTS`, following the teacher's migration-free
//! bootstrap style: the schema is the single source of truth, no versioned
//! migration chain.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS land (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    lang        TEXT NOT NULL DEFAULT 'fr',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS word (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    term   TEXT NOT NULL,
    lemma  TEXT NOT NULL,
    UNIQUE (term, lemma)
);

CREATE TABLE IF NOT EXISTS land_dictionary (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    land_id  INTEGER NOT NULL REFERENCES land (id) ON DELETE CASCADE,
    word_id  INTEGER NOT NULL REFERENCES word (id) ON DELETE CASCADE,
    UNIQUE (land_id, word_id)
);

CREATE TABLE IF NOT EXISTS domain (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    host        TEXT NOT NULL UNIQUE,
    fetched_at  TEXT,
    http_status INTEGER,
    title       TEXT,
    keywords    TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS expression (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    land_id      INTEGER NOT NULL REFERENCES land (id) ON DELETE CASCADE,
    url          TEXT NOT NULL,
    depth        INTEGER NOT NULL DEFAULT 0,
    lang         TEXT,
    title        TEXT,
    description  TEXT,
    keywords     TEXT,
    author       TEXT,
    published_at TEXT,
    raw_html     TEXT,
    readable     TEXT,
    relevance    INTEGER,
    domain_id    INTEGER REFERENCES domain (id) ON DELETE SET NULL,
    http_status  INTEGER,
    created_at   TEXT NOT NULL,
    fetched_at   TEXT,
    approved_at  TEXT,
    readable_at  TEXT,
    UNIQUE (land_id, url)
);

CREATE INDEX IF NOT EXISTS idx_expression_land ON expression (land_id);
CREATE INDEX IF NOT EXISTS idx_expression_domain ON expression (domain_id);
CREATE INDEX IF NOT EXISTS idx_expression_relevance ON expression (land_id, relevance);

CREATE TABLE IF NOT EXISTS expression_link (
    source_id INTEGER NOT NULL REFERENCES expression (id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES expression (id) ON DELETE CASCADE,
    PRIMARY KEY (source_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_expression_link_target ON expression_link (target_id);

CREATE TABLE IF NOT EXISTS media (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    expression_id     INTEGER NOT NULL REFERENCES expression (id) ON DELETE CASCADE,
    url               TEXT NOT NULL,
    kind              TEXT NOT NULL,
    width             INTEGER,
    height            INTEGER,
    file_size         INTEGER,
    format            TEXT,
    color_mode        TEXT,
    dominant_colors   TEXT,
    aspect_ratio      REAL,
    has_transparency  INTEGER,
    exif              TEXT,
    perceptual_hash   TEXT,
    web_safe_palette  TEXT,
    content_tags      TEXT,
    nsfw_score        REAL,
    analyzed_at       TEXT,
    analysis_error    TEXT,
    UNIQUE (expression_id, url)
);

CREATE TABLE IF NOT EXISTS tag (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    land_id   INTEGER NOT NULL REFERENCES land (id) ON DELETE CASCADE,
    parent_id INTEGER REFERENCES tag (id) ON DELETE CASCADE,
    name      TEXT NOT NULL,
    UNIQUE (land_id, parent_id, name)
);

CREATE TABLE IF NOT EXISTS tagged_content (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_id        INTEGER NOT NULL REFERENCES tag (id) ON DELETE CASCADE,
    expression_id INTEGER NOT NULL REFERENCES expression (id) ON DELETE CASCADE,
    text          TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_covers_every_entity() {
        for table in [
            "land",
            "word",
            "land_dictionary",
            "domain",
            "expression",
            "expression_link",
            "media",
            "tag",
            "tagged_content",
        ] {
            assert!(
                SCHEMA_SQL.contains(&format!("TABLE IF NOT EXISTS {table}")),
                "missing table {table}"
            );
        }
    }
}
