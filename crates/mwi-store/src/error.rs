//! Store error kinds (spec.md §4.1: `NotFound`, `Conflict`, everything else).

use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness violation on a concurrent insert. Callers MUST retry by
    /// re-selecting per spec.md §4.1 — never propagate this to the user.
    #[error("conflict on {entity}: {detail}")]
    Conflict { entity: &'static str, detail: String },

    #[error("database locked, circuit open")]
    CircuitOpen,

    #[error("sqlite error: {0}")]
    Sqlite(String),

    #[error("migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) if is_unique_violation(db_err.message()) => {
                Self::Conflict {
                    entity: "row",
                    detail: db_err.message().to_string(),
                }
            }
            _ => Self::Sqlite(e.to_string()),
        }
    }
}

fn is_unique_violation(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("unique constraint failed")
}

impl From<StoreError> for mwi_core::Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(detail) => mwi_core::Error::Store(format!("not found: {detail}")),
            StoreError::Conflict { entity, detail } => mwi_core::Error::Conflict { entity, detail },
            StoreError::CircuitOpen => mwi_core::Error::Store("circuit open".to_string()),
            StoreError::Sqlite(msg) | StoreError::Migration(msg) => mwi_core::Error::Store(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_message_is_detected() {
        assert!(is_unique_violation(
            "UNIQUE constraint failed: expressions.url"
        ));
        assert!(!is_unique_violation("disk I/O error"));
    }
}
