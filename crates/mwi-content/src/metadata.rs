//! `<html lang>`, `<title>`, and `<meta>` metadata extraction (spec.md §4.4
//! step 2), shaped after the `PageMetadata` fields in the darkscraper
//! reference crawler (`meta_description`, `meta_keywords`, `language`).

use scraper::{Html, Selector};

#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    pub lang: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

pub fn extract(document: &Html) -> PageMetadata {
    PageMetadata {
        lang: extract_lang(document),
        title: extract_title(document),
        description: extract_meta(document, "description"),
        keywords: extract_meta(document, "keywords"),
    }
}

fn extract_lang(document: &Html) -> Option<String> {
    let selector = Selector::parse("html").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("lang"))
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_meta(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}
