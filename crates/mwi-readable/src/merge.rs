//! Merge strategies combining extractor output with the stored Expression
//! (spec.md §4.5 step 2, §8 merge laws).

use mwi_core::{Error, Expression};

use crate::extractor::ExtractedPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    MercuryPriority,
    PreserveExisting,
    SmartMerge,
}

impl MergeStrategy {
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "mercury_priority" => Ok(Self::MercuryPriority),
            "preserve_existing" => Ok(Self::PreserveExisting),
            "smart_merge" => Ok(Self::SmartMerge),
            other => Err(Error::UnknownMergeStrategy(other.to_string())),
        }
    }
}

impl Default for MergeStrategy {
    fn default() -> Self {
        Self::SmartMerge
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn longer(a: &Option<String>, b: &Option<String>) -> Option<String> {
    match (non_empty(a), non_empty(b)) {
        (true, true) => {
            if a.as_ref().unwrap().len() >= b.as_ref().unwrap().len() {
                a.clone()
            } else {
                b.clone()
            }
        }
        (true, false) => a.clone(),
        (false, true) => b.clone(),
        (false, false) => None,
    }
}

/// Apply `strategy`, mutating `expression` in place. Returns whether any
/// field actually changed, so callers know whether to persist + rescore.
pub fn merge(strategy: MergeStrategy, expression: &mut Expression, extracted: &ExtractedPage) -> bool {
    match strategy {
        MergeStrategy::MercuryPriority => merge_mercury_priority(expression, extracted),
        MergeStrategy::PreserveExisting => merge_preserve_existing(expression, extracted),
        MergeStrategy::SmartMerge => merge_smart(expression, extracted),
    }
}

fn set_if_changed<T: PartialEq>(field: &mut T, new: T) -> bool {
    if *field != new {
        *field = new;
        true
    } else {
        false
    }
}

fn merge_mercury_priority(expression: &mut Expression, extracted: &ExtractedPage) -> bool {
    let mut changed = false;
    if non_empty(&extracted.title) {
        changed |= set_if_changed(&mut expression.title, extracted.title.clone());
    }
    if non_empty(&extracted.markdown) {
        changed |= set_if_changed(&mut expression.readable, extracted.markdown.clone());
    }
    if non_empty(&extracted.excerpt) {
        changed |= set_if_changed(&mut expression.description, extracted.excerpt.clone());
    }
    if non_empty(&extracted.author) {
        changed |= set_if_changed(&mut expression.author, extracted.author.clone());
    }
    if extracted.published_at.is_some() {
        changed |= set_if_changed(&mut expression.published_at, extracted.published_at);
    }
    if non_empty(&extracted.language) {
        changed |= set_if_changed(&mut expression.lang, extracted.language.clone());
    }
    changed
}

fn merge_preserve_existing(expression: &mut Expression, extracted: &ExtractedPage) -> bool {
    let mut changed = false;
    if !non_empty(&expression.title) && non_empty(&extracted.title) {
        changed |= set_if_changed(&mut expression.title, extracted.title.clone());
    }
    if !non_empty(&expression.readable) && non_empty(&extracted.markdown) {
        changed |= set_if_changed(&mut expression.readable, extracted.markdown.clone());
    }
    if !non_empty(&expression.description) && non_empty(&extracted.excerpt) {
        changed |= set_if_changed(&mut expression.description, extracted.excerpt.clone());
    }
    if !non_empty(&expression.author) && non_empty(&extracted.author) {
        changed |= set_if_changed(&mut expression.author, extracted.author.clone());
    }
    if expression.published_at.is_none() && extracted.published_at.is_some() {
        changed |= set_if_changed(&mut expression.published_at, extracted.published_at);
    }
    if !non_empty(&expression.lang) && non_empty(&extracted.language) {
        changed |= set_if_changed(&mut expression.lang, extracted.language.clone());
    }
    changed
}

fn merge_smart(expression: &mut Expression, extracted: &ExtractedPage) -> bool {
    let mut changed = false;
    let new_title = longer(&expression.title, &extracted.title);
    changed |= set_if_changed(&mut expression.title, new_title);
    if non_empty(&extracted.markdown) {
        changed |= set_if_changed(&mut expression.readable, extracted.markdown.clone());
    }
    let new_description = longer(&expression.description, &extracted.excerpt);
    changed |= set_if_changed(&mut expression.description, new_description);
    if !non_empty(&expression.author) && non_empty(&extracted.author) {
        changed |= set_if_changed(&mut expression.author, extracted.author.clone());
    }
    if expression.published_at.is_none() && extracted.published_at.is_some() {
        changed |= set_if_changed(&mut expression.published_at, extracted.published_at);
    }
    if !non_empty(&expression.lang) && non_empty(&extracted.language) {
        changed |= set_if_changed(&mut expression.lang, extracted.language.clone());
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn base_expression() -> Expression {
        let mut e = Expression::seed(1, "https://example.com/a");
        e.title = Some("Short".to_string());
        e.readable = Some("old".to_string());
        e
    }

    fn extracted(title: &str, markdown: &str) -> ExtractedPage {
        ExtractedPage {
            title: Some(title.to_string()),
            markdown: Some(markdown.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn preserve_existing_never_overwrites_nonempty_stored_field() {
        let mut e = base_expression();
        let extracted = extracted("Much Longer Title", "new");
        merge(MergeStrategy::PreserveExisting, &mut e, &extracted);
        assert_eq!(e.title.as_deref(), Some("Short"));
        assert_eq!(e.readable.as_deref(), Some("old"));
    }

    #[test]
    fn mercury_priority_overwrites_whenever_extracted_nonempty() {
        let mut e = base_expression();
        let extracted = extracted("Much Longer Title", "new");
        merge(MergeStrategy::MercuryPriority, &mut e, &extracted);
        assert_eq!(e.title.as_deref(), Some("Much Longer Title"));
        assert_eq!(e.readable.as_deref(), Some("new"));
    }

    #[test]
    fn smart_merge_title_returns_longer_string() {
        let mut e = base_expression();
        let extracted = extracted("Much Longer Title", "new");
        let changed = merge(MergeStrategy::SmartMerge, &mut e, &extracted);
        assert!(changed);
        assert_eq!(e.title.as_deref(), Some("Much Longer Title"));
        assert_eq!(e.readable.as_deref(), Some("new"));
    }

    #[test]
    fn smart_merge_keeps_existing_title_when_longer() {
        let mut e = base_expression();
        e.title = Some("A rather long existing title already here".to_string());
        let extracted = extracted("Short", "new");
        merge(MergeStrategy::SmartMerge, &mut e, &extracted);
        assert_eq!(e.title.as_deref(), Some("A rather long existing title already here"));
    }

    #[test]
    fn parse_rejects_unknown_strategy_names() {
        assert!(MergeStrategy::parse("bogus").is_err());
        assert_eq!(MergeStrategy::parse("smart_merge").unwrap(), MergeStrategy::SmartMerge);
    }

    #[test]
    fn no_op_merge_reports_unchanged() {
        let mut e = base_expression();
        let empty = ExtractedPage::default();
        let changed = merge(MergeStrategy::SmartMerge, &mut e, &empty);
        assert!(!changed);
        assert_eq!(e.title.as_deref(), Some("Short"));
        let _ = Utc::now();
    }
}
