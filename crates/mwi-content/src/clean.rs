//! Fixed denylist HTML cleaning (spec.md §4.4 step 3).
//!
//! The denylist is part of the spec; do not narrow it.

use scraper::{Html, Selector};

pub const DENYLIST: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside", "form", "iframe", "svg",
];

/// Render the visible text of `document` with denylisted subtrees excluded,
/// inter-block whitespace normalized to single spaces.
pub fn readable_text(document: &Html) -> String {
    let denylist_selector = denylist_selector();
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(element) = node.value().as_element() {
            if DENYLIST.contains(&element.name()) {
                continue;
            }
        }
        if let Some(text_node) = node.value().as_text() {
            if is_inside_denylist(node, &denylist_selector) {
                continue;
            }
            let trimmed = text_node.trim();
            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }
    }

    normalize_whitespace(&text)
}

fn denylist_selector() -> Selector {
    let joined = DENYLIST.join(", ");
    Selector::parse(&joined).expect("denylist selector is static and always valid")
}

fn is_inside_denylist(node: ego_tree::NodeRef<'_, scraper::Node>, _selector: &Selector) -> bool {
    node.ancestors().any(|ancestor| {
        ancestor
            .value()
            .as_element()
            .map(|el| DENYLIST.contains(&el.name()))
            .unwrap_or(false)
    })
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
