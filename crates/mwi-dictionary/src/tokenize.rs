//! Unicode tokenization and diacritic folding (spec.md §4.2).

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Split `text` on Unicode word boundaries, fold to lower case, and strip
/// diacritics (NFD decomposition followed by combining-mark removal).
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| fold(w)).collect()
}

/// Lower-case and diacritic-strip a single word.
pub fn fold(word: &str) -> String {
    word.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_word_boundaries() {
        let tokens = tokenize("Asthme et pollution urbaine.");
        assert_eq!(tokens, vec!["asthme", "et", "pollution", "urbaine"]);
    }

    #[test]
    fn fold_strips_diacritics() {
        assert_eq!(fold("pollué"), "pollue");
        assert_eq!(fold("ÉCOLOGIE"), "ecologie");
    }

    #[test]
    fn tokenize_of_empty_string_is_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_handles_mixed_scripts_without_panicking() {
        let tokens = tokenize("CO2 emissions — 排放 2024");
        assert!(tokens.contains(&"co2".to_string()));
        assert!(tokens.contains(&"2024".to_string()));
    }
}
