//! Name cleanup and first/last split

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::types::MAX_LAST_NAME_WORDS;

/// "emeritus" leaks into names when it follows the title; digits come from
/// dates and reference markers.
static NAME_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)emeritus|-?\d+").expect("valid regex"));

/// Splits raw name text into `(first_name, last_name)`
#[derive(Debug, Clone, Copy)]
pub struct NameNormalizer {
    max_last_name_words: usize,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NameNormalizer {
    pub fn new() -> Self {
        Self {
            max_last_name_words: MAX_LAST_NAME_WORDS,
        }
    }

    /// Set the cap on last-name words
    pub fn with_max_last_name_words(mut self, max: usize) -> Self {
        self.max_last_name_words = max;
        self
    }

    /// Returns `None` when either part would be empty.
    ///
    /// Names longer than two words are deduplicated (exact, case-sensitive
    /// matches), keeping the first occurrence of each word.
    pub fn normalize(&self, raw_name: &str) -> Option<(String, String)> {
        let cleaned = NAME_NOISE.replace_all(raw_name, "");
        let mut words: Vec<&str> = cleaned.split_whitespace().collect();

        if words.len() > 2 {
            let mut seen = FxHashSet::default();
            words.retain(|w| seen.insert(*w));
        }

        let (first, rest) = words.split_first()?;
        let last = rest
            .iter()
            .take(self.max_last_name_words)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        if last.is_empty() {
            return None;
        }
        Some((first.to_string(), last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(raw: &str) -> Option<(String, String)> {
        NameNormalizer::new().normalize(raw)
    }

    #[test]
    fn test_two_word_name() {
        assert_eq!(split("Jane Smith"), Some(("Jane".into(), "Smith".into())));
    }

    #[test]
    fn test_middle_initial_kept_in_last_name() {
        let (first, last) = split("Jane A Smith").unwrap();
        assert_eq!(first, "Jane");
        assert!(last.contains('A'));
        assert!(last.contains("Smith"));
    }

    #[test]
    fn test_duplicates_collapsed() {
        let (first, last) = split("John Jacob Jingleheimer Schmidt Schmidt").unwrap();
        assert_eq!(first, "John");
        assert_eq!(last, "Jacob Jingleheimer Schmidt");
    }

    #[test]
    fn test_two_identical_words_not_deduplicated() {
        assert_eq!(split("Lee Lee"), Some(("Lee".into(), "Lee".into())));
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let (_, last) = split("Ann van Van Berg").unwrap();
        assert_eq!(last, "van Van Berg");
    }

    #[test]
    fn test_emeritus_and_digits_removed() {
        assert_eq!(
            split("Emeritus Jane Smith 1942-2019"),
            Some(("Jane".into(), "Smith".into()))
        );
        assert_eq!(split("Jane EMERITUS Smith"), Some(("Jane".into(), "Smith".into())));
    }

    #[test]
    fn test_last_name_capped_at_five_words() {
        let (first, last) = split("A B C D E F G H").unwrap();
        assert_eq!(first, "A");
        assert_eq!(last.split_whitespace().count(), 5);
        assert_eq!(last, "B C D E F");
    }

    #[test]
    fn test_empty_parts_rejected() {
        assert_eq!(split(""), None);
        assert_eq!(split("Smith"), None);
        assert_eq!(split("Emeritus 1999"), None);
        assert_eq!(split("Smith emeritus"), None);
    }

    #[test]
    fn test_custom_cap() {
        let n = NameNormalizer::new().with_max_last_name_words(1);
        assert_eq!(n.normalize("Ann Marie Lee"), Some(("Ann".into(), "Marie".into())));
    }
}
