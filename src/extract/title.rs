//! Title validation and cleanup

use std::sync::LazyLock;

use regex::Regex;

use crate::keywords::TitleKeywordSet;
use crate::types::MAX_TITLE_CHARS;

/// Honorifics and Treebank bracket escapes stripped from titles.
static TITLE_ARTIFACTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)mrs\.|mr\.|ms\.|dr\.|-lrb-|-rrb-").expect("valid regex")
});

/// Keeps only the keyword-bearing part of a candidate's title text
#[derive(Debug, Clone, Copy)]
pub struct TitleValidator<'a> {
    keywords: &'a TitleKeywordSet,
}

impl<'a> TitleValidator<'a> {
    pub fn new(keywords: &'a TitleKeywordSet) -> Self {
        Self { keywords }
    }

    /// Concatenate every keyword match (keyword plus the run of non-digits
    /// after it). `None` when no keyword occurs.
    pub fn validate(&self, title_text: &str) -> Option<String> {
        let title: String = self
            .keywords
            .title_pattern()
            .find_iter(title_text)
            .map(|m| m.as_str())
            .collect();
        (!title.is_empty()).then_some(title)
    }
}

/// Strips honorifics and artifacts, then bounds the length
#[derive(Debug, Clone, Copy)]
pub struct TitleNormalizer {
    max_chars: usize,
}

impl Default for TitleNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleNormalizer {
    pub fn new() -> Self {
        Self {
            max_chars: MAX_TITLE_CHARS,
        }
    }

    /// Set maximum title length in characters, capped at [`MAX_TITLE_CHARS`]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.min(MAX_TITLE_CHARS);
        self
    }

    /// Cleaned title, or `None` if nothing is left.
    pub fn normalize(&self, raw_title: &str) -> Option<String> {
        let cleaned = TITLE_ARTIFACTS.replace_all(raw_title, "");
        let title: String = cleaned.trim().chars().take(self.max_chars).collect();
        (!title.is_empty()).then_some(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> TitleKeywordSet {
        TitleKeywordSet::new(words).unwrap()
    }

    #[test]
    fn test_validator_extracts_keyword_run() {
        let kw = keywords(&["professor"]);
        let validator = TitleValidator::new(&kw);
        assert_eq!(validator.validate("Professor").as_deref(), Some("Professor"));
        assert_eq!(
            validator.validate("Dr. Professor -LRB- Emeritus -RRB- of Physics").as_deref(),
            Some("Professor -LRB- Emeritus -RRB- of Physics")
        );
    }

    #[test]
    fn test_validator_drops_prefix_before_keyword() {
        let kw = keywords(&["professor"]);
        let title = TitleValidator::new(&kw).validate("Dr. Professor").unwrap();
        assert!(title.starts_with("Professor"));
    }

    #[test]
    fn test_validator_concatenates_matches_split_by_digits() {
        let kw = keywords(&["dean", "chair"]);
        let validator = TitleValidator::new(&kw);
        assert_eq!(
            validator.validate("Dean 2001 2010 Chair of Law").as_deref(),
            Some("Dean Chair of Law")
        );
    }

    #[test]
    fn test_validator_rejects_without_keyword() {
        let kw = keywords(&["professor"]);
        assert!(TitleValidator::new(&kw).validate("Senator").is_none());
        assert!(TitleValidator::new(&kw).validate("").is_none());
    }

    #[test]
    fn test_normalizer_strips_artifacts() {
        let n = TitleNormalizer::new();
        assert_eq!(
            n.normalize("Dr. Professor -lrb- Emeritus -RRB- of Physics").as_deref(),
            Some("Professor  Emeritus  of Physics")
        );
        assert_eq!(n.normalize("MRS. Chair").as_deref(), Some("Chair"));
    }

    #[test]
    fn test_normalizer_requires_literal_period() {
        // "ms" followed by another character is not the honorific.
        let n = TitleNormalizer::new();
        assert_eq!(n.normalize("Adams Professor").as_deref(), Some("Adams Professor"));
    }

    #[test]
    fn test_normalizer_empty_after_cleaning() {
        let n = TitleNormalizer::new();
        assert!(n.normalize("Dr. -LRB- -RRB-").is_none());
        assert!(n.normalize("   ").is_none());
    }

    #[test]
    fn test_normalizer_truncates_to_255_chars() {
        let long = format!("Professor {}", "x".repeat(400));
        let title = TitleNormalizer::new().normalize(&long).unwrap();
        assert_eq!(title.chars().count(), 255);
        assert!(title.starts_with("Professor "));
    }

    #[test]
    fn test_normalizer_truncates_by_chars_not_bytes() {
        let title = TitleNormalizer::new()
            .with_max_chars(3)
            .normalize("Père Noël")
            .unwrap();
        assert_eq!(title, "Pèr");
    }

    #[test]
    fn test_max_chars_cannot_exceed_title_column() {
        let long = format!("Professor {}", "x".repeat(2000));
        let title = TitleNormalizer::new()
            .with_max_chars(1000)
            .normalize(&long)
            .unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);

        let short = TitleNormalizer::new().with_max_chars(9).normalize(&long).unwrap();
        assert_eq!(short, "Professor");
    }
}
