//! Known title vocabulary
//!
//! [`TitleKeywordSet`] is built once at startup and only read afterwards, so a
//! single instance can be shared by reference across worker threads. It also
//! owns the compiled title pattern used by the title validator.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::error::{Error, Result};

/// Keyword category used when a keyword file groups keywords by kind
pub const DEFAULT_KEYWORD_CATEGORY: &str = "academic_title";

/// Built-in academic title vocabulary
pub const ACADEMIC_TITLES: &[&str] = &[
    "professor",
    "lecturer",
    "reader",
    "dean",
    "provost",
    "chancellor",
    "president",
    "chair",
    "director",
    "head",
    "fellow",
    "researcher",
    "scientist",
    "scholar",
    "instructor",
    "tutor",
    "librarian",
    "curator",
    "postdoc",
    "coordinator",
];

/// Read-only set of known title keywords
#[derive(Debug, Clone)]
pub struct TitleKeywordSet {
    keywords: Vec<String>,
    lookup: FxHashSet<String>,
    pattern: Regex,
}

impl TitleKeywordSet {
    /// Build from keywords, in priority order.
    ///
    /// Keywords are trimmed; blanks and case-insensitive duplicates are
    /// dropped. At least one keyword must remain.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut lookup = FxHashSet::default();
        for kw in keywords {
            let kw = kw.as_ref().trim();
            if !kw.is_empty() && lookup.insert(kw.to_lowercase()) {
                ordered.push(kw.to_string());
            }
        }
        if ordered.is_empty() {
            return Err(Error::config("title keyword set is empty"));
        }

        let alternation = ordered
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        // Keyword followed by everything up to the next digit.
        let pattern = RegexBuilder::new(&format!(r"(?:{alternation})\D*"))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::config(format!("title pattern: {e}")))?;

        Ok(Self {
            keywords: ordered,
            lookup,
            pattern,
        })
    }

    /// The built-in academic vocabulary
    pub fn academic() -> Result<Self> {
        Self::new(ACADEMIC_TITLES)
    }

    /// Parse a JSON keyword document: either an array of strings, or an
    /// object mapping categories to arrays (`category` is selected).
    pub fn from_json_str(json: &str, category: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let list = match &value {
            Value::Array(_) => &value,
            Value::Object(map) => map.get(category).ok_or_else(|| {
                Error::config(format!("keyword category {category:?} not found"))
            })?,
            _ => return Err(Error::config("keyword file must be an array or object")),
        };
        let items = list
            .as_array()
            .ok_or_else(|| Error::config(format!("keyword category {category:?} is not a list")))?;

        let words = items
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| Error::config(format!("keyword {v} is not a string")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(words)
    }

    /// Parse plain text: one keyword per line, `#` starts a comment line.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.starts_with('#')),
        )
    }

    /// Load from a `.json` file or a plain-text list
    pub fn from_path(path: impl AsRef<Path>, category: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content, category)
        } else {
            Self::from_text(&content)
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Case-insensitive membership
    pub fn contains(&self, word: &str) -> bool {
        self.lookup.contains(&word.to_lowercase())
    }

    /// `(?i)(?:kw1|kw2|...)\D*`
    pub fn title_pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
