//! Sentence segmentation and word tokenization
//!
//! Sentences come from UAX-29 boundaries (`unicode-segmentation`), re-joined
//! where a boundary falls right after an honorific or initial ("Dr. Jane
//! A. Smith" stays one sentence). Words follow Penn Treebank conventions:
//! punctuation is split off, and brackets become `-LRB-`/`-RRB-` style escapes.

use rustc_hash::FxHashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Abbreviations that never end a sentence (lowercase, without the period).
const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "st", "jr", "sr", "rev", "hon", "gen", "col", "capt", "lt",
    "sgt", "mt", "vs", "etc", "inc", "ltd", "co", "corp", "dept", "univ", "assoc", "asst", "no",
];

const LEADING_PUNCT: &[char] = &['"', '\'', '`', '(', '[', '{', '\u{201c}', '\u{2018}'];

const TRAILING_PUNCT: &[char] = &[
    ',', ';', ':', '?', '!', '"', '\'', ')', ']', '}', '\u{201d}', '\u{2019}',
];

/// Treebank-style sentence and word tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    abbreviations: FxHashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Create a tokenizer with the default English abbreviation list
    pub fn new() -> Self {
        Self {
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Add abbreviations (case-insensitive, with or without trailing period)
    pub fn with_abbreviations(mut self, words: &[&str]) -> Self {
        for word in words {
            self.abbreviations
                .insert(word.trim_end_matches('.').to_lowercase());
        }
        self
    }

    /// Split raw text into sentences. Newlines are treated as spaces.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        let flattened = text.replace(['\r', '\n'], " ");
        let mut sentences: Vec<String> = Vec::new();

        for fragment in flattened.unicode_sentences() {
            match sentences.last_mut() {
                Some(prev) if self.ends_with_abbreviation(prev) => prev.push_str(fragment),
                _ => sentences.push(fragment.to_string()),
            }
        }

        sentences
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Split one sentence into words.
    pub fn words(&self, sentence: &str) -> Vec<String> {
        let chunks: Vec<&str> = sentence.split_whitespace().collect();
        let mut words = Vec::with_capacity(chunks.len() + 4);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            self.split_chunk(chunk, i == last, &mut words);
        }

        words
    }

    /// Sentences of words.
    pub fn tokenize(&self, text: &str) -> Vec<Vec<String>> {
        self.sentences(text)
            .iter()
            .map(|s| self.words(s))
            .filter(|w| !w.is_empty())
            .collect()
    }

    /// Whether `word` (including its trailing period) is an abbreviation
    pub fn is_abbreviation(&self, word: &str) -> bool {
        let Some(stem) = word.strip_suffix('.') else {
            return false;
        };
        if stem.is_empty() {
            return false;
        }
        // Initials ("A.") and dotted forms ("Ph.D.", "U.S.")
        let mut chars = stem.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_alphabetic() {
                return true;
            }
        }
        if stem.contains('.') {
            return true;
        }
        self.abbreviations.contains(&stem.to_lowercase())
    }

    fn ends_with_abbreviation(&self, fragment: &str) -> bool {
        fragment
            .split_whitespace()
            .next_back()
            .map(|w| self.is_abbreviation(w.trim_start_matches(LEADING_PUNCT)))
            .unwrap_or(false)
    }

    fn split_chunk(&self, chunk: &str, sentence_final: bool, out: &mut Vec<String>) {
        let mut core = chunk;

        while let Some(c) = core.chars().next() {
            if !LEADING_PUNCT.contains(&c) {
                break;
            }
            out.push(escape_bracket(c));
            core = &core[c.len_utf8()..];
        }

        let mut trailing: Vec<String> = Vec::new();
        let mut period_split = false;
        while let Some(c) = core.chars().next_back() {
            if TRAILING_PUNCT.contains(&c) {
                trailing.push(escape_bracket(c));
            } else if c == '.'
                && sentence_final
                && !period_split
                && core.len() > 1
                && !self.is_abbreviation(core)
            {
                period_split = true;
                trailing.push(".".to_string());
            } else {
                break;
            }
            core = &core[..core.len() - c.len_utf8()];
        }

        if !core.is_empty() {
            match split_possessive(core) {
                Some((stem, suffix)) => {
                    out.push(stem.to_string());
                    out.push(suffix.to_string());
                }
                None => out.push(core.to_string()),
            }
        }

        out.extend(trailing.into_iter().rev());
    }
}

fn escape_bracket(c: char) -> String {
    match c {
        '(' => "-LRB-".to_string(),
        ')' => "-RRB-".to_string(),
        '[' => "-LSB-".to_string(),
        ']' => "-RSB-".to_string(),
        '{' => "-LCB-".to_string(),
        '}' => "-RCB-".to_string(),
        other => other.to_string(),
    }
}

fn split_possessive(word: &str) -> Option<(&str, &str)> {
    for suffix in ["'s", "'S", "\u{2019}s"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if !stem.is_empty() {
                return Some((stem, &word[stem.len()..]));
            }
        }
    }
    None
}
