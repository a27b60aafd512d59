//! Part-of-speech tagging
//!
//! [`PosTagger`] is the seam for plugging in a real tagger. The bundled
//! [`LexiconPosTagger`] is a rule-based fallback: a closed-class lexicon for
//! function words, capitalization for proper nouns and suffix rules for the
//! rest. It emits Penn Treebank tags, which is what the chunk grammars match on.

use rustc_hash::FxHashMap;

/// Assigns one Penn Treebank tag per word.
///
/// Implementations must return exactly `words.len()` tags, in order.
pub trait PosTagger: Send + Sync {
    fn tag(&self, words: &[String]) -> Vec<String>;
}

const CLOSED_CLASS: &[(&str, &str)] = &[
    // Determiners
    ("the", "DT"),
    ("a", "DT"),
    ("an", "DT"),
    ("this", "DT"),
    ("that", "DT"),
    ("these", "DT"),
    ("those", "DT"),
    ("each", "DT"),
    ("every", "DT"),
    ("some", "DT"),
    ("any", "DT"),
    ("no", "DT"),
    ("all", "DT"),
    // Prepositions / subordinating conjunctions
    ("of", "IN"),
    ("in", "IN"),
    ("at", "IN"),
    ("on", "IN"),
    ("for", "IN"),
    ("from", "IN"),
    ("with", "IN"),
    ("by", "IN"),
    ("about", "IN"),
    ("as", "IN"),
    ("into", "IN"),
    ("under", "IN"),
    ("over", "IN"),
    ("after", "IN"),
    ("before", "IN"),
    ("since", "IN"),
    ("during", "IN"),
    ("between", "IN"),
    ("through", "IN"),
    ("within", "IN"),
    ("without", "IN"),
    ("if", "IN"),
    ("because", "IN"),
    ("while", "IN"),
    ("to", "TO"),
    // Coordinating conjunctions
    ("and", "CC"),
    ("or", "CC"),
    ("but", "CC"),
    ("nor", "CC"),
    ("&", "CC"),
    // Pronouns
    ("i", "PRP"),
    ("you", "PRP"),
    ("he", "PRP"),
    ("she", "PRP"),
    ("it", "PRP"),
    ("we", "PRP"),
    ("they", "PRP"),
    ("him", "PRP"),
    ("them", "PRP"),
    ("us", "PRP"),
    ("my", "PRP$"),
    ("your", "PRP$"),
    ("his", "PRP$"),
    ("her", "PRP$"),
    ("its", "PRP$"),
    ("our", "PRP$"),
    ("their", "PRP$"),
    ("who", "WP"),
    ("whom", "WP"),
    ("whose", "WP$"),
    ("which", "WDT"),
    ("where", "WRB"),
    ("when", "WRB"),
    ("how", "WRB"),
    // Auxiliaries
    ("is", "VBZ"),
    ("are", "VBP"),
    ("am", "VBP"),
    ("was", "VBD"),
    ("were", "VBD"),
    ("be", "VB"),
    ("been", "VBN"),
    ("being", "VBG"),
    ("has", "VBZ"),
    ("have", "VBP"),
    ("had", "VBD"),
    ("does", "VBZ"),
    ("do", "VBP"),
    ("did", "VBD"),
    ("will", "MD"),
    ("would", "MD"),
    ("can", "MD"),
    ("could", "MD"),
    ("shall", "MD"),
    ("should", "MD"),
    ("may", "MD"),
    ("might", "MD"),
    ("must", "MD"),
    // Adverbs
    ("not", "RB"),
    ("also", "RB"),
    ("currently", "RB"),
    ("formerly", "RB"),
    ("'s", "POS"),
    ("\u{2019}s", "POS"),
];

const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "ical", "less"];

/// Rule-based English POS tagger
#[derive(Debug, Clone)]
pub struct LexiconPosTagger {
    lexicon: FxHashMap<String, String>,
}

impl Default for LexiconPosTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconPosTagger {
    /// Create a tagger with the built-in closed-class lexicon
    pub fn new() -> Self {
        let lexicon = CLOSED_CLASS
            .iter()
            .map(|(w, t)| (w.to_string(), t.to_string()))
            .collect();
        Self { lexicon }
    }

    /// Override or add lexicon entries (keys are matched case-insensitively)
    pub fn with_entries(mut self, entries: &[(&str, &str)]) -> Self {
        for (word, tag) in entries {
            self.lexicon.insert(word.to_lowercase(), tag.to_string());
        }
        self
    }

    /// Tag a single word given its position in the sentence
    pub fn tag_word(&self, word: &str, position: usize) -> String {
        if let Some(tag) = punctuation_tag(word) {
            return tag.to_string();
        }
        if is_number(word) {
            return "CD".to_string();
        }
        // Mid-sentence initials ("Jane A Smith", "Jane A. Smith")
        if position > 0 && is_initial(word) {
            return "NNP".to_string();
        }
        if let Some(tag) = self.lexicon.get(&word.to_lowercase()) {
            return tag.clone();
        }

        let starts_upper = word.chars().next().map_or(false, char::is_uppercase);
        if starts_upper {
            return "NNP".to_string();
        }

        let lower = word.to_lowercase();
        if lower.ends_with("ly") && lower.len() > 4 {
            "RB".to_string()
        } else if lower.ends_with("ing") && lower.len() > 4 {
            "VBG".to_string()
        } else if lower.ends_with("ed") && lower.len() > 3 {
            "VBD".to_string()
        } else if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            "JJ".to_string()
        } else if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 3 {
            "NNS".to_string()
        } else {
            "NN".to_string()
        }
    }
}

impl PosTagger for LexiconPosTagger {
    fn tag(&self, words: &[String]) -> Vec<String> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| self.tag_word(w, i))
            .collect()
    }
}

fn punctuation_tag(word: &str) -> Option<&'static str> {
    let tag = match word {
        "-LRB-" | "-LSB-" | "-LCB-" => "-LRB-",
        "-RRB-" | "-RSB-" | "-RCB-" => "-RRB-",
        "," => ",",
        "." | "?" | "!" => ".",
        ":" | ";" | "-" | "--" | "\u{2013}" | "\u{2014}" | "..." => ":",
        "\"" | "``" | "\u{201c}" | "`" => "``",
        "''" | "\u{201d}" | "'" => "''",
        "$" => "$",
        "#" => "#",
        _ => return None,
    };
    Some(tag)
}

fn is_number(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '/' | '%'))
}

fn is_initial(word: &str) -> bool {
    let stem = word.strip_suffix('.').unwrap_or(word);
    let mut chars = stem.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(sentence: &str) -> Vec<String> {
        let words: Vec<String> = sentence.split_whitespace().map(String::from).collect();
        LexiconPosTagger::new().tag(&words)
    }

    #[test]
    fn test_title_and_name_are_proper_nouns() {
        assert_eq!(tags("Professor Jane A Smith"), vec!["NNP", "NNP", "NNP", "NNP"]);
    }

    #[test]
    fn test_sentence_initial_article() {
        assert_eq!(tags("A professor")[0], "DT");
    }

    #[test]
    fn test_function_words() {
        assert_eq!(
            tags("Chair of the Department and Dean"),
            vec!["NNP", "IN", "DT", "NNP", "CC", "NNP"]
        );
    }

    #[test]
    fn test_numbers_and_punctuation() {
        assert_eq!(
            tags("since 1998 , -LRB- ok -RRB- ."),
            vec!["IN", "CD", ",", "-LRB-", "NN", "-RRB-", "."]
        );
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(
            tags("quickly teaching retired famous students law"),
            vec!["RB", "VBG", "VBD", "JJ", "NNS", "NN"]
        );
    }

    #[test]
    fn test_custom_entries_override() {
        let tagger = LexiconPosTagger::new().with_entries(&[("Emeritus", "NNP")]);
        assert_eq!(tagger.tag_word("emeritus", 3), "NNP");
    }

    #[test]
    fn test_output_length_matches_input() {
        let words: Vec<String> = vec!["x".into(); 17];
        assert_eq!(LexiconPosTagger::new().tag(&words).len(), 17);
    }
}
