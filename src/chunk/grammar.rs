//! Chunk grammars
//!
//! A grammar is an ordered cascade of stages. Each stage wraps matches of its
//! rules in a branch with the stage's label, and later stages see those
//! branches as single items tagged with that label.
//!
//! Grammars are written in the usual tag-pattern notation:
//!
//! ```text
//! PERSON: {<NNP>{2}}
//! NAMED_ENTITY: {<PERSON><NNP><IN|CC|DT|NN|NNP>*}
//!               {<NNP><IN|CC|DT|NN|NNP>*<PERSON>}
//! ```
//!
//! `<A|B>` matches one item tagged `A` or `B`; it may be followed by `?`, `*`,
//! `+` or `{n}`. A line starting with `{` adds rules to the previous stage.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::chunk::tree::Label;
use crate::error::{Error, Result};

/// Grammar used with an external NER tagger (PERSON/ORGANIZATION spans come in
/// already grouped).
pub const EXTERNAL_GRAMMAR: &str = r"
NAMED_ENTITY: {<NNP><IN|CC|DT|NN|NNP>*<ORGANIZATION>?<PERSON>}
              {<PERSON><NNP><IN|CC|DT|NN|NNP>*<ORGANIZATION>?}
";

/// Grammar used with POS tags only. PERSON is approximated by two proper
/// nouns and must be chunked before NAMED_ENTITY can refer to it.
pub const LOCAL_GRAMMAR: &str = r"
PERSON: {<NNP>{2}}
NAMED_ENTITY: {<PERSON><NNP><IN|CC|DT|NN|NNP>*}
              {<NNP><IN|CC|DT|NN|NNP>*<PERSON>}
";

static BUILTIN_EXTERNAL: LazyLock<Grammar> =
    LazyLock::new(|| Grammar::parse(EXTERNAL_GRAMMAR).expect("valid built-in grammar"));

static BUILTIN_LOCAL: LazyLock<Grammar> =
    LazyLock::new(|| Grammar::parse(LOCAL_GRAMMAR).expect("valid built-in grammar"));

/// Which built-in grammar to use, keyed by the tagger that produced the tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarKind {
    /// NER classes from an external tagging service, plus POS tags
    #[default]
    #[serde(alias = "stanford", alias = "stanford_ner", alias = "ner")]
    External,
    /// POS tags only
    #[serde(alias = "pos", alias = "nltk")]
    Local,
}

impl GrammarKind {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "external" | "stanford" | "stanford_ner" | "ner" => Some(GrammarKind::External),
            "local" | "pos" | "nltk" => Some(GrammarKind::Local),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GrammarKind::External => "external",
            GrammarKind::Local => "local",
        }
    }
}

impl std::str::FromStr for GrammarKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        GrammarKind::parse(value)
            .ok_or_else(|| Error::grammar(format!("unknown grammar kind {value:?}")))
    }
}

/// How many consecutive items one pattern element consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
    Exactly(usize),
}

impl Repeat {
    pub fn min(&self) -> usize {
        match self {
            Repeat::One | Repeat::OneOrMore => 1,
            Repeat::Optional | Repeat::ZeroOrMore => 0,
            Repeat::Exactly(n) => *n,
        }
    }

    pub fn max(&self) -> usize {
        match self {
            Repeat::One | Repeat::Optional => 1,
            Repeat::ZeroOrMore | Repeat::OneOrMore => usize::MAX,
            Repeat::Exactly(n) => *n,
        }
    }
}

/// One `<A|B>` element with its quantifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternElement {
    pub tags: Vec<String>,
    pub repeat: Repeat,
}

impl PatternElement {
    pub fn new(tags: &[&str], repeat: Repeat) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            repeat,
        }
    }

    pub fn accepts(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A sequence of pattern elements, matched greedily with backtracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRule {
    pub elements: Vec<PatternElement>,
}

impl ChunkRule {
    pub fn new(elements: Vec<PatternElement>) -> Result<Self> {
        if elements.is_empty() {
            return Err(Error::grammar("empty chunk rule"));
        }
        if elements.iter().all(|e| e.repeat.min() == 0) {
            return Err(Error::grammar("chunk rule can match zero items"));
        }
        Ok(Self { elements })
    }

    /// Try to match starting exactly at `start`; returns the end index.
    ///
    /// Quantifiers are greedy: the longest run is tried first and shortened
    /// only if the rest of the rule fails to match.
    pub fn match_at(&self, tags: &[&str], start: usize) -> Option<usize> {
        self.match_from(0, tags, start)
    }

    fn match_from(&self, element: usize, tags: &[&str], pos: usize) -> Option<usize> {
        let Some(el) = self.elements.get(element) else {
            return Some(pos);
        };

        let limit = el.repeat.max();
        let mut available = 0;
        while available < limit && pos + available < tags.len() && el.accepts(tags[pos + available])
        {
            available += 1;
        }
        if available < el.repeat.min() {
            return None;
        }

        (el.repeat.min()..=available)
            .rev()
            .find_map(|n| self.match_from(element + 1, tags, pos + n))
    }

    /// All non-overlapping matches, leftmost first
    pub fn find_all(&self, tags: &[&str]) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut i = 0;
        while i < tags.len() {
            match self.match_at(tags, i) {
                Some(end) if end > i => {
                    spans.push((i, end));
                    i = end;
                }
                _ => i += 1,
            }
        }
        spans
    }
}

impl fmt::Display for ChunkRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for el in &self.elements {
            write!(f, "<{}>", el.tags.join("|"))?;
            match el.repeat {
                Repeat::One => {}
                Repeat::Optional => write!(f, "?")?,
                Repeat::ZeroOrMore => write!(f, "*")?,
                Repeat::OneOrMore => write!(f, "+")?,
                Repeat::Exactly(n) => write!(f, "{{{n}}}")?,
            }
        }
        Ok(())
    }
}

/// Rules sharing one output label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarStage {
    pub label: Label,
    pub rules: Vec<ChunkRule>,
}

/// Ordered cascade of chunking stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    stages: Vec<GrammarStage>,
}

impl Grammar {
    pub fn new(stages: Vec<GrammarStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[GrammarStage] {
        &self.stages
    }

    /// Built-in grammar for a tagger kind
    pub fn for_kind(kind: GrammarKind) -> Self {
        match kind {
            GrammarKind::External => BUILTIN_EXTERNAL.clone(),
            GrammarKind::Local => BUILTIN_LOCAL.clone(),
        }
    }

    pub fn external() -> Self {
        Self::for_kind(GrammarKind::External)
    }

    pub fn local() -> Self {
        Self::for_kind(GrammarKind::Local)
    }

    /// Parse the textual grammar notation
    pub fn parse(source: &str) -> Result<Self> {
        let mut stages: Vec<GrammarStage> = Vec::new();

        for (lineno, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let body = match line.find(':') {
                Some(colon) if !line[..colon].contains('{') => {
                    let label = line[..colon].trim();
                    if label.is_empty() {
                        return Err(Error::grammar(format!("line {}: missing label", lineno + 1)));
                    }
                    stages.push(GrammarStage {
                        label: Label::parse(label),
                        rules: Vec::new(),
                    });
                    &line[colon + 1..]
                }
                _ => line,
            };

            let stage = stages.last_mut().ok_or_else(|| {
                Error::grammar(format!("line {}: rule before any label", lineno + 1))
            })?;
            for block in rule_blocks(body).map_err(|e| at_line(e, lineno))? {
                stage.rules.push(parse_rule(block).map_err(|e| at_line(e, lineno))?);
            }
        }

        if let Some(stage) = stages.iter().find(|s| s.rules.is_empty()) {
            return Err(Error::grammar(format!("stage {} has no rules", stage.label)));
        }
        Ok(Self { stages })
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in &self.stages {
            write!(f, "{}:", stage.label)?;
            for rule in &stage.rules {
                write!(f, " {{{rule}}}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn at_line(err: Error, lineno: usize) -> Error {
    match err {
        Error::Grammar(msg) => Error::grammar(format!("line {}: {msg}", lineno + 1)),
        other => other,
    }
}

/// Split `{...} {...}` into rule bodies, honoring nested `{n}` quantifiers.
fn rule_blocks(body: &str) -> Result<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in body.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::grammar("unbalanced '}'"))?;
                if depth == 0 {
                    blocks.push(&body[start..i]);
                }
            }
            c if depth == 0 && !c.is_whitespace() => {
                return Err(Error::grammar(format!("unexpected {c:?} outside rule")));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(Error::grammar("unbalanced '{'"));
    }
    Ok(blocks)
}

fn parse_rule(body: &str) -> Result<ChunkRule> {
    let mut elements = Vec::new();
    let mut rest = body.trim();

    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('<')
            .ok_or_else(|| Error::grammar(format!("expected '<' in {body:?}")))?;
        let close = inner
            .find('>')
            .ok_or_else(|| Error::grammar(format!("unclosed '<' in {body:?}")))?;

        // Empty alternatives ("<NN|>") are ignored.
        let tags: Vec<String> = inner[..close]
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        if tags.is_empty() {
            return Err(Error::grammar(format!("empty tag set in {body:?}")));
        }

        let (repeat, consumed) = parse_repeat(&inner[close + 1..])?;
        rest = inner[close + 1 + consumed..].trim_start();
        elements.push(PatternElement { tags, repeat });
    }

    ChunkRule::new(elements)
}

fn parse_repeat(s: &str) -> Result<(Repeat, usize)> {
    match s.chars().next() {
        Some('?') => Ok((Repeat::Optional, 1)),
        Some('*') => Ok((Repeat::ZeroOrMore, 1)),
        Some('+') => Ok((Repeat::OneOrMore, 1)),
        Some('{') => {
            let close = s
                .find('}')
                .ok_or_else(|| Error::grammar("unclosed repeat count"))?;
            let n: usize = s[1..close]
                .trim()
                .parse()
                .map_err(|_| Error::grammar(format!("bad repeat count {:?}", &s[1..close])))?;
            Ok((Repeat::Exactly(n), close + 1))
        }
        _ => Ok((Repeat::One, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(src: &str) -> ChunkRule {
        parse_rule(src).unwrap()
    }

    #[test]
    fn test_builtin_grammars_parse() {
        let external = Grammar::parse(EXTERNAL_GRAMMAR).unwrap();
        assert_eq!(external.stages().len(), 1);
        assert_eq!(external.stages()[0].label, Label::NamedEntity);
        assert_eq!(external.stages()[0].rules.len(), 2);

        let local = Grammar::parse(LOCAL_GRAMMAR).unwrap();
        assert_eq!(local.stages().len(), 2);
        assert_eq!(local.stages()[0].label, Label::Person);
        assert_eq!(local.stages()[0].rules[0].elements[0].repeat, Repeat::Exactly(2));
        assert_eq!(local.stages()[1].label, Label::NamedEntity);

        assert_eq!(Grammar::external(), external);
        assert_eq!(Grammar::local(), local);
    }

    #[test]
    fn test_rule_display_roundtrips_notation() {
        let r = rule("<NNP><IN|CC|DT|NN|NNP>*<ORGANIZATION>?<PERSON>");
        assert_eq!(r.to_string(), "<NNP><IN|CC|DT|NN|NNP>*<ORGANIZATION>?<PERSON>");
        assert_eq!(rule("<NNP>{2}").to_string(), "<NNP>{2}");
    }

    #[test]
    fn test_empty_alternative_ignored() {
        let r = rule("<NNP><IN|CC|DT|NN|NNP|>*<PERSON>");
        assert_eq!(r.elements[1].tags.len(), 5);
    }

    #[test]
    fn test_greedy_star_backtracks_to_find_tail() {
        let r = rule("<NNP><IN|NNP>*<PERSON>");
        let tags = ["NNP", "IN", "NNP", "PERSON", "NNP"];
        assert_eq!(r.match_at(&tags, 0), Some(4));
    }

    #[test]
    fn test_greedy_prefers_longest() {
        let r = rule("<NNP><NNP>*");
        assert_eq!(r.match_at(&["NNP", "NNP", "NNP", "IN"], 0), Some(3));
    }

    #[test]
    fn test_exact_repeat() {
        let r = rule("<NNP>{2}");
        let tags = ["NNP", "NNP", "NNP", "NNP", "NNP"];
        assert_eq!(r.find_all(&tags), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_find_all_non_overlapping_left_to_right() {
        let r = rule("<NNP><PERSON>");
        let tags = ["NNP", "PERSON", "IN", "NNP", "PERSON"];
        assert_eq!(r.find_all(&tags), vec![(0, 2), (3, 5)]);
    }

    #[test]
    fn test_no_match() {
        let r = rule("<NNP><PERSON>");
        assert!(r.find_all(&["IN", "DT", "NN"]).is_empty());
        assert!(r.find_all(&[]).is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(Grammar::parse("{<NNP>}").is_err());
        assert!(Grammar::parse("X: {<NNP>").is_err());
        assert!(Grammar::parse("X: {NNP}").is_err());
        assert!(Grammar::parse("X: {<>}").is_err());
        assert!(Grammar::parse("X: {<NNP>*}").is_err());
        assert!(Grammar::parse("X:").is_err());
        assert!(Grammar::parse("X: {<NNP>{two}}").is_err());
    }

    #[test]
    fn test_continuation_lines_and_comments() {
        let g = Grammar::parse(
            "# titles\nNAMED_ENTITY: {<NNP><PERSON>}\n    {<PERSON><NNP>}\n",
        )
        .unwrap();
        assert_eq!(g.stages().len(), 1);
        assert_eq!(g.stages()[0].rules.len(), 2);
    }

    #[test]
    fn test_grammar_kind_from_str() {
        assert_eq!("stanford_ner".parse::<GrammarKind>().unwrap(), GrammarKind::External);
        assert_eq!("NLTK".parse::<GrammarKind>().unwrap(), GrammarKind::Local);
        assert!("spacy".parse::<GrammarKind>().is_err());
    }

    #[test]
    fn test_grammar_kind_serde_accepts_cli_spellings() {
        for name in ["external", "stanford", "stanford_ner", "ner", "local", "pos", "nltk"] {
            let parsed: GrammarKind = name.parse().unwrap();
            let deserialized: GrammarKind =
                serde_json::from_value(serde_json::Value::String(name.into())).unwrap();
            assert_eq!(parsed, deserialized, "{name}");
        }
        assert!(serde_json::from_str::<GrammarKind>("\"spacy\"").is_err());
        assert_eq!(serde_json::to_string(&GrammarKind::Local).unwrap(), "\"local\"");
    }

    #[test]
    fn test_builtin_grammars_are_never_empty() {
        for kind in [GrammarKind::External, GrammarKind::Local] {
            let grammar = Grammar::for_kind(kind);
            assert!(!grammar.stages().is_empty(), "{kind:?}");
            assert!(grammar.stages().iter().all(|stage| !stage.rules.is_empty()));
        }
    }
}
