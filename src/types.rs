//! Core data types shared across the extraction pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag value meaning "no entity" in NER output and BIO sequences.
pub const OUTSIDE_TAG: &str = "O";

/// Entity class emitted by NER taggers for person names.
pub const PERSON_CLASS: &str = "PERSON";

/// Entity class emitted by NER taggers for organizations.
pub const ORGANIZATION_CLASS: &str = "ORGANIZATION";

/// Maximum length of a normalized job title, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Maximum number of words kept in a normalized last name.
pub const MAX_LAST_NAME_WORDS: usize = 5;

/// A single tagged token.
///
/// `tag` is either a Penn Treebank POS tag (`NNP`, `IN`, ...) or an entity
/// class (`PERSON`, `ORGANIZATION`, `O`), depending on which tagger produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,
    /// POS tag or entity class
    pub tag: String,
}

impl Token {
    pub fn new(text: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: tag.into(),
        }
    }

    /// Whether this token carries no entity class.
    pub fn is_outside(&self) -> bool {
        self.tag == OUTSIDE_TAG
    }
}

/// An ordered, tagged sentence.
pub type TaggedSentence = Vec<Token>;

/// Begin/Inside/Outside entity tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BioTag {
    Outside,
    Begin(String),
    Inside(String),
}

impl BioTag {
    /// The entity class, if any.
    pub fn class(&self) -> Option<&str> {
        match self {
            BioTag::Outside => None,
            BioTag::Begin(c) | BioTag::Inside(c) => Some(c),
        }
    }

    /// Parse `O`, `B-X` or `I-X`. Anything else is treated as a bare class
    /// and opens a new span.
    pub fn parse(tag: &str) -> Self {
        if tag == OUTSIDE_TAG {
            return BioTag::Outside;
        }
        if let Some(class) = tag.strip_prefix("B-") {
            return BioTag::Begin(class.to_string());
        }
        if let Some(class) = tag.strip_prefix("I-") {
            return BioTag::Inside(class.to_string());
        }
        BioTag::Begin(tag.to_string())
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioTag::Outside => write!(f, "{OUTSIDE_TAG}"),
            BioTag::Begin(c) => write!(f, "B-{c}"),
            BioTag::Inside(c) => write!(f, "I-{c}"),
        }
    }
}

/// A token carrying both its POS tag and its BIO entity tag (a CoNLL triple).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConllToken {
    pub text: String,
    pub pos: String,
    pub bio: BioTag,
}

impl ConllToken {
    pub fn new(text: impl Into<String>, pos: impl Into<String>, bio: BioTag) -> Self {
        Self {
            text: text.into(),
            pos: pos.into(),
            bio,
        }
    }
}

/// Raw (title, name) text harvested from one matched `NAMED_ENTITY` subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title_text: String,
    pub name_text: String,
}

impl Candidate {
    pub fn new(title_text: impl Into<String>, name_text: impl Into<String>) -> Self {
        Self {
            title_text: title_text.into(),
            name_text: name_text.into(),
        }
    }
}

/// Final normalized person/title record.
///
/// Only built by [`crate::extract::assembler::EntityAssembler`], after the
/// name and title normalizers have rejected empty fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub contact: String,
    pub origin: String,
}

/// One unit of work: free text plus the identifiers copied onto every entity
/// extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub origin: String,
}

impl SourceRecord {
    pub fn new(
        text: impl Into<String>,
        contact: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            text: text.into(),
            contact: contact.into(),
            origin: origin.into(),
        }
    }

    /// Set the record identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
