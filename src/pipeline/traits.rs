//! Stage trait definitions for the pipeline.
//!
//! Tagging is the only stage with interchangeable implementations: it either
//! calls an external NER service and merges in POS tags, or relies on POS
//! tags alone. Every later stage (chunking, walking, validation,
//! normalization) is a concrete type owned by the
//! [`Pipeline`](crate::pipeline::runner::Pipeline).

use crate::chunk::grammar::GrammarKind;
use crate::chunk::tree::ParseNode;
use crate::error::Result;
use crate::nlp::bio::TagNormalizer;
use crate::nlp::ner::NerTagger;
use crate::nlp::pos::{LexiconPosTagger, PosTagger};
use crate::nlp::tokenizer::Tokenizer;
use crate::types::Token;

// ============================================================================
// SentenceTagger: sentence text to chunkable nodes
// ============================================================================

/// Turns one sentence into the node sequence the chunker consumes.
///
/// # Contract
///
/// - **Input**: a single sentence of raw text.
/// - **Output**: leaves carrying POS tags, possibly grouped into entity-class
///   branches (`PERSON`, `ORGANIZATION`, ...).
/// - **Errors**: [`Error::Tagging`](crate::error::Error::Tagging) when the
///   underlying tagger fails. The runner logs the failure and skips the
///   sentence; other sentences are unaffected.
pub trait SentenceTagger: Send + Sync {
    fn tag_sentence(&self, sentence: &str) -> Result<Vec<ParseNode>>;

    /// The built-in grammar written for this tagger's output
    fn grammar_kind(&self) -> GrammarKind;
}

impl std::fmt::Debug for dyn SentenceTagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn SentenceTagger").finish_non_exhaustive()
    }
}

impl<T: SentenceTagger + ?Sized> SentenceTagger for Box<T> {
    fn tag_sentence(&self, sentence: &str) -> Result<Vec<ParseNode>> {
        (**self).tag_sentence(sentence)
    }

    fn grammar_kind(&self) -> GrammarKind {
        (**self).grammar_kind()
    }
}

// ============================================================================
// ExternalTagging: NER service + BIO + POS
// ============================================================================

/// NER classes from `ner`, BIO-encoded, with POS tags from `pos`.
///
/// Entity spans come back as branches labeled with their class, so a
/// `PERSON` span is already grouped before chunking starts.
#[derive(Debug, Clone)]
pub struct ExternalTagging<N, P = LexiconPosTagger> {
    pub ner: N,
    pub pos: P,
    normalizer: TagNormalizer,
}

impl<N: NerTagger> ExternalTagging<N> {
    pub fn new(ner: N) -> Self {
        Self::with_pos_tagger(ner, LexiconPosTagger::new())
    }
}

impl<N: NerTagger, P: PosTagger> ExternalTagging<N, P> {
    pub fn with_pos_tagger(ner: N, pos: P) -> Self {
        Self {
            ner,
            pos,
            normalizer: TagNormalizer,
        }
    }
}

impl<N: NerTagger, P: PosTagger> SentenceTagger for ExternalTagging<N, P> {
    fn tag_sentence(&self, sentence: &str) -> Result<Vec<ParseNode>> {
        let tokens = self.ner.tag(sentence)?;
        let conll = self.normalizer.to_conll(&tokens, &self.pos);
        Ok(ParseNode::from_conll(&conll))
    }

    fn grammar_kind(&self) -> GrammarKind {
        GrammarKind::External
    }
}

// ============================================================================
// LocalTagging: POS only
// ============================================================================

/// POS tags only; person names are left for the grammar to find.
#[derive(Debug, Clone, Default)]
pub struct LocalTagging<P = LexiconPosTagger> {
    pub tokenizer: Tokenizer,
    pub pos: P,
}

impl LocalTagging {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: PosTagger> LocalTagging<P> {
    pub fn with_pos_tagger(pos: P) -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            pos,
        }
    }
}

impl<P: PosTagger> SentenceTagger for LocalTagging<P> {
    fn tag_sentence(&self, sentence: &str) -> Result<Vec<ParseNode>> {
        let words = self.tokenizer.words(sentence);
        let tags = self.pos.tag(&words);
        let tokens: Vec<Token> = words
            .into_iter()
            .zip(tags)
            .map(|(word, tag)| Token::new(word, tag))
            .collect();
        Ok(ParseNode::from_tokens(&tokens))
    }

    fn grammar_kind(&self) -> GrammarKind {
        GrammarKind::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::tree::Label;
    use crate::error::Error;
    use crate::nlp::ner::GazetteerNerTagger;

    #[test]
    fn test_external_groups_person_span() {
        let ner = GazetteerNerTagger::new().with_persons(&["Jane", "Smith"]);
        let tagger = ExternalTagging::new(ner);
        let nodes = tagger.tag_sentence("Professor Jane Smith").unwrap();

        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].is_leaf());
        assert_eq!(nodes[1].label(), Some(&Label::Person));
        assert_eq!(nodes[1].token_count(), 2);
        assert_eq!(tagger.grammar_kind(), GrammarKind::External);
    }

    #[test]
    fn test_external_leaves_carry_pos_tags() {
        let tagger = ExternalTagging::new(GazetteerNerTagger::new());
        let nodes = tagger.tag_sentence("Professor of law").unwrap();
        let tags: Vec<&str> = nodes.iter().map(ParseNode::tag).collect();
        assert_eq!(tags, vec!["NNP", "IN", "NN"]);
    }

    #[test]
    fn test_local_is_flat() {
        let tagger = LocalTagging::new();
        let nodes = tagger.tag_sentence("Jane Smith teaches law.").unwrap();
        assert!(nodes.iter().all(ParseNode::is_leaf));
        assert_eq!(nodes.len(), 5);
        assert_eq!(tagger.grammar_kind(), GrammarKind::Local);
    }

    #[test]
    fn test_failures_propagate() {
        struct Down;
        impl NerTagger for Down {
            fn tag(&self, _sentence: &str) -> Result<Vec<Token>> {
                Err(Error::tagging("connection refused"))
            }
        }

        let tagger = ExternalTagging::new(Down);
        assert!(matches!(
            tagger.tag_sentence("Professor Jane Smith"),
            Err(Error::Tagging(_))
        ));
    }

    #[test]
    fn test_boxed_tagger() {
        let tagger: Box<dyn SentenceTagger> = Box::new(LocalTagging::new());
        assert_eq!(tagger.grammar_kind(), GrammarKind::Local);
        assert!(!tagger.tag_sentence("Dean Ann Lee").unwrap().is_empty());
    }
}
