//! Begin/Inside/Outside encoding of NER output
//!
//! NER services return one bare class per token (`PERSON`, `O`, ...), which
//! cannot tell two back-to-back spans of the same class apart from one long
//! span. [`TagNormalizer`] rewrites the classes into BIO tags and attaches POS
//! tags so the chunker can match on both.

use crate::nlp::pos::PosTagger;
use crate::types::{BioTag, ConllToken, Token, OUTSIDE_TAG};

/// Converts raw NER tags to BIO tags and merges in POS tags
#[derive(Debug, Clone, Copy, Default)]
pub struct TagNormalizer;

impl TagNormalizer {
    /// Rewrite entity classes with positional prefixes.
    ///
    /// - `O` stays `O`
    /// - a class following `O` (or at the start) gets `B-`
    /// - a class equal to the previous token's class gets `I-`
    /// - a class differing from the previous token's class gets `B-`
    pub fn to_bio(&self, sentence: &[Token]) -> Vec<(String, BioTag)> {
        let mut out = Vec::with_capacity(sentence.len());
        let mut prev = OUTSIDE_TAG;

        for token in sentence {
            let tag = token.tag.as_str();
            let bio = if tag == OUTSIDE_TAG {
                BioTag::Outside
            } else if prev == tag {
                BioTag::Inside(tag.to_string())
            } else {
                BioTag::Begin(tag.to_string())
            };
            out.push((token.text.clone(), bio));
            prev = tag;
        }

        out
    }

    /// BIO-encode an NER-tagged sentence and attach POS tags from `pos_tagger`.
    pub fn to_conll(&self, sentence: &[Token], pos_tagger: &dyn PosTagger) -> Vec<ConllToken> {
        if sentence.is_empty() {
            return Vec::new();
        }
        let bio = self.to_bio(sentence);
        let words: Vec<String> = bio.iter().map(|(w, _)| w.clone()).collect();
        let pos = pos_tagger.tag(&words);

        bio.into_iter()
            .zip(pos)
            .map(|((text, bio), pos)| ConllToken::new(text, pos, bio))
            .collect()
    }
}
