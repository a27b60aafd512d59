//! Natural Language Processing components
//!
//! This module provides tokenization, BIO encoding and the tagging
//! collaborators (POS and NER) the pipeline consumes.

pub mod bio;
pub mod ner;
pub mod pos;
pub mod tokenizer;
