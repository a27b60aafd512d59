//! Chunking: grammars, the cascaded chunker and the parse tree it builds.

pub mod chunker;
pub mod grammar;
pub mod tree;

pub use chunker::Chunker;
pub use grammar::{Grammar, GrammarKind};
pub use tree::{Label, ParseNode};
