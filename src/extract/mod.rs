//! Candidate harvesting, validation and normalization
//!
//! - [`walker`] pulls raw (title, name) candidates out of chunked trees
//! - [`title`] keeps keyword-bearing titles and cleans them
//! - [`name`] splits names into first/last
//! - [`assembler`] builds the final [`crate::types::Entity`]

pub mod assembler;
pub mod name;
pub mod title;
pub mod walker;

pub use assembler::EntityAssembler;
pub use name::NameNormalizer;
pub use title::{TitleNormalizer, TitleValidator};
pub use walker::TreeWalker;
