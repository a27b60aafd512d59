//! Candidate harvesting from chunked trees
//!
//! Every `NAMED_ENTITY` branch yields at most one [`Candidate`]: its first
//! `PERSON` descendant becomes the name, and whatever else the branch covers
//! becomes the title text.

use crate::chunk::tree::{Label, ParseNode};
use crate::types::{Candidate, Token};

/// Depth-first walker over chunked sentences
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalker;

impl TreeWalker {
    /// Candidates from one tree, in traversal order
    pub fn candidates(&self, tree: &ParseNode) -> Vec<Candidate> {
        let mut out = Vec::new();
        visit(tree, &mut out);
        out
    }

    /// Candidates from several trees, concatenated in order
    pub fn candidates_all<'a>(
        &self,
        trees: impl IntoIterator<Item = &'a ParseNode>,
    ) -> Vec<Candidate> {
        let mut out = Vec::new();
        for tree in trees {
            visit(tree, &mut out);
        }
        out
    }
}

fn visit(node: &ParseNode, out: &mut Vec<Candidate>) {
    match node {
        ParseNode::Leaf(_) => {}
        ParseNode::Branch {
            label: Label::NamedEntity,
            ..
        } => {
            if let Some(candidate) = harvest(node) {
                out.push(candidate);
            }
        }
        // Stray person spans carry no title.
        ParseNode::Branch {
            label: Label::Person,
            ..
        } => {}
        ParseNode::Branch { children, .. } => {
            for child in children {
                visit(child, out);
            }
        }
    }
}

/// Split a `NAMED_ENTITY` branch into (title, name) around its first PERSON.
fn harvest(branch: &ParseNode) -> Option<Candidate> {
    let Some(path) = branch.find_path(&|n| n.label() == Some(&Label::Person)) else {
        tracing::debug!(
            text = %join(&branch.leaves()),
            "named entity without a person; candidate dropped"
        );
        return None;
    };
    let person = branch.descendant(&path)?;

    // A lone name token is not reliable enough to split into first/last.
    let name = person.leaves();
    if name.len() <= 1 {
        tracing::debug!(name = %join(&name), "single-token person; candidate dropped");
        return None;
    }
    let title = branch.leaves_excluding(&path);

    Some(Candidate::new(join(&title), join(&name)))
}

fn join(tokens: &[&Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
