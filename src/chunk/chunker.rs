//! Cascaded chunking
//!
//! Applies a [`Grammar`] to one sentence at a time. Each stage scans the
//! current top-level nodes; every rule wraps its matches in a branch carrying
//! the stage's label. Matches are greedy, non-overlapping, left to right, and
//! never reach into a chunk already made by the same stage.

use crate::chunk::grammar::{ChunkRule, Grammar, GrammarKind, GrammarStage};
use crate::chunk::tree::{Label, ParseNode, SENTENCE_LABEL};

/// A node slot during one stage: still open to matching, or already chunked.
enum Slot {
    Open(ParseNode),
    Chunk(Vec<ParseNode>),
}

/// Grammar-driven chunker
#[derive(Debug, Clone)]
pub struct Chunker {
    grammar: Grammar,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(GrammarKind::default())
    }
}

impl Chunker {
    /// Create a chunker with a built-in grammar
    pub fn new(kind: GrammarKind) -> Self {
        Self {
            grammar: Grammar::for_kind(kind),
        }
    }

    /// Create a chunker with a custom grammar
    pub fn with_grammar(grammar: Grammar) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Chunk one sentence, returning its root branch (labeled `S`)
    pub fn chunk(&self, nodes: Vec<ParseNode>) -> ParseNode {
        let children = self
            .grammar
            .stages()
            .iter()
            .fold(nodes, |nodes, stage| apply_stage(stage, nodes));
        ParseNode::branch(Label::Other(SENTENCE_LABEL.to_string()), children)
    }

    /// Chunk sentences independently; nothing is matched across sentences.
    pub fn chunk_sentences(&self, sentences: Vec<Vec<ParseNode>>) -> Vec<ParseNode> {
        sentences.into_iter().map(|s| self.chunk(s)).collect()
    }
}

fn apply_stage(stage: &GrammarStage, nodes: Vec<ParseNode>) -> Vec<ParseNode> {
    let slots: Vec<Slot> = nodes.into_iter().map(Slot::Open).collect();
    let slots = stage
        .rules
        .iter()
        .fold(slots, |slots, rule| apply_rule(rule, slots));

    slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Open(node) => node,
            Slot::Chunk(children) => ParseNode::branch(stage.label.clone(), children),
        })
        .collect()
}

fn apply_rule(rule: &ChunkRule, slots: Vec<Slot>) -> Vec<Slot> {
    let mut out = Vec::with_capacity(slots.len());
    let mut run: Vec<ParseNode> = Vec::new();

    for slot in slots {
        match slot {
            Slot::Open(node) => run.push(node),
            chunk @ Slot::Chunk(_) => {
                flush_run(rule, std::mem::take(&mut run), &mut out);
                out.push(chunk);
            }
        }
    }
    flush_run(rule, run, &mut out);

    out
}

/// Match `rule` over a run of open nodes and move them into `out`.
fn flush_run(rule: &ChunkRule, run: Vec<ParseNode>, out: &mut Vec<Slot>) {
    if run.is_empty() {
        return;
    }

    let spans = {
        let tags: Vec<&str> = run.iter().map(|n| n.tag()).collect();
        rule.find_all(&tags)
    };

    let mut nodes = run.into_iter();
    let mut pos = 0;
    for (start, end) in spans {
        out.extend(nodes.by_ref().take(start - pos).map(Slot::Open));
        out.push(Slot::Chunk(nodes.by_ref().take(end - start).collect()));
        pos = end;
    }
    out.extend(nodes.map(Slot::Open));
}
