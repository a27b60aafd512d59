//! Parse tree produced by chunking
//!
//! A sentence is a sequence of [`ParseNode`]s. Leaves wrap tagged tokens;
//! branches group a contiguous run of nodes under a [`Label`]. Chunking only
//! ever wraps adjacent nodes, so reading the leaves left to right always gives
//! back the original token order.

use std::fmt;

use crate::types::{BioTag, ConllToken, Token};

/// Label of the root branch wrapping one chunked sentence
pub const SENTENCE_LABEL: &str = "S";

/// Branch label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// A title/name span matched by the grammar
    NamedEntity,
    /// A person-name span, from NER or from the local grammar
    Person,
    /// Any other label (`ORGANIZATION`, `LOCATION`, the sentence root, ...)
    Other(String),
}

impl Label {
    /// Parse a label name. `NAMED-ENTITY` is accepted as a spelling of
    /// `NAMED_ENTITY`.
    pub fn parse(name: &str) -> Self {
        match name {
            "NAMED_ENTITY" | "NAMED-ENTITY" => Label::NamedEntity,
            "PERSON" => Label::Person,
            other => Label::Other(other.to_string()),
        }
    }

    /// The tag this label presents to grammar patterns
    pub fn as_str(&self) -> &str {
        match self {
            Label::NamedEntity => "NAMED_ENTITY",
            Label::Person => "PERSON",
            Label::Other(name) => name,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in a chunked sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNode {
    Leaf(Token),
    Branch { label: Label, children: Vec<ParseNode> },
}

impl ParseNode {
    pub fn leaf(token: Token) -> Self {
        ParseNode::Leaf(token)
    }

    pub fn branch(label: Label, children: Vec<ParseNode>) -> Self {
        ParseNode::Branch { label, children }
    }

    /// Tag seen by grammar patterns: a leaf's token tag, or a branch's label.
    pub fn tag(&self) -> &str {
        match self {
            ParseNode::Leaf(token) => &token.tag,
            ParseNode::Branch { label, .. } => label.as_str(),
        }
    }

    pub fn label(&self) -> Option<&Label> {
        match self {
            ParseNode::Leaf(_) => None,
            ParseNode::Branch { label, .. } => Some(label),
        }
    }

    pub fn children(&self) -> &[ParseNode] {
        match self {
            ParseNode::Leaf(_) => &[],
            ParseNode::Branch { children, .. } => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ParseNode::Leaf(_))
    }

    /// All tokens under this node, in order
    pub fn leaves(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Token>) {
        match self {
            ParseNode::Leaf(token) => out.push(token),
            ParseNode::Branch { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Number of tokens under this node
    pub fn token_count(&self) -> usize {
        match self {
            ParseNode::Leaf(_) => 1,
            ParseNode::Branch { children, .. } => children.iter().map(|c| c.token_count()).sum(),
        }
    }

    /// Follow a path of child indices from this node
    pub fn descendant(&self, path: &[usize]) -> Option<&ParseNode> {
        path.iter()
            .try_fold(self, |node, &i| node.children().get(i))
    }

    /// Pre-order, leftmost-first search among descendants (not `self`).
    /// Returns the path of child indices to the first match.
    pub fn find_path(&self, pred: &impl Fn(&ParseNode) -> bool) -> Option<Vec<usize>> {
        for (i, child) in self.children().iter().enumerate() {
            if pred(child) {
                return Some(vec![i]);
            }
            if let Some(mut rest) = child.find_path(pred) {
                rest.insert(0, i);
                return Some(rest);
            }
        }
        None
    }

    /// Tokens under this node, skipping the subtree at `path`
    pub fn leaves_excluding(&self, path: &[usize]) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_leaves_excluding(path, &mut out);
        out
    }

    fn collect_leaves_excluding<'a>(&'a self, path: &[usize], out: &mut Vec<&'a Token>) {
        let Some((&skip, rest)) = path.split_first() else {
            // Reached the excluded node itself
            return;
        };
        for (i, child) in self.children().iter().enumerate() {
            if i != skip {
                child.collect_leaves(out);
            } else if !rest.is_empty() {
                child.collect_leaves_excluding(rest, out);
            }
        }
    }

    /// Flat sequence of leaves for a POS-tagged sentence
    pub fn from_tokens(sentence: &[Token]) -> Vec<ParseNode> {
        sentence.iter().cloned().map(ParseNode::Leaf).collect()
    }

    /// Build nodes from CoNLL triples.
    ///
    /// `B-X` opens a branch labeled `X`; `I-X` continues an open `X` branch
    /// (or opens one if the previous token was not inside `X`); `O` closes any
    /// open branch and emits a plain leaf. Leaves keep their POS tag.
    pub fn from_conll(tokens: &[ConllToken]) -> Vec<ParseNode> {
        let mut nodes: Vec<ParseNode> = Vec::new();
        let mut open: Option<(String, Vec<ParseNode>)> = None;

        for token in tokens {
            let leaf = ParseNode::Leaf(Token::new(token.text.clone(), token.pos.clone()));
            match &token.bio {
                BioTag::Outside => {
                    if let Some((class, children)) = open.take() {
                        nodes.push(ParseNode::branch(Label::parse(&class), children));
                    }
                    nodes.push(leaf);
                }
                BioTag::Inside(class) if open.as_ref().is_some_and(|(c, _)| c == class) => {
                    if let Some((_, children)) = open.as_mut() {
                        children.push(leaf);
                    }
                }
                BioTag::Begin(class) | BioTag::Inside(class) => {
                    if let Some((prev, children)) = open.take() {
                        nodes.push(ParseNode::branch(Label::parse(&prev), children));
                    }
                    open = Some((class.clone(), vec![leaf]));
                }
            }
        }

        if let Some((class, children)) = open {
            nodes.push(ParseNode::branch(Label::parse(&class), children));
        }
        nodes
    }
}

/// Bracketed rendering: `(NAMED_ENTITY Professor/NNP (PERSON Jane/NNP Smith/NNP))`
impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseNode::Leaf(token) => write!(f, "{}/{}", token.text, token.tag),
            ParseNode::Branch { label, children } => {
                write!(f, "({label}")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(text: &str, tag: &str) -> ParseNode {
        ParseNode::leaf(Token::new(text, tag))
    }

    fn sample() -> ParseNode {
        ParseNode::branch(
            Label::NamedEntity,
            vec![
                leaf("Professor", "NNP"),
                ParseNode::branch(
                    Label::Other("X".into()),
                    vec![
                        leaf("of", "IN"),
                        ParseNode::branch(
                            Label::Person,
                            vec![leaf("Jane", "NNP"), leaf("Smith", "NNP")],
                        ),
                    ],
                ),
                leaf("Smith", "NNP"),
            ],
        )
    }

    #[test]
    fn test_label_parse_and_display() {
        assert_eq!(Label::parse("NAMED-ENTITY"), Label::NamedEntity);
        assert_eq!(Label::parse("NAMED_ENTITY"), Label::NamedEntity);
        assert_eq!(Label::parse("PERSON"), Label::Person);
        assert_eq!(Label::parse("ORGANIZATION").to_string(), "ORGANIZATION");
    }

    #[test]
    fn test_leaves_in_order() {
        let tree = sample();
        let texts: Vec<&str> = tree.leaves().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Professor", "of", "Jane", "Smith", "Smith"]);
        assert_eq!(sample().token_count(), 5);
    }

    #[test]
    fn test_find_path_and_exclusion_by_position() {
        let tree = sample();
        let path = tree
            .find_path(&|n| n.label() == Some(&Label::Person))
            .unwrap();
        assert_eq!(path, vec![1, 1]);

        let person = tree.descendant(&path).unwrap();
        assert_eq!(person.token_count(), 2);

        // The trailing "Smith" leaf is equal by value to one inside PERSON but survives.
        let rest: Vec<&str> = tree
            .leaves_excluding(&path)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(rest, vec!["Professor", "of", "Smith"]);
    }

    #[test]
    fn test_find_path_none() {
        let tree = ParseNode::branch(Label::NamedEntity, vec![leaf("Dean", "NNP")]);
        assert!(tree.find_path(&|n| n.label() == Some(&Label::Person)).is_none());
    }

    #[test]
    fn test_from_conll_groups_spans() {
        let tokens = vec![
            ConllToken::new("Professor", "NNP", BioTag::Outside),
            ConllToken::new("Jane", "NNP", BioTag::Begin("PERSON".into())),
            ConllToken::new("Smith", "NNP", BioTag::Inside("PERSON".into())),
            ConllToken::new("Ann", "NNP", BioTag::Begin("PERSON".into())),
            ConllToken::new("of", "IN", BioTag::Outside),
            ConllToken::new("MIT", "NNP", BioTag::Begin("ORGANIZATION".into())),
        ];
        let nodes = ParseNode::from_conll(&tokens);
        let rendered: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Professor/NNP",
                "(PERSON Jane/NNP Smith/NNP)",
                "(PERSON Ann/NNP)",
                "of/IN",
                "(ORGANIZATION MIT/NNP)",
            ]
        );
    }

    #[test]
    fn test_from_conll_stray_inside_opens_span() {
        let tokens = vec![
            ConllToken::new("Jane", "NNP", BioTag::Inside("PERSON".into())),
            ConllToken::new("Smith", "NNP", BioTag::Inside("PERSON".into())),
        ];
        let nodes = ParseNode::from_conll(&tokens);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].label(), Some(&Label::Person));
        assert_eq!(nodes[0].token_count(), 2);
    }
}
