use std::fmt::Display;

use crate::token::Token;

pub type NodeId = usize;

#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Internal {
        nonterminal: String,
        children: Vec<NodeId>,
    },
    Leaf {
        token: Token,
    },
}

/// A syntax tree stored as an arena. Nodes refer to their children by index
/// and the tree owns every node.
#[derive(Debug, PartialEq, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId) -> Self {
        SyntaxTree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id] {
            Node::Internal { children, .. } => children.as_slice(),
            Node::Leaf { .. } => &[],
        }
    }

    pub fn nonterminal(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id] {
            Node::Internal { nonterminal, .. } => Some(nonterminal.as_str()),
            Node::Leaf { .. } => None,
        }
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        match &self.nodes[id] {
            Node::Leaf { token } => Some(token),
            Node::Internal { .. } => None,
        }
    }

    // Tokens under a node, left to right
    pub fn leaves_under(&self, id: NodeId) -> Vec<&Token> {
        let mut leaves = Vec::new();
        let mut pending = vec![id];

        while let Some(id) = pending.pop() {
            match &self.nodes[id] {
                Node::Leaf { token } => leaves.push(token),
                Node::Internal { children, .. } => pending.extend(children.iter().rev()),
            }
        }

        leaves
    }

    pub fn leaves(&self) -> Vec<&Token> {
        self.leaves_under(self.root)
    }

    // The leftmost token under a node
    pub fn first_token(&self, id: NodeId) -> Option<&Token> {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            match &self.nodes[id] {
                Node::Leaf { token } => return Some(token),
                Node::Internal { children, .. } => pending.extend(children.iter().rev()),
            }
        }
        None
    }

    pub fn last_token(&self, id: NodeId) -> Option<&Token> {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            match &self.nodes[id] {
                Node::Leaf { token } => return Some(token),
                Node::Internal { children, .. } => pending.extend(children.iter()),
            }
        }
        None
    }
}

impl Display for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pending = vec![(self.root, 0)];

        while let Some((id, depth)) = pending.pop() {
            let indent = "  ".repeat(depth);
            match &self.nodes[id] {
                Node::Internal { nonterminal, children } => {
                    writeln!(f, "{}{}", indent, nonterminal)?;
                    pending.extend(children.iter().rev().map(|&child| (child, depth + 1)));
                }
                Node::Leaf { token } => {
                    writeln!(f, "{}{} `{}` {}:{}", indent, token.kind, token.lexeme, token.line, token.column)?;
                }
            }
        }
        Ok(())
    }
}
