/*
    This module parses token streams with an LL(1) table
*/

mod tree;

pub use tree::*;

use log::{debug, trace};
use thiserror::Error;

use crate::error_handling::*;
use crate::grammar::*;
use crate::sets::Lookahead;
use crate::table::ParseTable;
use crate::token::Token;

#[derive(Debug, PartialEq, Error)]
pub enum SyntaxErrorType {
    // A terminal on the stack did not match the lookahead
    #[error("Expected {expected}, found {}", describe(.found, .lexeme))]
    Expected {
        expected: Lookahead,
        found: Lookahead,
        lexeme: String,
    },
    // The table has no entry for the nonterminal on this lookahead
    #[error("No production of `{nonterminal}` starts with {}", describe(.lookahead, .lexeme))]
    NoProduction {
        nonterminal: String,
        lookahead: Lookahead,
        lexeme: String,
    },
    // This is a problem with the parser, not the input
    #[error("Internal parser error: {0}")]
    Internal(String),
}

impl ErrorType for SyntaxErrorType {}

fn describe(lookahead: &Lookahead, lexeme: &str) -> String {
    match lookahead {
        Lookahead::End => "end of input".to_string(),
        other => format!("{} `{}`", other, lexeme),
    }
}

pub type SyntaxError = Error<SyntaxErrorType>;

// An entry on the parse stack. Epsilon entries carry their parent's node,
// since they contribute none of their own.
#[derive(Debug)]
enum Frame {
    End,
    Symbol(Symbol, NodeId),
}

struct Cursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn lookahead(&self) -> Lookahead {
        match self.current() {
            Some(token) => Lookahead::Terminal(token.kind.clone()),
            None => Lookahead::End,
        }
    }

    fn lexeme(&self) -> String {
        self.current().map(|t| t.lexeme.clone()).unwrap_or_default()
    }

    // Past the end of input, errors point at the last token
    fn location(&self) -> Location {
        self.current()
            .or_else(|| self.tokens.last())
            .map(Token::location)
            .unwrap_or_default()
    }

    fn error(&self, error: SyntaxErrorType) -> SyntaxError {
        SyntaxError::new(error, self.location())
    }
}

fn attach_children(nodes: &mut [Option<Node>], parent: NodeId, ids: &[NodeId]) {
    if let Some(Some(Node::Internal { children, .. })) = nodes.get_mut(parent) {
        children.extend_from_slice(ids);
    }
}

/// Parses `tokens` as a sentence of the grammar's start symbol. There is no
/// backtracking and no error recovery: the first mismatch is returned.
pub fn parse(tokens: &[Token], table: &ParseTable, grammar: &Grammar) -> Result<SyntaxTree, SyntaxError> {
    let start = grammar.start_symbol();
    let root: NodeId = 0;

    // Terminal slots stay empty until their token is matched
    let mut nodes = vec![Some(Node::Internal {
        nonterminal: start.to_string(),
        children: Vec::new(),
    })];
    let mut stack = vec![Frame::End, Frame::Symbol(Symbol::Nonterminal(start.to_string()), root)];
    let mut cursor = Cursor { tokens, position: 0 };

    while let Some(frame) = stack.pop() {
        trace!("stack top {:?}, lookahead {}", frame, cursor.lookahead());

        match frame {
            Frame::End => {
                if cursor.current().is_some() {
                    return Err(cursor.error(SyntaxErrorType::Expected {
                        expected: Lookahead::End,
                        found: cursor.lookahead(),
                        lexeme: cursor.lexeme(),
                    }));
                }
                break;
            }
            Frame::Symbol(Symbol::Epsilon, _) => continue,
            Frame::Symbol(Symbol::Terminal(name), id) => {
                match cursor.current() {
                    Some(token) if token.kind == name => {
                        nodes[id] = Some(Node::Leaf { token: token.clone() });
                        cursor.position += 1;
                    }
                    _ => {
                        return Err(cursor.error(SyntaxErrorType::Expected {
                            expected: Lookahead::Terminal(name),
                            found: cursor.lookahead(),
                            lexeme: cursor.lexeme(),
                        }));
                    }
                }
            }
            Frame::Symbol(Symbol::Nonterminal(name), id) => {
                let lookahead = cursor.lookahead();
                let Some(production) = table.get(&name, &lookahead) else {
                    return Err(cursor.error(SyntaxErrorType::NoProduction {
                        nonterminal: name,
                        lookahead,
                        lexeme: cursor.lexeme(),
                    }));
                };

                let mut children = Vec::with_capacity(production.symbols.len());
                let mut frames = Vec::with_capacity(production.symbols.len());
                for symbol in &production.symbols {
                    let child = match symbol {
                        Symbol::Epsilon => id,
                        Symbol::Terminal(_) => {
                            nodes.push(None);
                            children.push(nodes.len() - 1);
                            nodes.len() - 1
                        }
                        Symbol::Nonterminal(child_name) => {
                            nodes.push(Some(Node::Internal {
                                nonterminal: child_name.clone(),
                                children: Vec::new(),
                            }));
                            children.push(nodes.len() - 1);
                            nodes.len() - 1
                        }
                    };
                    frames.push(Frame::Symbol(symbol.clone(), child));
                }

                attach_children(&mut nodes, id, &children);
                stack.extend(frames.into_iter().rev());
            }
        }
    }

    let nodes: Vec<Node> = nodes.into_iter()
        .collect::<Option<_>>()
        .ok_or_else(|| cursor.error(SyntaxErrorType::Internal("unmatched terminal left in tree".to_string())))?;

    debug!("Parsed {} tokens into {} nodes", tokens.len(), nodes.len());
    Ok(SyntaxTree::new(nodes, root))
}
