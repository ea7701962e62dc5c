/*
    This module computes FIRST and FOLLOW sets
*/

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use log::debug;

use crate::grammar::*;

/// A member of a FIRST or FOLLOW set, and the lookahead a parser reads.
/// FIRST sets hold terminals and `Epsilon`; FOLLOW sets hold terminals and
/// `End`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum Lookahead {
    Epsilon,
    End,
    Terminal(String),
}

impl Lookahead {
    pub fn terminal(name: &str) -> Self {
        Lookahead::Terminal(name.to_string())
    }
}

impl Display for Lookahead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookahead::Epsilon => write!(f, "ε"),
            Lookahead::End => write!(f, "$"),
            Lookahead::Terminal(name) => write!(f, "{}", name),
        }
    }
}

pub type LookaheadSet = BTreeSet<Lookahead>;
pub type FirstSets = HashMap<String, LookaheadSet>;
pub type FollowSets = HashMap<String, LookaheadSet>;

/// FIRST of a symbol sequence. Each symbol contributes its FIRST set minus ε
/// for as long as everything before it is nullable; ε is included only when
/// the whole sequence is nullable (including when it is empty).
pub fn first_of_sequence(first: &FirstSets, symbols: &[Symbol]) -> LookaheadSet {
    let mut result = LookaheadSet::new();

    for symbol in symbols {
        match symbol {
            Symbol::Epsilon => continue,
            Symbol::Terminal(name) => {
                result.insert(Lookahead::Terminal(name.clone()));
                return result;
            }
            Symbol::Nonterminal(name) => {
                let Some(set) = first.get(name) else {
                    return result;
                };
                result.extend(set.iter().filter(|l| **l != Lookahead::Epsilon).cloned());
                if !set.contains(&Lookahead::Epsilon) {
                    return result;
                }
            }
        }
    }

    result.insert(Lookahead::Epsilon);
    result
}

pub fn compute_first(grammar: &Grammar) -> FirstSets {
    let mut first: FirstSets = grammar.nonterminals()
        .iter()
        .map(|name| (name.clone(), LookaheadSet::new()))
        .collect();

    let mut passes = 0;
    let mut changed = true;
    while changed {
        changed = false;
        passes += 1;

        for production in grammar.all_productions() {
            let addition = first_of_sequence(&first, &production.symbols);
            let Some(set) = first.get_mut(&production.lhs) else {
                continue;
            };
            for lookahead in addition {
                changed |= set.insert(lookahead);
            }
        }
    }

    debug!("FIRST sets converged after {} passes", passes);
    first
}

pub fn compute_follow(grammar: &Grammar, first: &FirstSets, start: &str) -> FollowSets {
    let mut follow: FollowSets = grammar.nonterminals()
        .iter()
        .map(|name| (name.clone(), LookaheadSet::new()))
        .collect();

    if let Some(set) = follow.get_mut(start) {
        set.insert(Lookahead::End);
    }

    let mut passes = 0;
    let mut changed = true;
    while changed {
        changed = false;
        passes += 1;

        for production in grammar.all_productions() {
            for (position, symbol) in production.symbols.iter().enumerate() {
                let Symbol::Nonterminal(name) = symbol else {
                    continue;
                };

                let rest = first_of_sequence(first, &production.symbols[position + 1..]);
                let mut addition: LookaheadSet = rest.iter()
                    .filter(|l| **l != Lookahead::Epsilon)
                    .cloned()
                    .collect();
                if rest.contains(&Lookahead::Epsilon) {
                    if let Some(owner) = follow.get(&production.lhs) {
                        addition.extend(owner.iter().cloned());
                    }
                }

                if let Some(set) = follow.get_mut(name) {
                    for lookahead in addition {
                        changed |= set.insert(lookahead);
                    }
                }
            }
        }
    }

    debug!("FOLLOW sets converged after {} passes", passes);
    follow
}

// Renders sets one nonterminal per line, in declaration order
pub fn display_sets(grammar: &Grammar, sets: &HashMap<String, LookaheadSet>) -> String {
    grammar.nonterminals()
        .iter()
        .map(|name| {
            let members = sets.get(name)
                .map(|set| set.iter().map(Lookahead::to_string).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            format!("{} = {{{}}}\n", name, members)
        })
        .collect()
}
