/*
    This module is for storing and inspecting grammars
*/

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;

use thiserror::Error;

// The base unit in a grammar rule
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
    // Derives the empty string; never matched against a token
    Epsilon,
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(name) => write!(f, "\"{}\"", name),
            Symbol::Nonterminal(name) => write!(f, "{}", name),
            Symbol::Epsilon => write!(f, "ε"),
        }
    }
}

// The symbols in a single alternative
pub type Alternative = Vec<Symbol>;

// The alternatives of a rewrite rule
pub type Rewrite = Vec<Alternative>;

/// One alternative of a nonterminal, remembering which rule owns it and
/// where it sits among that rule's alternatives.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Production {
    pub lhs: String,
    pub index: usize,
    pub symbols: Alternative,
}

impl Production {
    /// True when the body derives nothing but the empty string by itself
    pub fn is_epsilon(&self) -> bool {
        self.symbols.iter().all(|s| *s == Symbol::Epsilon)
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} =", self.lhs)?;
        if self.symbols.is_empty() {
            return write!(f, " ε");
        }
        for symbol in &self.symbols {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum GrammarError {
    #[error("Grammar has no rules")]
    EmptyGrammar,
    #[error("Start symbol `{0}` has no rule")]
    UndefinedStart(String),
    #[error("Nonterminal `{0}` is defined more than once")]
    DuplicateNonterminal(String),
}

/// An immutable grammar: nonterminals in declaration order, their ordered
/// productions, and the designated start symbol.
#[derive(Debug, PartialEq, Clone)]
pub struct Grammar {
    start_symbol: String,
    nonterminals: Vec<String>,
    rules: HashMap<String, Vec<Production>>,
}

impl Grammar {
    /// Builds a grammar from rewrite rules. Any nonterminal symbol without a
    /// rule of its own is treated as a terminal.
    pub fn from_rules(start: &str, rules: Vec<(String, Rewrite)>) -> Result<Grammar, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let mut declared = HashSet::with_capacity(rules.len());
        for (name, _) in &rules {
            if !declared.insert(name.clone()) {
                return Err(GrammarError::DuplicateNonterminal(name.clone()));
            }
        }

        if !declared.contains(start) {
            return Err(GrammarError::UndefinedStart(start.to_string()));
        }

        let nonterminals = rules.iter().map(|(name, _)| name.clone()).collect();
        let rules = rules.into_iter()
            .map(|(name, rewrite)| {
                let productions = rewrite.into_iter()
                    .enumerate()
                    .map(|(index, alternative)| Production {
                        lhs: name.clone(),
                        index,
                        symbols: alternative.into_iter().map(|s| classify(s, &declared)).collect(),
                    })
                    .collect();
                (name, productions)
            })
            .collect();

        Ok(Grammar {
            start_symbol: start.to_string(),
            nonterminals,
            rules,
        })
    }

    /// Builds a grammar from plain symbol names. A name is a nonterminal
    /// exactly when it has a rule; `ε` and the empty name mean epsilon.
    pub fn from_names(start: &str, rules: Vec<(&str, Vec<Vec<&str>>)>) -> Result<Grammar, GrammarError> {
        let rules = rules.into_iter()
            .map(|(name, alternatives)| {
                let rewrite = alternatives.into_iter()
                    .map(|alternative| alternative.into_iter()
                        .map(|symbol| match symbol {
                            "" | "ε" => Symbol::Epsilon,
                            _ => Symbol::Nonterminal(symbol.to_string()),
                        })
                        .collect())
                    .collect();
                (name.to_string(), rewrite)
            })
            .collect();

        Grammar::from_rules(start, rules)
    }

    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    // Nonterminals in the order their rules were declared
    pub fn nonterminals(&self) -> &[String] {
        &self.nonterminals
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn productions(&self, nonterminal: &str) -> &[Production] {
        self.rules.get(nonterminal).map(Vec::as_slice).unwrap_or(&[])
    }

    // Every production, grouped by nonterminal in declaration order
    pub fn all_productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.nonterminals.iter().flat_map(|name| self.productions(name))
    }

    pub fn terminals(&self) -> BTreeSet<&str> {
        self.all_productions()
            .flat_map(|p| p.symbols.iter())
            .filter_map(|symbol| match symbol {
                Symbol::Terminal(name) => Some(name.as_str()),
                _ => None
            })
            .collect()
    }
}

fn classify(symbol: Symbol, declared: &HashSet<String>) -> Symbol {
    match symbol {
        Symbol::Nonterminal(name) if !declared.contains(&name) => Symbol::Terminal(name),
        other => other,
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for production in self.all_productions() {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}
