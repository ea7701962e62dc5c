/*
    This module generates random sentences of a grammar
*/

use std::collections::HashMap;

use log::debug;
use rand::prelude::*;
use thiserror::Error;

use crate::error_handling::*;
use crate::grammar::*;
use crate::token::Token;

#[derive(Debug, PartialEq, Error)]
pub enum GenerateErrorType {
    // An undefined nonterminal was used
    #[error("No definition for nonterminal `{0}`")]
    UndefinedNonterminal(String),
    // Every derivation of the nonterminal loops forever
    #[error("`{0}` cannot derive a finite sentence")]
    Unproductive(String),
}

impl ErrorType for GenerateErrorType {}

pub type GenerateError = Error<GenerateErrorType>;
pub type GenResult<T> = Result<T, GenerateError>;

/// The height of the shortest derivation tree of each productive nonterminal.
/// Nonterminals missing from the map derive no finite sentence.
pub fn min_heights(grammar: &Grammar) -> HashMap<&str, usize> {
    let mut heights: HashMap<&str, usize> = HashMap::new();

    let mut passes = 0;
    let mut changed = true;
    while changed {
        changed = false;
        passes += 1;

        for name in grammar.nonterminals() {
            let best = grammar.productions(name).iter()
                .filter_map(|p| alternative_height(&p.symbols, &heights))
                .min();

            if let Some(best) = best {
                if heights.get(name.as_str()).map_or(true, |&h| best < h) {
                    heights.insert(name.as_str(), best);
                    changed = true;
                }
            }
        }
    }

    debug!("Minimum heights settled after {} passes", passes);
    heights
}

// None when some nonterminal in the alternative has no known height yet
fn alternative_height(symbols: &[Symbol], heights: &HashMap<&str, usize>) -> Option<usize> {
    symbols.iter()
        .try_fold(0, |deepest, symbol| match symbol {
            Symbol::Nonterminal(name) => heights.get(name.as_str()).map(|&h| deepest.max(h)),
            _ => Some(deepest),
        })
        .map(|deepest| deepest + 1)
}

/// Nonterminals that cannot derive any finite sentence, in declaration order
pub fn unproductive(grammar: &Grammar) -> Vec<&str> {
    let heights = min_heights(grammar);
    grammar.nonterminals().iter()
        .map(String::as_str)
        .filter(|name| !heights.contains_key(name))
        .collect()
}

struct Generator<'g, R> {
    grammar: &'g Grammar,
    heights: HashMap<&'g str, usize>,
    rng: R,
    max_depth: usize,
    sentence: Vec<&'g str>,
}

impl<'g, R: Rng> Generator<'g, R> {
    // Below the depth limit any finite alternative may be picked; past it
    // only the shallowest, so every derivation ends
    fn choose(&mut self, nonterminal: &str, depth: usize) -> Option<&'g Production> {
        let grammar = self.grammar;
        let candidates: Vec<(&Production, usize)> = grammar.productions(nonterminal).iter()
            .filter_map(|p| alternative_height(&p.symbols, &self.heights).map(|h| (p, h)))
            .collect();

        if depth < self.max_depth {
            candidates.choose(&mut self.rng).map(|&(p, _)| p)
        } else {
            candidates.iter().min_by_key(|&&(_, h)| h).map(|&(p, _)| p)
        }
    }

    fn nonterminal(&mut self, name: &str, depth: usize) {
        let Some(production) = self.choose(name, depth) else {
            return;
        };

        for symbol in &production.symbols {
            match symbol {
                Symbol::Terminal(terminal) => self.sentence.push(terminal.as_str()),
                Symbol::Nonterminal(child) => self.nonterminal(child, depth + 1),
                Symbol::Epsilon => {}
            }
        }
    }
}

/// Derives a random sentence from `start`. Each terminal becomes a token
/// whose kind and lexeme are the terminal's name, laid out on line 1.
pub fn generate(grammar: &Grammar, start: &str, rng: &mut impl Rng, max_depth: usize) -> GenResult<Vec<Token>> {
    if !grammar.is_nonterminal(start) {
        return Err(GenerateError::new(GenerateErrorType::UndefinedNonterminal(start.to_string()), Location::default()));
    }

    let heights = min_heights(grammar);
    if !heights.contains_key(start) {
        return Err(GenerateError::new(GenerateErrorType::Unproductive(start.to_string()), Location::default()));
    }

    let mut generator = Generator {
        grammar,
        heights,
        rng,
        max_depth,
        sentence: Vec::new(),
    };
    generator.nonterminal(start, 0);

    Ok(generator.sentence.into_iter()
        .enumerate()
        .map(|(i, terminal)| Token::new(terminal, terminal, 1, i + 1))
        .collect())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;

    use super::*;
    use crate::lang::test_support::table;
    use crate::parser;

    fn expression_grammar() -> Grammar {
        Grammar::from_names("E", vec![
            ("E", vec![vec!["T", "E'"]]),
            ("E'", vec![vec!["+", "T", "E'"], vec!["ε"]]),
            ("T", vec![vec!["F", "T'"]]),
            ("T'", vec![vec!["*", "F", "T'"], vec!["ε"]]),
            ("F", vec![vec!["(", "E", ")"], vec!["id"]]),
        ]).unwrap()
    }

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.kind.as_str()).collect()
    }

    #[test]
    fn heights_of_expression_grammar() {
        let grammar = expression_grammar();
        let heights = min_heights(&grammar);

        assert_eq!(heights["F"], 1);
        assert_eq!(heights["E'"], 1);
        assert_eq!(heights["T"], 2);
        assert_eq!(heights["E"], 3);
    }

    #[test]
    fn zero_depth_gives_shortest_sentence() {
        let grammar = expression_grammar();
        let mut rng = StdRng::seed_from_u64(7);

        let tokens = generate(&grammar, "E", &mut rng, 0).unwrap();
        assert_eq!(kinds(&tokens), vec!["id"]);
        assert_eq!(tokens[0], Token::new("id", "id", 1, 1));
    }

    #[test]
    fn same_seed_same_sentence() {
        let grammar = expression_grammar();

        let first = generate(&grammar, "E", &mut StdRng::seed_from_u64(42), 6).unwrap();
        let second = generate(&grammar, "E", &mut StdRng::seed_from_u64(42), 6).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unproductive_start_is_reported() {
        let grammar = Grammar::from_names("S", vec![
            ("S", vec![vec!["a", "S"]]),
            ("T", vec![vec!["b"]]),
        ]).unwrap();

        assert_eq!(unproductive(&grammar), vec!["S"]);
        let error = generate(&grammar, "S", &mut StdRng::seed_from_u64(0), 4).unwrap_err();
        assert_eq!(error.error, GenerateErrorType::Unproductive("S".to_string()));
        assert_eq!(generate(&grammar, "T", &mut StdRng::seed_from_u64(0), 4).unwrap().len(), 1);
    }

    #[test]
    fn undefined_start_is_reported() {
        let grammar = expression_grammar();
        let error = generate(&grammar, "Nope", &mut StdRng::seed_from_u64(0), 4).unwrap_err();

        assert_eq!(error.error, GenerateErrorType::UndefinedNonterminal("Nope".to_string()));
    }

    #[test]
    fn generated_programs_parse() {
        let (grammar, table) = table();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tokens = generate(&grammar, grammar.start_symbol(), &mut rng, 8).unwrap();

            let tree = parser::parse(&tokens, &table, &grammar).unwrap();
            let leaves: Vec<Token> = tree.leaves().into_iter().cloned().collect();
            assert_eq!(leaves, tokens);
        }
    }
}
