/*
    This module builds LL(1) parse tables
*/

use std::collections::HashMap;
use std::fmt::Display;

use itertools::Itertools;
use log::{info, trace};
use thiserror::Error;

use crate::grammar::*;
use crate::sets::*;

/// Two productions of the same nonterminal compete for one table cell, so the
/// grammar is not LL(1).
#[derive(Debug, PartialEq, Error)]
#[error("Grammar is not LL(1): cell [{nonterminal}, {lookahead}] is claimed by `{existing}` and `{incoming}`")]
pub struct GrammarConflict {
    pub nonterminal: String,
    pub lookahead: Lookahead,
    pub existing: Production,
    pub incoming: Production,
}

/// Maps (nonterminal, lookahead) to the production to expand with. Lookaheads
/// are terminals or the end marker. Immutable once built.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseTable {
    cells: HashMap<String, HashMap<Lookahead, Production>>,
}

impl ParseTable {
    pub fn get(&self, nonterminal: &str, lookahead: &Lookahead) -> Option<&Production> {
        self.cells.get(nonterminal).and_then(|row| row.get(lookahead))
    }

    // Lookaheads with an entry for this nonterminal, sorted
    pub fn expected(&self, nonterminal: &str) -> Vec<&Lookahead> {
        self.cells.get(nonterminal)
            .map(|row| row.keys().sorted().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every cell, sorted by nonterminal then lookahead
    pub fn entries(&self) -> Vec<(&str, &Lookahead, &Production)> {
        self.cells.iter()
            .flat_map(|(nonterminal, row)| row.iter().map(move |(l, p)| (nonterminal.as_str(), l, p)))
            .sorted_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)))
            .collect()
    }

    fn insert(&mut self, lookahead: Lookahead, production: &Production) -> Result<(), GrammarConflict> {
        let row = self.cells.entry(production.lhs.clone()).or_default();
        if let Some(existing) = row.get(&lookahead) {
            if existing != production {
                return Err(GrammarConflict {
                    nonterminal: production.lhs.clone(),
                    lookahead,
                    existing: existing.clone(),
                    incoming: production.clone(),
                });
            }
            return Ok(());
        }

        trace!("table[{}, {}] = {}", production.lhs, lookahead, production);
        row.insert(lookahead, production.clone());
        Ok(())
    }
}

impl Display for ParseTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (nonterminal, lookahead, production) in self.entries() {
            writeln!(f, "[{}, {}] {}", nonterminal, lookahead, production)?;
        }
        Ok(())
    }
}

pub fn build(grammar: &Grammar, first: &FirstSets, follow: &FollowSets) -> Result<ParseTable, GrammarConflict> {
    let mut table = ParseTable { cells: HashMap::with_capacity(grammar.nonterminals().len()) };

    for production in grammar.all_productions() {
        let starts = first_of_sequence(first, &production.symbols);

        for lookahead in starts.iter().filter(|l| **l != Lookahead::Epsilon) {
            table.insert(lookahead.clone(), production)?;
        }

        if starts.contains(&Lookahead::Epsilon) {
            for lookahead in follow.get(&production.lhs).into_iter().flatten() {
                table.insert(lookahead.clone(), production)?;
            }
        }
    }

    info!("Built parse table with {} entries", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_for(grammar: &Grammar) -> Result<ParseTable, GrammarConflict> {
        let first = compute_first(grammar);
        let follow = compute_follow(grammar, &first, grammar.start_symbol());
        build(grammar, &first, &follow)
    }

    fn expression_grammar() -> Grammar {
        Grammar::from_names("E", vec![
            ("E", vec![vec!["T", "E'"]]),
            ("E'", vec![vec!["+", "T", "E'"], vec!["ε"]]),
            ("T", vec![vec!["F", "T'"]]),
            ("T'", vec![vec!["*", "F", "T'"], vec!["ε"]]),
            ("F", vec![vec!["(", "E", ")"], vec!["id"]]),
        ]).unwrap()
    }

    #[test]
    fn builds_expression_table() {
        let grammar = expression_grammar();
        let table = table_for(&grammar).unwrap();

        let alternative = |nonterminal: &str, lookahead: Lookahead| {
            table.get(nonterminal, &lookahead).map(|p| p.index)
        };

        assert_eq!(alternative("E", Lookahead::terminal("id")), Some(0));
        assert_eq!(alternative("E", Lookahead::terminal("(")), Some(0));
        assert_eq!(alternative("E", Lookahead::terminal("+")), None);
        assert_eq!(alternative("E'", Lookahead::terminal("+")), Some(0));
        assert_eq!(alternative("E'", Lookahead::terminal(")")), Some(1));
        assert_eq!(alternative("E'", Lookahead::End), Some(1));
        assert_eq!(alternative("T'", Lookahead::terminal("*")), Some(0));
        assert_eq!(alternative("T'", Lookahead::terminal("+")), Some(1));
        assert_eq!(alternative("F", Lookahead::terminal("(")), Some(0));
        assert_eq!(alternative("F", Lookahead::terminal("id")), Some(1));
        assert_eq!(table.len(), 13);
    }

    #[test]
    fn every_filled_cell_matches_its_row() {
        let grammar = expression_grammar();
        let table = table_for(&grammar).unwrap();

        for (nonterminal, _, production) in table.entries() {
            assert_eq!(production.lhs, nonterminal);
        }
        assert_eq!(
            table.expected("E'"),
            vec![&Lookahead::End, &Lookahead::terminal(")"), &Lookahead::terminal("+")]
        );
    }

    #[test]
    fn reports_shared_first_terminal() {
        let grammar = Grammar::from_names("A", vec![
            ("A", vec![vec!["t", "x"], vec!["t", "y"]]),
        ]).unwrap();

        let conflict = table_for(&grammar).unwrap_err();
        assert_eq!(conflict.nonterminal, "A");
        assert_eq!(conflict.lookahead, Lookahead::terminal("t"));
        assert_eq!(conflict.existing.index, 0);
        assert_eq!(conflict.incoming.index, 1);
    }

    #[test]
    fn reports_left_recursion() {
        let grammar = Grammar::from_names("E", vec![
            ("E", vec![vec!["E", "+", "id"], vec!["id"]]),
        ]).unwrap();

        let conflict = table_for(&grammar).unwrap_err();
        assert_eq!(conflict.nonterminal, "E");
        assert_eq!(conflict.lookahead, Lookahead::terminal("id"));
    }

    #[test]
    fn reports_first_follow_overlap() {
        // A can vanish and is followed by `a`, which it can also start with
        let grammar = Grammar::from_names("S", vec![
            ("S", vec![vec!["A", "a"]]),
            ("A", vec![vec!["a"], vec![]]),
        ]).unwrap();

        let conflict = table_for(&grammar).unwrap_err();
        assert_eq!(conflict.nonterminal, "A");
        assert_eq!(conflict.lookahead, Lookahead::terminal("a"));
    }

    #[test]
    fn renders_sorted_cells() {
        let grammar = Grammar::from_names("S", vec![
            ("S", vec![vec!["b"], vec!["a", "S"]]),
        ]).unwrap();
        let table = table_for(&grammar).unwrap();

        assert_eq!(table.to_string(), "[S, a] S = \"a\" S\n[S, b] S = \"b\"\n");
    }
}
