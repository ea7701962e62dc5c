use std::collections::HashSet;

use itertools::Itertools;

use crate::grammar::Symbol;
use super::CompileErrorType::{DuplicateRule, UndefinedNonterminal};
use super::{CompileError, CompileErrors, FileResult, Rule};

// Bare names used on a rule line that no rule line defines
fn undefined_references(rules: &[Rule], defined: &HashSet<&str>) -> CompileErrors {
    rules.iter()
        .flat_map(|rule| rule.rewrite.iter()
            .flatten()
            .filter_map(move |symbol| match symbol {
                Symbol::Nonterminal(name) if !defined.contains(name.as_str()) => Some(name),
                _ => None
            })
            .unique()
            .map(move |name| CompileError::new(UndefinedNonterminal(name.clone()), rule.location.clone())))
        .collect()
}

// Every rule line after the first for the same nonterminal
fn duplicate_rules(rules: &[Rule]) -> CompileErrors {
    let mut seen = HashSet::with_capacity(rules.len());

    rules.iter()
        .filter(|&rule| !seen.insert(rule.symbol.as_str()))
        .map(|rule| CompileError::new(DuplicateRule(rule.symbol.clone()), rule.location.clone()))
        .collect()
}

/// Checks the rule lines as a whole, reporting errors in line order
pub fn verify_rules(rules: &[Rule]) -> FileResult<()> {
    let defined: HashSet<&str> = rules.iter().map(|rule| rule.symbol.as_str()).collect();

    let errors: CompileErrors = undefined_references(rules, &defined).into_iter()
        .chain(duplicate_rules(rules))
        .sorted_by_key(|error| error.line())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
