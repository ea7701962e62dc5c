/*
    This module loads grammar descriptions from BNF files
*/

mod lexer;
mod verifier;

use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::info;
use thiserror::Error;

use crate::grammar::*;
use crate::error_handling::*;
use lexer::*;
use verifier::verify_rules;

#[derive(Debug, Error)]
pub enum CompileErrorType {
    // A line which should contain a rule does not
    #[error("Expected `=` after nonterminal")]
    MissingEquals,
    // A rule has multiple equals signs
    #[error("Unexpected `=` encountered")]
    UnexpectedEquals,
    // The user starts a rule line with something other than a nonterminal
    #[error("Tried to define something other than a nonterminal")]
    MissingNonterminal,
    // There is an unclosed quote
    #[error("Unmatched quotes")]
    UnmatchedQuote,
    // An undefined token was used
    #[error("Could not find definition for `{0}`")]
    UndefinedNonterminal(String),
    // A nonterminal has more than one rule line
    #[error("`{0}` is already defined")]
    DuplicateRule(String),
    // Somehow a full rewrite was parsed as a base alternative
    // This is a problem with llfront, not the grammar
    #[error("Rewrite was not fully split (this is a problem with llfront, not the grammar)")]
    UnsplitRewrite,
    // A blank line got too deep into the parser
    // This is a problem with llfront, not the grammar
    #[error("Blank line encountered in rule parser (this is a problem with llfront, not the grammar)")]
    UnexpectedBlankLine,
    // The rules are fine but do not form a usable grammar
    #[error("{0}")]
    Grammar(GrammarError),
    // There was an issue with reading a file
    #[error("File error: {0}")]
    FileError(std::io::Error),
}

impl ErrorType for CompileErrorType {}

impl PartialEq for CompileErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CompileErrorType::FileError(a), CompileErrorType::FileError(b)) => a.kind() == b.kind(),
            (CompileErrorType::UndefinedNonterminal(a), CompileErrorType::UndefinedNonterminal(b)) => a == b,
            (CompileErrorType::DuplicateRule(a), CompileErrorType::DuplicateRule(b)) => a == b,
            (CompileErrorType::Grammar(a), CompileErrorType::Grammar(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

pub type CompileError = Error<CompileErrorType>;
pub type CompileErrors = Errors<CompileErrorType>;

fn file_error(error: CompileErrorType, file: &Path) -> CompileError {
    CompileError::new(error, Location::in_file(file.to_path_buf(), 0))
}

pub type Result<T> = std::result::Result<T, CompileErrorType>;
pub type LineResult<T> = std::result::Result<T, CompileError>;
pub type FileResult<T> = std::result::Result<T, CompileErrors>;

#[derive(PartialEq, Debug)]
pub(crate) struct Rule {
    symbol: String,
    rewrite: Rewrite,
    location: Location
}

fn parse_alternative(tokens: &[Token]) -> Result<Alternative> {
    tokens.iter().map(|t| match t {
        Token::Equals => Err(CompileErrorType::UnexpectedEquals),
        Token::Or => Err(CompileErrorType::UnsplitRewrite),
        Token::Epsilon => Ok(Symbol::Epsilon),
        Token::Nonterminal(s) => Ok(Symbol::Nonterminal(s.clone())),
        Token::Terminal(s) => Ok(Symbol::Terminal(s.clone()))
    }).collect()
}

fn parse_rewrite(tokens: &[Token]) -> Result<Rewrite> {
    tokens.split(|t| *t == Token::Or).map(parse_alternative).collect()
}

fn parse_line(tokens: &[Token], location: Location) -> Result<Rule> {
    let symbol = match tokens.first() {
        Some(Token::Nonterminal(s)) => Ok(s.clone()),
        Some(_) => Err(CompileErrorType::MissingNonterminal),
        None => Err(CompileErrorType::UnexpectedBlankLine)
    }?;

    if tokens.get(1) != Some(&Token::Equals) {
        return Err(CompileErrorType::MissingEquals)
    }

    let rewrite = parse_rewrite(&tokens[2..])?;

    return Ok(Rule {
        symbol,
        rewrite,
        location
    });
}

fn parse_lex_line(line: &str, location: Location) -> LineResult<Rule> {
    lexer::lex_line(line)
        .and_then(|lexed_line| parse_line(&lexed_line, location.clone()))
        .map_err(|error| CompileError { location, error })
}

fn is_rule_line(line: &str) -> bool {
    let line = line.trim_start();
    !line.is_empty() && !line.starts_with(';')
}

fn grammar_from_rules(rules: Vec<Rule>, start: Option<&str>, path: &Path) -> FileResult<Grammar> {
    verify_rules(&rules)?;

    // Without an explicit start symbol the first rule in the file is used
    let start_symbol = start
        .map(str::to_string)
        .or_else(|| rules.first().map(|rule| rule.symbol.clone()))
        .unwrap_or_default();

    let rules = rules.into_iter().map(|rule| (rule.symbol, rule.rewrite)).collect();
    Grammar::from_rules(&start_symbol, rules)
        .map_err(|e| vec![file_error(CompileErrorType::Grammar(e), path)])
}

/// Loads a grammar from BNF text. `path` only labels error locations.
/// Every malformed line is reported, not just the first.
pub fn parse_str(text: &str, path: &Path, start: Option<&str>) -> FileResult<Grammar> {
    let (rules, errors): (Vec<_>, Vec<_>) = text.lines()
        .enumerate()
        .filter(|(_, line)| is_rule_line(line))
        .map(|(num, line)| parse_lex_line(line, Location::in_file(path.to_path_buf(), num + 1)))
        .partition_result();

    if !errors.is_empty() {
        return Err(errors);
    }

    let grammar = grammar_from_rules(rules, start, path)?;
    info!(
        "Loaded {} rules from {} (start symbol `{}`)",
        grammar.nonterminals().len(),
        path.display(),
        grammar.start_symbol()
    );
    Ok(grammar)
}

pub fn parse_file(path: &PathBuf, start: Option<&str>) -> FileResult<Grammar> {
    let text = fs::read_to_string(path)
        .map_err(|e| vec![file_error(CompileErrorType::FileError(e), path)])?;

    parse_str(&text, path, start)
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;

    impl Location {
        pub fn new() -> Self {
            Location::in_file(PathBuf::new(), 0)
        }
    }

    fn s_nonterminal(text: &str) -> Symbol {
        Symbol::Nonterminal(text.to_string())
    }

    fn s_terminal(text: &str) -> Symbol {
        Symbol::Terminal(text.to_string())
    }

    #[test]
    fn parse_normal_alternative() {
        let lines = vec![
            vec![
                Token::Terminal("FUNC".to_string()),
                Token::Nonterminal("ReturnType".to_string()),
                Token::Terminal("ID".to_string()),
                Token::Nonterminal("Block".to_string())
            ],
            vec![
                Token::Epsilon
            ]
        ];
        let answers = vec![
            vec![
                s_terminal("FUNC"),
                s_nonterminal("ReturnType"),
                s_terminal("ID"),
                s_nonterminal("Block")
            ],
            vec![
                Symbol::Epsilon
            ]
        ];

        for (line, answer) in zip(lines, answers) {
            assert_eq!(parse_alternative(&line[..]).unwrap(), answer);
        }
    }

    #[test]
    fn parse_malformed_alternative() {
        assert_eq!(parse_alternative(&[Token::Equals]), Err(CompileErrorType::UnexpectedEquals));
        assert_eq!(parse_alternative(&[Token::Or]), Err(CompileErrorType::UnsplitRewrite));
    }

    #[test]
    fn parse_normal_line() {
        let text = "ReturnValue = Expression | \"\"";
        let lexed = lexer::lex_line(text).unwrap();
        let location = Location::new();

        let answer = Rule {
            symbol: "ReturnValue".to_string(),
            rewrite: vec![
                vec![s_nonterminal("Expression")],
                vec![Symbol::Epsilon]
            ],
            location: location.clone()
        };

        assert_eq!(parse_line(&lexed[..], location), Ok(answer));
    }

    #[test]
    fn parse_malformed_line() {
        // Blank
        assert_eq!(parse_line(&[], Location::new()), Err(CompileErrorType::UnexpectedBlankLine));

        // Missing equals
        assert_eq!(parse_line(
            &lexer::lex_line("Term Factor TermTail").unwrap()[..],
            Location::new()
        ), Err(CompileErrorType::MissingEquals));

        // Improper definition
        assert_eq!(parse_line(
            &lexer::lex_line("\"ID\" = Variable").unwrap()[..],
            Location::new()
        ), Err(CompileErrorType::MissingNonterminal));
        assert_eq!(parse_line(
            &lexer::lex_line("| = Term").unwrap()[..],
            Location::new()
        ), Err(CompileErrorType::MissingNonterminal));
        assert_eq!(parse_line(
            &lexer::lex_line("= Term").unwrap()[..],
            Location::new()
        ), Err(CompileErrorType::MissingNonterminal));
    }

    #[test]
    fn parse_normal_file() {
        let example_path = PathBuf::from("example_data/expression.bnf");
        let example_parsed = parse_file(&example_path, None).unwrap();

        let expected = Grammar::from_rules("Expr", vec![
            ("Expr".to_string(), vec![vec![s_nonterminal("Term"), s_nonterminal("ExprTail")]]),
            ("ExprTail".to_string(), vec![
                vec![s_terminal("PLUS"), s_nonterminal("Term"), s_nonterminal("ExprTail")],
                vec![Symbol::Epsilon]
            ]),
            ("Term".to_string(), vec![
                vec![s_terminal("ID")],
                vec![s_terminal("LPAREN"), s_nonterminal("Expr"), s_terminal("RPAREN")]
            ]),
        ]).unwrap();

        assert_eq!(example_parsed, expected);
    }

    #[test]
    fn explicit_start_symbol() {
        let example_path = PathBuf::from("example_data/expression.bnf");

        assert_eq!(parse_file(&example_path, Some("Term")).unwrap().start_symbol(), "Term");
        assert_eq!(parse_file(&example_path, Some("Nope")).unwrap_err(), vec![CompileError {
            location: Location::in_file(example_path.clone(), 0),
            error: CompileErrorType::Grammar(GrammarError::UndefinedStart("Nope".to_string()))
        }]);
    }

    #[test]
    fn parse_malformed_file() {
        let example_path = PathBuf::from("example_data/malformed.bnf");
        let example_parsed = parse_file(&example_path, None).unwrap_err();

        assert_eq!(example_parsed, vec![
            CompileError {
                location: Location::in_file(example_path.clone(), 3),
                error: CompileErrorType::MissingNonterminal
            },
            CompileError {
                location: Location::in_file(example_path, 6),
                error: CompileErrorType::UnexpectedEquals
            }
        ]);
    }

    #[test]
    fn reports_undefined_and_duplicate_rules() {
        let path = PathBuf::from("inline.bnf");
        let text = "S = A \"x\"\nB = \"b\"\nB = \"c\"\n";
        let errors = parse_str(text, &path, None).unwrap_err();

        assert_eq!(errors, vec![
            CompileError {
                location: Location::in_file(path.clone(), 1),
                error: CompileErrorType::UndefinedNonterminal("A".to_string())
            },
            CompileError {
                location: Location::in_file(path, 3),
                error: CompileErrorType::DuplicateRule("B".to_string())
            }
        ]);
    }

    #[test]
    fn missing_file() {
        let path = PathBuf::from("example_data/missing.bnf");
        let errors = parse_file(&path, None).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].error, CompileErrorType::FileError(_)));
    }
}
