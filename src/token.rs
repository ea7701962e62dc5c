/*
    Tokens as delivered by the external tokenizer, and a reader for
    tab-separated token dumps
*/

use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use itertools::Itertools;
use thiserror::Error;

use crate::error_handling::*;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: String,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: &str, lexeme: &str, line: usize, column: usize) -> Self {
        Token {
            kind: kind.to_string(),
            lexeme: lexeme.to_string(),
            line,
            column,
        }
    }

    pub fn location(&self) -> Location {
        Location::at(self.line, self.column)
    }
}

#[derive(Debug, Error)]
pub enum TokenFileErrorType {
    // A record does not have exactly four tab-separated fields
    #[error("Expected `kind<TAB>lexeme<TAB>line<TAB>column`, found {0} field(s)")]
    MalformedRecord(usize),
    // The line or column field is not a number
    #[error("Invalid position `{0}`")]
    BadPosition(String),
    #[error("File error: {0}")]
    FileError(std::io::Error),
}

impl ErrorType for TokenFileErrorType {}

impl PartialEq for TokenFileErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TokenFileErrorType::FileError(a), TokenFileErrorType::FileError(b)) => a.kind() == b.kind(),
            (TokenFileErrorType::MalformedRecord(a), TokenFileErrorType::MalformedRecord(b)) => a == b,
            (TokenFileErrorType::BadPosition(a), TokenFileErrorType::BadPosition(b)) => a == b,
            _ => false,
        }
    }
}

pub type TokenFileError = Error<TokenFileErrorType>;

fn parse_position(field: &str) -> Result<usize, TokenFileErrorType> {
    field.trim().parse().map_err(|_| TokenFileErrorType::BadPosition(field.to_string()))
}

fn parse_record(record: &str) -> Result<Token, TokenFileErrorType> {
    match record.split('\t').collect_vec().as_slice() {
        [kind, lexeme, line, column] => Ok(Token::new(kind, lexeme, parse_position(line)?, parse_position(column)?)),
        fields => Err(TokenFileErrorType::MalformedRecord(fields.len())),
    }
}

/// Reads one token per non-empty line. Every bad record is reported.
pub fn read_tokens(path: &Path) -> Result<Vec<Token>, Errors<TokenFileErrorType>> {
    let file_error = |e: std::io::Error| vec![TokenFileError::new(
        TokenFileErrorType::FileError(e),
        Location::in_file(path.to_path_buf(), 0)
    )];

    let file = File::open(path).map_err(file_error)?;
    let lines: Vec<String> = std::io::BufReader::new(file)
        .lines()
        .collect::<Result<_, _>>()
        .map_err(file_error)?;

    let (tokens, errors): (Vec<_>, Vec<_>) = lines.iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(num, line)| parse_record(line).map_err(|error| TokenFileError::new(
            error,
            Location::in_file(path.to_path_buf(), num + 1)
        )))
        .partition_result();

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn parse_normal_record() {
        assert_eq!(
            parse_record("INT_LITERAL\t10\t1\t10"),
            Ok(Token::new("INT_LITERAL", "10", 1, 10))
        );
        assert_eq!(
            parse_record("CHAR_LITERAL\t' '\t4\t2"),
            Ok(Token::new("CHAR_LITERAL", "' '", 4, 2))
        );
    }

    #[test]
    fn parse_malformed_record() {
        assert_eq!(parse_record("ID a 1 1"), Err(TokenFileErrorType::MalformedRecord(1)));
        assert_eq!(parse_record("ID\ta\tone\t1"), Err(TokenFileErrorType::BadPosition("one".to_string())));
    }

    #[test]
    fn read_token_file() {
        let tokens = read_tokens(&PathBuf::from("example_data/declare_and_main.tokens")).unwrap();

        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[0], Token::new("INT", "INT", 1, 1));
        assert_eq!(tokens[12], Token::new("RBRACE", "}", 4, 1));
    }

    #[test]
    fn read_missing_token_file() {
        let path = PathBuf::from("example_data/does_not_exist.tokens");
        let errors = read_tokens(&path).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].error, TokenFileErrorType::FileError(_)));
    }
}
