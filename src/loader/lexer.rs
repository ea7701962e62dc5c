use itertools::{Itertools, PeekingNext};

use super::{CompileErrorType, Result};

#[derive(PartialEq, Debug)]
pub enum Token {
    Equals,
    Or,
    Epsilon,
    Nonterminal(String),
    Terminal(String)
}

// Reads a quoted token kind. `\"` and `\\` escape the quote and backslash,
// and an empty pair of quotes stands for epsilon.
pub fn lex_terminal(line: &mut impl PeekingNext<Item = char>) -> Result<Token> {
    line.next(); // Consume open quote
    let mut token_text = String::new();

    loop {
        token_text.extend(line.peeking_take_while(|&c| c != '\"' && c != '\\'));
        match line.next() {
            Some('\"') => break,
            Some('\\') => match line.next() {
                Some(escaped) => token_text.push(escaped),
                None => return Err(CompileErrorType::UnmatchedQuote),
            },
            _ => return Err(CompileErrorType::UnmatchedQuote),
        }
    }

    if token_text.is_empty() {
        Ok(Token::Epsilon)
    } else {
        Ok(Token::Terminal(token_text))
    }
}

pub fn lex_nonterminal(line: &mut impl Iterator<Item = char>) -> Result<Token> {
    let name: String = line.take_while(|c| !c.is_whitespace()).collect();
    if name == "ε" {
        Ok(Token::Epsilon)
    } else {
        Ok(Token::Nonterminal(name))
    }
}

pub fn lex_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    let mut line_chars = line.chars().peekable();

    while let Some(&c) = line_chars.peek() {
        if c == ';' {
            // The rest of the line is a comment
            break;
        } else if c == '=' {
            line_chars.next();
            tokens.push(Token::Equals);
        } else if c == ':' && line_chars.clone().take(3).collect::<String>() == "::=" {
            line_chars.nth(2);
            tokens.push(Token::Equals);
        } else if c == '|' {
            line_chars.next();
            tokens.push(Token::Or);
        } else if c == '\"' {
            tokens.push(lex_terminal(&mut line_chars)?);
        } else if !c.is_whitespace() {
            tokens.push(lex_nonterminal(&mut line_chars)?);
        } else {
            line_chars.next();
        }
    }

    return Ok(tokens);
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;

    #[test]
    fn lex_normal_terminal() {
        let lines = vec![
            "\"ARROW\" Expression",
            "\"SEMICOLON\"",
            "\"LPAREN\"\"RPAREN\"",
            "\"say \\\"hi\\\"\"",
            "\"\" rest"
        ];
        // (result from the function, rest of the iterator)
        let answers = vec![
            (Token::Terminal("ARROW".to_string()), " Expression"),
            (Token::Terminal("SEMICOLON".to_string()), ""),
            (Token::Terminal("LPAREN".to_string()), "\"RPAREN\""),
            (Token::Terminal("say \"hi\"".to_string()), ""),
            (Token::Epsilon, " rest")
        ];

        for (line, (answer_token, answer_rest)) in zip(lines, answers) {
            let mut chars = line.chars().peekable();
            assert_eq!(lex_terminal(&mut chars).unwrap(), answer_token);
            assert_eq!(chars.collect::<String>(), answer_rest);
        }
    }

    #[test]
    fn lex_mismatched_terminal() {
        let lines = vec![
            "\"RETURN",
            "\"ID Variable",
            "\"trailing escape\\"
        ];

        for line in lines {
            let mut chars = line.chars().peekable();

            assert_eq!(lex_terminal(&mut chars).unwrap_err(), CompileErrorType::UnmatchedQuote);
        }
    }

    #[test]
    fn lex_normal_nonterminal() {
        let lines = vec![
            "Statement StatementList",
            "Block",
            "ε | Term"
        ];
        // (result from the function, rest of the iterator)
        let answers = vec![
            (Token::Nonterminal("Statement".to_string()), "StatementList"),
            (Token::Nonterminal("Block".to_string()), ""),
            (Token::Epsilon, "| Term")
        ];

        for (line, (answer_token, answer_rest)) in zip(lines, answers) {
            let mut chars = line.chars();
            assert_eq!(lex_nonterminal(&mut chars).unwrap(), answer_token);
            assert_eq!(chars.collect::<String>(), answer_rest);
        }
    }

    #[test]
    fn lex_normal_line() {
        let lines = vec![
            "Initializer = \"ARROW\" Expression | \"\"",
            "AddOp ::= \"PLUS\" | \"MINUS\" ; binary operators",
            "; a whole comment line"
        ];
        let answers = vec![
            vec![
                Token::Nonterminal("Initializer".to_string()),
                Token::Equals,
                Token::Terminal("ARROW".to_string()),
                Token::Nonterminal("Expression".to_string()),
                Token::Or,
                Token::Epsilon
            ],
            vec![
                Token::Nonterminal("AddOp".to_string()),
                Token::Equals,
                Token::Terminal("PLUS".to_string()),
                Token::Or,
                Token::Terminal("MINUS".to_string())
            ],
            vec![]
        ];

        for (line, answer) in zip(lines, answers) {
            assert_eq!(lex_line(line).unwrap(), answer)
        }
    }
}
