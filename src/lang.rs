/*
    This module bundles the toy language: its grammar, and the token kinds
    and node names the scope analyzer recognises
*/

use std::path::Path;

use crate::grammar::Grammar;
use crate::loader::{self, FileResult};

pub const GRAMMAR_SOURCE: &str = include_str!("../grammars/lang.bnf");
pub const START_SYMBOL: &str = "Program";

pub fn grammar() -> FileResult<Grammar> {
    loader::parse_str(GRAMMAR_SOURCE, Path::new("grammars/lang.bnf"), Some(START_SYMBOL))
}

pub mod kind {
    pub const INT: &str = "INT";
    pub const FLOAT: &str = "FLOAT";
    pub const CHAR: &str = "CHAR";
    pub const VOID: &str = "VOID";
    pub const ARRAY: &str = "ARRAY";
    pub const ID: &str = "ID";
    pub const INT_LITERAL: &str = "INT_LITERAL";
    pub const FLOAT_LITERAL: &str = "FLOAT_LITERAL";
    pub const CHAR_LITERAL: &str = "CHAR_LITERAL";
}

pub mod node {
    pub const DECLARATION: &str = "Declaration";
    pub const TYPE_SPEC: &str = "TypeSpec";
    pub const INITIALIZER: &str = "Initializer";
    pub const FUNCTION_DEFINITION: &str = "FunctionDefinition";
    pub const RETURN_TYPE: &str = "ReturnType";
    pub const MAIN_DEFINITION: &str = "MainDefinition";
    pub const BLOCK: &str = "Block";
    pub const ASSIGNMENT: &str = "Assignment";
    pub const RETURN: &str = "Return";
    pub const RETURN_VALUE: &str = "ReturnValue";
    pub const CALL: &str = "Call";
    pub const INDEX_SUFFIX: &str = "IndexSuffix";
    pub const EXPRESSION: &str = "Expression";
    pub const TERM: &str = "Term";
    pub const VARIABLE: &str = "Variable";
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::parser;

    #[test]
    fn bundled_grammar_is_ll1() {
        let (grammar, table) = table();

        assert_eq!(grammar.start_symbol(), START_SYMBOL);
        assert!(grammar.is_nonterminal(node::DECLARATION));
        assert!(!table.is_empty());
    }

    #[test]
    fn parses_a_program() {
        let source = "INT a -> 10 ;\nARRAY [ 3 ] FLOAT xs ;\nFUNC VOID f ( ) {\n  xs [ 0 ] -> 1.5 * ( 2.0 + 3.0 ) ;\n}\nMAIN ( ) {\n  CALL f ( ) ;\n  RETURN a ;\n}";
        let tokens = lex(source);
        let tree = parse(source);

        let leaves: Vec<_> = tree.leaves().into_iter().cloned().collect();
        assert_eq!(leaves, tokens);
        assert_eq!(tokens[14].lexeme, "f");
        assert_eq!((tokens[14].line, tokens[14].column), (3, 11));
    }

    #[test]
    fn rejects_missing_semicolon() {
        let (grammar, table) = table();
        let tokens = lex("INT a -> 10\nMAIN ( ) { RETURN 0 ; }");

        let error = parser::parse(&tokens, &table, &grammar).unwrap_err();
        assert_eq!((error.line(), error.column()), (2, 1));
    }
}
