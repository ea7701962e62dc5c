/*
    This module checks scopes and types over a parsed program
*/

mod scope;
mod types;

pub use scope::*;
pub use types::*;

use log::{debug, info};
use thiserror::Error;

use crate::error_handling::*;
use crate::lang::{kind, node};
use crate::parser::{NodeId, SyntaxTree};
use crate::token::Token;

#[derive(Debug, PartialEq, Error)]
pub enum SemanticErrorType {
    #[error("Variable `{0}` is not declared")]
    VariableNotDeclared(String),
    #[error("`{0}` is already declared in this scope")]
    VariableAlreadyDeclared(String),
    #[error("Function `{0}` is not declared")]
    FunctionNotDeclared(String),
    #[error("`{0}` is not an array")]
    NotAnArray(String),
    #[error("Array index must be INT, found {actual}")]
    ArrayIndexType { actual: Type },
    #[error("Cannot store {actual} in an array of {expected}")]
    ArrayAssignType { actual: Type, expected: Type },
    #[error("Program has no main function")]
    MissingMain,
    #[error("Main is already defined")]
    MainAlreadyDefined,
    #[error("Function `{0}` is defined after main")]
    FunctionAfterMain(String),
    #[error("Return outside of a function")]
    ReturnOutsideFunction,
    #[error("Cannot assign {actual} to a variable of type {expected}")]
    TypeMismatchAssign { actual: Type, expected: Type },
    #[error("Operands have different types: {left} and {right}")]
    ExpressionTypeMismatch { left: Type, right: Type },
    #[error("Returning {actual} from a function returning {expected}")]
    ReturnTypeMismatch { actual: Type, expected: Type },
    // Declarations are only allowed at the top level
    #[error("Variable `{0}` is declared inside a function")]
    LocalDeclaration(String),
    #[error("Array size `{0}` is not a non-negative integer")]
    InvalidArraySize(String),
    // The tree does not have the shape the toy language grammar gives it
    #[error("Unexpected tree shape: {0}")]
    MalformedTree(String),
}

impl ErrorType for SemanticErrorType {}

pub type SemanticError = Error<SemanticErrorType>;
pub type SemanticResult<T> = Result<T, SemanticError>;

// What the analyzer does with a node, decided by its nonterminal
#[derive(Debug, Clone, Copy)]
enum NodeTag<'t> {
    Declaration,
    FunctionDefinition,
    MainDefinition,
    Assignment,
    Return,
    Call,
    // An operand followed by a chain of operator tails
    BinaryExpression,
    Variable,
    Composite,
    Leaf(&'t Token),
}

/// The part of the walk that depends on where we are: `Some` return type
/// means we are inside a function body.
#[derive(Debug, Clone, Default)]
struct AnalysisContext {
    return_type: Option<Type>,
}

impl AnalysisContext {
    fn inside_function(&self) -> bool {
        self.return_type.is_some()
    }
}

struct Analyzer<'t> {
    tree: &'t SyntaxTree,
    symbols: SymbolTable,
    scopes: Vec<ScopeId>,
    main_declared: bool,
}

/// Checks declarations, name resolution and types over a program tree,
/// stopping at the first violation. On success returns the symbol table
/// built along the way.
pub fn analyze(tree: &SyntaxTree) -> SemanticResult<SymbolTable> {
    let mut analyzer = Analyzer {
        tree,
        symbols: SymbolTable::default(),
        scopes: vec![GLOBAL_SCOPE],
        main_declared: false,
    };

    analyzer.visit(tree.root(), &AnalysisContext::default())?;

    if !analyzer.main_declared {
        return Err(SemanticError::new(SemanticErrorType::MissingMain, Location::default()));
    }

    info!("Semantic analysis passed with {} symbols", analyzer.symbols.len());
    Ok(analyzer.symbols)
}

impl<'t> Analyzer<'t> {
    fn tag(&self, id: NodeId) -> NodeTag<'t> {
        let tree = self.tree;
        if let Some(token) = tree.token(id) {
            return NodeTag::Leaf(token);
        }

        match tree.nonterminal(id).unwrap_or_default() {
            node::DECLARATION => NodeTag::Declaration,
            node::FUNCTION_DEFINITION => NodeTag::FunctionDefinition,
            node::MAIN_DEFINITION => NodeTag::MainDefinition,
            node::ASSIGNMENT => NodeTag::Assignment,
            node::RETURN => NodeTag::Return,
            node::CALL => NodeTag::Call,
            node::EXPRESSION | node::TERM => NodeTag::BinaryExpression,
            node::VARIABLE => NodeTag::Variable,
            _ => NodeTag::Composite,
        }
    }

    fn error(&self, error: SemanticErrorType, at: NodeId) -> SemanticError {
        let location = self.tree.first_token(at).map(Token::location).unwrap_or_default();
        SemanticError::new(error, location)
    }

    fn malformed(&self, at: NodeId, what: &str) -> SemanticError {
        let name = self.tree.nonterminal(at).unwrap_or("leaf");
        self.error(SemanticErrorType::MalformedTree(format!("`{}` has no {}", name, what)), at)
    }

    fn child_node(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.tree.children(id).iter().copied().find(|&child| self.tree.nonterminal(child) == Some(name))
    }

    fn child_leaf(&self, id: NodeId, token_kind: &str) -> Option<(NodeId, &'t Token)> {
        let tree = self.tree;
        tree.children(id).iter()
            .filter_map(|&child| tree.token(child).map(|token| (child, token)))
            .find(|(_, token)| token.kind == token_kind)
    }

    fn expect_node(&self, id: NodeId, name: &str) -> SemanticResult<NodeId> {
        self.child_node(id, name).ok_or_else(|| self.malformed(id, name))
    }

    fn expect_leaf(&self, id: NodeId, token_kind: &str) -> SemanticResult<(NodeId, &'t Token)> {
        self.child_leaf(id, token_kind).ok_or_else(|| self.malformed(id, token_kind))
    }

    fn current_scope(&self) -> ScopeId {
        self.scopes.last().copied().unwrap_or(GLOBAL_SCOPE)
    }

    fn resolve(&self, name: &Token, at: NodeId) -> SemanticResult<&SymbolEntry> {
        self.symbols.resolve(self.current_scope(), &name.lexeme)
            .ok_or_else(|| self.error(SemanticErrorType::VariableNotDeclared(name.lexeme.clone()), at))
    }

    fn declare(&mut self, name: &Token, ty: Type, at: NodeId) -> SemanticResult<()> {
        let scope = self.current_scope();
        let entry = SymbolEntry {
            name: name.lexeme.clone(),
            ty,
            scope,
            line: name.line,
            column: name.column,
        };
        let duplicate = self.symbols.declare(entry).is_err();
        if duplicate {
            return Err(self.error(SemanticErrorType::VariableAlreadyDeclared(name.lexeme.clone()), at));
        }
        Ok(())
    }

    // Runs `body` in a fresh child of the current scope
    fn in_scope(&mut self, body: NodeId, context: &AnalysisContext) -> SemanticResult<()> {
        let scope = self.symbols.open_scope(self.current_scope());
        self.scopes.push(scope);
        let result = self.visit(body, context);
        self.scopes.pop();
        debug!("Closed scope {}", scope);
        result
    }

    // Composites are expanded on a work stack: list chains nest one level
    // per element
    fn visit(&mut self, id: NodeId, context: &AnalysisContext) -> SemanticResult<()> {
        let tree = self.tree;
        let mut pending = vec![id];

        while let Some(id) = pending.pop() {
            match self.tag(id) {
                NodeTag::Composite => pending.extend(tree.children(id).iter().rev()),
                _ => self.visit_node(id, context)?,
            }
        }
        Ok(())
    }

    fn visit_node(&mut self, id: NodeId, context: &AnalysisContext) -> SemanticResult<()> {
        match self.tag(id) {
            NodeTag::Declaration => self.declaration(id, context),
            NodeTag::FunctionDefinition => self.function_definition(id),
            NodeTag::MainDefinition => self.main_definition(id),
            NodeTag::Assignment => self.assignment(id),
            NodeTag::Return => self.return_statement(id, context),
            NodeTag::Call => self.call(id).map(|_| ()),
            NodeTag::BinaryExpression | NodeTag::Variable => self.infer(id).map(|_| ()),
            NodeTag::Composite | NodeTag::Leaf(_) => Ok(()),
        }
    }

    fn scalar_type(&self, id: NodeId) -> SemanticResult<Type> {
        let token = self.tree.first_token(id).ok_or_else(|| self.malformed(id, "type"))?;
        match token.kind.as_str() {
            kind::INT => Ok(Type::Int),
            kind::FLOAT => Ok(Type::Float),
            kind::CHAR => Ok(Type::Char),
            kind::VOID => Ok(Type::Void),
            _ => Err(self.malformed(id, "type keyword")),
        }
    }

    // Either a scalar type, or ARRAY [ size ] followed by the element type
    fn declared_type(&self, type_spec: NodeId) -> SemanticResult<Type> {
        if self.child_leaf(type_spec, kind::ARRAY).is_none() {
            return self.scalar_type(type_spec);
        }

        let (size_id, size) = self.expect_leaf(type_spec, kind::INT_LITERAL)?;
        let size = size.lexeme.parse::<usize>()
            .map_err(|_| self.error(SemanticErrorType::InvalidArraySize(size.lexeme.clone()), size_id))?;
        let element = self.scalar_type(*self.tree.children(type_spec).last().unwrap_or(&type_spec))?;
        Ok(Type::array(size, element))
    }

    fn declaration(&mut self, id: NodeId, context: &AnalysisContext) -> SemanticResult<()> {
        let (name_id, name) = self.expect_leaf(id, kind::ID)?;
        if context.inside_function() {
            return Err(self.error(SemanticErrorType::LocalDeclaration(name.lexeme.clone()), id));
        }

        let ty = self.declared_type(self.expect_node(id, node::TYPE_SPEC)?)?;
        if self.symbols.lookup_local(self.current_scope(), &name.lexeme).is_some() {
            return Err(self.error(SemanticErrorType::VariableAlreadyDeclared(name.lexeme.clone()), name_id));
        }

        let initializer = self.expect_node(id, node::INITIALIZER)?;
        if let Some(value) = self.child_node(initializer, node::EXPRESSION) {
            let actual = self.infer_required(value)?;
            if actual != ty {
                return Err(self.error(SemanticErrorType::TypeMismatchAssign { actual, expected: ty }, value));
            }
        }

        self.declare(name, ty, name_id)
    }

    fn function_definition(&mut self, id: NodeId) -> SemanticResult<()> {
        let (name_id, name) = self.expect_leaf(id, kind::ID)?;
        if self.main_declared {
            return Err(self.error(SemanticErrorType::FunctionAfterMain(name.lexeme.clone()), id));
        }

        let returns = self.scalar_type(self.expect_node(id, node::RETURN_TYPE)?)?;
        self.declare(name, Type::function(returns.clone()), name_id)?;

        let body = self.expect_node(id, node::BLOCK)?;
        self.in_scope(body, &AnalysisContext { return_type: Some(returns) })
    }

    fn main_definition(&mut self, id: NodeId) -> SemanticResult<()> {
        if self.main_declared {
            return Err(self.error(SemanticErrorType::MainAlreadyDefined, id));
        }
        self.main_declared = true;

        let body = self.expect_node(id, node::BLOCK)?;
        self.in_scope(body, &AnalysisContext { return_type: Some(Type::Int) })
    }

    // The index expression under an IndexSuffix, if it is not empty
    fn index_expression(&self, id: NodeId) -> Option<NodeId> {
        self.child_node(id, node::INDEX_SUFFIX)
            .and_then(|suffix| self.child_node(suffix, node::EXPRESSION))
    }

    fn check_index(&mut self, index: NodeId) -> SemanticResult<()> {
        let actual = self.infer_required(index)?;
        if actual != Type::Int {
            return Err(self.error(SemanticErrorType::ArrayIndexType { actual }, index));
        }
        Ok(())
    }

    fn assignment(&mut self, id: NodeId) -> SemanticResult<()> {
        let (name_id, name) = self.expect_leaf(id, kind::ID)?;
        let target = self.resolve(name, name_id)?.ty.clone();

        let value = self.expect_node(id, node::EXPRESSION)?;
        let actual = self.infer_required(value)?;

        match self.index_expression(id) {
            Some(index) => {
                self.check_index(index)?;
                let Type::Array { element, .. } = target else {
                    return Err(self.error(SemanticErrorType::NotAnArray(name.lexeme.clone()), name_id));
                };
                if actual != *element {
                    return Err(self.error(SemanticErrorType::ArrayAssignType { actual, expected: *element }, value));
                }
            }
            None => {
                if actual != target {
                    return Err(self.error(SemanticErrorType::TypeMismatchAssign { actual, expected: target }, value));
                }
            }
        }

        Ok(())
    }

    fn return_statement(&mut self, id: NodeId, context: &AnalysisContext) -> SemanticResult<()> {
        let Some(expected) = &context.return_type else {
            return Err(self.error(SemanticErrorType::ReturnOutsideFunction, id));
        };

        let value = self.child_node(id, node::RETURN_VALUE)
            .and_then(|value| self.child_node(value, node::EXPRESSION));
        let actual = match value {
            Some(value) => self.infer_required(value)?,
            None => Type::Void,
        };

        if *expected != Type::Void && actual != *expected {
            return Err(self.error(SemanticErrorType::ReturnTypeMismatch { actual, expected: expected.clone() }, id));
        }
        Ok(())
    }

    // Resolves the called name, which must be a function, to its return type
    fn call(&self, id: NodeId) -> SemanticResult<Type> {
        let (name_id, name) = self.expect_leaf(id, kind::ID)?;
        match self.symbols.resolve(self.current_scope(), &name.lexeme) {
            Some(SymbolEntry { ty: Type::Function { returns }, .. }) => Ok((**returns).clone()),
            _ => Err(self.error(SemanticErrorType::FunctionNotDeclared(name.lexeme.clone()), name_id)),
        }
    }

    fn infer_required(&mut self, id: NodeId) -> SemanticResult<Type> {
        self.infer(id)?.ok_or_else(|| self.malformed(id, "typed operand"))
    }

    // The type of an expression subtree, or None for subtrees that carry no
    // type (punctuation, operators, empty tails)
    fn infer(&mut self, id: NodeId) -> SemanticResult<Option<Type>> {
        match self.tag(id) {
            NodeTag::Leaf(token) => match token.kind.as_str() {
                kind::INT_LITERAL => Ok(Some(Type::Int)),
                kind::FLOAT_LITERAL => Ok(Some(Type::Float)),
                kind::CHAR_LITERAL => Ok(Some(Type::Char)),
                kind::ID => Ok(Some(self.resolve(token, id)?.ty.clone())),
                _ => Ok(None),
            },
            NodeTag::Call => self.call(id).map(Some),
            NodeTag::Variable => {
                let (name_id, name) = self.expect_leaf(id, kind::ID)?;
                let ty = self.resolve(name, name_id)?.ty.clone();
                let Some(index) = self.index_expression(id) else {
                    return Ok(Some(ty));
                };

                self.check_index(index)?;
                match ty {
                    Type::Array { element, .. } => Ok(Some(*element)),
                    _ => Err(self.error(SemanticErrorType::NotAnArray(name.lexeme.clone()), name_id)),
                }
            }
            NodeTag::BinaryExpression => {
                let tree = self.tree;
                let children = tree.children(id);
                let Some(&operand) = children.first() else {
                    return Err(self.malformed(id, "operand"));
                };
                let left = self.infer_required(operand)?;

                // Each tail is operator, operand, next tail; empty when done
                let mut tail = children.get(1).copied();
                while let Some(&[operator, operand, next]) = tail.map(|t| tree.children(t)) {
                    let right = self.infer_required(operand)?;
                    if right != left {
                        return Err(self.error(SemanticErrorType::ExpressionTypeMismatch { left, right }, operator));
                    }
                    tail = Some(next);
                }
                Ok(Some(left))
            }
            NodeTag::Composite => {
                let tree = self.tree;
                for &child in tree.children(id) {
                    if let Some(ty) = self.infer(child)? {
                        return Ok(Some(ty));
                    }
                }
                Ok(None)
            }
            NodeTag::Declaration
            | NodeTag::FunctionDefinition
            | NodeTag::MainDefinition
            | NodeTag::Assignment
            | NodeTag::Return => Err(self.malformed(id, "value")),
        }
    }
}
