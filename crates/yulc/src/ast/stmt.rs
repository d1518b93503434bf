//! Statement AST nodes

use super::{Expression, Identifier, Literal, NodeId, TypedName};
use crate::common::Span;
use crate::names::NameId;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub span: Span,
    pub statements: Vec<Statement>,
}

/// `f(x)` used as a statement
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub span: Span,
    pub expression: Expression,
}

/// `a, b := f()`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub span: Span,
    pub variable_names: Vec<Identifier>,
    pub value: Box<Expression>,
}

/// `let a, b := f()` or `let a`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub span: Span,
    pub variables: Vec<TypedName>,
    pub value: Option<Box<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub span: Span,
    pub name: NameId,
    pub parameters: Vec<TypedName>,
    pub return_variables: Vec<TypedName>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub span: Span,
    pub condition: Box<Expression>,
    pub body: Block,
}

/// One `case` of a switch; `value` is `None` for `default`
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub span: Span,
    pub value: Option<Literal>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub span: Span,
    pub expression: Box<Expression>,
    pub cases: Vec<Case>,
}

/// `for { pre } condition { post } { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub id: NodeId,
    pub span: Span,
    pub pre: Block,
    pub condition: Box<Expression>,
    pub post: Block,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    ExpressionStatement(ExpressionStatement),
    Assignment(Assignment),
    VariableDeclaration(VariableDeclaration),
    FunctionDefinition(FunctionDefinition),
    If(If),
    Switch(Switch),
    ForLoop(ForLoop),
    Break(Span),
    Continue(Span),
    Leave(Span),
    Block(Block),
}
