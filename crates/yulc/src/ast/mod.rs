//! Tree representation of a Yul program
//!
//! Nodes reference identifiers and types only through [`NameId`] handles of a
//! [`NameRepository`](crate::names::NameRepository). Blocks, expressions and
//! function definitions carry a [`NodeId`] so later stages can attach
//! information (scopes, inferred types) without owning the tree.

mod builder;
mod expr;
mod literal;
mod stmt;

pub use builder::AstBuilder;
pub use expr::{Expression, FunctionCall, Identifier, Literal, LiteralKind, TypedName};
pub use literal::{value_of_string_literal, LiteralValue, U256};
pub use stmt::{
    Assignment, Block, Case, ExpressionStatement, ForLoop, FunctionDefinition, If, Statement, Switch,
    VariableDeclaration,
};

/// Identity of a node within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);
