//! Expression AST nodes

use std::fmt;

use super::{LiteralValue, NodeId};
use crate::common::Span;
use crate::names::{NameId, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Number,
    Boolean,
    String,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LiteralKind::Number => "number",
            LiteralKind::Boolean => "boolean",
            LiteralKind::String => "string",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub id: NodeId,
    pub span: Span,
    pub kind: LiteralKind,
    pub value: LiteralValue,
    pub ty: Type,
}

impl Literal {
    /// Source form of the literal, without quotes
    pub fn format(&self) -> String {
        if let Some(hint) = self.value.hint() {
            return hint.to_string();
        }
        if self.value.is_unlimited() {
            return self.value.builtin_string_literal_value().to_string();
        }
        let value = self.value.value();
        match self.kind {
            LiteralKind::Boolean => (if value.is_zero() { "false" } else { "true" }).to_string(),
            LiteralKind::Number => value.to_string(),
            LiteralKind::String => {
                let bytes = value.to_be_bytes();
                let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            }
        }
    }

    /// Whether the literal respects the size limits of its kind
    pub fn is_valid(&self) -> bool {
        match self.kind {
            LiteralKind::Number => self
                .value
                .hint()
                .is_none_or(|text| super::U256::parse_literal(text).is_some()),
            LiteralKind::Boolean => {
                !self.value.is_unlimited()
                    && (self.value.value().is_zero() || self.value.value() == super::U256::ONE)
            }
            LiteralKind::String => {
                self.value.is_unlimited() || self.value.hint().is_none_or(|text| text.len() <= 32)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub id: NodeId,
    pub span: Span,
    pub name: NameId,
}

/// Declared variable, parameter or return variable with its type
#[derive(Debug, Clone, PartialEq)]
pub struct TypedName {
    pub id: NodeId,
    pub span: Span,
    pub name: NameId,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: NodeId,
    pub span: Span,
    pub function_name: Identifier,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    FunctionCall(FunctionCall),
}

impl Expression {
    pub fn id(&self) -> NodeId {
        match self {
            Expression::Literal(literal) => literal.id,
            Expression::Identifier(identifier) => identifier.id,
            Expression::FunctionCall(call) => call.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(literal) => literal.span,
            Expression::Identifier(identifier) => identifier.span,
            Expression::FunctionCall(call) => call.span,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expression::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}
