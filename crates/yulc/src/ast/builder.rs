//! Programmatic construction of trees
//!
//! Stands in for a parser: names are interned through the repository,
//! literals receive the dialect's default or bool type, every node gets a
//! fresh [`NodeId`], and string arguments at literal positions of builtins
//! are turned into unlimited literals.

use super::{
    Assignment, Block, Case, Expression, ExpressionStatement, ForLoop, FunctionCall, FunctionDefinition,
    Identifier, If, Literal, LiteralKind, LiteralValue, NodeId, Statement, Switch, TypedName,
    VariableDeclaration,
};
use crate::common::Span;
use crate::names::{NameId, NameRepository, Type};

pub struct AstBuilder<'a> {
    names: &'a mut NameRepository,
    next_id: u32,
    span: Span,
}

impl<'a> AstBuilder<'a> {
    pub fn new(names: &'a mut NameRepository) -> Self {
        Self {
            names,
            next_id: 0,
            span: Span::default(),
        }
    }

    /// Span attached to all nodes built from now on
    pub fn at(&mut self, span: impl Into<Span>) -> &mut Self {
        self.span = span.into();
        self
    }

    pub fn names(&mut self) -> &mut NameRepository {
        self.names
    }

    fn node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn name(&mut self, label: &str) -> NameId {
        self.names.define_name(label)
    }

    /// Type handle for `label`; empty means the default type. Labels that are
    /// not types of the dialect are interned as plain names.
    pub fn type_name(&mut self, label: &str) -> Type {
        if label.is_empty() {
            return self.names.predefined().default_type;
        }
        let ty = self.names.name_of_type(label);
        if ty.is_empty() { self.names.define_name(label) } else { ty }
    }

    pub fn identifier(&mut self, label: &str) -> Identifier {
        let name = self.name(label);
        Identifier {
            id: self.node_id(),
            span: self.span,
            name,
        }
    }

    pub fn ident(&mut self, label: &str) -> Expression {
        Expression::Identifier(self.identifier(label))
    }

    pub fn literal(&mut self, kind: LiteralKind, value: LiteralValue, ty: Type) -> Literal {
        Literal {
            id: self.node_id(),
            span: self.span,
            kind,
            value,
            ty,
        }
    }

    pub fn number_literal(&mut self, text: &str) -> Literal {
        let ty = self.names.predefined().default_type;
        self.literal(LiteralKind::Number, LiteralValue::number(text), ty)
    }

    pub fn number(&mut self, text: &str) -> Expression {
        Expression::Literal(self.number_literal(text))
    }

    /// Number literal with an explicit type, as in `1:u32`
    pub fn typed_number(&mut self, text: &str, ty: &str) -> Expression {
        let ty = self.type_name(ty);
        Expression::Literal(self.literal(LiteralKind::Number, LiteralValue::number(text), ty))
    }

    pub fn boolean(&mut self, value: bool) -> Expression {
        let ty = self.names.predefined().bool_type;
        Expression::Literal(self.literal(LiteralKind::Boolean, LiteralValue::boolean(value), ty))
    }

    /// Boolean literal with an explicit type, as in `true:u256`
    pub fn typed_boolean(&mut self, value: bool, ty: &str) -> Expression {
        let ty = self.type_name(ty);
        Expression::Literal(self.literal(LiteralKind::Boolean, LiteralValue::boolean(value), ty))
    }

    pub fn string_literal(&mut self, text: &str) -> Literal {
        let ty = self.names.predefined().default_type;
        self.literal(LiteralKind::String, LiteralValue::string(text), ty)
    }

    pub fn string(&mut self, text: &str) -> Expression {
        Expression::Literal(self.string_literal(text))
    }

    pub fn call(&mut self, function: &str, arguments: Vec<Expression>) -> Expression {
        let function_name = self.identifier(function);
        let literal_kinds: Vec<Option<LiteralKind>> = match self.names.builtin(function_name.name) {
            Some(builtin) => (0..arguments.len())
                .map(|index| builtin.data.literal_argument(index))
                .collect(),
            None => Vec::new(),
        };
        let arguments = arguments
            .into_iter()
            .enumerate()
            .map(|(index, argument)| match argument {
                Expression::Literal(mut literal)
                    if literal.kind == LiteralKind::String
                        && literal_kinds.get(index).copied().flatten().is_some() =>
                {
                    literal.value = literal.value.into_unlimited();
                    Expression::Literal(literal)
                }
                other => other,
            })
            .collect();

        Expression::FunctionCall(FunctionCall {
            id: self.node_id(),
            span: self.span,
            function_name,
            arguments,
        })
    }

    fn typed_name(&mut self, label: &str, ty: &str) -> TypedName {
        TypedName {
            id: self.node_id(),
            span: self.span,
            name: self.name(label),
            ty: self.type_name(ty),
        }
    }

    pub fn expr_stmt(&mut self, expression: Expression) -> Statement {
        Statement::ExpressionStatement(ExpressionStatement {
            span: self.span,
            expression,
        })
    }

    /// `let name := value` with the default type
    pub fn let_var(&mut self, name: &str, value: Option<Expression>) -> Statement {
        self.let_typed(&[(name, "")], value)
    }

    pub fn let_vars(&mut self, names: &[&str], value: Option<Expression>) -> Statement {
        let typed: Vec<(&str, &str)> = names.iter().map(|name| (*name, "")).collect();
        self.let_typed(&typed, value)
    }

    /// `let a:t1, b:t2 := value`; an empty type means the default type
    pub fn let_typed(&mut self, variables: &[(&str, &str)], value: Option<Expression>) -> Statement {
        let variables = variables
            .iter()
            .map(|(name, ty)| self.typed_name(name, ty))
            .collect();
        Statement::VariableDeclaration(VariableDeclaration {
            span: self.span,
            variables,
            value: value.map(Box::new),
        })
    }

    /// Declaration of already interned (possibly derived) names
    pub fn let_names(&mut self, names: Vec<NameId>, value: Option<Expression>) -> Statement {
        let ty = self.names.predefined().default_type;
        let variables = names
            .into_iter()
            .map(|name| TypedName {
                id: self.node_id(),
                span: self.span,
                name,
                ty,
            })
            .collect();
        Statement::VariableDeclaration(VariableDeclaration {
            span: self.span,
            variables,
            value: value.map(Box::new),
        })
    }

    pub fn assign(&mut self, targets: &[&str], value: Expression) -> Statement {
        let variable_names = targets.iter().map(|target| self.identifier(target)).collect();
        Statement::Assignment(Assignment {
            span: self.span,
            variable_names,
            value: Box::new(value),
        })
    }

    pub fn function(&mut self, name: &str, parameters: &[&str], returns: &[&str], body: Block) -> Statement {
        let parameters: Vec<(&str, &str)> = parameters.iter().map(|p| (*p, "")).collect();
        let returns: Vec<(&str, &str)> = returns.iter().map(|r| (*r, "")).collect();
        self.typed_function(name, &parameters, &returns, body)
    }

    pub fn typed_function(
        &mut self,
        name: &str,
        parameters: &[(&str, &str)],
        returns: &[(&str, &str)],
        body: Block,
    ) -> Statement {
        let name = self.name(name);
        let parameters = parameters.iter().map(|(p, ty)| self.typed_name(p, ty)).collect();
        let return_variables = returns.iter().map(|(r, ty)| self.typed_name(r, ty)).collect();
        Statement::FunctionDefinition(FunctionDefinition {
            id: self.node_id(),
            span: self.span,
            name,
            parameters,
            return_variables,
            body,
        })
    }

    pub fn if_stmt(&mut self, condition: Expression, body: Block) -> Statement {
        Statement::If(If {
            span: self.span,
            condition: Box::new(condition),
            body,
        })
    }

    /// `case value { body }`, or `default { body }` for `None`
    pub fn case(&mut self, value: Option<Literal>, body: Block) -> Case {
        Case {
            span: self.span,
            value,
            body,
        }
    }

    pub fn switch(&mut self, expression: Expression, cases: Vec<Case>) -> Statement {
        Statement::Switch(Switch {
            span: self.span,
            expression: Box::new(expression),
            cases,
        })
    }

    pub fn for_loop(&mut self, pre: Block, condition: Expression, post: Block, body: Block) -> Statement {
        Statement::ForLoop(ForLoop {
            id: self.node_id(),
            span: self.span,
            pre,
            condition: Box::new(condition),
            post,
            body,
        })
    }

    pub fn break_stmt(&mut self) -> Statement {
        Statement::Break(self.span)
    }

    pub fn continue_stmt(&mut self) -> Statement {
        Statement::Continue(self.span)
    }

    pub fn leave(&mut self) -> Statement {
        Statement::Leave(self.span)
    }

    pub fn block(&mut self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.node_id(),
            span: self.span,
            statements,
        }
    }

    /// A block used as a statement
    pub fn nested(&mut self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.block(statements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{EvmDialect, EvmVersion, GenericDialect};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn test_node_ids_are_unique() {
        let mut repository = NameRepository::new(Arc::new(GenericDialect::new()));
        let mut b = AstBuilder::new(&mut repository);
        let one = b.number("1");
        let x = b.ident("x");
        let call = b.call("f", vec![one, x]);
        let Expression::FunctionCall(call) = call else {
            panic!("expected a call");
        };
        let ids: BTreeSet<NodeId> = call
            .arguments
            .iter()
            .map(Expression::id)
            .chain([call.id, call.function_name.id])
            .collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_literal_types() {
        let mut repository = NameRepository::new(Arc::new(GenericDialect::new()));
        let predefined = *repository.predefined();
        let mut b = AstBuilder::new(&mut repository);
        let Expression::Literal(number) = b.number("7") else { panic!() };
        let Expression::Literal(flag) = b.boolean(true) else { panic!() };
        let Expression::Literal(small) = b.typed_number("7", "u8") else { panic!() };
        assert_eq!(number.ty, predefined.default_type);
        assert_eq!(flag.ty, predefined.bool_type);
        assert_eq!(b.names().label_of(small.ty), "u8");
        let unknown = b.type_name("u7");
        assert!(!b.names().is_type(unknown));
    }

    #[test]
    fn test_builtin_string_arguments_become_unlimited() {
        let mut repository = NameRepository::new(Arc::new(EvmDialect::with_objects(EvmVersion::default())));
        let mut b = AstBuilder::new(&mut repository);
        let long = "a".repeat(40);
        let name = b.string(&long);
        let Expression::FunctionCall(call) = b.call("datasize", vec![name]) else { panic!() };
        let literal = call.arguments[0].as_literal().unwrap();
        assert!(literal.value.is_unlimited());
        assert!(literal.is_valid());

        let plain = b.string(&long);
        let Expression::FunctionCall(call) = b.call("mstore", vec![plain]) else { panic!() };
        assert!(!call.arguments[0].as_literal().unwrap().value.is_unlimited());
    }
}
