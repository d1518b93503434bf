//! Collects every name a block defines or refers to

use std::collections::BTreeSet;

use super::NameId;
use crate::ast::{Block, Expression, Statement};

/// Walks a block and records declared variables, functions, parameters,
/// return variables and every identifier reference.
#[derive(Debug, Default)]
pub struct NameCollector {
    names: BTreeSet<NameId>,
}

impl NameCollector {
    pub fn collect(block: &Block) -> BTreeSet<NameId> {
        let mut collector = Self::default();
        collector.visit_block(block);
        collector.names
    }

    fn visit_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.visit_statement(statement);
        }
    }

    fn visit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::ExpressionStatement(stmt) => self.visit_expression(&stmt.expression),
            Statement::Assignment(assignment) => {
                self.names
                    .extend(assignment.variable_names.iter().map(|identifier| identifier.name));
                self.visit_expression(&assignment.value);
            }
            Statement::VariableDeclaration(declaration) => {
                self.names
                    .extend(declaration.variables.iter().map(|variable| variable.name));
                if let Some(value) = &declaration.value {
                    self.visit_expression(value);
                }
            }
            Statement::FunctionDefinition(function) => {
                self.names.insert(function.name);
                self.names.extend(
                    function
                        .parameters
                        .iter()
                        .chain(&function.return_variables)
                        .map(|variable| variable.name),
                );
                self.visit_block(&function.body);
            }
            Statement::If(stmt) => {
                self.visit_expression(&stmt.condition);
                self.visit_block(&stmt.body);
            }
            Statement::Switch(switch) => {
                self.visit_expression(&switch.expression);
                for case in &switch.cases {
                    self.visit_block(&case.body);
                }
            }
            Statement::ForLoop(for_loop) => {
                self.visit_block(&for_loop.pre);
                self.visit_expression(&for_loop.condition);
                self.visit_block(&for_loop.post);
                self.visit_block(&for_loop.body);
            }
            Statement::Block(block) => self.visit_block(block),
            Statement::Break(_) | Statement::Continue(_) | Statement::Leave(_) => {}
        }
    }

    fn visit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Literal(_) => {}
            Expression::Identifier(identifier) => {
                self.names.insert(identifier.name);
            }
            Expression::FunctionCall(call) => {
                self.names.insert(call.function_name.name);
                for argument in &call.arguments {
                    self.visit_expression(argument);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstBuilder;
    use crate::dialect::GenericDialect;
    use crate::names::NameRepository;
    use std::sync::Arc;

    #[test]
    fn test_collects_definitions_and_references() {
        let mut repository = NameRepository::new(Arc::new(GenericDialect::new()));
        let block = {
            let mut b = AstBuilder::new(&mut repository);
            let body = {
                let a = b.ident("a");
                let assign = b.assign(&["r"], a);
                b.block(vec![assign])
            };
            let f = b.function("f", &["a"], &["r"], body);
            let one = b.number("1");
            let call = b.call("f", vec![one]);
            let x = b.let_var("x", Some(call));
            b.block(vec![f, x])
        };

        let names = NameCollector::collect(&block);
        for label in ["f", "a", "r", "x"] {
            assert!(names.contains(&repository.name_of_label(label)), "missing {label}");
        }
        assert_eq!(names.len(), 4);
    }
}
