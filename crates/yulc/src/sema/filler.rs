//! First analysis pass: creates scopes and registers declarations
//!
//! Functions are hoisted: all functions of a block are registered before any
//! statement of the block is visited, so they can be called before their
//! definition. Variables are registered here too but only become usable
//! once the analyzer reaches their declaration.

use tracing::debug;

use super::info::AnalysisInfo;
use super::scope::ScopeId;
use crate::ast::{Block, FunctionDefinition, Statement, TypedName};
use crate::common::{CompileResult, ErrorId, ErrorReporter};
use crate::names::NameRepository;

pub struct ScopeFiller<'a> {
    info: &'a mut AnalysisInfo,
    reporter: &'a mut ErrorReporter,
    names: &'a NameRepository,
    current: Option<ScopeId>,
}

impl<'a> ScopeFiller<'a> {
    pub fn new(info: &'a mut AnalysisInfo, reporter: &'a mut ErrorReporter, names: &'a NameRepository) -> Self {
        Self {
            info,
            reporter,
            names,
            current: None,
        }
    }

    /// Builds the scopes of `block` and everything below it. Returns false
    /// if a name was declared twice in the same scope.
    pub fn fill(mut self, block: &Block) -> CompileResult<bool> {
        let watcher = self.reporter.watcher();
        self.visit_block(block)?;
        debug!(scopes = self.info.scopes.len(), "filled scopes");
        Ok(watcher.ok(self.reporter))
    }

    fn current(&self) -> ScopeId {
        self.current
            .unwrap_or_else(|| panic!("declaration outside of any block"))
    }

    fn visit_block(&mut self, block: &Block) -> CompileResult<()> {
        let outer = self.current;
        let scope = self.info.scopes.add(outer, false);
        self.info.block_scopes.insert(block.id, scope);
        self.current = Some(scope);

        for statement in &block.statements {
            if let Statement::FunctionDefinition(function) = statement {
                self.register_function(function)?;
            }
        }
        for statement in &block.statements {
            self.visit_statement(statement)?;
        }

        self.current = outer;
        Ok(())
    }

    fn visit_statement(&mut self, statement: &Statement) -> CompileResult<()> {
        match statement {
            Statement::VariableDeclaration(declaration) => {
                let scope = self.current();
                for variable in &declaration.variables {
                    if !self.register_variable(scope, variable)? {
                        break;
                    }
                }
            }
            Statement::FunctionDefinition(function) => {
                let outer = self.current;
                let virtual_scope = self.info.scopes.add(outer, true);
                self.info.function_scopes.insert(function.id, virtual_scope);
                for variable in function.parameters.iter().chain(&function.return_variables) {
                    self.register_variable(virtual_scope, variable)?;
                }
                self.current = Some(virtual_scope);
                self.visit_block(&function.body)?;
                self.current = outer;
            }
            Statement::If(stmt) => self.visit_block(&stmt.body)?,
            Statement::Switch(switch) => {
                for case in &switch.cases {
                    self.visit_block(&case.body)?;
                }
            }
            Statement::ForLoop(for_loop) => {
                // body and post see the declarations of pre
                let outer = self.current;
                self.visit_block(&for_loop.pre)?;
                self.current = self.info.block_scope(for_loop.pre.id);
                self.visit_block(&for_loop.body)?;
                self.visit_block(&for_loop.post)?;
                self.current = outer;
            }
            Statement::Block(block) => self.visit_block(block)?,
            Statement::ExpressionStatement(_)
            | Statement::Assignment(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Leave(_) => {}
        }
        Ok(())
    }

    fn register_variable(&mut self, scope: ScopeId, variable: &TypedName) -> CompileResult<bool> {
        if self.info.scopes.get_mut(scope).register_variable(variable.name, variable.ty) {
            return Ok(true);
        }
        self.reporter.declaration_error(
            ErrorId(1395),
            variable.span,
            format!(
                "Variable name {} already taken in this scope.",
                self.names.display_label(variable.name)
            ),
        )?;
        Ok(false)
    }

    fn register_function(&mut self, function: &FunctionDefinition) -> CompileResult<()> {
        let scope = self.current();
        let arguments = function.parameters.iter().map(|p| p.ty).collect();
        let returns = function.return_variables.iter().map(|r| r.ty).collect();
        if !self.info.scopes.get_mut(scope).register_function(function.name, arguments, returns) {
            self.reporter.declaration_error(
                ErrorId(6052),
                function.span,
                format!(
                    "Function name {} already taken in this scope.",
                    self.names.display_label(function.name)
                ),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstBuilder;
    use crate::dialect::GenericDialect;
    use crate::sema::ScopeIdentifier;
    use std::sync::Arc;

    fn repository() -> NameRepository {
        NameRepository::new(Arc::new(GenericDialect::new()))
    }

    #[test]
    fn test_functions_are_hoisted() {
        let mut names = repository();
        let block = {
            let mut b = AstBuilder::new(&mut names);
            let call = b.call("f", vec![]);
            let stmt = b.expr_stmt(call);
            let body = b.block(vec![]);
            let f = b.function("f", &["a"], &["r"], body);
            b.block(vec![stmt, f])
        };
        let mut info = AnalysisInfo::default();
        let mut reporter = ErrorReporter::new();
        assert!(ScopeFiller::new(&mut info, &mut reporter, &names).fill(&block).unwrap());

        let root = info.block_scope(block.id).unwrap();
        let f = names.name_of_label("f");
        let u256 = names.predefined().default_type;
        assert_eq!(
            info.scope(root).get(f),
            Some(&ScopeIdentifier::Function {
                arguments: vec![u256],
                returns: vec![u256],
            })
        );
    }

    #[test]
    fn test_duplicate_variable_in_same_scope() {
        let mut names = repository();
        let block = {
            let mut b = AstBuilder::new(&mut names);
            let first = b.let_var("x", None);
            let second = b.let_var("x", None);
            b.block(vec![first, second])
        };
        let mut info = AnalysisInfo::default();
        let mut reporter = ErrorReporter::new();
        assert!(!ScopeFiller::new(&mut info, &mut reporter, &names).fill(&block).unwrap());
        let error = reporter.errors().next().unwrap();
        assert_eq!(error.id, ErrorId(1395));
        assert_eq!(error.message, "Variable name x already taken in this scope.");
    }

    #[test]
    fn test_duplicate_function_in_same_scope() {
        let mut names = repository();
        let block = {
            let mut b = AstBuilder::new(&mut names);
            let body = b.block(vec![]);
            let first = b.function("f", &[], &[], body);
            let body = b.block(vec![]);
            let second = b.function("f", &["a"], &[], body);
            b.block(vec![first, second])
        };
        let mut info = AnalysisInfo::default();
        let mut reporter = ErrorReporter::new();
        assert!(!ScopeFiller::new(&mut info, &mut reporter, &names).fill(&block).unwrap());
        assert_eq!(reporter.errors().next().unwrap().message, "Function name f already taken in this scope.");
    }

    #[test]
    fn test_shadowing_in_nested_block_is_allowed() {
        let mut names = repository();
        let block = {
            let mut b = AstBuilder::new(&mut names);
            let outer = b.let_var("x", None);
            let inner_decl = b.let_var("x", None);
            let inner = b.nested(vec![inner_decl]);
            b.block(vec![outer, inner])
        };
        let mut info = AnalysisInfo::default();
        let mut reporter = ErrorReporter::new();
        assert!(ScopeFiller::new(&mut info, &mut reporter, &names).fill(&block).unwrap());
        assert_eq!(info.scopes.len(), 2);
    }

    #[test]
    fn test_for_loop_body_sees_pre() {
        let mut names = repository();
        let (block, body_id, pre_id) = {
            let mut b = AstBuilder::new(&mut names);
            let decl = b.let_var("i", None);
            let pre = b.block(vec![decl]);
            let condition = b.number("1");
            let post = b.block(vec![]);
            let body = b.block(vec![]);
            let (body_id, pre_id) = (body.id, pre.id);
            let stmt = b.for_loop(pre, condition, post, body);
            (b.block(vec![stmt]), body_id, pre_id)
        };
        let mut info = AnalysisInfo::default();
        let mut reporter = ErrorReporter::new();
        assert!(ScopeFiller::new(&mut info, &mut reporter, &names).fill(&block).unwrap());
        let body_scope = info.block_scope(body_id).unwrap();
        assert_eq!(info.scope(body_scope).parent, info.block_scope(pre_id));
        let i = names.name_of_label("i");
        assert!(info.scopes.lookup(body_scope, i).is_some());
    }

    #[test]
    fn test_function_gets_virtual_scope() {
        let mut names = repository();
        let (block, function_id, body_id) = {
            let mut b = AstBuilder::new(&mut names);
            let body = b.block(vec![]);
            let body_id = body.id;
            let f = b.function("f", &["a", "b"], &["r"], body);
            let Statement::FunctionDefinition(definition) = &f else { unreachable!() };
            let function_id = definition.id;
            (b.block(vec![f]), function_id, body_id)
        };
        let mut info = AnalysisInfo::default();
        let mut reporter = ErrorReporter::new();
        assert!(ScopeFiller::new(&mut info, &mut reporter, &names).fill(&block).unwrap());
        let virtual_scope = info.function_scope(function_id).unwrap();
        assert!(info.scope(virtual_scope).function_scope);
        assert_eq!(info.scope(virtual_scope).len(), 3);
        let body_scope = info.block_scope(body_id).unwrap();
        assert_eq!(info.scope(body_scope).parent, Some(virtual_scope));
    }
}
