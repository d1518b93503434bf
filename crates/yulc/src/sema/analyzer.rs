//! Semantic analyzer
//!
//! Walks a block after [`ScopeFiller`] created its scopes and checks
//! declaration order, arity, literal rules, target availability of builtins
//! and type consistency. Problems are reported to the [`ErrorReporter`] and
//! the walk continues with a substitute value; only hitting the error limit
//! stops it.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use tracing::debug;

use super::filler::ScopeFiller;
use super::info::AnalysisInfo;
use super::scope::{ScopeId, ScopeIdentifier};
use crate::ast::{
    Assignment, Block, Expression, ForLoop, FunctionCall, FunctionDefinition, Identifier, Literal, LiteralKind,
    Statement, Switch, U256, VariableDeclaration,
};
use crate::common::{CompileResult, ErrorId, ErrorReporter, Span};
use crate::dialect::{EvmVersion, Instruction, is_builtin_instruction};
use crate::names::{NameId, NameRepository, Type};

/// How an identifier handed to an [`IdentifierResolver`] is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierContext {
    /// Read access to a name not bound locally
    RValue,
    /// Assignment target not bound locally
    LValue,
    /// A variable being declared
    VariableDeclaration,
    /// The name was found locally; only shadowing checks are expected and
    /// the result is ignored
    NonExternal,
}

/// Hook for names that live outside of the analyzed block, e.g. variables
/// of a host language embedding the code
pub trait IdentifierResolver {
    /// Returns true if the identifier was resolved. Diagnostics reported by
    /// the resolver suppress the analyzer's own "not found" errors.
    fn resolve(
        &mut self,
        identifier: &Identifier,
        context: IdentifierContext,
        inside_function: bool,
        reporter: &mut ErrorReporter,
    ) -> CompileResult<bool>;
}

impl<F> IdentifierResolver for F
where
    F: FnMut(&Identifier, IdentifierContext, bool, &mut ErrorReporter) -> CompileResult<bool>,
{
    fn resolve(
        &mut self,
        identifier: &Identifier,
        context: IdentifierContext,
        inside_function: bool,
        reporter: &mut ErrorReporter,
    ) -> CompileResult<bool> {
        self(identifier, context, inside_function, reporter)
    }
}

/// Instructions that only exist from some version on, with the error used
/// when they are called while compiling for an older one
const VERSION_GATED: &[(Instruction, fn(EvmVersion) -> bool, u32, &str)] = &[
    (Instruction::ReturnDataCopy, EvmVersion::supports_returndata, 7756, "Byzantium"),
    (Instruction::ReturnDataSize, EvmVersion::supports_returndata, 4778, "Byzantium"),
    (Instruction::StaticCall, EvmVersion::has_static_call, 1503, "Byzantium"),
    (Instruction::Shl, EvmVersion::has_bitwise_shifting, 6612, "Constantinople"),
    (Instruction::Shr, EvmVersion::has_bitwise_shifting, 7458, "Constantinople"),
    (Instruction::Sar, EvmVersion::has_bitwise_shifting, 2054, "Constantinople"),
    (Instruction::Create2, EvmVersion::has_create2, 6166, "Constantinople"),
    (Instruction::ExtCodeHash, EvmVersion::has_ext_code_hash, 7110, "Constantinople"),
    (Instruction::ChainId, EvmVersion::has_chain_id, 1561, "Istanbul"),
    (Instruction::SelfBalance, EvmVersion::has_self_balance, 7721, "Istanbul"),
    (Instruction::BaseFee, EvmVersion::has_base_fee, 5430, "London"),
    (Instruction::BlobBaseFee, EvmVersion::has_blob_base_fee, 6679, "Cancun"),
    (Instruction::BlobHash, EvmVersion::has_blob_hash, 8314, "Cancun"),
    (Instruction::MCopy, EvmVersion::has_mcopy, 7755, "Cancun"),
    (Instruction::TStore, EvmVersion::supports_transient_storage, 6243, "Cancun"),
    (Instruction::TLoad, EvmVersion::supports_transient_storage, 6243, "Cancun"),
];

const SELFDESTRUCT_DEPRECATED: &str = "\"selfdestruct\" has been deprecated. \
    Note that, starting from the Cancun hard fork, the underlying opcode no longer deletes the code and \
    data associated with an account and only transfers its Ether to the beneficiary, \
    unless executed in the same transaction in which the contract was created (see EIP-6780). \
    Any use in newly deployed contracts is strongly discouraged even if the new behavior is taken into account. \
    Future changes to the EVM might further reduce the functionality of the opcode.";

const TRANSIENT_STORAGE_WARNING: &str = "Transient storage as defined by EIP-1153 can break the composability of smart contracts: \
    Since transient storage is cleared only at the end of the transaction and not at the end of the outermost call frame to the contract within a transaction, \
    your contract may unintentionally misbehave when invoked multiple times in a complex transaction. \
    To avoid this, be sure to clear all transient storage at the end of any call to your contract. \
    The use of transient storage for reentrancy guards that are cleared at the end of the call is safe.";

/// Semantic analyzer for a single block
pub struct Analyzer<'a> {
    info: &'a mut AnalysisInfo,
    reporter: &'a mut ErrorReporter,
    names: &'a NameRepository,
    resolver: Option<Box<dyn IdentifierResolver + 'a>>,
    data_names: BTreeSet<String>,
    evm_version: EvmVersion,
    current_scope: Option<ScopeId>,
    /// Variables whose declaration was already visited
    active_variables: FxHashSet<(ScopeId, NameId)>,
    in_loop_body: bool,
    in_function: bool,
}

impl<'a> Analyzer<'a> {
    pub fn new(info: &'a mut AnalysisInfo, reporter: &'a mut ErrorReporter, names: &'a NameRepository) -> Self {
        Self {
            info,
            reporter,
            names,
            resolver: None,
            data_names: BTreeSet::new(),
            evm_version: names.dialect().evm_version().unwrap_or_default(),
            current_scope: None,
            active_variables: FxHashSet::default(),
            in_loop_body: false,
            in_function: false,
        }
    }

    pub fn with_resolver(mut self, resolver: impl IdentifierResolver + 'a) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Qualified names of the data objects `datasize` and `dataoffset` may refer to
    pub fn with_data_names<S: Into<String>>(mut self, data_names: impl IntoIterator<Item = S>) -> Self {
        self.data_names = data_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_evm_version(mut self, version: EvmVersion) -> Self {
        self.evm_version = version;
        self
    }

    /// Analyzes `block`. Returns true if no error was reported and the walk
    /// was not aborted.
    #[tracing::instrument(level = "debug", skip_all, fields(dialect = self.names.dialect().name()))]
    pub fn analyze(&mut self, block: &Block) -> bool {
        let watcher = self.reporter.watcher();
        let aborted = match self.run(block) {
            Ok(()) => false,
            Err(error) => {
                // only a misbehaving resolver can fail without reporting
                debug_assert!(
                    !watcher.ok(self.reporter),
                    "fatal error detected, but no error is reported"
                );
                debug!(%error, "analysis aborted");
                true
            }
        };
        let success = !aborted && watcher.ok(self.reporter);
        debug!(success, diagnostics = self.reporter.diagnostics().len(), "analysis finished");
        success
    }

    /// Analyzes code that is known to be correct, e.g. code generated by the
    /// compiler itself. Panics if any error is reported.
    pub fn analyze_strict_assert_correct<S: Into<String>>(
        names: &NameRepository,
        block: &Block,
        data_names: impl IntoIterator<Item = S>,
    ) -> AnalysisInfo {
        let mut info = AnalysisInfo::default();
        let mut reporter = ErrorReporter::new();
        let success = Analyzer::new(&mut info, &mut reporter, names)
            .with_data_names(data_names)
            .analyze(block);
        if !success || reporter.has_errors() {
            let first = reporter
                .errors()
                .next()
                .map_or_else(String::new, ToString::to_string);
            panic!("invalid assembly/yul code: {first}");
        }
        info
    }

    fn run(&mut self, block: &Block) -> CompileResult<()> {
        if !ScopeFiller::new(self.info, self.reporter, self.names).fill(block)? {
            return Ok(());
        }
        self.visit_block(block)
    }

    fn visit_block(&mut self, block: &Block) -> CompileResult<()> {
        let previous = self.current_scope;
        self.current_scope = Some(self.scope_of(block));
        for statement in &block.statements {
            self.visit_statement(statement)?;
        }
        self.current_scope = previous;
        Ok(())
    }

    fn visit_statement(&mut self, statement: &Statement) -> CompileResult<()> {
        match statement {
            Statement::ExpressionStatement(stmt) => {
                let watcher = self.reporter.watcher();
                let types = self.visit_expression(&stmt.expression)?;
                if watcher.ok(self.reporter) && !types.is_empty() {
                    self.reporter.type_error(
                        ErrorId(3083),
                        stmt.span,
                        format!(
                            "Top-level expressions are not supposed to return values \
                             (this expression returns {} value{}). Use ``pop()`` or assign them.",
                            types.len(),
                            if types.len() == 1 { "" } else { "s" }
                        ),
                    )?;
                }
                Ok(())
            }
            Statement::Assignment(assignment) => self.visit_assignment(assignment),
            Statement::VariableDeclaration(declaration) => self.visit_variable_declaration(declaration),
            Statement::FunctionDefinition(function) => self.visit_function_definition(function),
            Statement::If(stmt) => {
                self.expect_bool_expression(&stmt.condition)?;
                self.visit_block(&stmt.body)
            }
            Statement::Switch(switch) => self.visit_switch(switch),
            Statement::ForLoop(for_loop) => self.visit_for_loop(for_loop),
            Statement::Break(span) => self.expect_loop_body("break", *span),
            Statement::Continue(span) => self.expect_loop_body("continue", *span),
            Statement::Leave(span) => {
                if !self.in_function {
                    self.reporter.syntax_error(
                        ErrorId(8149),
                        *span,
                        "Keyword \"leave\" can only be used inside a function.",
                    )?;
                }
                Ok(())
            }
            Statement::Block(block) => self.visit_block(block),
        }
    }

    fn visit_expression(&mut self, expression: &Expression) -> CompileResult<Vec<Type>> {
        let types = match expression {
            Expression::Literal(literal) => self.visit_literal(literal)?,
            Expression::Identifier(identifier) => self.visit_identifier(identifier)?,
            Expression::FunctionCall(call) => self.visit_function_call(call)?,
        };
        self.info.expression_types.insert(expression.id(), types.clone());
        Ok(types)
    }

    fn visit_literal(&mut self, literal: &Literal) -> CompileResult<Vec<Type>> {
        self.expect_valid_type(literal.ty, literal.span)?;
        let mut erroneous = false;
        match literal.kind {
            LiteralKind::String
                if !literal.value.is_unlimited() && literal.value.hint().is_some_and(|text| text.len() > 32) =>
            {
                erroneous = true;
                self.reporter.type_error(
                    ErrorId(3069),
                    literal.span,
                    format!("String literal too long ({} > 32)", literal.format().len()),
                )?;
            }
            LiteralKind::Number if literal.value.hint().is_some_and(|text| U256::parse_literal(text).is_none()) => {
                erroneous = true;
                self.reporter
                    .type_error(ErrorId(6708), literal.span, "Number literal too large (> 256 bits)")?;
            }
            LiteralKind::Boolean => {
                let value = literal.value.value();
                assert!(value == U256::ZERO || value == U256::ONE, "boolean literal out of range");
                assert!(
                    literal
                        .value
                        .hint()
                        .is_none_or(|text| text == "true" || text == "false"),
                    "boolean literal with non-boolean spelling"
                );
            }
            _ => {}
        }

        if !self
            .names
            .dialect()
            .valid_type_for_literal(literal.kind, &literal.value, literal.ty, self.names)
        {
            erroneous = true;
            self.reporter.type_error(
                ErrorId(5170),
                literal.span,
                format!(
                    "Invalid type \"{}\" for literal \"{}\".",
                    self.names.label_of(literal.ty),
                    literal.format()
                ),
            )?;
        }

        assert!(erroneous || literal.is_valid(), "invalid literal passed validation");
        Ok(vec![literal.ty])
    }

    fn visit_identifier(&mut self, identifier: &Identifier) -> CompileResult<Vec<Type>> {
        assert!(!identifier.name.is_empty(), "identifier without a name");
        let watcher = self.reporter.watcher();
        let mut ty = self.names.predefined().default_type;

        match self.lookup(identifier.name) {
            Some((scope, ScopeIdentifier::Variable { ty: variable_type })) => {
                if !self.active_variables.contains(&(scope, identifier.name)) {
                    self.reporter.declaration_error(
                        ErrorId(4990),
                        identifier.span,
                        format!("Variable {} used before it was declared.", self.names.display_label(identifier.name)),
                    )?;
                }
                ty = variable_type;
                self.resolve(identifier, IdentifierContext::NonExternal)?;
            }
            Some((_, ScopeIdentifier::Function { .. })) => {
                self.reporter.type_error(
                    ErrorId(6041),
                    identifier.span,
                    format!("Function {} used without being called.", self.names.display_label(identifier.name)),
                )?;
                self.resolve(identifier, IdentifierContext::NonExternal)?;
            }
            None => {
                let found = self.resolve(identifier, IdentifierContext::RValue)?;
                // the resolver may have reported something more specific
                if !found && watcher.ok(self.reporter) {
                    self.reporter.declaration_error(
                        ErrorId(8198),
                        identifier.span,
                        format!("Identifier \"{}\" not found.", self.names.display_label(identifier.name)),
                    )?;
                }
            }
        }
        Ok(vec![ty])
    }

    fn visit_assignment(&mut self, assignment: &Assignment) -> CompileResult<()> {
        let count = assignment.variable_names.len();
        assert!(count >= 1, "assignment without targets");

        let mut seen = FxHashSet::default();
        for target in &assignment.variable_names {
            if !seen.insert(target.name) {
                self.reporter.declaration_error(
                    ErrorId(9005),
                    assignment.span,
                    format!(
                        "Variable {} occurs multiple times on the left-hand side of the assignment.",
                        self.names.display_label(target.name)
                    ),
                )?;
            }
        }

        let types = self.visit_expression(&assignment.value)?;
        if types.len() != count {
            self.reporter.declaration_error(
                ErrorId(8678),
                assignment.span,
                format!(
                    "Variable count for assignment to \"{}\" does not match number of values ({} vs. {})",
                    join_labels(self.names, assignment.variable_names.iter().map(|target| target.name)),
                    count,
                    types.len()
                ),
            )?;
        }

        for (target, ty) in assignment.variable_names.iter().zip(&types) {
            self.check_assignment(target, *ty)?;
        }
        Ok(())
    }

    fn visit_variable_declaration(&mut self, declaration: &VariableDeclaration) -> CompileResult<()> {
        let count = declaration.variables.len();
        for variable in &declaration.variables {
            let identifier = Identifier {
                id: variable.id,
                span: variable.span,
                name: variable.name,
            };
            self.resolve(&identifier, IdentifierContext::VariableDeclaration)?;
        }
        for variable in &declaration.variables {
            self.expect_valid_identifier(variable.name, variable.span)?;
            self.expect_valid_type(variable.ty, variable.span)?;
        }

        if let Some(value) = &declaration.value {
            let types = self.visit_expression(value)?;
            if types.len() != count {
                self.reporter.declaration_error(
                    ErrorId(3812),
                    declaration.span,
                    format!(
                        "Variable count mismatch for declaration of \"{}\": {} variables and {} values.",
                        join_labels(self.names, declaration.variables.iter().map(|variable| variable.name)),
                        count,
                        types.len()
                    ),
                )?;
            }

            let default_type = self.names.predefined().default_type;
            for (index, variable) in declaration.variables.iter().enumerate() {
                let given = types.get(index).copied().unwrap_or(default_type);
                if variable.ty != given {
                    self.reporter.type_error(
                        ErrorId(3947),
                        variable.span,
                        format!(
                            "Assigning value of type \"{}\" to variable of type \"{}\".",
                            self.names.label_of(given),
                            self.names.label_of(variable.ty)
                        ),
                    )?;
                }
            }
        }

        let scope = self.current_scope();
        for variable in &declaration.variables {
            assert!(
                matches!(
                    self.info.scope(scope).get(variable.name),
                    Some(ScopeIdentifier::Variable { .. })
                ),
                "declared variable {} missing from its scope",
                variable.name
            );
            self.active_variables.insert((scope, variable.name));
        }
        Ok(())
    }

    fn visit_function_definition(&mut self, function: &FunctionDefinition) -> CompileResult<()> {
        assert!(!function.name.is_empty(), "function without a name");
        self.expect_valid_identifier(function.name, function.span)?;
        let virtual_scope = self
            .info
            .function_scope(function.id)
            .unwrap_or_else(|| panic!("no scope for function {}", function.name));

        for variable in function.parameters.iter().chain(&function.return_variables) {
            self.expect_valid_identifier(variable.name, variable.span)?;
            self.expect_valid_type(variable.ty, variable.span)?;
            self.active_variables.insert((virtual_scope, variable.name));
        }

        let outer = (self.in_loop_body, self.in_function);
        self.in_loop_body = false;
        self.in_function = true;
        self.visit_block(&function.body)?;
        (self.in_loop_body, self.in_function) = outer;
        Ok(())
    }

    fn visit_function_call(&mut self, call: &FunctionCall) -> CompileResult<Vec<Type>> {
        let names = self.names;
        let name = call.function_name.name;
        assert!(!name.is_empty(), "call without a function name");
        let watcher = self.reporter.watcher();
        let predefined = *names.predefined();

        let mut parameter_types: Option<Vec<Type>> = None;
        let mut return_types: Option<Vec<Type>> = None;
        let mut literal_arguments: &[Option<LiteralKind>] = &[];
        // signature of an externally resolved function is unknown
        let mut external = false;

        if let Some(builtin) = names.builtin(name) {
            if name == predefined.selfdestruct {
                self.reporter
                    .warning(ErrorId(1699), call.function_name.span, SELFDESTRUCT_DEPRECATED);
            } else if self.evm_version.supports_transient_storage()
                && name == predefined.tstore
                && !self.reporter.has_error(&[ErrorId(2394)])
            {
                self.reporter
                    .warning(ErrorId(2394), call.function_name.span, TRANSIENT_STORAGE_WARNING);
            }

            parameter_types = Some(builtin.parameters.clone());
            return_types = Some(builtin.returns.clone());
            literal_arguments = &builtin.data.literal_arguments;

            self.validate_instructions(&call.function_name)?;
            self.info.side_effects += builtin.data.side_effects;
        } else if let Some((_, binding)) = self.lookup(name) {
            match binding {
                ScopeIdentifier::Variable { .. } => {
                    self.reporter.type_error(
                        ErrorId(4202),
                        call.function_name.span,
                        "Attempt to call variable instead of function.",
                    )?;
                }
                ScopeIdentifier::Function { arguments, returns } => {
                    parameter_types = Some(arguments);
                    return_types = Some(returns);
                }
            }
            self.resolve(&call.function_name, IdentifierContext::NonExternal)?;
        } else if !self.validate_instructions(&call.function_name)? {
            external = self.resolve(&call.function_name, IdentifierContext::RValue)?;
            if !external && watcher.ok(self.reporter) {
                self.reporter.declaration_error(
                    ErrorId(4619),
                    call.function_name.span,
                    format!("Function \"{}\" not found.", self.names.display_label(name)),
                )?;
            }
            assert!(external || !watcher.ok(self.reporter), "expected a reported error");
        }

        if let Some(parameters) = &parameter_types {
            if call.arguments.len() != parameters.len() {
                self.reporter.type_error(
                    ErrorId(7000),
                    call.function_name.span,
                    format!(
                        "Function \"{}\" expects {} arguments but got {}.",
                        self.names.display_label(name),
                        parameters.len(),
                        call.arguments.len()
                    ),
                )?;
            }
        }

        let mut argument_types = Vec::with_capacity(call.arguments.len());
        for (index, argument) in call.arguments.iter().enumerate().rev() {
            if let Some(kind) = literal_arguments.get(index).copied().flatten() {
                match argument {
                    Expression::Literal(literal) if literal.kind != kind => {
                        self.reporter.type_error(
                            ErrorId(5859),
                            argument.span(),
                            format!("Function expects {kind} literal."),
                        )?;
                    }
                    Expression::Literal(literal) if kind == LiteralKind::String => {
                        self.check_literal_argument(name, literal)?;
                        argument_types.push(self.expect_unlimited_string_literal(literal));
                        self.info
                            .expression_types
                            .insert(literal.id, vec![literal.ty]);
                        continue;
                    }
                    Expression::Literal(_) => {}
                    _ => {
                        self.reporter.type_error(
                            ErrorId(9114),
                            call.function_name.span,
                            "Function expects direct literals as arguments.",
                        )?;
                    }
                }
            }
            argument_types.push(self.expect_expression(argument)?);
        }
        argument_types.reverse();

        if let Some(parameters) = &parameter_types {
            for ((expected, given), argument) in parameters.iter().zip(&argument_types).zip(&call.arguments) {
                self.expect_type(*expected, *given, argument.span())?;
            }
        }

        if watcher.ok(self.reporter) {
            assert!(
                external
                    || parameter_types
                        .as_ref()
                        .is_some_and(|parameters| parameters.len() == argument_types.len()),
                "successful call without matching signature"
            );
            return Ok(return_types.unwrap_or_default());
        }
        Ok(return_types.map_or_else(Vec::new, |returns| vec![predefined.default_type; returns.len()]))
    }

    /// Extra rules for string literals at literal positions of builtins
    fn check_literal_argument(&mut self, function: NameId, literal: &Literal) -> CompileResult<()> {
        let predefined = self.names.predefined();
        if function == predefined.datasize || function == predefined.dataoffset {
            let object = literal.format();
            if !self.data_names.contains(object.as_str()) {
                self.reporter.type_error(
                    ErrorId(3517),
                    literal.span,
                    format!("Unknown data object \"{object}\"."),
                )?;
            }
        } else if self.names.is_verbatim_function(function) {
            let empty = if literal.value.is_unlimited() {
                literal.value.builtin_string_literal_value().is_empty()
            } else {
                literal.value.value() == U256::ZERO
            };
            if empty {
                self.reporter.type_error(
                    ErrorId(1844),
                    literal.span,
                    "The \"verbatim_*\" builtins cannot be used with empty bytecode.",
                )?;
            }
        }
        Ok(())
    }

    fn visit_switch(&mut self, switch: &Switch) -> CompileResult<()> {
        if switch.cases.len() == 1 && switch.cases[0].value.is_none() {
            self.reporter.warning(
                ErrorId(9592),
                switch.span,
                "\"switch\" statement with only a default case.",
            );
        }

        let value_type = self.expect_expression(&switch.expression)?;

        let mut seen: BTreeSet<U256> = BTreeSet::new();
        for case in &switch.cases {
            if let Some(value) = &case.value {
                let watcher = self.reporter.watcher();
                self.expect_type(value_type, value.ty, value.span)?;
                self.visit_literal(value)?;
                // there is at most one default case, so only values can clash
                if watcher.ok(self.reporter) && !seen.insert(value.value.value()) {
                    self.reporter.declaration_error(
                        ErrorId(6792),
                        case.span,
                        format!("Duplicate case \"{}\" defined.", value.format()),
                    )?;
                }
            }
            self.visit_block(&case.body)?;
        }
        Ok(())
    }

    fn visit_for_loop(&mut self, for_loop: &ForLoop) -> CompileResult<()> {
        let outer_scope = self.current_scope;
        let outer_loop_body = self.in_loop_body;

        self.in_loop_body = false;
        self.visit_block(&for_loop.pre)?;

        // condition, body and post live in the scope of pre
        self.current_scope = Some(self.scope_of(&for_loop.pre));
        self.expect_bool_expression(&for_loop.condition)?;

        self.in_loop_body = true;
        self.visit_block(&for_loop.body)?;
        self.in_loop_body = false;
        self.visit_block(&for_loop.post)?;

        self.current_scope = outer_scope;
        self.in_loop_body = outer_loop_body;
        Ok(())
    }

    fn expect_loop_body(&mut self, keyword: &str, span: Span) -> CompileResult<()> {
        if !self.in_loop_body {
            self.reporter.syntax_error(
                ErrorId(2592),
                span,
                format!("Keyword \"{keyword}\" needs to be inside a for-loop body."),
            )?;
        }
        Ok(())
    }

    fn expect_expression(&mut self, expression: &Expression) -> CompileResult<Type> {
        let types = self.visit_expression(expression)?;
        if types.len() != 1 {
            self.reporter.type_error(
                ErrorId(3950),
                expression.span(),
                format!(
                    "Expected expression to evaluate to one value, but got {} values instead.",
                    types.len()
                ),
            )?;
        }
        Ok(types
            .first()
            .copied()
            .unwrap_or(self.names.predefined().default_type))
    }

    fn expect_unlimited_string_literal(&self, literal: &Literal) -> Type {
        assert_eq!(literal.kind, LiteralKind::String);
        assert!(
            self.names
                .dialect()
                .valid_type_for_literal(LiteralKind::String, &literal.value, literal.ty, self.names)
        );
        assert!(literal.value.is_unlimited(), "builtin string argument is not unlimited");
        literal.ty
    }

    fn expect_bool_expression(&mut self, expression: &Expression) -> CompileResult<()> {
        let ty = self.expect_expression(expression)?;
        let bool_type = self.names.predefined().bool_type;
        if ty != bool_type {
            self.reporter.type_error(
                ErrorId(1733),
                expression.span(),
                format!(
                    "Expected a value of boolean type \"{}\" but got \"{}\"",
                    self.names.label_of(bool_type),
                    self.names.label_of(ty)
                ),
            )?;
        }
        Ok(())
    }

    fn check_assignment(&mut self, variable: &Identifier, value_type: Type) -> CompileResult<()> {
        assert!(!variable.name.is_empty(), "assignment target without a name");
        let watcher = self.reporter.watcher();
        let mut variable_type = None;

        let found = match self.lookup(variable.name) {
            Some((scope, binding)) => {
                self.resolve(variable, IdentifierContext::NonExternal)?;
                match binding {
                    ScopeIdentifier::Function { .. } => {
                        self.reporter
                            .type_error(ErrorId(2657), variable.span, "Assignment requires variable.")?;
                    }
                    ScopeIdentifier::Variable { .. } if !self.active_variables.contains(&(scope, variable.name)) => {
                        self.reporter.declaration_error(
                            ErrorId(1133),
                            variable.span,
                            format!("Variable {} used before it was declared.", self.names.display_label(variable.name)),
                        )?;
                    }
                    ScopeIdentifier::Variable { ty } => variable_type = Some(ty),
                }
                true
            }
            None => {
                let resolved = self.resolve(variable, IdentifierContext::LValue)?;
                if resolved {
                    variable_type = Some(self.names.predefined().default_type);
                }
                resolved
            }
        };

        if !found && watcher.ok(self.reporter) {
            self.reporter.declaration_error(
                ErrorId(4634),
                variable.span,
                "Variable not found or variable not lvalue.",
            )?;
        }
        if let Some(ty) = variable_type.filter(|ty| *ty != value_type) {
            self.reporter.type_error(
                ErrorId(9547),
                variable.span,
                format!(
                    "Assigning a value of type \"{}\" to a variable of type \"{}\".",
                    self.names.label_of(value_type),
                    self.names.label_of(ty)
                ),
            )?;
        }

        assert!(!watcher.ok(self.reporter) || variable_type.is_some());
        Ok(())
    }

    fn expect_valid_identifier(&mut self, name: NameId, span: Span) -> CompileResult<()> {
        let label = self.names.display_label(name);
        // a leading dot never makes it through the parser
        if label.ends_with('.') {
            self.reporter.syntax_error(
                ErrorId(3384),
                span,
                format!("\"{label}\" is not a valid identifier (ends with a dot)."),
            )?;
        }
        if label.contains("..") {
            self.reporter.syntax_error(
                ErrorId(7771),
                span,
                format!("\"{label}\" is not a valid identifier (contains consecutive dots)."),
            )?;
        }
        if self.names.dialect().reserved_identifier(label) {
            self.reporter.declaration_error(
                ErrorId(5017),
                span,
                format!("The identifier \"{label}\" is reserved and can not be used."),
            )?;
        }
        Ok(())
    }

    fn expect_valid_type(&mut self, ty: Type, span: Span) -> CompileResult<()> {
        if !self.names.is_type(ty) {
            self.reporter.type_error(
                ErrorId(5473),
                span,
                format!(
                    "\"{}\" is not a valid type (user defined types are not yet supported).",
                    self.names.display_label(ty)
                ),
            )?;
        }
        Ok(())
    }

    fn expect_type(&mut self, expected: Type, given: Type, span: Span) -> CompileResult<()> {
        if expected != given {
            self.reporter.type_error(
                ErrorId(3781),
                span,
                format!(
                    "Expected a value of type \"{}\" but got \"{}\".",
                    self.names.label_of(expected),
                    self.names.label_of(given)
                ),
            )?;
        }
        Ok(())
    }

    /// Checks a call name against the instructions of the default EVM
    /// version. Returns true if an error was reported, which happens for
    /// instructions the configured version lacks and for `pc`.
    fn validate_instructions(&mut self, function_name: &Identifier) -> CompileResult<bool> {
        let name = function_name.name;
        if self.names.is_derived_name(name) && !self.names.is_verbatim_function(name) {
            return Ok(false);
        }
        let instruction = Instruction::from_name(self.names.label_of(name))
            .filter(|instruction| is_builtin_instruction(*instruction, EvmVersion::default()));
        match instruction {
            Some(instruction) => self.validate_instruction(instruction, function_name.span),
            None => Ok(false),
        }
    }

    fn validate_instruction(&mut self, instruction: Instruction, span: Span) -> CompileResult<bool> {
        let gated = VERSION_GATED
            .iter()
            .find(|(gated, available, ..)| *gated == instruction && !available(self.evm_version));
        if let Some((_, _, code, fork)) = gated {
            self.reporter.type_error(
                ErrorId(*code),
                span,
                format!(
                    "The \"{}\" instruction is only available for {fork}-compatible VMs \
                     (you are currently compiling for \"{}\").",
                    instruction.name(),
                    self.evm_version
                ),
            )?;
            return Ok(true);
        }
        if instruction == Instruction::Pc {
            self.reporter.syntax_error(
                ErrorId(2450),
                span,
                "PC instruction is a low-level EVM feature. Because of that PC is disallowed in strict assembly.",
            )?;
            return Ok(true);
        }
        Ok(false)
    }

    fn resolve(&mut self, identifier: &Identifier, context: IdentifierContext) -> CompileResult<bool> {
        let inside_function = self.inside_function();
        match self.resolver.as_mut() {
            Some(resolver) => resolver.resolve(identifier, context, inside_function, self.reporter),
            None => Ok(false),
        }
    }

    fn lookup(&self, name: NameId) -> Option<(ScopeId, ScopeIdentifier)> {
        self.info
            .scopes
            .lookup(self.current_scope(), name)
            .map(|(scope, identifier)| (scope, identifier.clone()))
    }

    fn inside_function(&self) -> bool {
        self.current_scope
            .is_some_and(|scope| self.info.scopes.inside_function(scope))
    }

    fn current_scope(&self) -> ScopeId {
        self.current_scope
            .unwrap_or_else(|| panic!("no current scope"))
    }

    fn scope_of(&self, block: &Block) -> ScopeId {
        self.info
            .block_scope(block.id)
            .unwrap_or_else(|| panic!("scope requested for block {:?} but not present", block.id))
    }
}

fn join_labels(names: &NameRepository, handles: impl Iterator<Item = NameId>) -> String {
    handles
        .map(|name| names.display_label(name))
        .collect::<Vec<_>>()
        .join(", ")
}
