//! Analysis driver: configuration and sessions
//!
//! A [`Session`] owns the name repository for one dialect and runs any
//! number of analyses against it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{AstBuilder, Block, Identifier};
use crate::common::{
    CompileError, CompileResult, DEFAULT_ERROR_LIMIT, DEFAULT_WARNING_LIMIT, Diagnostic, DiagnosticReporter,
    ErrorReporter,
};
use crate::dialect::{Dialect, EvmDialect, EvmVersion, GenericDialect};
use crate::names::NameRepository;
use crate::sema::{AnalysisInfo, Analyzer, IdentifierContext, IdentifierResolver};

type NoResolver = fn(&Identifier, IdentifierContext, bool, &mut ErrorReporter) -> CompileResult<bool>;

/// Dialect selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectKind {
    /// Typed dialect without builtins
    Generic,
    /// Untyped EVM dialect with the instruction builtins
    #[default]
    Evm,
    /// EVM dialect with data object access and `verbatim`
    EvmObjects,
    /// EVM dialect with `u256` and `bool`
    EvmTyped,
}

impl DialectKind {
    pub const ALL: [DialectKind; 4] = [
        DialectKind::Generic,
        DialectKind::Evm,
        DialectKind::EvmObjects,
        DialectKind::EvmTyped,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Generic => "generic",
            DialectKind::Evm => "evm",
            DialectKind::EvmObjects => "evm-objects",
            DialectKind::EvmTyped => "evm-typed",
        }
    }

    pub fn build(self, version: EvmVersion) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Generic => Arc::new(GenericDialect::new()),
            DialectKind::Evm => Arc::new(EvmDialect::strict_assembly(version)),
            DialectKind::EvmObjects => Arc::new(EvmDialect::with_objects(version)),
            DialectKind::EvmTyped => Arc::new(EvmDialect::typed(version)),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DialectKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CompileError::UnknownDialect(s.to_string()))
    }
}

/// Configuration options for a session
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub dialect: DialectKind,
    pub evm_version: EvmVersion,
    /// Errors accepted before analysis aborts; `None` for no limit
    pub error_limit: Option<usize>,
    /// Warnings recorded before the rest is dropped; `None` for no limit
    pub warning_limit: Option<usize>,
    /// Labels label generation must not produce
    pub reserved_labels: BTreeSet<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            evm_version: EvmVersion::default(),
            error_limit: Some(DEFAULT_ERROR_LIMIT),
            warning_limit: Some(DEFAULT_WARNING_LIMIT),
            reserved_labels: BTreeSet::new(),
        }
    }
}

/// Result of one analysis run
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub success: bool,
    pub info: AnalysisInfo,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisOutcome {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

/// Name repository and configuration shared by a series of analyses
pub struct Session {
    config: AnalysisConfig,
    names: NameRepository,
}

impl Session {
    pub fn new(config: AnalysisConfig) -> Self {
        let names = NameRepository::new(config.dialect.build(config.evm_version));
        debug!(dialect = %config.dialect, version = %config.evm_version, "session created");
        Self { config, names }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn names(&self) -> &NameRepository {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut NameRepository {
        &mut self.names
    }

    /// Builder interning into this session's repository
    pub fn builder(&mut self) -> AstBuilder<'_> {
        AstBuilder::new(&mut self.names)
    }

    fn reporter(&self) -> ErrorReporter {
        let mut reporter = ErrorReporter::unlimited();
        if let Some(limit) = self.config.error_limit {
            reporter = reporter.with_error_limit(limit);
        }
        if let Some(limit) = self.config.warning_limit {
            reporter = reporter.with_warning_limit(limit);
        }
        reporter
    }

    /// Analyze `block`; `data_names` are the data objects visible to it
    pub fn analyze<S: Into<String>>(&self, block: &Block, data_names: impl IntoIterator<Item = S>) -> AnalysisOutcome {
        self.run(block, data_names, None::<NoResolver>)
    }

    /// Like [`Session::analyze`], asking `resolver` about names the block
    /// does not bind itself
    pub fn analyze_with_resolver<S: Into<String>>(
        &self,
        block: &Block,
        data_names: impl IntoIterator<Item = S>,
        resolver: impl IdentifierResolver,
    ) -> AnalysisOutcome {
        self.run(block, data_names, Some(resolver))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(dialect = %self.config.dialect))]
    fn run<S: Into<String>>(
        &self,
        block: &Block,
        data_names: impl IntoIterator<Item = S>,
        resolver: Option<impl IdentifierResolver>,
    ) -> AnalysisOutcome {
        let mut info = AnalysisInfo::default();
        let mut reporter = self.reporter();
        let success = {
            let mut analyzer = Analyzer::new(&mut info, &mut reporter, &self.names)
                .with_data_names(data_names)
                .with_evm_version(self.config.evm_version);
            if let Some(resolver) = resolver {
                analyzer = analyzer.with_resolver(resolver);
            }
            analyzer.analyze(block)
        };
        AnalysisOutcome {
            success,
            info,
            diagnostics: reporter.into_diagnostics(),
        }
    }

    /// Label derived names used in `block`, avoiding the configured
    /// reserved labels
    pub fn generate_labels(&mut self, block: &Block) {
        self.names.generate_labels(block, &self.config.reserved_labels);
    }

    /// Render all diagnostics of `outcome` against the given source text
    pub fn render(&self, file_name: &str, source: &str, outcome: &AnalysisOutcome) -> Vec<String> {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file(file_name, source);
        outcome
            .diagnostics
            .iter()
            .map(|diagnostic| reporter.render(file_id, diagnostic))
            .collect()
    }

    /// Emit all diagnostics of `outcome` to stderr
    pub fn report(&self, file_name: &str, source: &str, outcome: &AnalysisOutcome) {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file(file_name, source);
        for diagnostic in &outcome.diagnostics {
            reporter.report_diagnostic(file_id, diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ErrorId, Span};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dialect_kind_from_str() {
        for kind in DialectKind::ALL {
            assert_eq!(kind.name().parse::<DialectKind>().unwrap(), kind);
        }
        let err = "ewasm".parse::<DialectKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown dialect 'ewasm'");
    }

    #[test]
    fn test_session_builds_configured_dialect() {
        let config = AnalysisConfig {
            dialect: DialectKind::EvmTyped,
            evm_version: "london".parse().unwrap(),
            ..AnalysisConfig::default()
        };
        let session = Session::new(config);
        assert_eq!(session.names().dialect().name(), "evm-typed");
        assert_eq!(session.names().dialect().evm_version(), Some(EvmVersion::London));
        assert!(session.names().is_evm_dialect());
    }

    #[test]
    fn test_session_analyze() {
        let mut session = Session::new(AnalysisConfig::default());
        let block = {
            let mut b = session.builder();
            let object = b.string("runtime");
            let size = b.call("datasize", vec![object]);
            let decl = b.let_var("x", Some(size));
            b.block(vec![decl])
        };
        let outcome = session.analyze(&block, ["runtime"]);
        // plain EVM dialect has no datasize
        assert!(!outcome.success);
        assert_eq!(outcome.errors().next().unwrap().id, ErrorId(4619));

        let mut session = Session::new(AnalysisConfig {
            dialect: DialectKind::EvmObjects,
            ..AnalysisConfig::default()
        });
        let block = {
            let mut b = session.builder();
            let object = b.string("runtime");
            let size = b.call("datasize", vec![object]);
            let decl = b.let_var("x", Some(size));
            b.block(vec![decl])
        };
        let outcome = session.analyze(&block, ["runtime"]);
        assert!(outcome.success, "{:?}", outcome.diagnostics);
        assert_eq!(outcome.warnings().count(), 0);
    }

    #[test]
    fn test_session_error_limit() {
        let mut session = Session::new(AnalysisConfig {
            error_limit: Some(0),
            ..AnalysisConfig::default()
        });
        let block = {
            let mut b = session.builder();
            let read = b.ident("missing");
            let first = b.let_var("a", Some(read));
            let read = b.ident("missing");
            let second = b.let_var("b", Some(read));
            b.block(vec![first, second])
        };
        let outcome = session.analyze(&block, Vec::<String>::new());
        assert!(!outcome.success);
        let ids: Vec<u32> = outcome.diagnostics.iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec![4013]);
    }

    #[test]
    fn test_session_with_resolver() {
        let mut session = Session::new(AnalysisConfig::default());
        let block = {
            let mut b = session.builder();
            let read = b.ident("external");
            let decl = b.let_var("a", Some(read));
            b.block(vec![decl])
        };
        let outcome = session.analyze_with_resolver(
            &block,
            Vec::<String>::new(),
            |_: &Identifier, context: IdentifierContext, _: bool, _: &mut ErrorReporter| {
                Ok(context == IdentifierContext::RValue)
            },
        );
        assert!(outcome.success, "{:?}", outcome.diagnostics);
    }

    #[test]
    fn test_generate_labels_uses_reserved_labels() {
        let mut session = Session::new(AnalysisConfig {
            reserved_labels: ["tmp".to_string()].into(),
            ..AnalysisConfig::default()
        });
        let base = session.names_mut().define_name("tmp");
        let derived = session.names_mut().derive_name(base);
        let block = {
            let mut b = session.builder();
            let decl = b.let_names(vec![derived], None);
            b.block(vec![decl])
        };
        session.generate_labels(&block);
        assert_eq!(session.names().label_of(derived), "tmp_1");
    }

    #[test]
    fn test_render_diagnostics() {
        let mut session = Session::new(AnalysisConfig::default());
        let source = "{ y := 1 }";
        let block = {
            let mut b = session.builder();
            b.at(Span::new(2, 3));
            let one = b.number("1");
            let assign = b.assign(&["y"], one);
            b.block(vec![assign])
        };
        let outcome = session.analyze(&block, Vec::<String>::new());
        let rendered = session.render("input.yul", source, &outcome);
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("4634"));
        assert!(rendered[0].contains("Variable not found or variable not lvalue."));
    }
}
