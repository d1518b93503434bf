//! Structured diagnostics and the error reporter used during analysis
//!
//! User-facing problems never become `Err` values. They are appended to an
//! [`ErrorReporter`] and traversal continues. The only exception is the error
//! ceiling: once more than `error_limit` errors were reported, the reporter
//! records a final note and returns [`CompileError::ErrorLimit`], which callers
//! propagate with `?` to abort the walk.

use std::fmt;

use super::{CompileError, CompileResult, Span};

/// Default number of errors accepted before analysis is aborted
pub const DEFAULT_ERROR_LIMIT: usize = 256;
/// Default number of warnings recorded before further warnings are dropped
pub const DEFAULT_WARNING_LIMIT: usize = 256;

/// Stable numeric identifier of a diagnostic, used for filtering and suppression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorId(pub u32);

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed identifier text and other syntactic restrictions
    SyntaxError,
    /// Unknown, shadowed or not yet declared names, count mismatches
    DeclarationError,
    /// Type mismatches, invalid literals, unavailable target operations
    TypeError,
    /// Deprecations and style hints; never affects the verdict
    Warning,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::Warning => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxError => "SyntaxError",
            DiagnosticKind::DeclarationError => "DeclarationError",
            DiagnosticKind::TypeError => "TypeError",
            DiagnosticKind::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub id: ErrorId,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, id: ErrorId, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            span,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind.title(), self.id, self.message)
    }
}

/// Snapshot of the error count, used to ask "was an error reported since?"
#[derive(Debug, Clone, Copy)]
pub struct ErrorWatcher {
    baseline: usize,
}

impl ErrorWatcher {
    /// True if no error was reported after this watcher was taken
    pub fn ok(&self, reporter: &ErrorReporter) -> bool {
        reporter.error_count == self.baseline
    }
}

/// Append-only diagnostic sink with error and warning ceilings
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    error_limit: Option<usize>,
    warning_limit: Option<usize>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
            error_limit: Some(DEFAULT_ERROR_LIMIT),
            warning_limit: Some(DEFAULT_WARNING_LIMIT),
        }
    }

    /// Reporter without any ceiling
    pub fn unlimited() -> Self {
        Self {
            error_limit: None,
            warning_limit: None,
            ..Self::new()
        }
    }

    pub fn with_error_limit(mut self, limit: usize) -> Self {
        self.error_limit = Some(limit);
        self
    }

    pub fn with_warning_limit(mut self, limit: usize) -> Self {
        self.warning_limit = Some(limit);
        self
    }

    pub fn watcher(&self) -> ErrorWatcher {
        ErrorWatcher {
            baseline: self.error_count,
        }
    }

    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        id: ErrorId,
        span: Span,
        message: impl Into<String>,
    ) -> CompileResult<()> {
        if kind == DiagnosticKind::Warning {
            self.push_warning(id, span, message.into());
            return Ok(());
        }

        self.error_count += 1;
        if let Some(limit) = self.error_limit {
            if self.error_count > limit {
                self.diagnostics.push(Diagnostic::new(
                    kind,
                    ErrorId(4013),
                    span,
                    format!("There are more than {limit} errors. Aborting."),
                ));
                return Err(CompileError::ErrorLimit { limit });
            }
        }
        self.diagnostics.push(Diagnostic::new(kind, id, span, message));
        Ok(())
    }

    fn push_warning(&mut self, id: ErrorId, span: Span, message: String) {
        if let Some(limit) = self.warning_limit {
            if self.warning_count >= limit {
                if self.warning_count == limit {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::Warning,
                        ErrorId(4591),
                        span,
                        format!("There are more than {limit} warnings. Ignoring the rest."),
                    ));
                    self.warning_count += 1;
                }
                return;
            }
        }
        self.warning_count += 1;
        self.diagnostics.push(Diagnostic::new(DiagnosticKind::Warning, id, span, message));
    }

    pub fn syntax_error(&mut self, id: ErrorId, span: Span, message: impl Into<String>) -> CompileResult<()> {
        self.report(DiagnosticKind::SyntaxError, id, span, message)
    }

    pub fn declaration_error(&mut self, id: ErrorId, span: Span, message: impl Into<String>) -> CompileResult<()> {
        self.report(DiagnosticKind::DeclarationError, id, span, message)
    }

    pub fn type_error(&mut self, id: ErrorId, span: Span, message: impl Into<String>) -> CompileResult<()> {
        self.report(DiagnosticKind::TypeError, id, span, message)
    }

    pub fn warning(&mut self, id: ErrorId, span: Span, message: impl Into<String>) {
        self.push_warning(id, span, message.into());
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// True if a diagnostic of any severity with one of `ids` was recorded
    pub fn has_error(&self, ids: &[ErrorId]) -> bool {
        self.diagnostics.iter().any(|d| ids.contains(&d.id))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_tracks_errors_only() {
        let mut reporter = ErrorReporter::new();
        let watcher = reporter.watcher();
        reporter.warning(ErrorId(1), Span::default(), "just a warning");
        assert!(watcher.ok(&reporter));
        reporter
            .type_error(ErrorId(2), Span::default(), "an error")
            .unwrap();
        assert!(!watcher.ok(&reporter));
        assert!(reporter.has_errors());
        assert_eq!(reporter.errors().count(), 1);
        assert_eq!(reporter.warnings().count(), 1);
    }

    #[test]
    fn test_error_limit_aborts() {
        let mut reporter = ErrorReporter::new().with_error_limit(2);
        assert!(reporter.type_error(ErrorId(1), Span::default(), "one").is_ok());
        assert!(reporter.type_error(ErrorId(1), Span::default(), "two").is_ok());
        let err = reporter.type_error(ErrorId(1), Span::default(), "three").unwrap_err();
        assert!(matches!(err, CompileError::ErrorLimit { limit: 2 }));
        let last = reporter.diagnostics().last().unwrap();
        assert_eq!(last.id, ErrorId(4013));
        assert_eq!(last.message, "There are more than 2 errors. Aborting.");
    }

    #[test]
    fn test_warning_limit_drops_the_rest() {
        let mut reporter = ErrorReporter::new().with_warning_limit(1);
        reporter.warning(ErrorId(7), Span::default(), "first");
        reporter.warning(ErrorId(7), Span::default(), "second");
        reporter.warning(ErrorId(7), Span::default(), "third");
        let ids: Vec<_> = reporter.diagnostics().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![ErrorId(7), ErrorId(4591)]);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn test_has_error_matches_warnings_too() {
        let mut reporter = ErrorReporter::unlimited();
        reporter.warning(ErrorId(2394), Span::default(), "transient storage");
        assert!(reporter.has_error(&[ErrorId(2394)]));
        assert!(!reporter.has_error(&[ErrorId(1699)]));
    }
}
