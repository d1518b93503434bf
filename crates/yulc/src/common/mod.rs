//! Common infrastructure shared by the name repository and the analyzer

mod diagnostics;
mod error;
mod span;

pub use diagnostics::{
    Diagnostic, DiagnosticKind, ErrorId, ErrorReporter, ErrorWatcher, Severity, DEFAULT_ERROR_LIMIT,
    DEFAULT_WARNING_LIMIT,
};
pub use error::{CompileError, CompileResult, DiagnosticReporter};
pub use span::Span;
