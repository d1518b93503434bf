//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic as CodespanDiagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream};
use thiserror::Error;

use super::diagnostics::{Diagnostic, DiagnosticKind};

/// Unrecoverable failure of an analysis run or of its setup
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("more than {limit} errors reported, analysis aborted")]
    ErrorLimit { limit: usize },

    #[error("unknown EVM version '{0}'")]
    UnknownEvmVersion(String),

    #[error("unknown dialect '{0}'")]
    UnknownDialect(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, error: &CompileError) {
        let diagnostic = CodespanDiagnostic::error().with_message(error.to_string());
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    pub fn report_diagnostic(&self, file_id: usize, diagnostic: &Diagnostic) {
        let diagnostic = to_codespan(file_id, diagnostic);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    /// Render a diagnostic without colors, e.g. for logs and tests
    pub fn render(&self, file_id: usize, diagnostic: &Diagnostic) -> String {
        let diagnostic = to_codespan(file_id, diagnostic);
        let mut buffer = NoColor::new(Vec::new());
        if term::emit(&mut buffer, &self.config, &self.files, &diagnostic).is_err() {
            return diagnostic.message;
        }
        String::from_utf8_lossy(&buffer.into_inner()).into_owned()
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_codespan(file_id: usize, diagnostic: &Diagnostic) -> CodespanDiagnostic<usize> {
    let base = match diagnostic.kind {
        DiagnosticKind::Warning => CodespanDiagnostic::warning(),
        _ => CodespanDiagnostic::error(),
    };
    base.with_message(diagnostic.kind.title())
        .with_code(diagnostic.id.to_string())
        .with_labels(vec![
            Label::primary(file_id, diagnostic.span.range()).with_message(diagnostic.message.clone()),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ErrorId, Span};

    #[test]
    fn test_render_contains_code_and_message() {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("input.yul", "{ let x := y }");
        let diagnostic = Diagnostic::new(
            DiagnosticKind::DeclarationError,
            ErrorId(8198),
            Span::new(11, 12),
            "Identifier \"y\" not found.",
        );
        let rendered = reporter.render(file_id, &diagnostic);
        assert!(rendered.contains("DeclarationError"));
        assert!(rendered.contains("8198"));
        assert!(rendered.contains("Identifier \"y\" not found."));
    }

    #[test]
    fn test_error_display() {
        let error = CompileError::UnknownEvmVersion("frontier".into());
        assert_eq!(error.to_string(), "unknown EVM version 'frontier'");
    }
}
