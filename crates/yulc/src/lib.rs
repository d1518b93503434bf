//! Yulc - semantic analysis for the Yul intermediate language
//!
//! This library checks Yul code for scoping, arity, literal and type
//! errors and keeps the interned names the rest of the toolchain works with.
//!
//! ## Architecture
//!
//! The library is organized into:
//! - **AST** (`ast/`): Tree representation and a builder for it
//! - **Dialects** (`dialect/`): Builtins, types and EVM versions of each dialect
//! - **Names** (`names/`): Name repository with derived names and label generation
//! - **Sema** (`sema/`): Scope construction and the analyzer
//! - **Driver** (`driver/`): Configuration and analysis sessions
//! - **Common** (`common/`): Shared infrastructure (errors, diagnostics, spans)

pub mod ast;
pub mod common;
pub mod dialect;
pub mod driver;
pub mod names;
pub mod sema;

// Re-exports for convenience
pub use ast::{AstBuilder, Block};
pub use common::{CompileError, CompileResult, Diagnostic, DiagnosticReporter, ErrorId, ErrorReporter, Span};
pub use dialect::{Dialect, EvmDialect, EvmVersion, GenericDialect};
pub use driver::{AnalysisConfig, AnalysisOutcome, DialectKind, Session};
pub use names::{NameId, NameRepository};
pub use sema::{AnalysisInfo, Analyzer, IdentifierContext, IdentifierResolver};
