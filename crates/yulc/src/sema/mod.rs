//! Semantic analysis: scope construction and checking

mod analyzer;
mod filler;
mod info;
mod scope;

pub use analyzer::{Analyzer, IdentifierContext, IdentifierResolver};
pub use filler::ScopeFiller;
pub use info::AnalysisInfo;
pub use scope::{Scope, ScopeId, ScopeIdentifier, ScopeTree};
