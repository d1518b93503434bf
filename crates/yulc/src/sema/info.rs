//! Results of an analysis run

use rustc_hash::FxHashMap;

use super::scope::{Scope, ScopeId, ScopeTree};
use crate::ast::NodeId;
use crate::dialect::SideEffects;
use crate::names::Type;

/// Scopes, per-node scope assignment and inferred expression types
#[derive(Debug, Clone, Default)]
pub struct AnalysisInfo {
    pub scopes: ScopeTree,
    /// Scope opened by each block
    pub block_scopes: FxHashMap<NodeId, ScopeId>,
    /// Virtual scope holding the parameters and return variables of each
    /// function definition
    pub function_scopes: FxHashMap<NodeId, ScopeId>,
    /// Types produced by every visited expression
    pub expression_types: FxHashMap<NodeId, Vec<Type>>,
    /// Accumulated side effects of all builtin calls
    pub side_effects: SideEffects,
}

impl AnalysisInfo {
    pub fn block_scope(&self, block: NodeId) -> Option<ScopeId> {
        self.block_scopes.get(&block).copied()
    }

    pub fn function_scope(&self, function: NodeId) -> Option<ScopeId> {
        self.function_scopes.get(&function).copied()
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        self.scopes.get(id)
    }

    pub fn expression_types(&self, expression: NodeId) -> Option<&[Type]> {
        self.expression_types.get(&expression).map(Vec::as_slice)
    }
}
