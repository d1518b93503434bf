//! Dialect trait and implementations
//!
//! A dialect decides which types exist, which builtin functions are
//! available and which identifiers are reserved. The name repository and the
//! analyzer only ever talk to a dialect through this trait.

mod evm;
mod instruction;
mod side_effects;
mod version;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::ast::{Literal, LiteralKind, LiteralValue, NodeId};
use crate::common::Span;
use crate::names::{NameRepository, Type};

pub use evm::EvmDialect;
pub(crate) use evm::is_builtin_instruction;
pub use instruction::Instruction;
pub use side_effects::{ControlFlowSideEffects, Effect, SideEffects};
pub use version::EvmVersion;

/// Description of a builtin function as provided by a dialect
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinFunction {
    pub name: String,
    /// Parameter type labels
    pub parameters: Vec<String>,
    /// Return type labels
    pub returns: Vec<String>,
    pub side_effects: SideEffects,
    pub control_flow_side_effects: ControlFlowSideEffects,
    /// This is `msize` or may contain it
    pub is_msize: bool,
    /// Empty, or one entry per argument. A kind at position `i` means the
    /// `i`-th argument must be a literal of that kind.
    pub literal_arguments: Vec<Option<LiteralKind>>,
    /// The instruction this builtin maps to, if any
    pub instruction: Option<Instruction>,
}

impl BuiltinFunction {
    pub fn new(name: impl Into<String>, parameters: usize, returns: usize) -> Self {
        Self {
            name: name.into(),
            parameters: vec![String::new(); parameters],
            returns: vec![String::new(); returns],
            side_effects: SideEffects::default(),
            control_flow_side_effects: ControlFlowSideEffects::default(),
            is_msize: false,
            literal_arguments: Vec::new(),
            instruction: None,
        }
    }

    pub fn literal_argument(&self, index: usize) -> Option<LiteralKind> {
        self.literal_arguments.get(index).copied().flatten()
    }
}

/// Trait for Yul dialects
pub trait Dialect: Send + Sync + std::fmt::Debug {
    /// Short name used in logs, e.g. "evm" or "generic"
    fn name(&self) -> &'static str;

    /// Type used when a declaration omits one
    fn default_type(&self) -> &str;

    /// Type of the literals `true` and `false`
    fn bool_type(&self) -> &str;

    /// Sorted, distinct type labels. Untyped dialects return `[""]`.
    fn types(&self) -> &[String];

    fn builtin(&self, name: &str) -> Option<Arc<BuiltinFunction>> {
        let _ = name;
        None
    }

    /// True if the identifier may not be declared by user code. Includes builtins.
    fn reserved_identifier(&self, name: &str) -> bool {
        self.builtin(name).is_some()
    }

    fn discard_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        let _ = ty;
        None
    }

    fn equality_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        let _ = ty;
        None
    }

    fn boolean_negation_function(&self) -> Option<Arc<BuiltinFunction>> {
        None
    }

    fn memory_store_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        let _ = ty;
        None
    }

    fn memory_load_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        let _ = ty;
        None
    }

    fn storage_store_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        let _ = ty;
        None
    }

    fn storage_load_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        let _ = ty;
        None
    }

    /// Name of the hash builtin for `ty`, empty if there is none
    fn hash_function(&self, ty: &str) -> &str {
        let _ = ty;
        ""
    }

    fn builtin_names(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Whether `ty` may be attached to a literal of the given kind.
    /// Only called for types that exist in the dialect.
    fn valid_type_for_literal(
        &self,
        kind: LiteralKind,
        value: &LiteralValue,
        ty: Type,
        names: &NameRepository,
    ) -> bool {
        let _ = value;
        match kind {
            LiteralKind::Boolean => ty == names.predefined().bool_type,
            _ => true,
        }
    }

    fn zero_literal_for_type(&self, ty: Type, names: &NameRepository, id: NodeId) -> Literal {
        let predefined = names.predefined();
        let (kind, value) = if ty == predefined.bool_type && ty != predefined.default_type {
            (LiteralKind::Boolean, LiteralValue::boolean(false))
        } else {
            (LiteralKind::Number, LiteralValue::number("0"))
        };
        Literal {
            id,
            span: Span::default(),
            kind,
            value,
            ty,
        }
    }

    /// Target version for dialects that compile to the EVM
    fn evm_version(&self) -> Option<EvmVersion> {
        None
    }
}

/// Typed dialect without builtins, mostly useful for testing the type rules
#[derive(Debug, Clone)]
pub struct GenericDialect {
    types: Vec<String>,
}

impl GenericDialect {
    pub fn new() -> Self {
        let mut types: Vec<String> = [
            "bool", "u8", "s8", "u32", "s32", "u64", "s64", "u128", "s128", "u256", "s256",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        types.sort();
        Self { types }
    }
}

impl Default for GenericDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn default_type(&self) -> &str {
        "u256"
    }

    fn bool_type(&self) -> &str {
        "bool"
    }

    fn types(&self) -> &[String] {
        &self.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_dialect_types_are_sorted() {
        let dialect = GenericDialect::new();
        let types = dialect.types();
        assert_eq!(types.len(), 11);
        assert!(types.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(types.iter().any(|t| t == dialect.default_type()));
        assert!(dialect.builtin("add").is_none());
        assert!(!dialect.reserved_identifier("add"));
    }

    #[test]
    fn test_literal_argument_lookup() {
        let mut function = BuiltinFunction::new("setimmutable", 3, 0);
        assert_eq!(function.literal_argument(1), None);
        function.literal_arguments = vec![None, Some(LiteralKind::String), None];
        assert_eq!(function.literal_argument(1), Some(LiteralKind::String));
        assert_eq!(function.literal_argument(0), None);
        assert_eq!(function.literal_argument(7), None);
    }
}
