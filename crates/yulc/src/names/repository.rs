//! Append-only name table

use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};
use tracing::{debug, trace};

use super::{NameCollector, NameId, Type};
use crate::ast::Block;
use crate::dialect::{BuiltinFunction, Dialect};

/// A builtin function as seen through name handles
#[derive(Debug, Clone)]
pub struct BuiltinHandleFunction {
    pub name: NameId,
    pub parameters: Vec<Type>,
    pub returns: Vec<Type>,
    pub data: Arc<BuiltinFunction>,
}

/// Handles the toolchain refers to directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PredefinedHandles {
    pub empty: NameId,
    /// Base of all `verbatim_<n>i_<m>o` handles
    pub verbatim: NameId,
    pub bool_type: Type,
    pub default_type: Type,
    pub datasize: NameId,
    pub dataoffset: NameId,
    pub selfdestruct: NameId,
    pub memoryguard: NameId,
    pub eq: NameId,
    pub add: NameId,
    pub sub: NameId,
    pub tstore: NameId,
    pub placeholder_zero: NameId,
    pub placeholder_one: NameId,
    pub placeholder_thirtytwo: NameId,
}

/// Per-type builtins, indexed by the position of the type in the dialect
#[derive(Debug, Clone, Default)]
struct PredefinedFunctions {
    discard: Vec<Option<NameId>>,
    equality: Vec<Option<NameId>>,
    boolean_negation: Option<NameId>,
    memory_store: Vec<Option<NameId>>,
    memory_load: Vec<Option<NameId>>,
    storage_store: Vec<Option<NameId>>,
    storage_load: Vec<Option<NameId>>,
    hash: Vec<NameId>,
}

#[derive(Debug, Clone, Copy, Default)]
struct IndexBoundaries {
    begin_types: usize,
    end_types: usize,
    begin_builtins: usize,
    end_builtins: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameEntry {
    Defined(DefaultSymbol),
    /// Alias of another handle, without a label of its own
    Derived(NameId),
}

/// Interning table for all names of a dialect
#[derive(Debug, Clone)]
pub struct NameRepository {
    dialect: Arc<dyn Dialect>,
    dialect_types: Vec<(Type, String)>,
    builtin_functions: FxHashMap<NameId, BuiltinHandleFunction>,
    predefined_functions: PredefinedFunctions,
    labels: StringInterner<DefaultBackend>,
    names: Vec<NameEntry>,
    /// First handle defined with a given label
    label_owners: FxHashMap<DefaultSymbol, NameId>,
    verbatim_names: FxHashMap<(usize, usize), NameId>,
    predefined: PredefinedHandles,
    boundaries: IndexBoundaries,
    ghosts: usize,
}

impl NameRepository {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        let mut repository = Self {
            dialect,
            dialect_types: Vec::new(),
            builtin_functions: FxHashMap::default(),
            predefined_functions: PredefinedFunctions::default(),
            labels: StringInterner::new(),
            names: Vec::new(),
            label_owners: FxHashMap::default(),
            verbatim_names: FxHashMap::default(),
            predefined: PredefinedHandles::default(),
            boundaries: IndexBoundaries::default(),
            ghosts: 0,
        };
        repository.push_label("");

        let dialect = Arc::clone(&repository.dialect);
        for ty in dialect.types() {
            if ty.is_empty() {
                repository.boundaries.begin_types = 0;
                repository.dialect_types.push((NameId::EMPTY, String::new()));
            } else {
                repository.boundaries.begin_types = 1;
                let name = repository.define_name(ty);
                repository.dialect_types.push((name, ty.clone()));
            }
        }
        repository.boundaries.end_types = repository.names.len();

        // While the builtin range is still empty every builtin gets a fresh handle.
        repository.boundaries.begin_builtins = repository.names.len();
        repository.boundaries.end_builtins = repository.names.len();
        let builtin_names = dialect.builtin_names();
        repository.predefined.verbatim = repository.define_name("@ verbatim");
        for label in builtin_names.iter().filter(|label| !label.is_empty()) {
            let name = repository.define_name(label);
            if let Some(function) = dialect.builtin(label) {
                let converted = repository.convert_builtin_function(name, function);
                repository.builtin_functions.insert(name, converted);
            }
        }
        repository.boundaries.end_builtins = repository.names.len();

        repository.predefined.bool_type = repository.name_of_type(dialect.bool_type());
        repository.predefined.default_type = repository.name_of_type(dialect.default_type());
        let mut builtin_or_define = |label: &str| {
            if builtin_names.contains(label) {
                repository.name_of_builtin(label)
            } else {
                repository.define_name(label)
            }
        };
        let dataoffset = builtin_or_define("dataoffset");
        let datasize = builtin_or_define("datasize");
        let selfdestruct = builtin_or_define("selfdestruct");
        let tstore = builtin_or_define("tstore");
        let memoryguard = builtin_or_define("memoryguard");
        let eq = builtin_or_define("eq");
        let add = builtin_or_define("add");
        let sub = builtin_or_define("sub");
        repository.predefined = PredefinedHandles {
            dataoffset,
            datasize,
            selfdestruct,
            tstore,
            memoryguard,
            eq,
            add,
            sub,
            ..repository.predefined
        };

        repository.fill_predefined_functions();

        repository.predefined.placeholder_zero = repository.define_name("@ 0");
        repository.predefined.placeholder_one = repository.define_name("@ 1");
        repository.predefined.placeholder_thirtytwo = repository.define_name("@ 32");

        debug!(
            dialect = repository.dialect.name(),
            types = repository.dialect_types.len(),
            builtins = repository.builtin_functions.len(),
            names = repository.names.len(),
            "name repository constructed"
        );
        repository
    }

    fn fill_predefined_functions(&mut self) {
        let mut types = self.dialect_types.clone();
        if types.is_empty() {
            types.push((NameId::EMPTY, String::new()));
        }

        let dialect = Arc::clone(&self.dialect);
        let resolve = |function: Option<Arc<BuiltinFunction>>| function.map(|f| self.name_of_builtin(&f.name));
        let mut functions = PredefinedFunctions::default();
        for (_, label) in &types {
            functions.discard.push(resolve(dialect.discard_function(label)));
            functions.equality.push(resolve(dialect.equality_function(label)));
            functions.boolean_negation = resolve(dialect.boolean_negation_function());
            functions.memory_store.push(resolve(dialect.memory_store_function(label)));
            functions.memory_load.push(resolve(dialect.memory_load_function(label)));
            functions.storage_store.push(resolve(dialect.storage_store_function(label)));
            functions.storage_load.push(resolve(dialect.storage_load_function(label)));
            functions.hash.push(self.name_of_builtin(dialect.hash_function(label)));
        }
        self.predefined_functions = functions;
    }

    /// Handle of `label`, interning it on first use. Verbatim builtins are
    /// deduplicated by their argument and return counts.
    pub fn define_name(&mut self, label: &str) -> NameId {
        if let Some(builtin) = self.dialect.builtin(label) {
            if builtin.name.starts_with("verbatim") {
                let key = (builtin.parameters.len(), builtin.returns.len());
                if let Some(name) = self.verbatim_names.get(&key) {
                    return *name;
                }
                let name = self.derive_name(self.predefined.verbatim);
                let converted = self.convert_builtin_function(name, builtin);
                self.builtin_functions.insert(name, converted);
                self.verbatim_names.insert(key, name);
                trace!(%name, label, "registered verbatim builtin");
                return name;
            }
            let existing = self.name_of_builtin(label);
            if !existing.is_empty() {
                return existing;
            }
            return self.push_label(label);
        }

        if label.is_empty() && !self.names.is_empty() {
            return NameId::EMPTY;
        }
        let existing = self.name_of_label(label);
        if !existing.is_empty() {
            return existing;
        }
        self.push_label(label)
    }

    /// New handle aliasing `base`; its label is assigned by `generate_labels`
    pub fn derive_name(&mut self, base: NameId) -> NameId {
        self.assert_within_bounds(base);
        let name = NameId::from_index(self.names.len());
        self.names.push(NameEntry::Derived(base));
        name
    }

    /// Fresh compiler-internal name `GHOST[n]`
    pub fn add_ghost(&mut self) -> NameId {
        let label = format!("GHOST[{}]", self.ghosts);
        self.ghosts += 1;
        self.define_name(&label)
    }

    fn push_label(&mut self, label: &str) -> NameId {
        let symbol = self.labels.get_or_intern(label);
        let name = NameId::from_index(self.names.len());
        self.names.push(NameEntry::Defined(symbol));
        self.label_owners.entry(symbol).or_insert(name);
        name
    }

    fn resolve(&self, symbol: DefaultSymbol) -> &str {
        self.labels
            .resolve(symbol)
            .unwrap_or_else(|| panic!("label symbol {symbol:?} is not interned"))
    }

    fn assert_within_bounds(&self, name: NameId) {
        assert!(
            name.index() < self.names.len(),
            "name {name} exceeds repository size, probably stems from another instance"
        );
    }

    /// Label of `name`. Derived names only have one after label generation,
    /// except verbatim builtins which report their builtin name.
    pub fn label_of(&self, name: NameId) -> &str {
        self.assert_within_bounds(name);
        match self.names[name.index()] {
            NameEntry::Defined(symbol) => self.resolve(symbol),
            NameEntry::Derived(_) => {
                assert!(self.is_verbatim_function(name), "derived name {name} was not yet labeled");
                match self.builtin(name) {
                    Some(function) => &function.data.name,
                    None => panic!("verbatim name {name} has no builtin descriptor"),
                }
            }
        }
    }

    pub fn base_name_of(&self, name: NameId) -> NameId {
        self.assert_within_bounds(name);
        let mut current = name;
        while let NameEntry::Derived(base) = self.names[current.index()] {
            current = base;
        }
        current
    }

    pub fn base_label_of(&self, name: NameId) -> &str {
        self.label_of(self.base_name_of(name))
    }

    /// Label for diagnostics. Unlabeled derived names show their base label.
    pub fn display_label(&self, name: NameId) -> &str {
        if self.is_derived_name(name) && !self.is_verbatim_function(name) {
            self.base_label_of(name)
        } else {
            self.label_of(name)
        }
    }

    pub fn is_derived_name(&self, name: NameId) -> bool {
        self.assert_within_bounds(name);
        matches!(self.names[name.index()], NameEntry::Derived(_))
    }

    pub fn builtin(&self, name: NameId) -> Option<&BuiltinHandleFunction> {
        if !self.is_builtin_name(name) {
            return None;
        }
        self.builtin_functions.get(&name)
    }

    fn typed_predefined_function(&self, ty: Type, table: &[Option<NameId>]) -> Option<&BuiltinHandleFunction> {
        self.assert_within_bounds(ty);
        let index = self.index_of_type(ty);
        assert!(index < table.len(), "type {ty} has no predefined function entry");
        table[index].and_then(|name| self.builtin(name))
    }

    pub fn discard_function(&self, ty: Type) -> Option<&BuiltinHandleFunction> {
        self.typed_predefined_function(ty, &self.predefined_functions.discard)
    }

    pub fn equality_function(&self, ty: Type) -> Option<&BuiltinHandleFunction> {
        self.typed_predefined_function(ty, &self.predefined_functions.equality)
    }

    pub fn boolean_negation_function(&self) -> Option<&BuiltinHandleFunction> {
        self.predefined_functions
            .boolean_negation
            .and_then(|name| self.builtin(name))
    }

    pub fn memory_load_function(&self, ty: Type) -> Option<&BuiltinHandleFunction> {
        self.typed_predefined_function(ty, &self.predefined_functions.memory_load)
    }

    pub fn memory_store_function(&self, ty: Type) -> Option<&BuiltinHandleFunction> {
        self.typed_predefined_function(ty, &self.predefined_functions.memory_store)
    }

    pub fn storage_load_function(&self, ty: Type) -> Option<&BuiltinHandleFunction> {
        self.typed_predefined_function(ty, &self.predefined_functions.storage_load)
    }

    pub fn storage_store_function(&self, ty: Type) -> Option<&BuiltinHandleFunction> {
        self.typed_predefined_function(ty, &self.predefined_functions.storage_store)
    }

    /// Hash builtin for `ty`, the empty name if the dialect has none
    pub fn hash_function(&self, ty: Type) -> NameId {
        self.assert_within_bounds(ty);
        let index = self.index_of_type(ty);
        self.predefined_functions.hash[index]
    }

    pub fn is_builtin_name(&self, name: NameId) -> bool {
        let base = self.base_name_of(name).index();
        base >= self.boundaries.begin_builtins && base < self.boundaries.end_builtins
    }

    pub fn is_type(&self, name: NameId) -> bool {
        let index = name.index();
        index >= self.boundaries.begin_types && index < self.boundaries.end_types
    }

    pub fn is_verbatim_function(&self, name: NameId) -> bool {
        self.base_name_of(name) == self.predefined.verbatim
    }

    /// Handle that first defined `label`. Names unified with it later by
    /// [`generate_labels`](Self::generate_labels) are not returned.
    pub fn name_of_label(&self, label: &str) -> NameId {
        self.labels
            .get(label)
            .and_then(|symbol| self.label_owners.get(&symbol))
            .copied()
            .unwrap_or(NameId::EMPTY)
    }

    pub fn name_of_builtin(&self, label: &str) -> NameId {
        (self.boundaries.begin_builtins..self.boundaries.end_builtins)
            .map(NameId::from_index)
            .find(|name| self.base_label_of(*name) == label)
            .unwrap_or(NameId::EMPTY)
    }

    pub fn name_of_type(&self, label: &str) -> Type {
        self.dialect_types
            .iter()
            .find(|(_, ty)| ty == label)
            .map_or(NameId::EMPTY, |(name, _)| *name)
    }

    fn index_of_type(&self, ty: Type) -> usize {
        if self.dialect_types.is_empty() {
            return 0;
        }
        self.dialect_types
            .iter()
            .position(|(name, _)| *name == ty)
            .unwrap_or_else(|| panic!("{ty} is not a type of this dialect"))
    }

    fn convert_builtin_function(&self, name: NameId, function: Arc<BuiltinFunction>) -> BuiltinHandleFunction {
        BuiltinHandleFunction {
            name,
            parameters: function.parameters.iter().map(|ty| self.name_of_type(ty)).collect(),
            returns: function.returns.iter().map(|ty| self.name_of_type(ty)).collect(),
            data: function,
        }
    }

    pub fn predefined(&self) -> &PredefinedHandles {
        &self.predefined
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn is_evm_dialect(&self) -> bool {
        self.dialect.evm_version().is_some()
    }

    /// Number of handles allocated so far
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Never true: the empty name is always present
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Give every derived name used in `block` a label of its own.
    ///
    /// Labels are the base label, bumped with `_1`, `_2`, ... until they are
    /// neither used in the block, a builtin, nor contained in `reserved`.
    /// A candidate that matches a label defined outside the block makes the
    /// derived name an alias of that label's entry.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn generate_labels(&mut self, block: &Block, reserved: &BTreeSet<String>) {
        let names = NameCollector::collect(block);

        let mut used: BTreeSet<String> = (0..self.boundaries.end_builtins)
            .map(|index| self.label_of(NameId::from_index(index)).to_string())
            .collect();
        for name in &names {
            if !self.is_derived_name(*name) || self.is_verbatim_function(*name) {
                used.insert(self.label_of(*name).to_string());
            }
        }

        let mut generated = Vec::new();
        for &name in names.range(NameId::from_index(self.boundaries.end_builtins)..) {
            if !self.is_derived_name(name) || self.is_verbatim_function(name) {
                continue;
            }
            let base_label = self.base_label_of(name).to_string();
            let mut label = base_label.clone();
            let mut bump = 1;
            while used.contains(&label) || reserved.contains(&label) {
                label = format!("{base_label}_{bump}");
                bump += 1;
            }

            let existing = self.name_of_label(&label);
            if existing.is_empty() {
                generated.push((label.clone(), name));
            } else {
                trace!(%name, %existing, label, "unified derived name with existing label");
                self.names[name.index()] = self.names[existing.index()];
            }
            used.insert(label);
        }

        debug!(generated = generated.len(), "generated labels");
        for (label, name) in generated {
            let symbol = self.labels.get_or_intern(&label);
            self.names[name.index()] = NameEntry::Defined(symbol);
            self.label_owners.entry(symbol).or_insert(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstBuilder;
    use crate::dialect::{EvmDialect, EvmVersion, GenericDialect};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn evm() -> NameRepository {
        NameRepository::new(Arc::new(EvmDialect::with_objects(EvmVersion::default())))
    }

    fn generic() -> NameRepository {
        NameRepository::new(Arc::new(GenericDialect::new()))
    }

    #[test]
    fn test_repository_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NameRepository>();
    }

    #[test]
    fn test_empty_name_is_first() {
        let repository = evm();
        assert_eq!(repository.label_of(NameId::EMPTY), "");
        assert_eq!(repository.predefined().empty, NameId::EMPTY);
    }

    #[test]
    fn test_define_name_is_stable() {
        let mut repository = generic();
        let x = repository.define_name("x");
        let y = repository.define_name("y");
        assert_ne!(x, y);
        assert_eq!(repository.define_name("x"), x);
        assert_eq!(repository.label_of(x), "x");
        assert_eq!(repository.name_of_label("y"), y);
        assert_eq!(repository.name_of_label("z"), NameId::EMPTY);
        assert_eq!(repository.define_name(""), NameId::EMPTY);
    }

    #[test]
    fn test_untyped_dialect_types() {
        let repository = evm();
        let predefined = repository.predefined();
        assert_eq!(predefined.default_type, NameId::EMPTY);
        assert_eq!(predefined.bool_type, NameId::EMPTY);
        assert!(repository.is_type(NameId::EMPTY));
        assert!(repository.discard_function(NameId::EMPTY).is_some());
        assert!(repository.is_evm_dialect());
    }

    #[test]
    fn test_typed_dialect_types() {
        let repository = generic();
        let predefined = repository.predefined();
        assert_eq!(repository.label_of(predefined.default_type), "u256");
        assert_eq!(repository.label_of(predefined.bool_type), "bool");
        assert!(repository.is_type(predefined.default_type));
        assert!(!repository.is_type(NameId::EMPTY));
        assert!(repository.discard_function(predefined.default_type).is_none());
        assert_eq!(repository.hash_function(predefined.bool_type), NameId::EMPTY);
        assert!(!repository.is_evm_dialect());
    }

    #[test]
    #[should_panic(expected = "is not a type of this dialect")]
    fn test_predefined_lookup_rejects_non_types() {
        let mut repository = generic();
        let x = repository.define_name("x");
        let _ = repository.discard_function(x);
    }

    #[test]
    fn test_builtins_resolve_to_descriptors() {
        let mut repository = evm();
        let add = repository.define_name("add");
        assert_eq!(add, repository.predefined().add);
        assert!(repository.is_builtin_name(add));
        let function = repository.builtin(add).unwrap();
        assert_eq!(function.parameters.len(), 2);
        assert_eq!(function.returns.len(), 1);
        let mstore = repository.name_of_builtin("mstore");
        assert_eq!(repository.define_name("mstore"), mstore);

        let user = repository.define_name("my_add");
        assert!(!repository.is_builtin_name(user));
        assert!(repository.builtin(user).is_none());
    }

    #[test]
    fn test_missing_predefined_builtins_get_plain_handles() {
        let repository = evm_without_objects();
        let datasize = repository.predefined().datasize;
        assert_ne!(datasize, NameId::EMPTY);
        assert_eq!(repository.label_of(datasize), "datasize");
        assert!(repository.builtin(datasize).is_none());
    }

    fn evm_without_objects() -> NameRepository {
        NameRepository::new(Arc::new(EvmDialect::strict_assembly(EvmVersion::default())))
    }

    #[test]
    fn test_verbatim_names_dedupe_by_arity() {
        let mut repository = evm();
        let first = repository.define_name("verbatim_2i_1o");
        let second = repository.define_name("verbatim_2i_1o");
        let other = repository.define_name("verbatim_1i_1o");
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(repository.is_derived_name(first));
        assert!(repository.is_verbatim_function(first));
        assert!(repository.is_builtin_name(first));
        assert_eq!(repository.label_of(first), "verbatim_2i_1o");
        assert_eq!(repository.builtin(first).unwrap().parameters.len(), 3);
    }

    #[test]
    fn test_ghosts_are_unique() {
        let mut repository = generic();
        let first = repository.add_ghost();
        let second = repository.add_ghost();
        assert_ne!(first, second);
        assert_eq!(repository.label_of(first), "GHOST[0]");
        assert_eq!(repository.label_of(second), "GHOST[1]");
    }

    #[test]
    fn test_placeholders_are_defined_last() {
        let repository = generic();
        let predefined = repository.predefined();
        assert_eq!(repository.label_of(predefined.placeholder_zero), "@ 0");
        assert_eq!(repository.label_of(predefined.placeholder_one), "@ 1");
        assert_eq!(repository.label_of(predefined.placeholder_thirtytwo), "@ 32");
        assert_eq!(predefined.placeholder_thirtytwo.index(), repository.len() - 1);
    }

    #[test]
    #[should_panic(expected = "was not yet labeled")]
    fn test_label_of_unlabeled_derived_name_panics() {
        let mut repository = generic();
        let x = repository.define_name("x");
        let derived = repository.derive_name(x);
        let _ = repository.label_of(derived);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut repository = generic();
        let x = repository.define_name("x");
        let mut copy = repository.clone();
        let y = copy.define_name("y");
        assert_eq!(copy.label_of(x), "x");
        assert_eq!(repository.name_of_label("y"), NameId::EMPTY);
        assert_eq!(copy.name_of_label("y"), y);
    }

    #[test]
    fn test_generate_labels_bumps_past_used_labels() {
        let mut repository = generic();
        let x = repository.define_name("x");
        let x_1 = repository.define_name("x_1");
        let derived = repository.derive_name(x);

        let block = {
            let mut b = AstBuilder::new(&mut repository);
            let decl_x = b.let_var("x", None);
            let decl_x_1 = b.let_var("x_1", None);
            let decl_derived = b.let_names(vec![derived], None);
            b.block(vec![decl_x, decl_x_1, decl_derived])
        };
        repository.generate_labels(&block, &BTreeSet::new());

        assert_eq!(repository.label_of(x), "x");
        assert_eq!(repository.label_of(x_1), "x_1");
        assert_eq!(repository.label_of(derived), "x_2");
        assert!(!repository.is_derived_name(derived));
        assert_eq!(repository.name_of_label("x_2"), derived);
    }

    #[test]
    fn test_generate_labels_respects_reserved_labels() {
        let mut repository = generic();
        let x = repository.define_name("x");
        let derived = repository.derive_name(x);
        let block = {
            let mut b = AstBuilder::new(&mut repository);
            let decl = b.let_names(vec![derived], None);
            b.block(vec![decl])
        };
        let reserved: BTreeSet<String> = ["x".to_string(), "x_1".to_string()].into();
        repository.generate_labels(&block, &reserved);
        assert_eq!(repository.label_of(derived), "x_2");
    }

    #[test]
    fn test_generate_labels_unifies_with_label_defined_outside_block() {
        let mut repository = generic();
        let x = repository.define_name("x");
        let outside = repository.define_name("x_1");
        let derived = repository.derive_name(x);
        let block = {
            let mut b = AstBuilder::new(&mut repository);
            let decl_x = b.let_var("x", None);
            let decl = b.let_names(vec![derived], None);
            b.block(vec![decl_x, decl])
        };
        repository.generate_labels(&block, &BTreeSet::new());
        assert_eq!(repository.label_of(derived), "x_1");
        // the label still maps back to its first owner only
        assert_eq!(repository.name_of_label("x_1"), outside);
        assert_ne!(repository.name_of_label("x_1"), derived);
    }

    #[test]
    fn test_generate_labels_avoids_builtin_labels() {
        let mut repository = evm();
        let addr = repository.define_name("addr");
        let derived = repository.derive_name(addr);
        let block = {
            let mut b = AstBuilder::new(&mut repository);
            let decl = b.let_names(vec![derived], None);
            b.block(vec![decl])
        };
        let reserved: BTreeSet<String> = ["addr".to_string()].into();
        repository.generate_labels(&block, &reserved);
        assert_eq!(repository.label_of(derived), "addr_1");
        assert!(repository.builtin(repository.name_of_label("add")).is_some());
    }

    proptest! {
        #[test]
        fn prop_base_name_is_idempotent(ops in proptest::collection::vec((0u8..3, 0usize..16), 1..64)) {
            let mut repository = generic();
            for (op, pick) in ops {
                let target = NameId::from_index(pick % repository.len());
                match op {
                    0 => { repository.define_name(&format!("n{pick}")); }
                    1 => { repository.derive_name(target); }
                    _ => { repository.add_ghost(); }
                }
            }
            for index in 0..repository.len() {
                let name = NameId::from_index(index);
                let base = repository.base_name_of(name);
                prop_assert_eq!(repository.base_name_of(base), base);
                prop_assert!(!repository.is_derived_name(base));
            }
        }

        #[test]
        fn prop_define_name_is_stable(labels in proptest::collection::vec("[a-z]{1,4}(_[0-9])?", 1..32)) {
            let mut repository = evm();
            let first: Vec<NameId> = labels.iter().map(|label| repository.define_name(label)).collect();
            let second: Vec<NameId> = labels.iter().map(|label| repository.define_name(label)).collect();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_generated_labels_are_distinct(
            bases in proptest::collection::vec("[a-c]", 1..6),
            derivations in proptest::collection::vec(0usize..6, 1..12),
            reserved in proptest::collection::btree_set("[a-c](_[1-3])?", 0..4),
        ) {
            let mut repository = evm();
            let base_names: Vec<NameId> = bases.iter().map(|label| repository.define_name(label)).collect();
            let derived: Vec<NameId> = derivations
                .iter()
                .map(|pick| repository.derive_name(base_names[pick % base_names.len()]))
                .collect();
            let mut live = base_names.clone();
            live.extend(&derived);
            live.sort();
            live.dedup();

            let block = {
                let mut b = AstBuilder::new(&mut repository);
                let decl = b.let_names(live.clone(), None);
                b.block(vec![decl])
            };
            repository.generate_labels(&block, &reserved);

            let mut seen = BTreeSet::new();
            for name in &live {
                let label = repository.label_of(*name).to_string();
                prop_assert!(seen.insert(label.clone()), "label {} assigned twice", label);
            }
            for name in &derived {
                let label = repository.label_of(*name);
                prop_assert!(!reserved.contains(label));
                prop_assert!(repository.dialect().builtin(label).is_none());
            }
        }
    }
}
