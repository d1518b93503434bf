//! EVM dialects: plain, with object access, and typed

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{BuiltinFunction, Dialect, EvmVersion, Instruction, SideEffects};
use crate::ast::LiteralKind;

/// Builtins that exist only when object access is enabled
const OBJECT_BUILTINS: [&str; 6] = [
    "linkersymbol",
    "datasize",
    "dataoffset",
    "datacopy",
    "setimmutable",
    "loadimmutable",
];

#[derive(Debug, Clone)]
pub struct EvmDialect {
    version: EvmVersion,
    object_access: bool,
    typed: bool,
    types: Vec<String>,
    default_type: String,
    bool_type: String,
    functions: BTreeMap<String, Arc<BuiltinFunction>>,
    reserved: BTreeSet<String>,
}

impl EvmDialect {
    pub fn new(version: EvmVersion, object_access: bool) -> Self {
        let mut functions = BTreeMap::new();
        for instruction in Instruction::all() {
            if is_builtin_instruction(instruction, version) {
                let function = instruction_function(instruction);
                functions.insert(function.name.clone(), function);
            }
        }
        if object_access {
            for function in object_functions() {
                functions.insert(function.name.clone(), function);
            }
        }

        Self {
            version,
            object_access,
            typed: false,
            types: vec![String::new()],
            default_type: String::new(),
            bool_type: String::new(),
            functions: functions.into_iter().map(|(name, f)| (name, Arc::new(f))).collect(),
            reserved: reserved_identifiers(version),
        }
    }

    /// Inline assembly flavour without object access
    pub fn strict_assembly(version: EvmVersion) -> Self {
        Self::new(version, false)
    }

    /// Dialect used inside Yul objects
    pub fn with_objects(version: EvmVersion) -> Self {
        Self::new(version, true)
    }

    /// Typed variant with `u256` and `bool`
    pub fn typed(version: EvmVersion) -> Self {
        let mut dialect = Self::new(version, true);
        dialect.typed = true;
        dialect.default_type = "u256".to_string();
        dialect.bool_type = "bool".to_string();
        dialect.types = vec!["bool".to_string(), "u256".to_string()];

        let default_type = dialect.default_type.clone();
        let bool_type = dialect.bool_type.clone();
        let mut functions: BTreeMap<String, BuiltinFunction> = std::mem::take(&mut dialect.functions)
            .into_iter()
            .map(|(name, f)| (name, Arc::unwrap_or_clone(f)))
            .collect();

        for function in functions.values_mut() {
            function.parameters.fill(default_type.clone());
            function.returns.fill(default_type.clone());
        }
        for comparison in ["lt", "gt", "slt", "sgt", "eq"] {
            if let Some(function) = functions.get_mut(comparison) {
                function.returns = vec![bool_type.clone()];
            }
        }
        if let Some(not) = functions.remove("not") {
            functions.insert("bitnot".to_string(), renamed(not, "bitnot"));
        }
        if let Some(iszero) = functions.remove("iszero") {
            let mut not = renamed(iszero, "not");
            not.parameters = vec![bool_type.clone()];
            not.returns = vec![bool_type.clone()];
            functions.insert("not".to_string(), not);
        }
        for op in ["and", "or", "xor"] {
            if let Some(mut function) = functions.remove(op) {
                let bitwise = renamed(function.clone(), &format!("bit{op}"));
                function.parameters = vec![bool_type.clone(), bool_type.clone()];
                function.returns = vec![bool_type.clone()];
                functions.insert(bitwise.name.clone(), bitwise);
                functions.insert(op.to_string(), function);
            }
        }
        if let Some(pop) = functions.get("pop") {
            let mut popbool = renamed(pop.clone(), "popbool");
            popbool.parameters = vec![bool_type.clone()];
            functions.insert(popbool.name.clone(), popbool);
        }

        let mut bool_to_u256 = BuiltinFunction::new("bool_to_u256", 1, 1);
        bool_to_u256.parameters = vec![bool_type.clone()];
        bool_to_u256.returns = vec![default_type.clone()];
        functions.insert(bool_to_u256.name.clone(), bool_to_u256);

        let mut u256_to_bool = BuiltinFunction::new("u256_to_bool", 1, 1);
        u256_to_bool.parameters = vec![default_type];
        u256_to_bool.returns = vec![bool_type];
        functions.insert(u256_to_bool.name.clone(), u256_to_bool);

        dialect.functions = functions.into_iter().map(|(name, f)| (name, Arc::new(f))).collect();
        dialect
    }

    pub fn version(&self) -> EvmVersion {
        self.version
    }

    pub fn provides_object_access(&self) -> bool {
        self.object_access
    }

    pub fn is_typed(&self) -> bool {
        self.typed
    }

    /// Builtin lookup that ignores the verbatim family
    fn builtin_no_verbatim(&self, name: &str) -> Option<Arc<BuiltinFunction>> {
        self.functions.get(name).map(Arc::clone)
    }

    /// `verbatim_<n>i_<m>o`: raw bytecode taking `n` stack arguments and
    /// producing `m` values
    pub fn verbatim_function(&self, arguments: usize, returns: usize) -> BuiltinFunction {
        let mut function = BuiltinFunction::new(format!("verbatim_{arguments}i_{returns}o"), 1 + arguments, returns);
        function.parameters.fill(self.default_type.clone());
        function.returns.fill(self.default_type.clone());
        function.side_effects = SideEffects::worst();
        function.is_msize = true;
        function.literal_arguments = std::iter::once(Some(LiteralKind::String))
            .chain(std::iter::repeat_n(None, arguments))
            .collect();
        function
    }
}

impl Dialect for EvmDialect {
    fn name(&self) -> &'static str {
        match (self.typed, self.object_access) {
            (true, _) => "evm-typed",
            (false, true) => "evm-objects",
            (false, false) => "evm",
        }
    }

    fn default_type(&self) -> &str {
        &self.default_type
    }

    fn bool_type(&self) -> &str {
        &self.bool_type
    }

    fn types(&self) -> &[String] {
        &self.types
    }

    fn builtin(&self, name: &str) -> Option<Arc<BuiltinFunction>> {
        if self.object_access {
            if let Some((arguments, returns)) = parse_verbatim_name(name) {
                return Some(Arc::new(self.verbatim_function(arguments, returns)));
            }
        }
        self.builtin_no_verbatim(name)
    }

    fn reserved_identifier(&self, name: &str) -> bool {
        if self.object_access && name.starts_with("verbatim") {
            return true;
        }
        self.reserved.contains(name)
    }

    fn discard_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        if self.typed && ty == self.bool_type {
            return self.builtin_no_verbatim("popbool");
        }
        self.builtin_no_verbatim("pop")
    }

    fn equality_function(&self, ty: &str) -> Option<Arc<BuiltinFunction>> {
        if self.typed && ty == self.bool_type {
            return None;
        }
        self.builtin_no_verbatim("eq")
    }

    fn boolean_negation_function(&self) -> Option<Arc<BuiltinFunction>> {
        self.builtin_no_verbatim(if self.typed { "not" } else { "iszero" })
    }

    fn memory_store_function(&self, _ty: &str) -> Option<Arc<BuiltinFunction>> {
        self.builtin_no_verbatim("mstore")
    }

    fn memory_load_function(&self, _ty: &str) -> Option<Arc<BuiltinFunction>> {
        self.builtin_no_verbatim("mload")
    }

    fn storage_store_function(&self, _ty: &str) -> Option<Arc<BuiltinFunction>> {
        self.builtin_no_verbatim("sstore")
    }

    fn storage_load_function(&self, _ty: &str) -> Option<Arc<BuiltinFunction>> {
        self.builtin_no_verbatim("sload")
    }

    fn hash_function(&self, _ty: &str) -> &str {
        "keccak256"
    }

    fn builtin_names(&self) -> BTreeSet<String> {
        self.functions
            .keys()
            .cloned()
            .chain(std::iter::once("verbatim".to_string()))
            .collect()
    }

    fn evm_version(&self) -> Option<EvmVersion> {
        Some(self.version)
    }
}

/// Whether an instruction is exposed as a builtin function on `version`.
/// Stack manipulation and jumps are never callable.
pub(crate) fn is_builtin_instruction(instruction: Instruction, version: EvmVersion) -> bool {
    if instruction.is_push() || instruction.is_dup() || instruction.is_swap() || instruction.is_jump() {
        return false;
    }
    if !version.has_opcode(instruction) {
        return false;
    }
    match instruction {
        Instruction::Prevrandao => version.has_prev_randao(),
        Instruction::Difficulty => !version.has_prev_randao(),
        _ => true,
    }
}

fn instruction_function(instruction: Instruction) -> BuiltinFunction {
    let mut function = BuiltinFunction::new(instruction.name(), instruction.args(), instruction.rets());
    function.side_effects = instruction.side_effects();
    function.control_flow_side_effects = instruction.control_flow_side_effects();
    function.is_msize = instruction == Instruction::MSize;
    function.instruction = Some(instruction);
    function
}

fn object_functions() -> Vec<BuiltinFunction> {
    let with_literals = |name: &str, params: usize, rets: usize, literals: Vec<Option<LiteralKind>>| {
        let mut function = BuiltinFunction::new(name, params, rets);
        function.literal_arguments = literals;
        function
    };

    let mut datacopy = BuiltinFunction::new("datacopy", 3, 0);
    datacopy.side_effects = SideEffects {
        movable: false,
        can_be_removed: false,
        can_be_removed_if_no_msize: false,
        memory: super::Effect::Write,
        ..SideEffects::default()
    };

    let mut setimmutable = with_literals("setimmutable", 3, 0, vec![None, Some(LiteralKind::String), None]);
    setimmutable.side_effects = SideEffects {
        movable_apart_from_effects: false,
        ..datacopy.side_effects
    };

    vec![
        with_literals("linkersymbol", 1, 1, vec![Some(LiteralKind::String)]),
        with_literals("memoryguard", 1, 1, vec![Some(LiteralKind::Number)]),
        with_literals("datasize", 1, 1, vec![Some(LiteralKind::String)]),
        with_literals("dataoffset", 1, 1, vec![Some(LiteralKind::String)]),
        datacopy,
        setimmutable,
        with_literals("loadimmutable", 1, 1, vec![Some(LiteralKind::String)]),
    ]
}

/// Instruction names plus object builtins. Opcodes introduced by a later fork
/// than `version` stay usable as identifiers.
fn reserved_identifiers(version: EvmVersion) -> BTreeSet<String> {
    let not_yet_introduced = |instruction: Instruction| match instruction {
        Instruction::BaseFee => !version.has_base_fee(),
        Instruction::Prevrandao => !version.has_prev_randao(),
        Instruction::BlobHash => !version.has_blob_hash(),
        Instruction::BlobBaseFee => !version.has_blob_base_fee(),
        Instruction::MCopy => !version.has_mcopy(),
        Instruction::TStore | Instruction::TLoad => !version.supports_transient_storage(),
        _ => false,
    };

    Instruction::all()
        .filter(|instruction| !not_yet_introduced(*instruction))
        .map(|instruction| instruction.name().into_owned())
        .chain(OBJECT_BUILTINS.iter().map(|name| (*name).to_string()))
        .collect()
}

/// Parse `verbatim_<n>i_<m>o` where both counts are one or two digits
/// without a leading zero
fn parse_verbatim_name(name: &str) -> Option<(usize, usize)> {
    let rest = name.strip_prefix("verbatim_")?;
    let (arguments, rest) = rest.split_once("i_")?;
    let returns = rest.strip_suffix('o')?;
    Some((parse_count(arguments)?, parse_count(returns)?))
}

fn parse_count(digits: &str) -> Option<usize> {
    let valid = match digits.as_bytes() {
        [d] => d.is_ascii_digit(),
        [first, second] => (b'1'..=b'9').contains(first) && second.is_ascii_digit(),
        _ => false,
    };
    if valid { digits.parse().ok() } else { None }
}

fn renamed(mut function: BuiltinFunction, name: &str) -> BuiltinFunction {
    function.name = name.to_string();
    function
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_follow_version() {
        let old = EvmDialect::strict_assembly(EvmVersion::Homestead);
        assert!(old.builtin("add").is_some());
        assert!(old.builtin("shl").is_none());
        assert!(old.builtin("difficulty").is_some());
        assert!(old.builtin("prevrandao").is_none());
        assert!(old.builtin("dup1").is_none());
        assert!(old.builtin("jump").is_none());

        let new = EvmDialect::strict_assembly(EvmVersion::Cancun);
        assert!(new.builtin("tstore").is_some());
        assert!(new.builtin("prevrandao").is_some());
        assert!(new.builtin("difficulty").is_none());
        assert!(new.builtin("datasize").is_none());
    }

    #[test]
    fn test_reserved_identifiers() {
        let dialect = EvmDialect::strict_assembly(EvmVersion::Shanghai);
        assert!(dialect.reserved_identifier("add"));
        assert!(dialect.reserved_identifier("shl"));
        assert!(dialect.reserved_identifier("dup3"));
        assert!(dialect.reserved_identifier("datasize"));
        assert!(!dialect.reserved_identifier("tstore"));
        assert!(!dialect.reserved_identifier("mcopy"));
        assert!(!dialect.reserved_identifier("verbatim_1i_1o"));
        assert!(EvmDialect::with_objects(EvmVersion::Shanghai).reserved_identifier("verbatim_x"));
    }

    #[test]
    fn test_verbatim_names() {
        assert_eq!(parse_verbatim_name("verbatim_2i_1o"), Some((2, 1)));
        assert_eq!(parse_verbatim_name("verbatim_10i_99o"), Some((10, 99)));
        assert_eq!(parse_verbatim_name("verbatim_01i_1o"), None);
        assert_eq!(parse_verbatim_name("verbatim_100i_1o"), None);
        assert_eq!(parse_verbatim_name("verbatim_i_1o"), None);
        assert_eq!(parse_verbatim_name("verbatim"), None);

        let dialect = EvmDialect::with_objects(EvmVersion::default());
        let verbatim = dialect.builtin("verbatim_2i_1o").unwrap();
        assert_eq!(verbatim.parameters.len(), 3);
        assert_eq!(verbatim.returns.len(), 1);
        assert_eq!(verbatim.literal_argument(0), Some(LiteralKind::String));
        assert_eq!(verbatim.literal_argument(1), None);
        assert!(EvmDialect::strict_assembly(EvmVersion::default()).builtin("verbatim_2i_1o").is_none());
    }

    #[test]
    fn test_typed_dialect_functions() {
        let dialect = EvmDialect::typed(EvmVersion::default());
        assert_eq!(dialect.types(), ["bool".to_string(), "u256".to_string()]);
        let lt = dialect.builtin("lt").unwrap();
        assert_eq!(lt.parameters, vec!["u256", "u256"]);
        assert_eq!(lt.returns, vec!["bool"]);
        let not = dialect.builtin("not").unwrap();
        assert_eq!(not.parameters, vec!["bool"]);
        assert!(dialect.builtin("iszero").is_none());
        assert_eq!(dialect.builtin("bitnot").unwrap().parameters, vec!["u256"]);
        assert_eq!(dialect.builtin("bitand").unwrap().returns, vec!["u256"]);
        assert_eq!(dialect.builtin("and").unwrap().parameters, vec!["bool", "bool"]);
        assert_eq!(dialect.discard_function("bool").unwrap().name, "popbool");
        assert_eq!(dialect.discard_function("u256").unwrap().name, "pop");
        assert!(dialect.equality_function("bool").is_none());
        assert_eq!(dialect.boolean_negation_function().unwrap().name, "not");
        assert_eq!(dialect.builtin("verbatim_1i_0o").unwrap().parameters, vec!["u256", "u256"]);
    }

    #[test]
    fn test_builtin_names_include_verbatim() {
        let names = EvmDialect::strict_assembly(EvmVersion::default()).builtin_names();
        assert!(names.contains("verbatim"));
        assert!(names.contains("mstore"));
        assert!(!names.contains("memoryguard"));
    }
}
