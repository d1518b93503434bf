//! EVM instruction table
//!
//! Only the facts the front end needs are recorded here: the textual name,
//! stack arity and a coarse side effect classification.

use std::borrow::Cow;

use super::{ControlFlowSideEffects, Effect, SideEffects};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instruction {
    Stop,
    Add,
    Mul,
    Sub,
    Div,
    SDiv,
    Mod,
    SMod,
    AddMod,
    MulMod,
    Exp,
    SignExtend,
    Lt,
    Gt,
    Slt,
    Sgt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Byte,
    Shl,
    Shr,
    Sar,
    Keccak256,
    Address,
    Balance,
    Origin,
    Caller,
    CallValue,
    CallDataLoad,
    CallDataSize,
    CallDataCopy,
    CodeSize,
    CodeCopy,
    GasPrice,
    ExtCodeSize,
    ExtCodeCopy,
    ReturnDataSize,
    ReturnDataCopy,
    ExtCodeHash,
    BlockHash,
    Coinbase,
    Timestamp,
    Number,
    Difficulty,
    Prevrandao,
    GasLimit,
    ChainId,
    SelfBalance,
    BaseFee,
    BlobHash,
    BlobBaseFee,
    Pop,
    MLoad,
    MStore,
    MStore8,
    SLoad,
    SStore,
    Jump,
    JumpI,
    Pc,
    MSize,
    Gas,
    JumpDest,
    TLoad,
    TStore,
    MCopy,
    Push0,
    /// `push1` to `push32`
    Push(u8),
    /// `dup1` to `dup16`
    Dup(u8),
    /// `swap1` to `swap16`
    Swap(u8),
    /// `log0` to `log4`
    Log(u8),
    Create,
    Call,
    CallCode,
    Return,
    DelegateCall,
    Create2,
    StaticCall,
    Revert,
    Invalid,
    SelfDestruct,
}

/// (instruction, name, arguments, return values)
const FIXED: &[(Instruction, &str, usize, usize)] = &[
    (Instruction::Stop, "stop", 0, 0),
    (Instruction::Add, "add", 2, 1),
    (Instruction::Mul, "mul", 2, 1),
    (Instruction::Sub, "sub", 2, 1),
    (Instruction::Div, "div", 2, 1),
    (Instruction::SDiv, "sdiv", 2, 1),
    (Instruction::Mod, "mod", 2, 1),
    (Instruction::SMod, "smod", 2, 1),
    (Instruction::AddMod, "addmod", 3, 1),
    (Instruction::MulMod, "mulmod", 3, 1),
    (Instruction::Exp, "exp", 2, 1),
    (Instruction::SignExtend, "signextend", 2, 1),
    (Instruction::Lt, "lt", 2, 1),
    (Instruction::Gt, "gt", 2, 1),
    (Instruction::Slt, "slt", 2, 1),
    (Instruction::Sgt, "sgt", 2, 1),
    (Instruction::Eq, "eq", 2, 1),
    (Instruction::IsZero, "iszero", 1, 1),
    (Instruction::And, "and", 2, 1),
    (Instruction::Or, "or", 2, 1),
    (Instruction::Xor, "xor", 2, 1),
    (Instruction::Not, "not", 1, 1),
    (Instruction::Byte, "byte", 2, 1),
    (Instruction::Shl, "shl", 2, 1),
    (Instruction::Shr, "shr", 2, 1),
    (Instruction::Sar, "sar", 2, 1),
    (Instruction::Keccak256, "keccak256", 2, 1),
    (Instruction::Address, "address", 0, 1),
    (Instruction::Balance, "balance", 1, 1),
    (Instruction::Origin, "origin", 0, 1),
    (Instruction::Caller, "caller", 0, 1),
    (Instruction::CallValue, "callvalue", 0, 1),
    (Instruction::CallDataLoad, "calldataload", 1, 1),
    (Instruction::CallDataSize, "calldatasize", 0, 1),
    (Instruction::CallDataCopy, "calldatacopy", 3, 0),
    (Instruction::CodeSize, "codesize", 0, 1),
    (Instruction::CodeCopy, "codecopy", 3, 0),
    (Instruction::GasPrice, "gasprice", 0, 1),
    (Instruction::ExtCodeSize, "extcodesize", 1, 1),
    (Instruction::ExtCodeCopy, "extcodecopy", 4, 0),
    (Instruction::ReturnDataSize, "returndatasize", 0, 1),
    (Instruction::ReturnDataCopy, "returndatacopy", 3, 0),
    (Instruction::ExtCodeHash, "extcodehash", 1, 1),
    (Instruction::BlockHash, "blockhash", 1, 1),
    (Instruction::Coinbase, "coinbase", 0, 1),
    (Instruction::Timestamp, "timestamp", 0, 1),
    (Instruction::Number, "number", 0, 1),
    (Instruction::Difficulty, "difficulty", 0, 1),
    (Instruction::Prevrandao, "prevrandao", 0, 1),
    (Instruction::GasLimit, "gaslimit", 0, 1),
    (Instruction::ChainId, "chainid", 0, 1),
    (Instruction::SelfBalance, "selfbalance", 0, 1),
    (Instruction::BaseFee, "basefee", 0, 1),
    (Instruction::BlobHash, "blobhash", 1, 1),
    (Instruction::BlobBaseFee, "blobbasefee", 0, 1),
    (Instruction::Pop, "pop", 1, 0),
    (Instruction::MLoad, "mload", 1, 1),
    (Instruction::MStore, "mstore", 2, 0),
    (Instruction::MStore8, "mstore8", 2, 0),
    (Instruction::SLoad, "sload", 1, 1),
    (Instruction::SStore, "sstore", 2, 0),
    (Instruction::Jump, "jump", 1, 0),
    (Instruction::JumpI, "jumpi", 2, 0),
    (Instruction::Pc, "pc", 0, 1),
    (Instruction::MSize, "msize", 0, 1),
    (Instruction::Gas, "gas", 0, 1),
    (Instruction::JumpDest, "jumpdest", 0, 0),
    (Instruction::TLoad, "tload", 1, 1),
    (Instruction::TStore, "tstore", 2, 0),
    (Instruction::MCopy, "mcopy", 3, 0),
    (Instruction::Push0, "push0", 0, 1),
    (Instruction::Create, "create", 3, 1),
    (Instruction::Call, "call", 7, 1),
    (Instruction::CallCode, "callcode", 7, 1),
    (Instruction::Return, "return", 2, 0),
    (Instruction::DelegateCall, "delegatecall", 6, 1),
    (Instruction::Create2, "create2", 4, 1),
    (Instruction::StaticCall, "staticcall", 6, 1),
    (Instruction::Revert, "revert", 2, 0),
    (Instruction::Invalid, "invalid", 0, 0),
    (Instruction::SelfDestruct, "selfdestruct", 1, 0),
];

impl Instruction {
    /// Every instruction, including the numbered push/dup/swap/log families
    pub fn all() -> impl Iterator<Item = Instruction> {
        FIXED
            .iter()
            .map(|(instruction, ..)| *instruction)
            .chain((1..=32).map(Instruction::Push))
            .chain((1..=16).map(Instruction::Dup))
            .chain((1..=16).map(Instruction::Swap))
            .chain((0..=4).map(Instruction::Log))
    }

    pub fn from_name(name: &str) -> Option<Instruction> {
        Self::all().find(|instruction| instruction.name() == name)
    }

    pub fn name(self) -> Cow<'static, str> {
        match self {
            Instruction::Push(n) => Cow::Owned(format!("push{n}")),
            Instruction::Dup(n) => Cow::Owned(format!("dup{n}")),
            Instruction::Swap(n) => Cow::Owned(format!("swap{n}")),
            Instruction::Log(n) => Cow::Owned(format!("log{n}")),
            fixed => Cow::Borrowed(Self::fixed_entry(fixed).1),
        }
    }

    /// Number of stack arguments
    pub fn args(self) -> usize {
        match self {
            Instruction::Push(_) => 0,
            Instruction::Dup(n) => n as usize,
            Instruction::Swap(n) => n as usize + 1,
            Instruction::Log(n) => n as usize + 2,
            fixed => Self::fixed_entry(fixed).2,
        }
    }

    /// Number of values left on the stack
    pub fn rets(self) -> usize {
        match self {
            Instruction::Push(_) => 1,
            Instruction::Dup(n) => n as usize + 1,
            Instruction::Swap(n) => n as usize + 1,
            Instruction::Log(_) => 0,
            fixed => Self::fixed_entry(fixed).3,
        }
    }

    fn fixed_entry(self) -> &'static (Instruction, &'static str, usize, usize) {
        FIXED
            .iter()
            .find(|(instruction, ..)| *instruction == self)
            .unwrap_or_else(|| panic!("instruction {self:?} has no fixed table entry"))
    }

    pub fn is_push(self) -> bool {
        matches!(self, Instruction::Push0 | Instruction::Push(_))
    }

    pub fn is_dup(self) -> bool {
        matches!(self, Instruction::Dup(_))
    }

    pub fn is_swap(self) -> bool {
        matches!(self, Instruction::Swap(_))
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Instruction::Jump | Instruction::JumpI | Instruction::JumpDest)
    }

    pub fn terminates_control_flow(self) -> bool {
        matches!(
            self,
            Instruction::Stop
                | Instruction::Return
                | Instruction::Revert
                | Instruction::Invalid
                | Instruction::SelfDestruct
        )
    }

    pub fn reverts(self) -> bool {
        matches!(self, Instruction::Revert | Instruction::Invalid)
    }

    pub fn control_flow_side_effects(self) -> ControlFlowSideEffects {
        if !self.terminates_control_flow() {
            return ControlFlowSideEffects::default();
        }
        ControlFlowSideEffects {
            can_terminate: !self.reverts(),
            can_revert: self.reverts(),
            can_continue: false,
        }
    }

    pub fn side_effects(self) -> SideEffects {
        use Instruction::*;

        let pure = SideEffects::default();
        let reads = |state: fn(&mut SideEffects) -> &mut Effect| {
            let mut effects = SideEffects {
                movable: false,
                ..SideEffects::default()
            };
            *state(&mut effects) = Effect::Read;
            effects
        };
        let writes = |state: fn(&mut SideEffects) -> &mut Effect| {
            let mut effects = SideEffects {
                movable: false,
                can_be_removed: false,
                can_be_removed_if_no_msize: false,
                ..SideEffects::default()
            };
            *state(&mut effects) = Effect::Write;
            effects
        };

        match self {
            Balance | ExtCodeSize | ExtCodeHash | SelfBalance | ReturnDataSize => {
                reads(|e| &mut e.other_state)
            }
            MLoad | Keccak256 => reads(|e| &mut e.memory),
            SLoad => reads(|e| &mut e.storage),
            TLoad => reads(|e| &mut e.transient_storage),
            Gas | Pc => SideEffects {
                movable_apart_from_effects: false,
                ..reads(|e| &mut e.other_state)
            },
            MSize => SideEffects {
                movable_apart_from_effects: false,
                can_be_removed_if_no_msize: true,
                ..reads(|e| &mut e.memory)
            },
            MStore | MStore8 | CallDataCopy | CodeCopy | MCopy => writes(|e| &mut e.memory),
            ExtCodeCopy | ReturnDataCopy => SideEffects {
                other_state: Effect::Read,
                ..writes(|e| &mut e.memory)
            },
            SStore => writes(|e| &mut e.storage),
            TStore => writes(|e| &mut e.transient_storage),
            Log(_) => SideEffects {
                memory: Effect::Read,
                ..writes(|e| &mut e.other_state)
            },
            Return | Revert => SideEffects {
                movable_apart_from_effects: false,
                ..writes(|e| &mut e.memory)
            },
            Stop | Invalid | SelfDestruct => SideEffects {
                movable_apart_from_effects: false,
                ..writes(|e| &mut e.other_state)
            },
            Create | Create2 | Call | CallCode | DelegateCall | StaticCall | Jump | JumpI | JumpDest => {
                SideEffects::worst()
            }
            _ => pure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_arity() {
        assert_eq!(Instruction::Add.name(), "add");
        assert_eq!(Instruction::Push(12).name(), "push12");
        assert_eq!(Instruction::Log(3).args(), 5);
        assert_eq!(Instruction::Swap(2).args(), 3);
        assert_eq!(Instruction::Call.args(), 7);
        assert_eq!(Instruction::from_name("returndatacopy"), Some(Instruction::ReturnDataCopy));
        assert_eq!(Instruction::from_name("dup16"), Some(Instruction::Dup(16)));
        assert_eq!(Instruction::from_name("frobnicate"), None);
    }

    #[test]
    fn test_every_fixed_instruction_is_listed_once() {
        let all: Vec<_> = Instruction::all().collect();
        for (instruction, ..) in FIXED {
            assert_eq!(all.iter().filter(|i| *i == instruction).count(), 1);
        }
        assert_eq!(all.len(), FIXED.len() + 32 + 16 + 16 + 5);
    }

    #[test]
    fn test_side_effect_classes() {
        assert!(Instruction::Add.side_effects().movable);
        assert_eq!(Instruction::SLoad.side_effects().storage, Effect::Read);
        assert!(!Instruction::SStore.side_effects().can_be_removed);
        assert_eq!(Instruction::Call.side_effects(), SideEffects::worst());
        assert!(!Instruction::Revert.control_flow_side_effects().can_continue);
        assert!(Instruction::Revert.control_flow_side_effects().can_revert);
        assert!(Instruction::Return.control_flow_side_effects().can_terminate);
    }
}
