//! EVM hard fork versions and the capabilities they introduce

use std::fmt;
use std::str::FromStr;

use super::Instruction;
use crate::common::CompileError;

/// Target EVM version, ordered by release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    #[default]
    Cancun,
    Prague,
}

impl EvmVersion {
    pub const ALL: [EvmVersion; 13] = [
        EvmVersion::Homestead,
        EvmVersion::TangerineWhistle,
        EvmVersion::SpuriousDragon,
        EvmVersion::Byzantium,
        EvmVersion::Constantinople,
        EvmVersion::Petersburg,
        EvmVersion::Istanbul,
        EvmVersion::Berlin,
        EvmVersion::London,
        EvmVersion::Paris,
        EvmVersion::Shanghai,
        EvmVersion::Cancun,
        EvmVersion::Prague,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
            EvmVersion::Berlin => "berlin",
            EvmVersion::London => "london",
            EvmVersion::Paris => "paris",
            EvmVersion::Shanghai => "shanghai",
            EvmVersion::Cancun => "cancun",
            EvmVersion::Prague => "prague",
        }
    }

    pub fn supports_returndata(self) -> bool {
        self >= EvmVersion::Byzantium
    }

    pub fn has_static_call(self) -> bool {
        self >= EvmVersion::Byzantium
    }

    pub fn has_bitwise_shifting(self) -> bool {
        self >= EvmVersion::Constantinople
    }

    pub fn has_create2(self) -> bool {
        self >= EvmVersion::Constantinople
    }

    pub fn has_ext_code_hash(self) -> bool {
        self >= EvmVersion::Constantinople
    }

    pub fn has_chain_id(self) -> bool {
        self >= EvmVersion::Istanbul
    }

    pub fn has_self_balance(self) -> bool {
        self >= EvmVersion::Istanbul
    }

    pub fn has_base_fee(self) -> bool {
        self >= EvmVersion::London
    }

    pub fn has_prev_randao(self) -> bool {
        self >= EvmVersion::Paris
    }

    pub fn has_push0(self) -> bool {
        self >= EvmVersion::Shanghai
    }

    pub fn has_blob_base_fee(self) -> bool {
        self >= EvmVersion::Cancun
    }

    pub fn has_blob_hash(self) -> bool {
        self >= EvmVersion::Cancun
    }

    pub fn has_mcopy(self) -> bool {
        self >= EvmVersion::Cancun
    }

    pub fn supports_transient_storage(self) -> bool {
        self >= EvmVersion::Cancun
    }

    /// Whether the opcode exists on this version. `difficulty` and
    /// `prevrandao` share an opcode, the name is chosen by the dialect.
    pub fn has_opcode(self, instruction: Instruction) -> bool {
        match instruction {
            Instruction::ReturnDataCopy | Instruction::ReturnDataSize => self.supports_returndata(),
            Instruction::StaticCall => self.has_static_call(),
            Instruction::Shl | Instruction::Shr | Instruction::Sar => self.has_bitwise_shifting(),
            Instruction::Create2 => self.has_create2(),
            Instruction::ExtCodeHash => self.has_ext_code_hash(),
            Instruction::ChainId => self.has_chain_id(),
            Instruction::SelfBalance => self.has_self_balance(),
            Instruction::BaseFee => self.has_base_fee(),
            Instruction::Push0 => self.has_push0(),
            Instruction::BlobHash => self.has_blob_hash(),
            Instruction::BlobBaseFee => self.has_blob_base_fee(),
            Instruction::MCopy => self.has_mcopy(),
            Instruction::TLoad | Instruction::TStore => self.supports_transient_storage(),
            _ => true,
        }
    }
}

impl fmt::Display for EvmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvmVersion {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvmVersion::ALL
            .into_iter()
            .find(|version| version.name() == s)
            .ok_or_else(|| CompileError::UnknownEvmVersion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        assert_eq!("london".parse::<EvmVersion>().unwrap(), EvmVersion::London);
        assert_eq!(
            "tangerineWhistle".parse::<EvmVersion>().unwrap(),
            EvmVersion::TangerineWhistle
        );
        assert!("frontier".parse::<EvmVersion>().is_err());
    }

    #[test]
    fn test_capabilities_follow_fork_order() {
        assert!(!EvmVersion::Homestead.supports_returndata());
        assert!(EvmVersion::Byzantium.supports_returndata());
        assert!(!EvmVersion::Byzantium.has_bitwise_shifting());
        assert!(EvmVersion::Petersburg.has_create2());
        assert!(!EvmVersion::Shanghai.supports_transient_storage());
        assert!(EvmVersion::default().supports_transient_storage());
        assert!(!EvmVersion::Berlin.has_opcode(Instruction::BaseFee));
        assert!(EvmVersion::Homestead.has_opcode(Instruction::Add));
    }
}
