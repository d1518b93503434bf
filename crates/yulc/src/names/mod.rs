//! Identifier handles and the repository that owns their labels
//!
//! Every identifier of a program, every type and every builtin is referred
//! to by a [`NameId`]. The [`NameRepository`] maps handles back to labels,
//! knows which handles denote builtins and types, and can derive fresh
//! names that only receive a label once [`NameRepository::generate_labels`]
//! runs.

mod collector;
mod repository;

use std::fmt;

pub use collector::NameCollector;
pub use repository::{BuiltinHandleFunction, NameRepository, PredefinedHandles};

/// Handle of a name interned in a [`NameRepository`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NameId(u32);

impl NameId {
    /// The empty name, always the first handle of a repository
    pub const EMPTY: NameId = NameId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).unwrap_or_else(|_| panic!("name handle {index} exceeds u32 range"));
        NameId(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Types are names too; the repository reserves a range of handles for them
pub type Type = NameId;
