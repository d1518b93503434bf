//! Side effect summaries of builtin functions

use std::ops::AddAssign;

/// Access to one kind of state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Effect {
    #[default]
    None,
    Read,
    Write,
}

/// What a builtin may do to the machine state, from the optimizer's view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SideEffects {
    /// Can be freely moved and duplicated
    pub movable: bool,
    /// Can be moved if the effects below are respected
    pub movable_apart_from_effects: bool,
    /// Can be removed if the result is unused
    pub can_be_removed: bool,
    /// Can be removed if the code does not observe `msize`
    pub can_be_removed_if_no_msize: bool,
    pub cannot_loop: bool,
    pub other_state: Effect,
    pub storage: Effect,
    pub memory: Effect,
    pub transient_storage: Effect,
}

impl SideEffects {
    pub fn worst() -> Self {
        Self {
            movable: false,
            movable_apart_from_effects: false,
            can_be_removed: false,
            can_be_removed_if_no_msize: false,
            cannot_loop: false,
            other_state: Effect::Write,
            storage: Effect::Write,
            memory: Effect::Write,
            transient_storage: Effect::Write,
        }
    }
}

impl Default for SideEffects {
    fn default() -> Self {
        Self {
            movable: true,
            movable_apart_from_effects: true,
            can_be_removed: true,
            can_be_removed_if_no_msize: true,
            cannot_loop: true,
            other_state: Effect::None,
            storage: Effect::None,
            memory: Effect::None,
            transient_storage: Effect::None,
        }
    }
}

impl AddAssign for SideEffects {
    fn add_assign(&mut self, other: Self) {
        self.movable &= other.movable;
        self.movable_apart_from_effects &= other.movable_apart_from_effects;
        self.can_be_removed &= other.can_be_removed;
        self.can_be_removed_if_no_msize &= other.can_be_removed_if_no_msize;
        self.cannot_loop &= other.cannot_loop;
        self.other_state = self.other_state.max(other.other_state);
        self.storage = self.storage.max(other.storage);
        self.memory = self.memory.max(other.memory);
        self.transient_storage = self.transient_storage.max(other.transient_storage);
    }
}

/// How a builtin may leave the current control flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlFlowSideEffects {
    pub can_terminate: bool,
    pub can_revert: bool,
    pub can_continue: bool,
}

impl Default for ControlFlowSideEffects {
    fn default() -> Self {
        Self {
            can_terminate: false,
            can_revert: false,
            can_continue: true,
        }
    }
}
