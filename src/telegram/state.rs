//! Per-owner interaction state.
//!
//! One enum value per owner instead of parallel boolean sets, so a user can
//! never be simultaneously "entering a name" and "entering a block target".
//! The map is process-lifetime only and never persisted.

use dashmap::DashMap;

/// What the next plain-text message from this owner means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    /// Next message is the desired local part for a named mint.
    AwaitingName,
    /// Admin: next message carries the user id to block.
    AwaitingBlockTarget,
    /// Admin: next message carries the user id to unblock.
    AwaitingUnblockTarget,
}

/// Owners currently mid-flow. Absence means idle.
#[derive(Debug, Default)]
pub struct InteractionState {
    inner: DashMap<i64, UserState>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `state`, replacing whatever flow the owner was in.
    pub fn set(&self, owner: i64, state: UserState) {
        self.inner.insert(owner, state);
    }

    pub fn get(&self, owner: i64) -> Option<UserState> {
        self.inner.get(&owner).map(|entry| *entry)
    }

    /// Back to idle.
    pub fn clear(&self, owner: i64) {
        self.inner.remove(&owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_mutually_exclusive() {
        let state = InteractionState::new();
        state.set(1, UserState::AwaitingName);
        state.set(1, UserState::AwaitingBlockTarget);
        assert_eq!(state.get(1), Some(UserState::AwaitingBlockTarget));
    }

    #[test]
    fn clear_returns_to_idle() {
        let state = InteractionState::new();
        state.set(1, UserState::AwaitingName);
        state.clear(1);
        assert_eq!(state.get(1), None);
        // Clearing an idle owner is harmless.
        state.clear(1);
    }
}
