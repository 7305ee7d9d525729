//! Per-message disclosure state machine
//!
//! Executable messages start `Hidden` behind a Manual / Automatic choice.
//! Everything else starts `Expanded`. Any expanded message can be folded to
//! `Collapsed` and back.

use std::collections::HashMap;

use crate::models::MessageId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Disclosure {
    /// Gated pending the Manual / Automatic choice
    Hidden,
    #[default]
    Expanded,
    Collapsed,
}

/// Keyed store of disclosure states, session-only
#[derive(Debug, Default)]
pub struct DisclosureStore {
    states: HashMap<MessageId, Disclosure>,
}

impl DisclosureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the initial state of a message. A message is gated at most once.
    pub fn gate(&mut self, id: MessageId, executable: bool) -> Disclosure {
        *self.states.entry(id).or_insert(if executable {
            Disclosure::Hidden
        } else {
            Disclosure::Expanded
        })
    }

    /// Unknown messages (restored from disk, still streaming) count as expanded
    pub fn state(&self, id: MessageId) -> Disclosure {
        self.states.get(&id).copied().unwrap_or_default()
    }

    /// Manual: reveal the full content for good
    pub fn choose_manual(&mut self, id: MessageId) -> bool {
        match self.states.get_mut(&id) {
            Some(state @ Disclosure::Hidden) => {
                *state = Disclosure::Expanded;
                true
            }
            _ => false,
        }
    }

    /// Automatic: valid only while gated. The message itself stays hidden.
    pub fn choose_automatic(&self, id: MessageId) -> bool {
        self.state(id) == Disclosure::Hidden
    }

    /// Flip Expanded and Collapsed; hidden messages are left alone
    pub fn toggle_collapse(&mut self, id: MessageId) -> Disclosure {
        let next = match self.state(id) {
            Disclosure::Expanded => Disclosure::Collapsed,
            Disclosure::Collapsed => Disclosure::Expanded,
            Disclosure::Hidden => return Disclosure::Hidden,
        };
        self.states.insert(id, next);
        next
    }

    pub fn remove(&mut self, id: MessageId) {
        self.states.remove(&id);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_executable_message_is_gated() {
        let mut store = DisclosureStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.gate(id, true), Disclosure::Hidden);
        assert!(store.choose_automatic(id));
        assert_eq!(store.state(id), Disclosure::Hidden);

        assert!(store.choose_manual(id));
        assert_eq!(store.state(id), Disclosure::Expanded);
        assert!(!store.choose_manual(id));
        assert!(!store.choose_automatic(id));
    }

    #[test]
    fn test_gate_is_recorded_once() {
        let mut store = DisclosureStore::new();
        let id = Uuid::new_v4();
        store.gate(id, true);
        store.choose_manual(id);
        assert_eq!(store.gate(id, true), Disclosure::Expanded);
    }

    #[test]
    fn test_non_executable_starts_expanded_and_collapses() {
        let mut store = DisclosureStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.gate(id, false), Disclosure::Expanded);
        assert_eq!(store.toggle_collapse(id), Disclosure::Collapsed);
        assert_eq!(store.toggle_collapse(id), Disclosure::Expanded);
    }

    #[test]
    fn test_hidden_cannot_collapse() {
        let mut store = DisclosureStore::new();
        let id = Uuid::new_v4();
        store.gate(id, true);
        assert_eq!(store.toggle_collapse(id), Disclosure::Hidden);
    }

    #[test]
    fn test_unknown_is_expanded_and_clear_forgets() {
        let mut store = DisclosureStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.state(id), Disclosure::Expanded);
        store.gate(id, true);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.state(id), Disclosure::Expanded);
    }
}
