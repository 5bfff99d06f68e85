//! Presence/Message Store
//!
//! In-memory authoritative state for the current set of present users and
//! the ordered message log. `apply` is a pure reducer over one decoded
//! action; its rules are deliberately order-tolerant (idempotent join,
//! no-op leave-of-absent) so out-of-order delivery degrades gracefully.

use crate::domain::{Message, User};

use super::events::ActionEvent;

/// Reconciled session state: who is present, what has been said.
///
/// Collections are only ever replaced wholesale (ready resync, reset) or
/// rebuilt-and-swapped by a single-entity add/remove/append; they are
/// never spliced in place, so a previously cloned snapshot can never be
/// observed torn.
#[derive(Debug, Default)]
pub struct ChatState {
    users: Vec<User>,
    messages: Vec<Message>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded action to the state.
    pub fn apply(&mut self, action: ActionEvent) {
        match action {
            ActionEvent::Ready { users, messages } => {
                // Full resync discards everything held locally
                self.users = users;
                self.messages = messages;
            }
            ActionEvent::Join(user) => {
                // Duplicate joins for an already-present id are no-ops
                if self.users.iter().any(|u| u.id == user.id) {
                    return;
                }
                let mut users = self.users.clone();
                users.push(user);
                self.users = users;
            }
            ActionEvent::Leave(user) => {
                self.users = self
                    .users
                    .iter()
                    .filter(|u| u.id != user.id)
                    .cloned()
                    .collect();
            }
            ActionEvent::Message(message) => {
                let mut messages = self.messages.clone();
                messages.push(message);
                self.messages = messages;
            }
        }
    }

    /// Clear all state, used on every teardown.
    pub fn reset(&mut self) {
        self.users = Vec::new();
        self.messages = Vec::new();
    }

    /// Snapshot of the currently-present users.
    pub fn users(&self) -> Vec<User> {
        self.users.clone()
    }

    /// Snapshot of the message log, in arrival order.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }
}
