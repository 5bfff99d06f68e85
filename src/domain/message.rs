//! Message entity.
//!
//! One chat utterance as pushed by the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// A single chat message in the session log.
///
/// Messages are append-only: once received they are never mutated or
/// removed except by a full state reset (reconnect or ready resync).
/// The minimal protocol has no message-identity-based deduplication,
/// so `id` is carried but never used as an idempotence key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identifier
    pub id: String,

    /// Message text (up to the server's limit)
    pub content: String,

    /// Author at the time of sending
    pub author: User,

    /// Timestamp when the message was sent
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Get the content length in characters.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}
