//! User entity.
//!
//! Identity of a connected participant as pushed by the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participant currently present in the chat.
///
/// Presence is keyed by `id`; usernames are display names and are not
/// guaranteed unique across the lifetime of a session. Earlier protocol
/// revisions keyed presence by username, the current one keys by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque stable identifier, unique among currently-present users
    pub id: String,

    /// Display name
    pub username: String,

    /// Account creation timestamp
    pub created: DateTime<Utc>,
}

impl User {
    /// Create a user with the given id and username.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            created: Utc::now(),
        }
    }
}
