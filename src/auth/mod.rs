//! Credential Provider Seam
//!
//! The session layer never manages login, registration, or token parsing.
//! It reads a bearer token and an authorization gate from an injected
//! provider at `connect()` time and nowhere else; re-authentication
//! mid-session is out of scope.

use std::sync::Arc;

use parking_lot::RwLock;

/// Source of the bearer token and the "may this client connect" gate.
///
/// Implementations must be cheap to query; the session reads both values
/// once per connection attempt.
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, if any.
    fn token(&self) -> Option<String>;

    /// Whether the user is allowed to open a gateway connection.
    fn authorized(&self) -> bool;
}

/// Credential provider backed by an in-memory token slot.
///
/// Authorization follows token presence: a client holding a token is
/// allowed to connect, one without is not.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<String>>,
}

impl StaticCredentials {
    /// Create a provider with no token (unauthorized).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding the given token.
    pub fn with_token(token: impl Into<String>) -> Arc<Self> {
        let creds = Self::new();
        creds.set_token(Some(token.into()));
        Arc::new(creds)
    }

    /// Replace the stored token; `None` revokes authorization.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

impl CredentialProvider for StaticCredentials {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn authorized(&self) -> bool {
        self.token.read().is_some()
    }
}
