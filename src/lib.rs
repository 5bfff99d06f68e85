//! # Chat Client Library
//!
//! A realtime chat client built around a single persistent WebSocket
//! gateway connection:
//! - Tagged-message protocol codec (op codes, action codes, error codes)
//! - In-memory presence and message store fed by server events
//! - Session state machine driving handshake, heartbeats, and teardown
//!
//! ## Architecture
//!
//! The session layer owns all mutable state. Presentation reads derived
//! views (`users`, `messages`, `phase`) and issues commands (`connect`,
//! `disconnect`, `send_message`); credentials come from an injected
//! [`auth::CredentialProvider`]; the wire sits behind a
//! [`gateway::transport::TransportFactory`] so tests can run against a
//! fake socket instead of a real network.
//!
//! ## Module Structure
//!
//! ```text
//! chat_client/
//! +-- config/    Configuration management
//! +-- domain/    User and Message entities
//! +-- auth/      Credential provider seam
//! +-- gateway/   Protocol codec, store, transport, session machine
//! +-- shared/    Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain entities
pub mod domain;

// Credential provider seam
pub mod auth;

// Gateway session layer - the protocol core
pub mod gateway;

// Shared utilities
pub mod shared;

// Telemetry and observability
pub mod telemetry;
