//! Shared Utilities
//!
//! Common error types used across the crate.

pub mod error;

pub use error::ClientError;
