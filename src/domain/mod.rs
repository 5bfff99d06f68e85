//! Domain Entities
//!
//! Core data shapes exchanged with the gateway.

pub mod message;
pub mod user;

pub use message::Message;
pub use user::User;
