//! Gateway Session Layer
//!
//! The protocol core: wire codec, presence/message store, transport seam,
//! and the session state machine that ties them together.

pub mod events;
pub mod session;
pub mod store;
pub mod transport;

pub use session::{ChatSession, SessionPhase};
pub use store::ChatState;
