//! Configuration Management

pub mod settings;

pub use settings::{GatewaySettings, Settings};
