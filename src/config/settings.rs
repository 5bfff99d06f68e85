//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Gateway connection configuration
    pub gateway: GatewaySettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Gateway connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// WebSocket URL of the chat gateway (e.g., "ws://localhost:7070/ws")
    pub url: String,

    /// Heartbeat interval in milliseconds (default: 5000)
    pub heartbeat_interval_ms: u64,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("gateway.url", "ws://localhost:7070/ws")?
            .set_default("gateway.heartbeat_interval_ms", 5000_i64)?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__GATEWAY__URL=ws://... -> gateway.url
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("gateway.url", std::env::var("GATEWAY_URL").ok())?
            .build()?
            .try_deserialize()
    }
}

impl GatewaySettings {
    /// Heartbeat interval as a `Duration`.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}
