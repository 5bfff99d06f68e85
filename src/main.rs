//! # Chat Client
//!
//! A minimal terminal frontend over the gateway session layer.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Credentials (bearer token from the environment)
//! - The gateway session, driven by stdin commands

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use chat_client::auth::{CredentialProvider, StaticCredentials};
use chat_client::config::Settings;
use chat_client::gateway::transport::WsTransportFactory;
use chat_client::gateway::ChatSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    chat_client::telemetry::init_tracing();

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        url = %settings.gateway.url,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Token management is outside the session core; here it simply
    // comes from the environment
    let credentials = match std::env::var("CHAT_TOKEN") {
        Ok(token) => StaticCredentials::with_token(token),
        Err(_) => Arc::new(StaticCredentials::new()),
    };
    if !credentials.authorized() {
        eprintln!("No CHAT_TOKEN set; the session will refuse to connect.");
    }

    let session = ChatSession::new(
        settings.gateway.clone(),
        credentials,
        Arc::new(WsTransportFactory),
    );
    session.connect();

    // Print messages as they arrive in the session view
    let view = session.clone();
    tokio::spawn(async move {
        let mut printed = 0usize;
        let mut ticker = tokio::time::interval(Duration::from_millis(250));
        loop {
            ticker.tick().await;
            let messages = view.messages();
            if messages.len() < printed {
                // The log only shrinks on resync/teardown; start over
                printed = 0;
            }
            for msg in &messages[printed..] {
                println!(
                    "[{}] {}: {}",
                    msg.timestamp.format("%H:%M:%S"),
                    msg.author.username,
                    msg.content
                );
            }
            printed = messages.len();
        }
    });

    // Read lines from stdin and send them as chat messages
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/users" => {
                for user in session.users() {
                    println!("* {}", user.username);
                }
            }
            "/connect" => session.connect(),
            text => session.send_message(text),
        }
    }

    session.disconnect();
    Ok(())
}
