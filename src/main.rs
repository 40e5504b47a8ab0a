//! Chat Server - Entry Point
//!
//! Starts the TCP listener and ChatServer actor, accepting connections.

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_substrate::{handle_connection, ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_substrate=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_substrate=info")),
        )
        .init();

    // Command line wins over the environment
    let config = ServerConfig::parse();

    // Start TCP listener
    let listener = TcpListener::bind(config.addr).await?;
    info!("WebSocket Chat Server listening on {}", config.addr);

    // Create ChatServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(config.channel_buffer);
    let server = ChatServer::new(cmd_rx, config.history_capacity);
    tokio::spawn(server.run());

    info!(
        "ChatServer actor started (history capacity {})",
        config.history_capacity
    );

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
