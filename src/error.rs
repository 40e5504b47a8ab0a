//! Error types for the chat substrate
//!
//! Defines application-level errors and socket transport errors.
//! Uses thiserror for ergonomic error definitions.
//!
//! Malformed or unroutable messages are routine and never show up here:
//! the dispatcher drops them silently.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal connection errors and programmer errors such as
/// registering an absent listener.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Socket transport error
    #[error(transparent)]
    Socket(#[from] SocketError),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// A room listener is mandatory
    #[error("Listener is required")]
    MissingListener,
}

/// Socket transport errors
#[derive(Debug, Error)]
pub enum SocketError {
    /// The socket has been closed
    #[error("Socket closed")]
    Closed,

    /// Connecting or handshaking with the remote endpoint failed
    #[error("Connection failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    /// The live connection failed
    #[error("Transport error: {0}")]
    Transport(#[source] tokio_tungstenite::tungstenite::Error),
}
