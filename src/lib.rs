//! Real-time chat substrate
//!
//! A transport-agnostic socket abstraction, a `(kind, status)` message
//! dispatcher, and a chat room with bounded history built on top of them.
//!
//! # Components
//! - `socket`: the `Socket` capability set, `is_socket`, and two transports
//!   (`WsSocket` over tokio-tungstenite, `LocalSocket` in-process loopback)
//! - `message`: the `{ kind, status, payload }` envelope and chat payloads
//! - `dispatcher`: routes message batches to handlers
//! - `room`: bounded FIFO history with synchronous listener fan-out
//!
//! # Architecture
//! The bundled server uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` owns the room and the dispatcher
//! - Each connection runs a `WsSocket` and forwards decoded batches to it
//! - No locks needed - all room access goes through message passing
//!
//! # Example
//! ```ignore
//! use chat_substrate::{is_socket, LocalSocket, Socket};
//!
//! let mut socket = LocalSocket::new();
//! assert!(is_socket(&socket));
//!
//! let sender = socket.sender();
//! socket.on_open(Box::new(move || {
//!     let _ = sender.send("kikoo");
//! }));
//! socket.on_message(Box::new(|data| println!("{:?}", data)));
//!
//! socket.receive(); // opens, then delivers "kikoo"
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod room;
pub mod server;
pub mod socket;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use config::ServerConfig;
pub use dispatcher::{Dispatcher, StatusHandlers};
pub use error::{AppError, SocketError};
pub use handler::handle_connection;
pub use message::{
    chat_history_message, chat_log_message, decode_batch, is_valid_message,
    is_valid_message_value, make_message, ChatLogEntry, Message,
};
pub use room::{ChatRoom, MessageHistory};
pub use server::{ChatServer, ServerCommand};
pub use socket::{is_socket, Capabilities, Data, HasCapabilities, LocalSocket, Socket, WsSocket};
pub use types::{ClientId, ListenerId};
