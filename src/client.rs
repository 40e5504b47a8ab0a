//! Client struct definition
//!
//! Represents a connected client: its socket sender and the room listener
//! that forwards new chat entries to it.

use tracing::debug;

use crate::error::AppError;
use crate::message::Message;
use crate::socket::SocketSender;
use crate::types::{ClientId, ListenerId};

/// Connected client information
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Server → Client socket handle
    pub sender: SocketSender,
    /// Room listener registered for this client
    pub listener: ListenerId,
}

impl Client {
    pub fn new(id: ClientId, sender: SocketSender, listener: ListenerId) -> Self {
        Self {
            id,
            sender,
            listener,
        }
    }

    /// Send a message to this client
    pub fn send(&self, msg: &Message) -> Result<(), AppError> {
        send_message(&self.sender, msg)?;
        debug!("Queued {}/{} message for {}", msg.kind, msg.status, self.id);
        Ok(())
    }
}

/// Serialize `msg` and queue it on `sender`
pub fn send_message(sender: &SocketSender, msg: &Message) -> Result<(), AppError> {
    let json = msg.to_json()?;
    sender.send(json)?;
    Ok(())
}
