//! Transport-agnostic socket abstraction
//!
//! A socket is anything that can report an "open" event, deliver received
//! data, send data and close. Two transports implement it:
//! - `LocalSocket`: in-process loopback pumped explicitly with `receive()`
//! - `WsSocket`: WebSocket connection driven by `run()`
//!
//! Callbacks reply through a cloned `SocketSender` instead of borrowing
//! the socket they are registered on.

mod local;
mod ws;

use std::ops::BitOr;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::SocketError;

pub use local::LocalSocket;
pub use ws::WsSocket;

/// Callback fired once the socket is open
pub type OpenCallback = Box<dyn FnMut() + Send>;

/// Callback fired for every received frame
pub type MessageCallback = Box<dyn FnMut(Data) + Send>;

/// Callback fired once the socket is closed
pub type CloseCallback = Box<dyn FnMut() + Send>;

/// One frame of raw data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Text(String),
    Binary(Vec<u8>),
}

impl Data {
    /// Text content, if this is a text frame
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Text(text) => Some(text),
            Data::Binary(_) => None,
        }
    }

    pub(crate) fn into_ws(self) -> WsMessage {
        match self {
            Data::Text(text) => WsMessage::Text(text.into()),
            Data::Binary(bytes) => WsMessage::Binary(bytes.into()),
        }
    }
}

impl From<&str> for Data {
    fn from(text: &str) -> Self {
        Data::Text(text.to_string())
    }
}

impl From<String> for Data {
    fn from(text: String) -> Self {
        Data::Text(text)
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data::Binary(bytes)
    }
}

/// Socket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closed,
}

/// Queued instruction for the transport
#[derive(Debug)]
pub(crate) enum Outbound {
    Data(Data),
    Close,
}

/// Cloneable handle for sending through (or closing) a socket
///
/// Sending is fire-and-forget: the frame is queued for the transport and
/// only fails once the socket is closed.
#[derive(Debug, Clone)]
pub struct SocketSender {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl SocketSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }

    /// Queue a frame for sending
    pub fn send(&self, data: impl Into<Data>) -> Result<(), SocketError> {
        self.tx
            .send(Outbound::Data(data.into()))
            .map_err(|_| SocketError::Closed)
    }

    /// Ask the transport to close; a no-op if already closed
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The full socket capability set
pub trait Socket {
    /// Register the "open" callback (replaces any previous one)
    fn on_open(&mut self, callback: OpenCallback);

    /// Register the "message received" callback (replaces any previous one)
    fn on_message(&mut self, callback: MessageCallback);

    /// Register the "close" callback (replaces any previous one)
    fn on_close(&mut self, callback: CloseCallback);

    /// Send raw data
    fn send(&self, data: Data) -> Result<(), SocketError>;

    /// Close the connection. Terminal and idempotent.
    fn close(&mut self);

    /// Handle for sending from inside callbacks
    fn sender(&self) -> SocketSender;

    fn ready_state(&self) -> ReadyState;
}

/// Set of socket capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const OPEN: Self = Self(1);
    pub const MESSAGE: Self = Self(1 << 1);
    pub const SEND: Self = Self(1 << 2);
    pub const CLOSE: Self = Self(1 << 3);
    pub const ALL: Self = Self(0b1111);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Reports which socket capabilities an object exposes
pub trait HasCapabilities {
    fn capabilities(&self) -> Capabilities;
}

impl<S: Socket + ?Sized> HasCapabilities for S {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }
}

/// A sender can write and close but never observes events
impl HasCapabilities for SocketSender {
    fn capabilities(&self) -> Capabilities {
        Capabilities::SEND | Capabilities::CLOSE
    }
}

/// Whether `candidate` can be used as a socket
///
/// Requires the whole capability set; a subset (e.g. send only) is rejected.
pub fn is_socket<T: HasCapabilities + ?Sized>(candidate: &T) -> bool {
    candidate.capabilities().contains(Capabilities::ALL)
}
