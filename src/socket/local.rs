//! In-process loopback socket
//!
//! No network stack and no event loop: whatever is sent comes back as a
//! received frame the next time the owner pumps `receive()`.

use tokio::sync::mpsc;
use tracing::debug;

use super::{
    CloseCallback, Data, MessageCallback, OpenCallback, Outbound, ReadyState, Socket,
    SocketSender,
};
use crate::error::SocketError;

/// Loopback socket pumped by its owner
pub struct LocalSocket {
    tx: mpsc::UnboundedSender<Outbound>,
    rx: mpsc::UnboundedReceiver<Outbound>,
    state: ReadyState,
    on_open: Option<OpenCallback>,
    on_message: Option<MessageCallback>,
    on_close: Option<CloseCallback>,
}

impl LocalSocket {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            state: ReadyState::Connecting,
            on_open: None,
            on_message: None,
            on_close: None,
        }
    }

    /// Pump the socket
    ///
    /// The first call opens the socket and fires "open". Every call then
    /// delivers the frames already queued to the message callback; frames
    /// sent from inside that callback wait for the next pump, so an echoing
    /// callback cannot loop forever. Returns the number of frames delivered.
    pub fn receive(&mut self) -> usize {
        if self.state == ReadyState::Closed {
            return 0;
        }

        if self.state == ReadyState::Connecting {
            self.state = ReadyState::Open;
            if let Some(on_open) = self.on_open.as_mut() {
                on_open();
            }
        }

        let mut pending = Vec::new();
        while let Ok(outbound) = self.rx.try_recv() {
            pending.push(outbound);
        }

        let mut delivered = 0;
        for outbound in pending {
            match outbound {
                Outbound::Data(data) => {
                    delivered += 1;
                    if let Some(on_message) = self.on_message.as_mut() {
                        on_message(data);
                    }
                }
                Outbound::Close => {
                    self.close();
                    break;
                }
            }
        }
        delivered
    }
}

impl Default for LocalSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Socket for LocalSocket {
    fn on_open(&mut self, callback: OpenCallback) {
        self.on_open = Some(callback);
    }

    fn on_message(&mut self, callback: MessageCallback) {
        self.on_message = Some(callback);
    }

    fn on_close(&mut self, callback: CloseCallback) {
        self.on_close = Some(callback);
    }

    fn send(&self, data: Data) -> Result<(), SocketError> {
        if self.state == ReadyState::Closed {
            return Err(SocketError::Closed);
        }
        self.tx
            .send(Outbound::Data(data))
            .map_err(|_| SocketError::Closed)
    }

    fn close(&mut self) {
        if self.state == ReadyState::Closed {
            return;
        }
        debug!("Local socket closed");
        self.state = ReadyState::Closed;
        self.rx.close();
        if let Some(on_close) = self.on_close.as_mut() {
            on_close();
        }
    }

    fn sender(&self) -> SocketSender {
        SocketSender::new(self.tx.clone())
    }

    fn ready_state(&self) -> ReadyState {
        self.state
    }
}
