//! WebSocket-backed socket
//!
//! Wraps a live `tokio-tungstenite` stream. Events are delivered from
//! `run()`, which multiplexes inbound frames and queued outbound frames
//! until the connection ends.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::{
    CloseCallback, Data, MessageCallback, OpenCallback, Outbound, ReadyState, Socket,
    SocketSender,
};
use crate::error::SocketError;

/// Network socket over a WebSocket stream
pub struct WsSocket<S = MaybeTlsStream<TcpStream>> {
    stream: Option<WebSocketStream<S>>,
    tx: mpsc::UnboundedSender<Outbound>,
    rx: mpsc::UnboundedReceiver<Outbound>,
    state: ReadyState,
    on_open: Option<OpenCallback>,
    on_message: Option<MessageCallback>,
    on_close: Option<CloseCallback>,
}

impl WsSocket {
    /// Connect to `url`
    ///
    /// Never fails loudly: an unreachable endpoint or a malformed URL is
    /// logged and yields `None`.
    pub async fn connect(url: &str) -> Option<Self> {
        match Self::try_connect(url).await {
            Ok(socket) => Some(socket),
            Err(e) => {
                warn!("Failed to create websocket to {}: {}", url, e);
                None
            }
        }
    }

    pub async fn try_connect(url: &str) -> Result<Self, SocketError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(SocketError::Connect)?;
        debug!("Connected to {}", url);
        Ok(Self::from_stream(stream))
    }
}

impl<S> WsSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already handshaken stream (client or server side)
    pub fn from_stream(stream: WebSocketStream<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            stream: Some(stream),
            tx,
            rx,
            state: ReadyState::Connecting,
            on_open: None,
            on_message: None,
            on_close: None,
        }
    }

    /// Drive the connection until it closes
    ///
    /// Fires "open" first, then "message" for every inbound text or binary
    /// frame. Returns when the peer closes, the stream ends, `close()` is
    /// requested through a `SocketSender`, or the transport fails. "close"
    /// fires exactly once on the way out.
    pub async fn run(&mut self) -> Result<(), SocketError> {
        let Some(stream) = self.stream.take() else {
            return Err(SocketError::Closed);
        };

        self.state = ReadyState::Open;
        if let Some(on_open) = self.on_open.as_mut() {
            on_open();
        }

        let (mut sink, mut source) = stream.split();

        let result = loop {
            tokio::select! {
                inbound = source.next() => match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(on_message) = self.on_message.as_mut() {
                            on_message(Data::Text(text.to_string()));
                        }
                    }
                    Some(Ok(WsMessage::Binary(bytes))) => {
                        if let Some(on_message) = self.on_message.as_mut() {
                            on_message(Data::Binary(bytes.to_vec()));
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        debug!("Peer closed websocket");
                        // Flush the close reply tungstenite queued
                        let _ = sink.close().await;
                        break Ok(());
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong handled by tungstenite
                    }
                    Some(Err(e)) => break Err(SocketError::Transport(e)),
                },
                outbound = self.rx.recv() => match outbound {
                    Some(Outbound::Data(data)) => {
                        if let Err(e) = sink.send(data.into_ws()).await {
                            break Err(SocketError::Transport(e));
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = sink.close().await;
                        break Ok(());
                    }
                },
            }
        };

        self.finish();
        result
    }

    fn finish(&mut self) {
        if self.state == ReadyState::Closed {
            return;
        }
        self.state = ReadyState::Closed;
        self.rx.close();
        if let Some(on_close) = self.on_close.as_mut() {
            on_close();
        }
    }
}

impl<S> Socket for WsSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
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
        self.tx
            .send(Outbound::Data(data))
            .map_err(|_| SocketError::Closed)
    }

    /// Closes a socket that is not being driven. While `run()` is active,
    /// close through `sender().close()` instead.
    fn close(&mut self) {
        // Dropping the stream drops the underlying connection
        self.stream = None;
        self.finish();
    }

    fn sender(&self) -> SocketSender {
        SocketSender::new(self.tx.clone())
    }

    fn ready_state(&self) -> ReadyState {
        self.state
    }
}
