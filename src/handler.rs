//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake, decoding
//! inbound frames into message batches, and running the client's socket
//! until it closes.

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::decode_batch;
use crate::server::ServerCommand;
use crate::socket::{Socket, WsSocket};
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, registers the client with the
/// ChatServer and forwards every decoded batch to it.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let mut socket = WsSocket::from_stream(ws_stream);

    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Register with ChatServer
    if cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            sender: socket.sender(),
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }

    // The message callback is synchronous; a forward task awaits room on the
    // actor channel for each queued batch
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<ServerCommand>();
    let forward_tx = cmd_tx.clone();
    let forward_task = tokio::spawn(async move {
        while let Some(cmd) = inbound_rx.recv().await {
            if forward_tx.send(cmd).await.is_err() {
                debug!("Server closed, ending forward task for {}", client_id);
                break;
            }
        }
    });

    socket.on_message(Box::new(move |data| {
        let Some(text) = data.as_text() else {
            debug!("Ignoring binary frame from {}", client_id);
            return;
        };
        match decode_batch(text) {
            Ok(messages) if messages.is_empty() => {}
            Ok(messages) => {
                let cmd = ServerCommand::Inbound {
                    client_id,
                    messages,
                };
                if inbound_tx.send(cmd).is_err() {
                    debug!("Forward task ended, dropping batch from {}", client_id);
                }
            }
            Err(e) => {
                warn!("Invalid JSON from {}: {}", client_id, e);
            }
        }
    }));

    let result = socket.run().await;
    if let Err(e) = &result {
        error!("WebSocket error for {}: {}", client_id, e);
    }

    // Dropping the socket drops the callback's queue sender, letting the
    // forward task drain every pending batch before the disconnect
    drop(socket);
    let _ = forward_task.await;

    // Send disconnect command
    let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;

    info!("Client {} disconnected", client_id);

    result.map_err(AppError::from)
}
