//! ChatServer Actor implementation
//!
//! The central actor owning the chat room, the message dispatcher and the
//! connected clients. Uses the Actor pattern with mpsc channels for
//! message passing, so the room is only ever touched from one task.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::{send_message, Client};
use crate::dispatcher::{Dispatcher, StatusHandlers};
use crate::message::{
    chat_history_message, chat_log_message, ChatLogEntry, Message, CHAT_LOG, STATUS_SUCCESS,
};
use crate::room::{ChatRoom, MessageHistory};
use crate::socket::SocketSender;
use crate::types::ClientId;

/// Commands sent from connection handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        sender: SocketSender,
    },
    /// Client disconnected
    Disconnect { client_id: ClientId },
    /// Batch of messages decoded from one inbound frame
    Inbound {
        client_id: ClientId,
        messages: Vec<Message>,
    },
}

/// Build the dispatcher routing client messages into the room
pub fn chat_dispatcher() -> Dispatcher<ChatRoom> {
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_handler(
        CHAT_LOG,
        StatusHandlers::new().on(STATUS_SUCCESS, |room: &mut ChatRoom, msg: &Message| {
            match msg.payload_as::<ChatLogEntry>() {
                Ok(entry) => room.add_log(entry),
                Err(e) => debug!("Dropping chat-log with malformed payload: {}", e),
            }
        }),
    );
    dispatcher
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    room: ChatRoom,
    dispatcher: Dispatcher<ChatRoom>,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a ChatServer whose room keeps `history_capacity` entries
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, history_capacity: usize) -> Self {
        Self {
            clients: HashMap::new(),
            room: ChatRoom::with_capacity(history_capacity),
            dispatcher: chat_dispatcher(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
            ServerCommand::Inbound {
                client_id,
                messages,
            } => {
                self.handle_inbound(client_id, messages);
            }
        }
    }

    /// Replay history to the new client, then subscribe it to new entries
    fn handle_connect(&mut self, client_id: ClientId, sender: SocketSender) {
        info!("Client {} connected", client_id);

        // The room cannot change before the replay below is queued
        let forward = sender.clone();
        let listener = self
            .room
            .add_listener(move |entry: &ChatLogEntry, _: &MessageHistory| {
                if let Err(e) = send_message(&forward, &chat_log_message(entry)) {
                    debug!("Dropping chat-log for {}: {}", client_id, e);
                }
            });
        let client = Client::new(client_id, sender, listener);

        let replay = chat_history_message(&self.room.capture_message_history());
        if let Err(e) = client.send(&replay) {
            warn!("Failed to replay history to {}: {}", client_id, e);
        }

        self.clients.insert(client_id, client);
        debug!("Total clients: {}", self.clients.len());
    }

    /// Handle client disconnection
    fn handle_disconnect(&mut self, client_id: ClientId) {
        info!("Client {} disconnected", client_id);

        if let Some(client) = self.clients.remove(&client_id) {
            self.room.remove_listener(client.listener);
        }

        debug!("Total clients: {}", self.clients.len());
    }

    fn handle_inbound(&mut self, client_id: ClientId, messages: Vec<Message>) {
        let handled = self.dispatcher.dispatch(&mut self.room, &messages);
        debug!(
            "Client {} sent {} messages, {} handled",
            client_id,
            messages.len(),
            handled
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::message::{make_message, CHAT_HISTORY};
    use crate::socket::{LocalSocket, Socket};

    /// LocalSocket standing in for a client connection, collecting what
    /// the server sends it
    fn client_socket() -> (LocalSocket, Arc<Mutex<Vec<Message>>>) {
        let mut socket = LocalSocket::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        socket.on_message(Box::new(move |data| {
            let msg: Message = serde_json::from_str(data.as_text().unwrap()).unwrap();
            sink.lock().unwrap().push(msg);
        }));
        (socket, received)
    }

    fn post(author: &str, text: &str) -> Message {
        chat_log_message(&ChatLogEntry::new(author, text))
    }

    #[tokio::test]
    async fn test_connect_replays_history_then_forwards_new_entries() {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let server = tokio::spawn(ChatServer::new(cmd_rx, 100).run());

        let alice = ClientId::new();
        let bob = ClientId::new();
        let (mut alice_socket, alice_received) = client_socket();
        let (mut bob_socket, bob_received) = client_socket();

        cmd_tx
            .send(ServerCommand::Connect {
                client_id: alice,
                sender: alice_socket.sender(),
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Inbound {
                client_id: alice,
                messages: vec![post("alice", "hi")],
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Connect {
                client_id: bob,
                sender: bob_socket.sender(),
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Inbound {
                client_id: bob,
                messages: vec![post("bob", "hello")],
            })
            .await
            .unwrap();
        drop(cmd_tx);
        server.await.unwrap();

        alice_socket.receive();
        bob_socket.receive();

        let alice_received = alice_received.lock().unwrap();
        assert_eq!(alice_received.len(), 3);
        assert_eq!(alice_received[0], chat_history_message(&[]));
        assert_eq!(alice_received[1], post("alice", "hi"));
        assert_eq!(alice_received[2], post("bob", "hello"));

        let bob_received = bob_received.lock().unwrap();
        assert_eq!(bob_received.len(), 2);
        assert_eq!(bob_received[0].kind, CHAT_HISTORY);
        assert_eq!(
            bob_received[0].payload_as::<Vec<ChatLogEntry>>().unwrap(),
            vec![ChatLogEntry::new("alice", "hi")]
        );
        assert_eq!(bob_received[1], post("bob", "hello"));
    }

    #[tokio::test]
    async fn test_disconnected_client_stops_receiving() {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let server = tokio::spawn(ChatServer::new(cmd_rx, 100).run());

        let alice = ClientId::new();
        let (mut socket, received) = client_socket();

        cmd_tx
            .send(ServerCommand::Connect {
                client_id: alice,
                sender: socket.sender(),
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Disconnect { client_id: alice })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Inbound {
                client_id: ClientId::new(),
                messages: vec![post("carol", "anyone?")],
            })
            .await
            .unwrap();
        drop(cmd_tx);
        server.await.unwrap();

        socket.receive();
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].kind, CHAT_HISTORY);
    }

    #[test]
    fn test_chat_dispatcher_ignores_unroutable_and_malformed() {
        let mut dispatcher = chat_dispatcher();
        let mut room = ChatRoom::new();

        let handled = dispatcher.dispatch(
            &mut room,
            &[
                make_message(CHAT_LOG, "failure"),
                make_message(CHAT_LOG, STATUS_SUCCESS)
                    .with_payload(serde_json::json!({ "nope": true })),
                make_message("unknown", STATUS_SUCCESS),
                post("alice", "kept"),
            ],
        );

        // the malformed payload still reaches its handler, which drops it
        assert_eq!(handled, 2);
        assert_eq!(
            room.capture_message_history(),
            vec![ChatLogEntry::new("alice", "kept")]
        );
    }
}
