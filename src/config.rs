//! Server configuration
//!
//! Command-line options, each with an environment fallback:
//! - `ADDR` / `CHAT_SERVER_ADDR`: bind address
//! - `--history-capacity` / `CHAT_HISTORY_CAPACITY`: chat entries the room keeps
//! - `--channel-buffer` / `CHAT_CHANNEL_BUFFER`: ChatServer command channel size

use std::net::SocketAddr;

use clap::builder::RangedU64ValueParser;
use clap::Parser;

use crate::room::DEFAULT_HISTORY_CAPACITY;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Channel buffer size for server commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Socket address the server should bind to
    #[arg(env = "CHAT_SERVER_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,

    /// Number of chat entries replayed to new clients
    #[arg(long, env = "CHAT_HISTORY_CAPACITY", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Size of the ChatServer command channel
    #[arg(
        long,
        env = "CHAT_CHANNEL_BUFFER",
        default_value_t = CHANNEL_BUFFER_SIZE,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub channel_buffer: usize,
}
