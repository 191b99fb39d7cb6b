//! # Protocol Module
//!
//! Commands exchanged between client and server.
//!
//! Framing is newline-delimited: every command is one line of JSON using
//! serde's externally tagged enum layout, e.g.
//!
//! ```text
//! client → server   {"SetName":"alice"}
//! client → server   {"SendMessage":{"Text":"hi"}}
//! server → client   {"UserMessage":["alice",{"Text":"hi"}]}
//! server → client   {"UserList":[["alice","127.0.0.1:50412"]]}
//! ```
//!
//! The helpers here produce and consume single lines without the trailing
//! newline; the transport's line codec owns the delimiter.

use crate::error::Result;
use crate::message::{Message, User};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::net::SocketAddr;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Port used by both server and client when none is given.
pub const DEFAULT_PORT: u16 = 30388;

/// Longest accepted line, in bytes. Longer lines are discarded.
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Text of the error reply sent for any line the server cannot decode.
pub const ERROR_REPLY: &str = "What's that?";

// =============================================================================
// COMMANDS
// =============================================================================

/// Requests a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCommand {
    /// Register or change the sender's name. Must come first.
    SetName(String),
    /// Post a message to everyone in the room.
    SendMessage(Message),
}

/// Everything the server pushes to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerCommand {
    /// A message posted by a user.
    UserMessage(User, Message),
    /// A notice from the server itself (joins, leaves).
    ServerMessage(Message),
    /// Every named user currently online, with their address.
    UserList(Vec<(User, SocketAddr)>),
    /// The previous line from this client was not understood.
    Error(String),
    /// The room's display name, sent once after the first `SetName`.
    ServerName(String),
}

// =============================================================================
// LINE HELPERS
// =============================================================================

/// Encode a command as one JSON line (without the newline).
pub fn encode<T: Serialize>(command: &T) -> Result<String> {
    Ok(serde_json::to_string(command)?)
}

fn decode<T: DeserializeOwned>(line: &str) -> Result<T> {
    Ok(serde_json::from_str(line.trim_end_matches(['\r', '\n']))?)
}

/// Decode a line received by the server.
pub fn decode_client(line: &str) -> Result<ClientCommand> {
    decode(line)
}

/// Decode a line received by the client.
pub fn decode_server(line: &str) -> Result<ServerCommand> {
    decode(line)
}
