//! # Chat Core
//!
//! The protocol and room logic shared by the `chat` server and client.
//!
//! This crate is synchronous and performs no I/O. The server owns a
//! [`Room`] and feeds it the commands it decodes; the room answers with a
//! list of [`Delivery`] values that the network layer routes to sockets.
//!
//! ```text
//!  client ──ClientCommand──► server task ──► Room::set_name / post / leave
//!                                                     │
//!  client ◄──ServerCommand── outboxes ◄──── Vec<Delivery>
//! ```

pub mod error;
pub mod message;
pub mod protocol;
pub mod room;

pub use error::{Error, Result};
pub use message::{Message, User};
pub use protocol::{
    ClientCommand, DEFAULT_PORT, ERROR_REPLY, MAX_LINE_LENGTH, ServerCommand, decode_client,
    decode_server, encode,
};
pub use room::{DEFAULT_HISTORY_LIMIT, Delivery, Room};
