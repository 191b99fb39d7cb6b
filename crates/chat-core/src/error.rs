use std::net::SocketAddr;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the protocol and room logic.
#[derive(Debug, Error)]
pub enum Error {
    /// A line could not be encoded or decoded as a command.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An operation referenced a connection that never joined.
    #[error("unknown peer: {0}")]
    UnknownPeer(SocketAddr),
}
