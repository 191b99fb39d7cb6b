use thiserror::Error;
use tokio_util::codec::LinesCodecError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the server, the client and the front ends.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket, stdin or terminal I/O failed.
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    /// The line framing rejected a frame (too long, or the socket failed).
    #[error("codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// A command could not be encoded or decoded, or referenced an unknown peer.
    #[error("protocol error: {0}")]
    Protocol(#[from] chat_core::Error),

    /// A background task ended abnormally.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A local channel closed while it was still needed.
    #[error("chat error: {0}")]
    Chat(String),
}
