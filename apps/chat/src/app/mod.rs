//! # Front Ends
//!
//! Collect user input for the [`Client`](crate::client::Client) and show
//! what the server sends back.

mod basic;
mod tui;
mod view;

pub use basic::BasicApp;
pub use tui::TuiApp;
pub use view::{ChatView, KeyOutcome, LineKind, MAX_INPUT_CHARS, ViewLine};

use crate::client::ClientInput;
use crate::error::Result;
use chat_core::ServerCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type Tx<T> = mpsc::UnboundedSender<T>;
pub type Rx<T> = mpsc::UnboundedReceiver<T>;

/// A front end driven by the client.
pub trait App {
    /// Spawn the front end's tasks and return immediately.
    ///
    /// The returned handle completes when the front end is done: after it
    /// sent [`ClientInput::Exit`], or once `msg_rx` is closed.
    fn start(
        self,
        input_tx: Tx<ClientInput>,
        msg_rx: Rx<ServerCommand>,
        name: &str,
    ) -> Result<JoinHandle<Result<()>>>;
}

// =============================================================================
// LOCAL COMMANDS
// =============================================================================

/// A line typed by the user, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Plain text to post.
    Message(String),
    /// A `:command` handled by the client itself.
    Command(LocalCommand),
}

/// Commands that never reach the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    Exit,
    Clear,
    /// Anything else after a `:`, lowercased.
    Invalid(String),
}

/// Classify a typed line. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    match line.strip_prefix(':') {
        Some(command) => {
            let command = command.trim().to_lowercase();
            Some(Input::Command(match command.as_str() {
                "exit" => LocalCommand::Exit,
                "clear" => LocalCommand::Clear,
                _ => LocalCommand::Invalid(command),
            }))
        }
        None => Some(Input::Message(line.to_string())),
    }
}
