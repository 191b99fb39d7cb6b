//! # CLI
//!
//! `chat server` and `chat client` subcommands. Every flag can also be set
//! through a `CHAT_*` environment variable.

use crate::app::{BasicApp, TuiApp};
use crate::client::{Client, ClientConfig};
use crate::error::Result;
use crate::server::{Server, ServerConfig};
use crate::telemetry::LogOutput;
use chat_core::{DEFAULT_HISTORY_LIMIT, DEFAULT_PORT, MAX_LINE_LENGTH};
use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Parser)]
#[command(
    name = "chat",
    version,
    about = "An async chat client/server with tokio."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Default log directive and output for the chosen subcommand.
    ///
    /// The server logs at `info`. Clients log at `warn`, and not at all
    /// while the terminal UI owns the screen.
    pub fn log_settings(&self) -> (&'static str, LogOutput) {
        match &self.command {
            Command::Server(_) => ("info", LogOutput::Stderr),
            Command::Client(args) if args.tui => ("warn", LogOutput::Off),
            Command::Client(_) => ("warn", LogOutput::Stderr),
        }
    }

    pub async fn execute(self) -> Result<()> {
        self.command.execute().await
    }
}

#[derive(Clone, Debug, PartialEq, Subcommand)]
pub enum Command {
    /// Connect to a chat server
    Client(ClientArgs),
    /// Run a chat server
    Server(ServerArgs),
}

impl Command {
    pub async fn execute(self) -> Result<()> {
        match self {
            Self::Client(args) => args.execute().await,
            Self::Server(args) => args.execute().await,
        }
    }
}

// =============================================================================
// SERVER
// =============================================================================

#[derive(Clone, Debug, PartialEq, Args)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "CHAT_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "CHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Room name shown to clients
    #[arg(short, long, env = "CHAT_SERVER_NAME", default_value = "Chat")]
    pub name: String,

    /// Number of recent messages replayed to newcomers
    #[arg(long = "history", env = "CHAT_HISTORY", default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub history_limit: usize,
}

impl ServerArgs {
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            port: self.port,
            name: self.name.clone(),
            history_limit: self.history_limit,
            max_line_length: MAX_LINE_LENGTH,
        }
    }

    async fn execute(self) -> Result<()> {
        let server = Server::bind(self.config()).await?;
        server
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "cannot listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            })
            .await
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Args)]
pub struct ClientArgs {
    /// Server host name or address
    #[arg(short, long, env = "CHAT_SERVER", default_value = "127.0.0.1")]
    pub server: String,

    /// Server port
    #[arg(short, long, env = "CHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Name to join as; a random one is picked when omitted
    #[arg(short, long, env = "CHAT_NAME")]
    pub name: Option<String>,

    /// Use the full-screen terminal UI
    #[arg(short, long, env = "CHAT_TUI")]
    pub tui: bool,
}

impl ClientArgs {
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            server: self.server.clone(),
            port: self.port,
            name: self.name.clone(),
            tui: self.tui,
        }
    }

    async fn execute(self) -> Result<()> {
        let config = self.config();
        let client = Client::connect(&config).await?;
        info!(name = %client.name(), "joining");
        if config.tui {
            client.run(TuiApp).await
        } else {
            client.run(BasicApp).await
        }
    }
}
