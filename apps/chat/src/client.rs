//! # Chat Client
//!
//! Connects to a server, registers a name and shuttles commands between the
//! socket and a front end ([`App`]).
//!
//! ```text
//!   front end ──ClientInput──► run loop ──ClientCommand──► socket
//!   front end ◄─ServerCommand── reader task ◄────────────── socket
//! ```

use crate::app::App;
use crate::error::Result;
use chat_core::{
    ClientCommand, DEFAULT_PORT, MAX_LINE_LENGTH, Message, ServerCommand, decode_server, encode,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

type Transport = Framed<TcpStream, LinesCodec>;
type Sink = SplitSink<Transport, String>;
type Source = SplitStream<Transport>;

/// Client settings, filled from the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or address.
    pub server: String,
    pub port: u16,
    /// Name to register; a random one is generated when absent.
    pub name: Option<String>,
    /// Use the terminal UI instead of plain stdin/stdout.
    pub tui: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            name: None,
            tui: false,
        }
    }
}

/// What a front end asks the client to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientInput {
    /// Post this text to the room.
    Text(String),
    /// Disconnect and stop.
    Exit,
}

/// Use `name` if it is non-blank, otherwise generate an adjective-noun name.
pub fn new_name(name: Option<String>) -> String {
    match name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => names::Generator::default()
            .next()
            .unwrap_or_else(|| "anonymous".to_string()),
    }
}

/// A connected client.
pub struct Client {
    name: String,
    transport: Transport,
}

impl Client {
    /// Open the connection. Nothing is sent until [`Client::run`].
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let stream = TcpStream::connect((config.server.as_str(), config.port)).await?;
        info!(peer = %stream.peer_addr()?, "connected");
        Ok(Self {
            name: new_name(config.name.clone()),
            transport: Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
        })
    }

    /// The name this client registers with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register, start `app` and relay until the user exits or the server
    /// goes away. Returns once the front end has finished.
    pub async fn run<A: App>(self, app: A) -> Result<()> {
        let (mut sink, source) = self.transport.split::<String>();
        let (input_tx, mut input_rx) = mpsc::unbounded_channel();
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let mut reader = tokio::spawn(forward(source, msg_tx));
        let front_end = app.start(input_tx, msg_rx, &self.name)?;

        let result = relay(&mut sink, &mut input_rx, &mut reader, &self.name).await;

        // Dropping the reader closes the front end's message channel.
        reader.abort();
        let _ = sink.close().await;
        front_end.await??;
        result
    }
}

async fn relay(
    sink: &mut Sink,
    input_rx: &mut mpsc::UnboundedReceiver<ClientInput>,
    reader: &mut tokio::task::JoinHandle<()>,
    name: &str,
) -> Result<()> {
    send(sink, &ClientCommand::SetName(name.to_string())).await?;

    loop {
        tokio::select! {
            input = input_rx.recv() => match input {
                Some(ClientInput::Text(text)) => {
                    send(sink, &ClientCommand::SendMessage(Message::Text(text))).await?;
                }
                Some(ClientInput::Exit) | None => {
                    debug!("front end exited");
                    return Ok(());
                }
            },
            _ = &mut *reader => {
                info!("server closed the connection");
                return Ok(());
            }
        }
    }
}

/// Decode server lines and hand them to the front end.
async fn forward(mut source: Source, msg_tx: mpsc::UnboundedSender<ServerCommand>) {
    let mut paused = false;
    loop {
        let frame = match source.next().await {
            Some(frame) => frame,
            // Framing pauses once after a codec error.
            None if paused => {
                paused = false;
                continue;
            }
            None => break,
        };
        match frame {
            Ok(line) => match decode_server(&line) {
                Ok(command) => {
                    if msg_tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, %line, "unknown server command"),
            },
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!("server line too long");
                paused = true;
            }
            Err(LinesCodecError::Io(e)) => {
                warn!(error = %e, "connection error");
                break;
            }
        }
    }
}

async fn send(sink: &mut Sink, command: &ClientCommand) -> Result<()> {
    sink.send(encode(command)?).await?;
    Ok(())
}
