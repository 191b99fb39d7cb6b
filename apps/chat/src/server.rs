//! # Chat Server
//!
//! A TCP server that accepts any number of clients and relays their
//! messages through a shared [`Room`].
//!
//! Each connection runs in its own task and owns:
//! - the framed socket (one JSON command per line)
//! - the receiving half of an unbounded outbox, into which other
//!   connections push broadcasts
//!
//! The sending halves of all outboxes live in the [`Hub`] next to the room,
//! behind one `tokio::sync::Mutex`.

use crate::error::Result;
use chat_core::{
    ClientCommand, DEFAULT_HISTORY_LIMIT, DEFAULT_PORT, Delivery, ERROR_REPLY, MAX_LINE_LENGTH,
    Room, ServerCommand, decode_client, encode,
};
use futures::{SinkExt, StreamExt};
use std::collections::BTreeMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{Instrument, Span, debug, field, info, info_span, warn};

type Transport = Framed<TcpStream, LinesCodec>;
type Outbox = mpsc::UnboundedSender<ServerCommand>;
type Inbox = mpsc::UnboundedReceiver<ServerCommand>;
type SharedHub = Arc<Mutex<Hub>>;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Server settings, filled from the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: IpAddr,
    /// Port to listen on. Zero picks a free port.
    pub port: u16,
    /// Room name announced to clients.
    pub name: String,
    /// Number of messages replayed to newcomers.
    pub history_limit: usize,
    /// Longest accepted line in bytes.
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            name: "Chat".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}

// =============================================================================
// HUB (ROOM + OUTBOXES)
// =============================================================================

/// The room together with the send halves of every connection's outbox.
struct Hub {
    room: Room,
    outboxes: BTreeMap<SocketAddr, Outbox>,
}

impl Hub {
    fn register(&mut self, addr: SocketAddr, outbox: Outbox) {
        self.room.join(addr);
        self.outboxes.insert(addr, outbox);
    }

    fn unregister(&mut self, addr: SocketAddr) {
        self.outboxes.remove(&addr);
        let deliveries = self.room.leave(addr);
        self.route(deliveries);
    }

    /// Apply a decoded command and return what must be written back to the
    /// sender directly.
    fn apply(&mut self, addr: SocketAddr, command: ClientCommand) -> Result<Vec<ServerCommand>> {
        let deliveries = match command {
            ClientCommand::SetName(name) => {
                let deliveries = self.room.set_name(addr, &name)?;
                if let Some(name) = self.room.name_of(&addr)
                    && !deliveries.is_empty()
                {
                    Span::current().record("user", name);
                    info!(user = %name, "set name");
                }
                deliveries
            }
            ClientCommand::SendMessage(message) => {
                let text = message.to_string();
                let deliveries = self.room.post(addr, message)?;
                if !deliveries.is_empty() {
                    debug!(message = %text, "message");
                }
                deliveries
            }
        };
        Ok(self.route(deliveries))
    }

    /// Push broadcasts to every outbox; hand back the direct replies.
    ///
    /// Chat lines skip peers without a name. They get those lines from the
    /// history replay once they pick one.
    fn route(&self, deliveries: Vec<Delivery>) -> Vec<ServerCommand> {
        let mut direct = Vec::new();
        for delivery in deliveries {
            match delivery {
                Delivery::Broadcast(command) => {
                    let chat_line = matches!(command, ServerCommand::UserMessage(..));
                    for (addr, outbox) in &self.outboxes {
                        if chat_line && self.room.name_of(addr).is_none() {
                            continue;
                        }
                        // A closed outbox belongs to a connection that is
                        // already unregistering.
                        let _ = outbox.send(command.clone());
                    }
                }
                Delivery::Direct(command) => direct.push(command),
            }
        }
        direct
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// The chat server.
pub struct Server {
    listener: TcpListener,
    hub: SharedHub,
    name: String,
    max_line_length: usize,
}

impl Server {
    /// Bind the listening socket.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.bind, config.port)).await?;
        let hub = Hub {
            room: Room::new(config.name.clone(), config.history_limit),
            outboxes: BTreeMap::new(),
        };
        Ok(Self {
            listener,
            hub: Arc::new(Mutex::new(hub)),
            name: config.name,
            max_line_length: config.max_line_length,
        })
    }

    /// The address actually bound, useful when the port was zero.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// Connection tasks already running are left to the runtime.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        info!(addr = %self.local_addr()?, name = %self.name, "listening");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let hub = Arc::clone(&self.hub);
                    let max_line_length = self.max_line_length;
                    let span = info_span!("conn", peer = %addr, user = field::Empty);
                    tokio::spawn(
                        async move {
                            if let Err(e) = handle(stream, addr, hub, max_line_length).await {
                                warn!(error = %e, "connection closed with error");
                            }
                        }
                        .instrument(span),
                    );
                }
            }
        }
    }
}

// =============================================================================
// CONNECTION HANDLING
// =============================================================================

/// Register the peer, serve it until it goes away, then unregister it.
async fn handle(
    stream: TcpStream,
    addr: SocketAddr,
    hub: SharedHub,
    max_line_length: usize,
) -> Result<()> {
    let mut transport = Framed::new(stream, LinesCodec::new_with_max_length(max_line_length));
    let (outbox, mut inbox) = mpsc::unbounded_channel();
    hub.lock().await.register(addr, outbox);
    info!("joined");

    let result = serve(&mut transport, &mut inbox, addr, &hub).await;

    hub.lock().await.unregister(addr);
    info!("left");
    result
}

/// Poll the outbox and the socket until the client disconnects.
async fn serve(
    transport: &mut Transport,
    inbox: &mut Inbox,
    addr: SocketAddr,
    hub: &SharedHub,
) -> Result<()> {
    // After a codec error the framed stream yields one `None` before it
    // resumes reading; that one is not an EOF.
    let mut paused = false;

    loop {
        tokio::select! {
            Some(command) = inbox.recv() => {
                send(transport, &command).await?;
            }
            frame = transport.next() => match frame {
                None if paused => paused = false,
                None => return Ok(()),
                Some(Ok(line)) => match decode_client(&line) {
                    Ok(command) => {
                        let direct = hub.lock().await.apply(addr, command)?;
                        for command in &direct {
                            send(transport, command).await?;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "undecodable command");
                        send(transport, &ServerCommand::Error(ERROR_REPLY.to_string())).await?;
                    }
                },
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!("line too long");
                    paused = true;
                    send(transport, &ServerCommand::Error(ERROR_REPLY.to_string())).await?;
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
            }
        }
    }
}

async fn send(transport: &mut Transport, command: &ServerCommand) -> Result<()> {
    transport.send(encode(command)?).await?;
    Ok(())
}
