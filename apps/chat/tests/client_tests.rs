//! Integration tests for the chat client against a live server.
//!
//! A scripted front end stands in for the terminal.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use chat::Result;
use chat::app::{App, Rx, Tx};
use chat::chat_core::{ClientCommand, Message, ServerCommand, decode_server, encode};
use chat::client::{Client, ClientConfig, ClientInput};
use chat::server::{Server, ServerConfig};
use futures::{SinkExt, StreamExt};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

const TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server() -> SocketAddr {
    let server = Server::bind(ServerConfig {
        bind: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        name: "Lobby".to_string(),
        ..ServerConfig::default()
    })
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

fn client_config(addr: SocketAddr, name: Option<&str>) -> ClientConfig {
    ClientConfig {
        server: addr.ip().to_string(),
        port: addr.port(),
        name: name.map(str::to_string),
        tui: false,
    }
}

/// Posts its lines once registered, waits for the last one to come back,
/// then exits and reports everything it saw.
struct ScriptedApp {
    lines: Vec<String>,
    seen: oneshot::Sender<(String, Vec<ServerCommand>)>,
}

impl App for ScriptedApp {
    fn start(
        self,
        input_tx: Tx<ClientInput>,
        mut msg_rx: Rx<ServerCommand>,
        name: &str,
    ) -> Result<JoinHandle<Result<()>>> {
        let name = name.to_string();
        Ok(tokio::spawn(async move {
            let mut seen = Vec::new();
            let last = self.lines.last().cloned();
            for line in self.lines {
                input_tx.send(ClientInput::Text(line)).unwrap();
            }
            while let Some(command) = msg_rx.recv().await {
                let done = matches!(
                    (&command, &last),
                    (ServerCommand::UserMessage(user, message), Some(last))
                        if *user == name && message.to_string() == *last
                );
                seen.push(command);
                if done || last.is_none() {
                    break;
                }
            }
            input_tx.send(ClientInput::Exit).unwrap();
            let _ = self.seen.send((name, seen));
            Ok(())
        }))
    }
}

/// Exits as soon as it starts.
struct QuitApp;

impl App for QuitApp {
    fn start(
        self,
        input_tx: Tx<ClientInput>,
        _msg_rx: Rx<ServerCommand>,
        _name: &str,
    ) -> Result<JoinHandle<Result<()>>> {
        input_tx.send(ClientInput::Exit).unwrap();
        Ok(tokio::spawn(async { Ok(()) }))
    }
}

/// A raw observer connection, named and past its greeting.
async fn observer(addr: SocketAddr, name: &str) -> Framed<TcpStream, LinesCodec> {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut transport = Framed::new(stream, LinesCodec::new());
    transport
        .send(encode(&ClientCommand::SetName(name.to_string())).unwrap())
        .await
        .unwrap();
    recv_until(&mut transport, |c| matches!(c, ServerCommand::UserList(..))).await;
    transport
}

async fn recv_until(
    transport: &mut Framed<TcpStream, LinesCodec>,
    predicate: impl Fn(&ServerCommand) -> bool,
) -> ServerCommand {
    loop {
        let line = tokio::time::timeout(TIMEOUT, transport.next())
            .await
            .expect("timed out waiting for the server")
            .expect("connection closed")
            .unwrap();
        let command = decode_server(&line).unwrap();
        if predicate(&command) {
            return command;
        }
    }
}

// =============================================================================
// CLIENT TESTS
// =============================================================================

#[tokio::test]
async fn test_client_registers_posts_and_exits() {
    let addr = start_server().await;
    let mut watcher = observer(addr, "watcher").await;

    let client = Client::connect(&client_config(addr, Some("bot")))
        .await
        .unwrap();
    assert_eq!(client.name(), "bot");

    let (seen_tx, seen_rx) = oneshot::channel();
    let app = ScriptedApp {
        lines: vec!["hello from bot".to_string()],
        seen: seen_tx,
    };
    tokio::time::timeout(TIMEOUT, client.run(app))
        .await
        .unwrap()
        .unwrap();

    let (name, seen) = seen_rx.await.unwrap();
    assert_eq!(name, "bot");
    assert_eq!(seen.first(), Some(&ServerCommand::ServerName("Lobby".to_string())));

    let relayed = recv_until(&mut watcher, |c| matches!(c, ServerCommand::UserMessage(..))).await;
    assert_eq!(
        relayed,
        ServerCommand::UserMessage("bot".to_string(), Message::text("hello from bot"))
    );
    let left = recv_until(&mut watcher, |c| matches!(c, ServerCommand::ServerMessage(..))).await;
    assert_eq!(left, ServerCommand::ServerMessage(Message::text("bot left.")));
}

#[tokio::test]
async fn test_client_without_name_gets_generated_one() {
    let addr = start_server().await;
    let mut watcher = observer(addr, "watcher").await;

    let client = Client::connect(&client_config(addr, None)).await.unwrap();
    let name = client.name().to_string();
    assert!(!name.is_empty());

    tokio::time::timeout(TIMEOUT, client.run(QuitApp))
        .await
        .unwrap()
        .unwrap();

    let welcome = recv_until(&mut watcher, |c| {
        matches!(c, ServerCommand::ServerMessage(m) if m.to_string().starts_with("Welcome"))
    })
    .await;
    assert_eq!(
        welcome,
        ServerCommand::ServerMessage(Message::Text(format!("Welcome, {}!", name)))
    );
}

#[tokio::test]
async fn test_client_stops_when_server_goes_away() {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept one connection, read the name, then hang up.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut transport = Framed::new(stream, LinesCodec::new());
        let _ = transport.next().await;
    });

    let client = Client::connect(&client_config(addr, Some("bot")))
        .await
        .unwrap();
    let (seen_tx, _seen_rx) = oneshot::channel();
    let app = ScriptedApp {
        lines: Vec::new(),
        seen: seen_tx,
    };

    tokio::time::timeout(TIMEOUT, client.run(app))
        .await
        .unwrap()
        .unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(Client::connect(&client_config(addr, Some("bot"))).await.is_err());
}
