//! # Room Module
//!
//! The state of a chat server: its name, the peers connected to it and a
//! bounded history of posted messages.
//!
//! Every mutating operation returns the [`Delivery`] list the caller must
//! route. The room never talks to a socket itself, so the same logic runs
//! under the server's mutex and in plain unit tests.

use crate::error::{Error, Result};
use crate::message::{Message, User};
use crate::protocol::ServerCommand;
use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;

/// Default number of messages kept for replay to newcomers.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// =============================================================================
// DELIVERY
// =============================================================================

/// Where a server command produced by the room must go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// To every connected peer, the originating one included.
    Broadcast(ServerCommand),
    /// Only to the peer whose command produced it.
    Direct(ServerCommand),
}

// =============================================================================
// ROOM
// =============================================================================

/// Shared server state.
///
/// Peers are keyed by their socket address. A peer that has not sent
/// `SetName` yet has an empty name: it receives broadcasts but does not
/// appear in the user list and cannot post.
#[derive(Debug, Clone, Default)]
pub struct Room {
    /// Display name announced to clients.
    name: String,
    /// Connected peers: address -> user name (empty until named).
    peers: BTreeMap<SocketAddr, User>,
    /// Most recent messages, oldest first.
    history: VecDeque<(User, Message)>,
    /// Maximum history length. Zero disables history.
    history_limit: usize,
}

impl Room {
    /// Create an empty room.
    pub fn new(name: impl Into<String>, history_limit: usize) -> Self {
        Self {
            name: name.into(),
            peers: BTreeMap::new(),
            history: VecDeque::new(),
            history_limit,
        }
    }

    /// The room's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of connected peers, named or not.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// The name registered for `addr`, if it has one.
    pub fn name_of(&self, addr: &SocketAddr) -> Option<&str> {
        self.peers
            .get(addr)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Stored messages, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &(User, Message)> {
        self.history.iter()
    }

    /// Named peers with their addresses, ordered by address.
    pub fn user_list(&self) -> Vec<(User, SocketAddr)> {
        self.peers
            .iter()
            .filter(|(_, name)| !name.is_empty())
            .map(|(addr, name)| (name.clone(), *addr))
            .collect()
    }

    /// Register a fresh connection. Re-joining an address resets its name.
    pub fn join(&mut self, addr: SocketAddr) {
        self.peers.insert(addr, User::new());
    }

    /// Apply `SetName` from `addr`.
    ///
    /// Blank names are ignored. The first successful naming welcomes the
    /// user, tells it the room name and replays the history; every naming
    /// refreshes everyone's user list.
    pub fn set_name(&mut self, addr: SocketAddr, name: &str) -> Result<Vec<Delivery>> {
        let name = name.trim();
        let current = self.peers.get_mut(&addr).ok_or(Error::UnknownPeer(addr))?;
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let first_time = current.is_empty();
        *current = name.to_string();

        let mut deliveries = Vec::new();
        if first_time {
            deliveries.push(Delivery::Broadcast(ServerCommand::ServerMessage(
                Message::Text(format!("Welcome, {}!", name)),
            )));
            deliveries.push(Delivery::Direct(ServerCommand::ServerName(
                self.name.clone(),
            )));
            deliveries.extend(self.history.iter().map(|(user, message)| {
                Delivery::Direct(ServerCommand::UserMessage(user.clone(), message.clone()))
            }));
        }
        deliveries.push(self.user_list_delivery());
        Ok(deliveries)
    }

    /// Apply `SendMessage` from `addr`.
    ///
    /// Messages from unnamed peers and blank messages are dropped.
    pub fn post(&mut self, addr: SocketAddr, message: Message) -> Result<Vec<Delivery>> {
        let name = self.peers.get(&addr).ok_or(Error::UnknownPeer(addr))?;
        if name.is_empty() || message.is_blank() {
            return Ok(Vec::new());
        }
        let name = name.clone();

        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back((name.clone(), message.clone()));
        }

        Ok(vec![Delivery::Broadcast(ServerCommand::UserMessage(
            name, message,
        ))])
    }

    /// Remove `addr` from the room.
    ///
    /// Only named peers are announced; an anonymous connection leaves
    /// silently. Leaving twice is a no-op.
    pub fn leave(&mut self, addr: SocketAddr) -> Vec<Delivery> {
        match self.peers.remove(&addr) {
            Some(name) if !name.is_empty() => vec![
                Delivery::Broadcast(ServerCommand::ServerMessage(Message::Text(format!(
                    "{} left.",
                    name
                )))),
                self.user_list_delivery(),
            ],
            _ => Vec::new(),
        }
    }

    fn user_list_delivery(&self) -> Delivery {
        Delivery::Broadcast(ServerCommand::UserList(self.user_list()))
    }
}
