//! Chat messages as they travel between users.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user's display name.
pub type User = String;

/// All kinds of messages a user can post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Text(String),
}

impl Message {
    /// Create a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// True when there is nothing to show once whitespace is trimmed.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text.trim()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_trims_surrounding_whitespace() {
        let message = Message::text("  hello there \n");
        assert_eq!(message.to_string(), "hello there");
    }

    #[test]
    fn display_keeps_inner_whitespace() {
        let message = Message::text("a  b");
        assert_eq!(message.to_string(), "a  b");
    }

    #[test]
    fn blank_detection() {
        assert!(Message::text("").is_blank());
        assert!(Message::text(" \t\n").is_blank());
        assert!(!Message::text(" x ").is_blank());
    }
}
