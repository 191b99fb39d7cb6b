//! What the terminal UI shows, kept apart from the terminal itself.

use super::{Input, LocalCommand, parse_input};
use chat_core::{ServerCommand, User};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthStr;

/// Longest input the user can type, in characters.
pub const MAX_INPUT_CHARS: usize = 140;

/// How a line in the message pane is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    User,
    Notice,
    Error,
    /// Feedback from a local `:command`.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub text: String,
    pub kind: LineKind,
}

impl ViewLine {
    fn new(text: String, kind: LineKind) -> Self {
        Self { text, kind }
    }
}

/// The result of a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing to forward; redraw.
    None,
    /// Post this text.
    Send(String),
    /// Leave the chat.
    Exit,
}

/// State of the terminal UI.
#[derive(Debug, Clone)]
pub struct ChatView {
    pub input: String,
    pub last_input: String,
    pub messages: Vec<ViewLine>,
    pub username: User,
    pub users: Vec<User>,
    pub server_name: String,
}

impl ChatView {
    pub fn new(username: &str) -> Self {
        Self {
            input: String::new(),
            last_input: String::new(),
            messages: Vec::new(),
            username: username.to_string(),
            users: Vec::new(),
            server_name: "Chat".to_string(),
        }
    }

    /// Display width of the pending input, for cursor placement.
    pub fn input_width(&self) -> usize {
        self.input.width()
    }

    /// Update the view from a server command, stamping user messages with
    /// the local time.
    pub fn apply(&mut self, command: ServerCommand) {
        let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.apply_at(command, &stamp);
    }

    /// [`ChatView::apply`] with an explicit timestamp.
    pub fn apply_at(&mut self, command: ServerCommand, stamp: &str) {
        match command {
            ServerCommand::UserMessage(user, message) => self.messages.push(ViewLine::new(
                format!("[{}, {}] {}", user, stamp, message),
                LineKind::User,
            )),
            ServerCommand::ServerMessage(message) => self
                .messages
                .push(ViewLine::new(format!("=> {}", message), LineKind::Notice)),
            ServerCommand::Error(message) => self.messages.push(ViewLine::new(
                format!("=> Error: {}", message),
                LineKind::Error,
            )),
            ServerCommand::UserList(users) => {
                self.users = users.into_iter().map(|(name, _)| name).collect();
            }
            ServerCommand::ServerName(name) => self.server_name = name,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Esc => KeyOutcome::Exit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Exit,
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) => {
                if self.input.chars().count() < MAX_INPUT_CHARS {
                    self.input.push(c);
                }
                KeyOutcome::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                KeyOutcome::None
            }
            KeyCode::Up if self.input.is_empty() => {
                self.input = self.last_input.clone();
                KeyOutcome::None
            }
            _ => KeyOutcome::None,
        }
    }

    fn submit(&mut self) -> KeyOutcome {
        if self.input.is_empty() {
            return KeyOutcome::None;
        }
        let text = std::mem::take(&mut self.input);
        self.last_input = text.clone();

        match parse_input(&text) {
            None => KeyOutcome::None,
            Some(Input::Message(text)) => KeyOutcome::Send(text),
            Some(Input::Command(LocalCommand::Exit)) => KeyOutcome::Exit,
            Some(Input::Command(LocalCommand::Clear)) => {
                self.messages.clear();
                KeyOutcome::None
            }
            Some(Input::Command(LocalCommand::Invalid(command))) => {
                self.messages.push(ViewLine::new(
                    format!("=> Invalid command `{}`", command),
                    LineKind::Local,
                ));
                KeyOutcome::None
            }
        }
    }
}
