use super::{App, Input, LocalCommand, Rx, Tx, parse_input};
use crate::client::ClientInput;
use crate::error::Result;
use chat_core::ServerCommand;
use std::io::BufRead;
use tokio::task::JoinHandle;
use tracing::debug;

/// A line-oriented front end: stdin in, stdout out.
#[derive(Debug, Default)]
pub struct BasicApp;

impl App for BasicApp {
    fn start(
        self,
        input_tx: Tx<ClientInput>,
        mut msg_rx: Rx<ServerCommand>,
        name: &str,
    ) -> Result<JoinHandle<Result<()>>> {
        println!("Joined as `{}`.", name);

        // Blocking stdin reads get their own thread so they never hold up
        // runtime shutdown.
        std::thread::Builder::new()
            .name("stdin".to_string())
            .spawn(move || read_stdin(input_tx))?;

        Ok(tokio::spawn(async move {
            while let Some(command) = msg_rx.recv().await {
                println!("{}", render(&command));
            }
            Ok(())
        }))
    }
}

fn read_stdin(input_tx: Tx<ClientInput>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let input = match parse_input(&line) {
            None => continue,
            Some(Input::Message(text)) => ClientInput::Text(text),
            Some(Input::Command(LocalCommand::Exit)) => break,
            Some(Input::Command(LocalCommand::Clear)) => continue,
            Some(Input::Command(LocalCommand::Invalid(command))) => {
                println!("Invalid command `{}`", command);
                continue;
            }
        };
        if input_tx.send(input).is_err() {
            return;
        }
    }
    debug!("stdin closed");
    let _ = input_tx.send(ClientInput::Exit);
}

/// One output line per server command.
fn render(command: &ServerCommand) -> String {
    match command {
        ServerCommand::UserMessage(user, message) => format!("[{}] {}", user, message),
        ServerCommand::ServerMessage(message) => format!("<SERVER> {}", message),
        ServerCommand::UserList(users) => {
            let names: Vec<&str> = users.iter().map(|(name, _)| name.as_str()).collect();
            format!("<SERVER> Online users: {}", names.join(", "))
        }
        ServerCommand::Error(message) => format!("<SERVER> Error: {}", message),
        ServerCommand::ServerName(name) => format!("<SERVER> Server's name is `{}`", name),
    }
}
