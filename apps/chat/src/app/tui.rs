use super::{App, ChatView, KeyOutcome, LineKind, Rx, Tx};
use crate::client::ClientInput;
use crate::error::Result;
use chat_core::ServerCommand;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use tokio::task::JoinHandle;
use tracing::debug;

/// A full-screen terminal front end.
#[derive(Debug, Default)]
pub struct TuiApp;

impl App for TuiApp {
    fn start(
        self,
        input_tx: Tx<ClientInput>,
        mut msg_rx: Rx<ServerCommand>,
        name: &str,
    ) -> Result<JoinHandle<Result<()>>> {
        let mut terminal = ratatui::try_init()?;
        let mut view = ChatView::new(name);

        Ok(tokio::spawn(async move {
            let result = event_loop(&mut terminal, &mut view, &input_tx, &mut msg_rx).await;
            ratatui::restore();
            result
        }))
    }
}

/// Redraw, then wait for a key press or a server command.
async fn event_loop(
    terminal: &mut DefaultTerminal,
    view: &mut ChatView,
    input_tx: &Tx<ClientInput>,
    msg_rx: &mut Rx<ServerCommand>,
) -> Result<()> {
    let mut events = EventStream::new();

    loop {
        terminal.draw(|frame| render(frame, &*view))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match view.handle_key(key) {
                        KeyOutcome::None => {}
                        KeyOutcome::Send(text) => {
                            if input_tx.send(ClientInput::Text(text)).is_err() {
                                return Ok(());
                            }
                        }
                        KeyOutcome::Exit => {
                            let _ = input_tx.send(ClientInput::Exit);
                            return Ok(());
                        }
                    }
                }
                // Resizes and the like only need a redraw.
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            command = msg_rx.recv() => match command {
                Some(command) => view.apply(command),
                None => {
                    debug!("connection closed, leaving the terminal UI");
                    return Ok(());
                }
            },
        }
    }
}

fn style_of(kind: LineKind) -> Style {
    match kind {
        LineKind::User => Style::default(),
        LineKind::Notice => Style::default().add_modifier(Modifier::BOLD),
        LineKind::Error => Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::LightRed),
        LineKind::Local => Style::default().fg(Color::Red),
    }
}

fn render(frame: &mut Frame, view: &ChatView) {
    //  |        rows[0]         |
    //  | body[0]   |   body[1]  |  <- rows[1]
    //  |        rows[2]         |
    let rows = Layout::default()
        .margin(1)
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Max(2),
            Constraint::Percentage(70),
            Constraint::Percentage(20),
        ])
        .split(frame.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(80), Constraint::Percentage(20)])
        .split(rows[1]);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help = Paragraph::new(Line::from(vec![
        Span::styled(
            view.server_name.as_str(),
            bold.add_modifier(Modifier::ITALIC),
        ),
        Span::raw(" -- Press "),
        Span::styled("ESC", bold),
        Span::raw(" or send "),
        Span::styled(":exit", bold),
        Span::raw(" to exit"),
    ]));
    frame.render_widget(help, rows[0]);

    let visible = rows[1].height.saturating_sub(2) as usize;
    let skip = view.messages.len().saturating_sub(visible);
    let messages: Vec<ListItem> = view
        .messages
        .iter()
        .skip(skip)
        .map(|line| ListItem::new(Span::styled(line.text.as_str(), style_of(line.kind))))
        .collect();
    let messages =
        List::new(messages).block(Block::default().borders(Borders::ALL).title("Messages"));
    frame.render_widget(messages, body[0]);

    let users: Vec<ListItem> = view
        .users
        .iter()
        .map(|user| ListItem::new(user.as_str()))
        .collect();
    let users = List::new(users).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} Users", view.users.len())),
    );
    frame.render_widget(users, body[1]);

    let input = Paragraph::new(view.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(view.username.as_str()),
        );
    frame.render_widget(input, rows[2]);

    let inner_width = rows[2].width.saturating_sub(2).max(1);
    let width = view.input_width() as u16;
    frame.set_cursor_position((
        rows[2].x + width % inner_width + 1,
        rows[2].y + width / inner_width + 1,
    ));
}
