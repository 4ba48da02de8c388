use chrono::{Local, TimeZone};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::{cell::Cell, fmt::Display, io, time::Duration};
use textwrap::{core::display_width, wrap};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::error::ChatResult;
use crate::grouping::{group, time_label, DateGroup, Side};
use crate::models::{Contact, Message};

pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

/// Rows moved by one PageUp/PageDown
const SCROLL_STEP: usize = 5;

/// What the main loop has to do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Quit,
    /// A different contact was selected; the message list must be reloaded
    ContactChanged(u32),
    /// Post this text as the local user
    Send(String),
}

/// Results of background API calls, delivered to the UI over a channel
#[derive(Debug)]
pub enum ApiEvent {
    Loaded(ChatResult<Vec<Message>>),
    Sent(ChatResult<Vec<Message>>),
    Health(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Messages,
    Contacts,
}

/// Blocking popup shown after a failed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub detail: String,
}

/// One logical row of the conversation view, before wrapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRow {
    Date(String),
    Bubble { side: Side, text: String, time: String },
    RunBreak,
}

pub struct ChatUI {
    contacts: Vec<Contact>,
    current_contact_index: usize,
    messages: Vec<Message>,
    input: Input,
    active_tab: Tab,
    /// Lines scrolled up from the newest message; 0 follows the bottom
    scroll_offset: usize,
    notification: Option<Notification>,
    connection_status: bool,
    rendered_lines: Cell<usize>,
}

impl ChatUI {
    pub fn new(contacts: Vec<Contact>) -> Self {
        ChatUI {
            contacts,
            current_contact_index: 0,
            messages: Vec::new(),
            input: Input::default(),
            active_tab: Tab::Messages,
            scroll_offset: 0,
            notification: None,
            connection_status: false,
            rendered_lines: Cell::new(0),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn active_contact(&self) -> Option<&Contact> {
        self.contacts.get(self.current_contact_index)
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn input_text(&self) -> &str {
        self.input.value()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status
    }

    pub fn set_connection_status(&mut self, connected: bool) {
        self.connection_status = connected;
    }

    /// Sending is only possible with non-blank input
    pub fn can_send(&self) -> bool {
        !self.input.value().trim().is_empty()
    }

    /// Replace the whole list, as after a (re)load.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.scroll_to_bottom();
    }

    /// Append messages whose id is not already shown. Returns how many were added.
    pub fn merge_messages(&mut self, incoming: Vec<Message>) -> usize {
        let mut added = 0;
        for message in incoming {
            if self.messages.iter().any(|m| m.id == message.id) {
                debug!("UI: Skipping duplicate message {}", message.id);
                continue;
            }
            self.messages.push(message);
            added += 1;
        }
        self.scroll_to_bottom();
        added
    }

    pub fn show_notification(&mut self, message: &str, detail: &str) {
        self.notification = Some(Notification {
            message: message.to_string(),
            detail: detail.to_string(),
        });
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Fold a finished background request into the view.
    pub fn apply(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::Loaded(Ok(messages)) => {
                info!("UI: Loaded {} messages", messages.len());
                self.set_messages(messages);
            }
            ApiEvent::Loaded(Err(e)) => {
                error!("Failed to fetch messages: {}", e);
                self.show_notification("Failed to fetch messages. Please try again.", &e.to_string());
            }
            ApiEvent::Sent(Ok(sent)) => {
                let added = self.merge_messages(sent);
                debug!("UI: Merged {} sent messages", added);
                self.input.reset();
            }
            ApiEvent::Sent(Err(e)) => {
                // The typed text stays in the input for a manual retry
                error!("Failed to send message: {}", e);
                self.show_notification("Failed to send message. Please try again.", &e.to_string());
            }
            ApiEvent::Health(connected) => self.set_connection_status(connected),
        }
    }

    fn select_contact(&mut self, index: usize) -> Option<UiAction> {
        if index == self.current_contact_index {
            return None;
        }
        self.current_contact_index = index;
        self.active_contact().map(|c| UiAction::ContactChanged(c.id))
    }

    pub fn handle_input(&mut self) -> io::Result<Option<UiAction>> {
        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key));
                }
            }
        }
        Ok(None)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        // The popup swallows everything until it is dismissed
        if self.notification.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notification = None;
            }
            return None;
        }

        match key.code {
            KeyCode::Esc => return Some(UiAction::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(UiAction::Quit)
            }
            KeyCode::Tab => {
                self.active_tab = match self.active_tab {
                    Tab::Messages => Tab::Contacts,
                    Tab::Contacts => Tab::Messages,
                };
                return None;
            }
            KeyCode::PageUp => {
                let max = self.rendered_lines.get().saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + SCROLL_STEP).min(max);
                return None;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
                return None;
            }
            _ => {}
        }

        match self.active_tab {
            Tab::Contacts => match key.code {
                KeyCode::Up if !self.contacts.is_empty() => {
                    let len = self.contacts.len();
                    self.select_contact((self.current_contact_index + len - 1) % len)
                }
                KeyCode::Down if !self.contacts.is_empty() => {
                    self.select_contact((self.current_contact_index + 1) % self.contacts.len())
                }
                KeyCode::Enter => {
                    self.active_tab = Tab::Messages;
                    None
                }
                _ => None,
            },
            Tab::Messages => match key.code {
                KeyCode::Enter => {
                    if self.can_send() {
                        Some(UiAction::Send(self.input.value().to_string()))
                    } else {
                        None
                    }
                }
                _ => {
                    self.input.handle_event(&Event::Key(key));
                    None
                }
            },
        }
    }

    pub fn draw<B: Backend>(&self, frame: &mut Frame<B>) {
        let size = frame.size();

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25), // Contacts
                Constraint::Percentage(50), // Conversation
                Constraint::Percentage(25), // Profile
            ])
            .split(size);

        let chat_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Messages
                Constraint::Length(3), // Input
                Constraint::Length(1), // Help line
            ])
            .split(columns[1]);

        self.draw_contacts(frame, columns[0]);
        self.draw_header(frame, chat_chunks[0]);
        self.draw_messages(frame, chat_chunks[1]);
        self.draw_input(frame, chat_chunks[2]);

        let help = Paragraph::new(Line::from(vec![Span::styled(
            "ESC quit | TAB switch | Up/Down contact | PgUp/PgDn scroll | Enter send",
            Style::default().fg(Color::Gray),
        )]));
        frame.render_widget(help, chat_chunks[3]);

        self.draw_profile(frame, columns[2]);

        if let Tab::Messages = self.active_tab {
            frame.set_cursor(
                chat_chunks[2].x + self.input.cursor() as u16 + 1,
                chat_chunks[2].y + 1,
            );
        }

        if let Some(notification) = &self.notification {
            draw_notification(frame, notification, size);
        }
    }

    fn draw_contacts<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let items: Vec<ListItem> = self
            .contacts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let active = i == self.current_contact_index;
                let marker = if active { "> " } else { "  " };
                let name_style = if active {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Text::from(vec![
                    Line::from(Span::styled(format!("{}{}", marker, c.name), name_style)),
                    Line::from(Span::styled(
                        format!("  {}", c.last_message),
                        Style::default().fg(Color::DarkGray),
                    )),
                ]))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title("Chats (Tab to focus)")
                .borders(Borders::ALL)
                .border_style(match self.active_tab {
                    Tab::Contacts => Style::default().fg(Color::Yellow),
                    Tab::Messages => Style::default(),
                }),
        );
        let mut state = ListState::default();
        state.select(Some(self.current_contact_index));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_header<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let (name, status) = match self.active_contact() {
            Some(c) => (c.name.as_str(), c.status.as_str()),
            None => ("No contact", ""),
        };
        let connection = if self.is_connected() {
            Span::styled(" online", Style::default().fg(Color::Green))
        } else {
            Span::styled(" offline", Style::default().fg(Color::Red))
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled(name.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(status.to_string(), Style::default().fg(Color::Gray)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(vec![Span::raw("Server:"), connection])),
        );
        frame.render_widget(header, area);
    }

    fn draw_messages<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let width = area.width.saturating_sub(2) as usize;
        let rows = build_rows(&group(&self.messages), &Local);
        let items: Vec<ListItem> = rows
            .iter()
            .flat_map(|row| row_lines(row, width))
            .map(ListItem::new)
            .collect();
        self.rendered_lines.set(items.len());

        // Selecting the newest line keeps the list pinned to the bottom
        let mut list_state = ListState::default();
        if !items.is_empty() {
            let offset = self.scroll_offset.min(items.len() - 1);
            list_state.select(Some(items.len() - 1 - offset));
        }

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Messages"))
            .highlight_style(Style::default());
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_input<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let send_hint = if self.can_send() {
            Span::styled(" [Enter: send]", Style::default().fg(Color::Green))
        } else {
            Span::styled(" [Enter: send]", Style::default().fg(Color::DarkGray))
        };
        let block = Block::default()
            .title(Line::from(vec![Span::raw("Message"), send_hint]))
            .borders(Borders::ALL)
            .border_style(match self.active_tab {
                Tab::Messages => Style::default().fg(Color::Yellow),
                Tab::Contacts => Style::default(),
            });

        let body = if self.input.value().is_empty() {
            Paragraph::new(Span::styled("Type a message", Style::default().fg(Color::DarkGray)))
        } else {
            Paragraph::new(self.input.value())
        };
        frame.render_widget(body.block(block), area);
    }

    fn draw_profile<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let lines = match self.active_contact() {
            Some(c) => vec![
                Line::from(Span::styled(
                    c.first_name().to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(c.status.clone(), Style::default().fg(Color::Gray))),
                Line::from(""),
                Line::from("View profile"),
                Line::from("Search chat"),
                Line::from("Sent images"),
                Line::from("More options"),
            ],
            None => Vec::new(),
        };
        let profile = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Profile"))
            .wrap(Wrap { trim: true });
        frame.render_widget(profile, area);
    }
}

/// Flatten grouped messages into display rows: a date label per group, a
/// bubble per message, and a break between sender runs.
pub fn build_rows<Tz: TimeZone>(groups: &[DateGroup], tz: &Tz) -> Vec<ChatRow>
where
    Tz::Offset: Display,
{
    let mut rows = Vec::new();
    for group in groups {
        rows.push(ChatRow::Date(group.label.clone()));
        for (i, run) in group.runs.iter().enumerate() {
            if i > 0 {
                rows.push(ChatRow::RunBreak);
            }
            let side = run.side();
            for message in &run.messages {
                rows.push(ChatRow::Bubble {
                    side,
                    text: message.text.clone(),
                    time: time_label(message, tz),
                });
            }
        }
    }
    rows
}

/// Wrap one row to `width` columns. Sent bubbles are right-aligned.
pub fn row_lines(row: &ChatRow, width: usize) -> Vec<Line<'static>> {
    match row {
        ChatRow::RunBreak => vec![Line::from("")],
        ChatRow::Date(label) => {
            let pad = width.saturating_sub(display_width(label)) / 2;
            vec![Line::from(Span::styled(
                format!("{}{}", " ".repeat(pad), label),
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            ))]
        }
        ChatRow::Bubble { side, text, time } => {
            let bubble_width = (width * 2 / 3).max(10);
            let text_style = match side {
                Side::Sent => Style::default().fg(Color::Cyan),
                Side::Received => Style::default(),
            };
            let mut wrapped: Vec<String> = wrap(text, bubble_width)
                .into_iter()
                .map(|l| l.into_owned())
                .collect();
            if wrapped.is_empty() {
                wrapped.push(String::new());
            }

            let last = wrapped.len() - 1;
            wrapped
                .into_iter()
                .enumerate()
                .map(|(i, content)| {
                    let mut spans = vec![Span::styled(content, text_style)];
                    if i == last {
                        spans.push(Span::styled(
                            format!(" {}", time),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                    if *side == Side::Sent {
                        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
                        spans.insert(0, Span::raw(" ".repeat(width.saturating_sub(used))));
                    }
                    Line::from(spans)
                })
                .collect()
        }
    }
}

fn draw_notification<B: Backend>(f: &mut Frame<B>, notification: &Notification, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 8.min(area.height.saturating_sub(4));
    let popup_area = Rect::new(
        (area.width - popup_width) / 2,
        (area.height - popup_height) / 2,
        popup_width,
        popup_height,
    );

    let text = vec![
        Line::from(Span::styled(
            notification.message.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(notification.detail.clone(), Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from("Press [Enter] or [ESC] to dismiss"),
    ];
    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .title("Error")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
