//! Rendering seam between the chat client and whatever shows the conversation.

use chrono::{DateTime, NaiveDateTime};
use colored::*;

use crate::protocol::InboundMessage;

/// How a message relates to the local participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Sent by the local (non-admin) participant.
    Own,
    /// Sent by a support agent.
    Support,
    Peer,
}

pub trait ChatView {
    fn clear_transcript(&mut self);
    fn append_message(&mut self, msg: &InboundMessage, origin: MessageOrigin);
    fn append_status(&mut self, text: &str);
    /// Show the single "X is typing..." slot, replacing whatever name it held.
    fn show_typing(&mut self, name: &str);
    fn hide_typing(&mut self);
    fn clear_compose(&mut self) {}
}

// ---------------------------------------------------------------------------
// In-memory view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Message {
        message: InboundMessage,
        origin: MessageOrigin,
    },
    Status(String),
}

/// Keeps the transcript and indicator in memory.
#[derive(Debug, Default, Clone)]
pub struct TranscriptView {
    pub entries: Vec<TranscriptEntry>,
    /// Name currently shown in the typing slot.
    pub typing: Option<String>,
    pub compose_clears: usize,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &InboundMessage> {
        self.entries.iter().filter_map(|e| match e {
            TranscriptEntry::Message { message, .. } => Some(message),
            TranscriptEntry::Status(_) => None,
        })
    }

    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            TranscriptEntry::Status(s) => Some(s.as_str()),
            TranscriptEntry::Message { .. } => None,
        })
    }
}

impl ChatView for TranscriptView {
    fn clear_transcript(&mut self) {
        self.entries.clear();
    }

    fn append_message(&mut self, msg: &InboundMessage, origin: MessageOrigin) {
        self.entries.push(TranscriptEntry::Message {
            message: msg.clone(),
            origin,
        });
    }

    fn append_status(&mut self, text: &str) {
        self.entries.push(TranscriptEntry::Status(text.to_string()));
    }

    fn show_typing(&mut self, name: &str) {
        self.typing = Some(name.to_string());
    }

    fn hide_typing(&mut self) {
        self.typing = None;
    }

    fn clear_compose(&mut self) {
        self.compose_clears += 1;
    }
}

// ---------------------------------------------------------------------------
// Console view
// ---------------------------------------------------------------------------

/// Prints the conversation to stdout, one line per entry.
#[derive(Debug, Default)]
pub struct ConsoleView {
    typing: Option<String>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatView for ConsoleView {
    fn clear_transcript(&mut self) {
        println!("{}", "── history ──".dimmed());
    }

    fn append_message(&mut self, msg: &InboundMessage, origin: MessageOrigin) {
        println!("{}", format_message(msg, origin));
    }

    fn append_status(&mut self, text: &str) {
        println!("{}", format!("* {}", text).yellow().dimmed());
    }

    fn show_typing(&mut self, name: &str) {
        if self.typing.as_deref() != Some(name) {
            println!("{}", typing_label(name).italic().dimmed());
        }
        self.typing = Some(name.to_string());
    }

    fn hide_typing(&mut self) {
        self.typing = None;
    }
}

/// `"{name} is typing..."`
pub fn typing_label(name: &str) -> String {
    format!("{} is typing...", name)
}

/// Format one transcript line: `[HH:MM:SS] Name: text`, colored by origin.
pub fn format_message(msg: &InboundMessage, origin: MessageOrigin) -> String {
    let time = msg
        .sent_at
        .as_deref()
        .map(display_time)
        .unwrap_or_default();
    let sender = match origin {
        MessageOrigin::Own => msg.sender_name.bright_green().bold(),
        MessageOrigin::Support => msg.sender_name.bright_cyan().bold(),
        MessageOrigin::Peer => msg.sender_name.bold(),
    };
    if time.is_empty() {
        format!("{}: {}", sender, msg.text)
    } else {
        format!("{} {}: {}", format!("[{}]", time).dimmed(), sender, msg.text)
    }
}

/// Wall-clock `HH:MM:SS` from an ISO-8601 timestamp; the raw text when it does
/// not parse.
pub fn display_time(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%H:%M:%S").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%H:%M:%S").to_string();
    }
    raw.to_string()
}
