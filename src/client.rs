//! Chat session client: one order conversation bound to one channel.
//!
//! ## Design
//! - The client is owned by a single task; every method takes `&mut self`
//! - Outbound emissions are fire-and-forget through the injected [`Channel`]
//! - History fetches run on spawned tasks and come back as [`HistoryBatch`]es
//!   tagged with the generation that issued them. `open` and `close` bump the
//!   generation, so a batch for a superseded session is dropped on arrival
//! - The typing deadline lives in [`Presence`]; the owner sleeps until
//!   [`ChatClient::typing_deadline`] and calls [`ChatClient::on_debounce_expire`]
//!
//! Preconditions that are not met (no session, blank text, disconnected
//! channel) turn operations into silent no-ops.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::{Channel, ChannelEvent};
use crate::error::ChatError;
use crate::history::HistorySource;
use crate::presence::{Presence, Transition, DEFAULT_DEBOUNCE};
use crate::protocol::{InboundEvent, InboundMessage, OutboundEvent};
use crate::view::{ChatView, MessageOrigin};

pub const STATUS_CONNECTED: &str = "Connected to chat";
pub const STATUS_DISCONNECTED: &str = "Disconnected from chat";
pub const STATUS_ERROR: &str = "Connection error";

/// The local side of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub is_admin: bool,
}

impl Participant {
    pub fn new(name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            name: name.into(),
            is_admin,
        }
    }

    pub fn is_self(&self, name: &str) -> bool {
        self.name == name
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub participant: Participant,
    /// Idle window before "stopped typing" is emitted.
    pub debounce: Duration,
}

impl ClientOptions {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }
}

/// Why `send` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
    NoSession,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped(SkipReason),
}

/// A finished history fetch on its way back to the owner task.
#[derive(Debug)]
pub struct HistoryBatch {
    pub generation: u64,
    pub session_id: String,
    pub result: Result<Vec<InboundMessage>, ChatError>,
}

pub type HistoryInbox = mpsc::UnboundedReceiver<HistoryBatch>;

pub struct ChatClient<C, H, V> {
    id: Uuid,
    channel: C,
    history: H,
    view: V,
    participant: Participant,
    session_id: Option<String>,
    presence: Presence,
    compose: String,
    generation: u64,
    pending_fetch: Option<JoinHandle<()>>,
    history_tx: mpsc::UnboundedSender<HistoryBatch>,
}

impl<C, H, V> ChatClient<C, H, V>
where
    C: Channel,
    H: HistorySource,
    V: ChatView,
{
    /// Build a client with no session open.
    ///
    /// The returned inbox receives finished history fetches; feed them back
    /// through [`on_history_loaded`](Self::on_history_loaded).
    pub fn new(channel: C, history: H, view: V, options: ClientOptions) -> (Self, HistoryInbox) {
        let (history_tx, history_rx) = mpsc::unbounded_channel();
        let client = ChatClient {
            id: Uuid::new_v4(),
            channel,
            history,
            view,
            participant: options.participant,
            session_id: None,
            presence: Presence::new(options.debounce),
            compose: String::new(),
            generation: 0,
            pending_fetch: None,
            history_tx,
        };
        (client, history_rx)
    }

    // -- accessors -----------------------------------------------------------

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn is_typing(&self) -> bool {
        self.presence.is_typing()
    }

    pub fn typing_deadline(&self) -> Option<Instant> {
        self.presence.deadline()
    }

    pub fn debounce_window(&self) -> Duration {
        self.presence.window()
    }

    pub fn compose(&self) -> &str {
        &self.compose
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    // -- session lifecycle ---------------------------------------------------

    /// Bind the client to `session_id`, join it and load its history.
    ///
    /// A blank id is ignored; any other id is used exactly as given. An
    /// already-open session is closed first. The fetch is spawned on the
    /// current tokio runtime and skipped with a warning when there is none.
    pub fn open(&mut self, session_id: &str) {
        if session_id.trim().is_empty() {
            debug!(client_id = %self.id, "open with empty session id ignored");
            return;
        }
        if self.session_id.is_some() {
            self.close();
        }

        self.session_id = Some(session_id.to_string());
        self.channel.emit(OutboundEvent::Join {
            session_id: session_id.to_string(),
        });

        self.generation += 1;
        let generation = self.generation;
        match Handle::try_current() {
            Ok(handle) => {
                let fetch = self.history.fetch(session_id);
                let tx = self.history_tx.clone();
                let sid = session_id.to_string();
                self.pending_fetch = Some(handle.spawn(async move {
                    let result = fetch.await;
                    let _ = tx.send(HistoryBatch {
                        generation,
                        session_id: sid,
                        result,
                    });
                }));
            }
            Err(e) => {
                warn!(client_id = %self.id, session_id, error = %e, "no runtime, chat history not loaded");
            }
        }

        info!(client_id = %self.id, session_id, generation, "chat session opened");
    }

    /// Leave the current session. No-op when none is open.
    pub fn close(&mut self) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };

        if let Some(Transition::Stopped) = self.presence.stop() {
            self.emit_typing(&session_id, false);
        }
        self.channel.emit(OutboundEvent::Leave {
            session_id: session_id.clone(),
        });

        self.generation += 1;
        if let Some(handle) = self.pending_fetch.take() {
            handle.abort();
        }

        info!(client_id = %self.id, session_id = %session_id, "chat session closed");
    }

    // -- outbound ------------------------------------------------------------

    /// Send `text` on the open session.
    pub fn send(&mut self, text: &str) -> Delivery {
        let text = text.trim();
        if text.is_empty() {
            return Delivery::Skipped(SkipReason::EmptyText);
        }
        let Some(session_id) = self.session_id.clone() else {
            return Delivery::Skipped(SkipReason::NoSession);
        };
        if !self.channel.is_connected() {
            debug!(client_id = %self.id, session_id = %session_id, "send dropped, channel disconnected");
            return Delivery::Skipped(SkipReason::Disconnected);
        }

        self.channel.emit(OutboundEvent::Message {
            session_id: session_id.clone(),
            text: text.to_string(),
        });
        self.compose.clear();
        self.view.clear_compose();

        if let Some(Transition::Stopped) = self.presence.stop() {
            self.emit_typing(&session_id, false);
        }
        Delivery::Sent
    }

    /// Send whatever is in the compose buffer.
    pub fn submit(&mut self) -> Delivery {
        let text = std::mem::take(&mut self.compose);
        let delivery = self.send(&text);
        if delivery != Delivery::Sent {
            self.compose = text;
        }
        delivery
    }

    /// Replace the compose buffer and count it as a keystroke.
    pub fn input(&mut self, text: &str) {
        self.compose = text.to_string();
        self.notify_activity();
    }

    /// Register a keystroke: announce typing on the idle → typing edge and
    /// push the idle deadline out by one debounce window.
    pub fn notify_activity(&mut self) {
        let Some(session_id) = self.session_id.clone() else {
            return;
        };
        if let Some(Transition::Started) = self.presence.activity(Instant::now()) {
            self.emit_typing(&session_id, true);
        }
    }

    /// The idle timer fired. Ignored if the deadline moved in the meantime.
    pub fn on_debounce_expire(&mut self) {
        if let Some(Transition::Stopped) = self.presence.expire(Instant::now()) {
            if let Some(session_id) = self.session_id.clone() {
                self.emit_typing(&session_id, false);
            }
        }
    }

    fn emit_typing(&self, session_id: &str, is_typing: bool) {
        self.channel.emit(OutboundEvent::Typing {
            session_id: session_id.to_string(),
            is_typing,
        });
    }

    // -- inbound -------------------------------------------------------------

    pub fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => self.view.append_status(STATUS_CONNECTED),
            ChannelEvent::Disconnected => self.view.append_status(STATUS_DISCONNECTED),
            ChannelEvent::Error(detail) => {
                warn!(client_id = %self.id, error = %detail, "chat channel error");
                self.view.append_status(STATUS_ERROR);
            }
            ChannelEvent::Inbound(InboundEvent::Message(msg)) => self.on_inbound_message(msg),
            ChannelEvent::Inbound(InboundEvent::Typing(notice)) => {
                self.on_inbound_presence(&notice.sender_name, notice.is_typing)
            }
            ChannelEvent::Inbound(InboundEvent::Status(status)) => self.on_status(&status.text),
        }
    }

    /// Append a message to the transcript in arrival order.
    pub fn on_inbound_message(&mut self, msg: InboundMessage) {
        let origin = self.origin_of(&msg);
        self.view.append_message(&msg, origin);
    }

    /// Update the shared typing indicator. Our own echoes are ignored.
    // The indicator has one slot: concurrent typists overwrite each other and
    // any "stopped" hides it.
    pub fn on_inbound_presence(&mut self, name: &str, is_typing: bool) {
        if self.participant.is_self(name) {
            return;
        }
        if is_typing {
            self.view.show_typing(name);
        } else {
            self.view.hide_typing();
        }
    }

    pub fn on_status(&mut self, text: &str) {
        self.view.append_status(text);
    }

    /// Apply a finished history fetch.
    pub fn on_history_loaded(&mut self, batch: HistoryBatch) {
        let current = self.session_id.as_deref();
        if batch.generation != self.generation || current != Some(batch.session_id.as_str()) {
            debug!(
                client_id = %self.id,
                session_id = %batch.session_id,
                generation = batch.generation,
                current_generation = self.generation,
                "discarding stale chat history"
            );
            return;
        }
        self.pending_fetch = None;

        match batch.result {
            Ok(messages) => {
                debug!(client_id = %self.id, session_id = %batch.session_id, count = messages.len(), "chat history loaded");
                self.view.clear_transcript();
                for msg in messages {
                    self.on_inbound_message(msg);
                }
            }
            Err(e) => {
                warn!(client_id = %self.id, session_id = %batch.session_id, error = %e, "error loading chat history");
            }
        }
    }

    fn origin_of(&self, msg: &InboundMessage) -> MessageOrigin {
        if msg.is_privileged {
            MessageOrigin::Support
        } else if self.participant.is_self(&msg.sender_name) {
            MessageOrigin::Own
        } else {
            MessageOrigin::Peer
        }
    }
}
