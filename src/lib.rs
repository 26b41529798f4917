//! Client side of the order-support live chat.
//!
//! A [`ChatClient`] binds one order conversation to a [`Channel`], relays
//! composed messages, renders inbound events through a [`ChatView`], and keeps
//! a debounced "is typing" signal. [`runtime::run`] is the task that drives it.

pub mod channel;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod presence;
pub mod protocol;
pub mod runtime;
pub mod support;
pub mod transport;
pub mod view;

pub use channel::{Channel, ChannelEvent, MemoryChannel};
pub use client::{ChatClient, ClientOptions, Delivery, HistoryBatch, HistoryInbox, Participant, SkipReason};
pub use config::ChatConfig;
pub use error::ChatError;
pub use history::{HistoryFuture, HistorySource, HttpHistory};
pub use presence::{Presence, Transition};
pub use protocol::{InboundEvent, InboundMessage, OutboundEvent};
pub use runtime::Command;
pub use transport::WsChannel;
pub use view::{ChatView, ConsoleView, MessageOrigin, TranscriptView};
