//! The bidirectional message channel the client is built on.
//!
//! The client only needs two things from a channel: whether it is currently
//! connected, and a fire-and-forget way to emit an event. Inbound traffic
//! arrives separately as a stream of [`ChannelEvent`]s fed to the runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::protocol::{InboundEvent, OutboundEvent};

pub trait Channel {
    fn is_connected(&self) -> bool;

    /// Queue `event` for delivery. Never blocks and never reports failure;
    /// events emitted while disconnected are dropped.
    fn emit(&self, event: OutboundEvent);
}

/// What the transport reports to the client's owner task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Error(String),
    Inbound(InboundEvent),
}

/// In-process channel: emitted events land on an unbounded receiver.
///
/// The connection flag is shared between clones, so a test or a local demo can
/// flip it from outside the client.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    tx: mpsc::UnboundedSender<OutboundEvent>,
    connected: Arc<AtomicBool>,
}

impl MemoryChannel {
    /// Create a connected channel and the receiver its emissions go to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = MemoryChannel {
            tx,
            connected: Arc::new(AtomicBool::new(true)),
        };
        (channel, rx)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Channel for MemoryChannel {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn emit(&self, event: OutboundEvent) {
        if !self.is_connected() {
            tracing::debug!(kind = event.kind(), "channel disconnected, dropping event");
            return;
        }
        let _ = self.tx.send(event);
    }
}

/// Drain whatever is currently queued on `rx` without waiting.
pub fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(id: &str) -> OutboundEvent {
        OutboundEvent::Join {
            session_id: id.to_string(),
        }
    }

    #[test]
    fn test_memory_channel_starts_connected() {
        let (ch, _rx) = MemoryChannel::new();
        assert!(ch.is_connected());
    }

    #[test]
    fn test_memory_channel_delivers_in_order() {
        let (ch, mut rx) = MemoryChannel::new();
        ch.emit(join("a"));
        ch.emit(join("b"));
        assert_eq!(drain(&mut rx), vec![join("a"), join("b")]);
    }

    #[test]
    fn test_memory_channel_drops_while_disconnected() {
        let (ch, mut rx) = MemoryChannel::new();
        ch.set_connected(false);
        ch.emit(join("a"));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_connection_flag_shared_between_clones() {
        let (ch, _rx) = MemoryChannel::new();
        let other = ch.clone();
        other.set_connected(false);
        assert!(!ch.is_connected());
    }

    #[test]
    fn test_drain_empty_receiver() {
        let (_ch, mut rx) = MemoryChannel::new();
        assert!(drain(&mut rx).is_empty());
    }
}
