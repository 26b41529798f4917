//! Typing-presence debounce.
//!
//! A single boolean plus a single deadline. Keystrokes push the deadline out;
//! once it passes with no new activity the state falls back to idle. Time is
//! passed in by the caller so the state machine stays free of timers; the
//! owning task sleeps until [`Presence::deadline`].

use std::time::Duration;
use tokio::time::Instant;

/// Default idle window before "stopped typing" is emitted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2_000);

/// A change in the local typing state that must be announced on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
}

impl Transition {
    pub fn is_typing(self) -> bool {
        matches!(self, Transition::Started)
    }
}

#[derive(Debug, Clone)]
pub struct Presence {
    typing: bool,
    deadline: Option<Instant>,
    window: Duration,
}

impl Presence {
    pub fn new(window: Duration) -> Self {
        Self {
            typing: false,
            deadline: None,
            window,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// When the pending idle timer fires, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a keystroke at `now`.
    ///
    /// Returns `Started` only on the idle → typing edge. The deadline is
    /// replaced on every call.
    pub fn activity(&mut self, now: Instant) -> Option<Transition> {
        self.deadline = Some(now + self.window);
        if self.typing {
            None
        } else {
            self.typing = true;
            Some(Transition::Started)
        }
    }

    /// Fire the idle timer at `now`.
    ///
    /// Stale wakeups (before the current deadline) and wakeups while idle are
    /// ignored.
    pub fn expire(&mut self, now: Instant) -> Option<Transition> {
        match self.deadline {
            Some(deadline) if self.typing && now >= deadline => {
                self.typing = false;
                self.deadline = None;
                Some(Transition::Stopped)
            }
            _ => None,
        }
    }

    /// Force the idle state and drop any pending deadline.
    pub fn stop(&mut self) -> Option<Transition> {
        self.deadline = None;
        if self.typing {
            self.typing = false;
            Some(Transition::Stopped)
        } else {
            None
        }
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
