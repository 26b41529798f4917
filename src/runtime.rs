//! The owner task that drives a [`ChatClient`].
//!
//! Four trigger sources are multiplexed with `tokio::select!`:
//! 1. user commands
//! 2. channel events from the transport
//! 3. finished history fetches
//! 4. the typing idle deadline (armed only while one is set)
//!
//! Because the deadline is re-read from the client on every iteration, there
//! is never more than one pending timer.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::channel::{Channel, ChannelEvent};
use crate::client::{ChatClient, HistoryInbox};
use crate::history::HistorySource;
use crate::view::ChatView;

/// A user-side request for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Close,
    /// Replace the compose buffer (a keystroke).
    Input(String),
    /// A keystroke that does not change the buffer the client tracks.
    Activity,
    Send(String),
    Submit,
    Shutdown,
}

/// Run until [`Command::Shutdown`] or until the command queue closes.
///
/// The session is closed on the way out and the client handed back.
pub async fn run<C, H, V>(
    mut client: ChatClient<C, H, V>,
    mut history: HistoryInbox,
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    mut commands: mpsc::Receiver<Command>,
) -> ChatClient<C, H, V>
where
    C: Channel,
    H: HistorySource,
    V: ChatView,
{
    let mut events_open = true;

    loop {
        let deadline = client.typing_deadline();

        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => apply(&mut client, cmd),
                }
            }

            event = events.recv(), if events_open => {
                match event {
                    Some(event) => client.on_channel_event(event),
                    None => {
                        debug!("channel event stream ended");
                        events_open = false;
                    }
                }
            }

            Some(batch) = history.recv() => client.on_history_loaded(batch),

            () = sleep_until_opt(deadline), if deadline.is_some() => client.on_debounce_expire(),
        }
    }

    client.close();
    info!("chat runtime stopped");
    client
}

fn apply<C, H, V>(client: &mut ChatClient<C, H, V>, cmd: Command)
where
    C: Channel,
    H: HistorySource,
    V: ChatView,
{
    match cmd {
        Command::Open(id) => client.open(&id),
        Command::Close => client.close(),
        Command::Input(text) => client.input(&text),
        Command::Activity => client.notify_activity(),
        Command::Send(text) => {
            let delivery = client.send(&text);
            debug!(?delivery, "send");
        }
        Command::Submit => {
            let delivery = client.submit();
            debug!(?delivery, "submit");
        }
        Command::Shutdown => {}
    }
}

async fn sleep_until_opt(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{drain, MemoryChannel};
    use crate::client::{ClientOptions, Participant};
    use crate::history::HistoryFuture;
    use crate::protocol::{InboundEvent, OutboundEvent, StatusLine};
    use crate::view::TranscriptView;
    use futures_util::FutureExt;
    use std::time::Duration;

    struct EmptyHistory;

    impl HistorySource for EmptyHistory {
        fn fetch(&self, _session_id: &str) -> HistoryFuture {
            async { Ok(Vec::new()) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_fires_debounce_once_after_idle() {
        let (channel, mut out) = MemoryChannel::new();
        let (client, inbox) = ChatClient::new(
            channel,
            EmptyHistory,
            TranscriptView::new(),
            ClientOptions::new(Participant::new("Ann", false)).debounce(Duration::from_millis(3_000)),
        );
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let task = tokio::spawn(run(client, inbox, events_rx, cmd_rx));

        cmd_tx.send(Command::Open("9".to_string())).await.unwrap();
        cmd_tx.send(Command::Activity).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        cmd_tx.send(Command::Activity).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_900)).await;

        let before = drain(&mut out);
        assert_eq!(
            before,
            vec![
                OutboundEvent::Join { session_id: "9".to_string() },
                OutboundEvent::Typing { session_id: "9".to_string(), is_typing: true },
            ]
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            drain(&mut out),
            vec![OutboundEvent::Typing { session_id: "9".to_string(), is_typing: false }]
        );

        cmd_tx.send(Command::Shutdown).await.unwrap();
        let client = task.await.unwrap();
        assert!(client.session_id().is_none());
        assert_eq!(
            drain(&mut out),
            vec![OutboundEvent::Leave { session_id: "9".to_string() }]
        );
    }

    #[tokio::test]
    async fn test_runtime_renders_channel_events_and_survives_stream_end() {
        let (channel, _out) = MemoryChannel::new();
        let (client, inbox) = ChatClient::new(
            channel,
            EmptyHistory,
            TranscriptView::new(),
            ClientOptions::new(Participant::new("Ann", false)),
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let task = tokio::spawn(run(client, inbox, events_rx, cmd_rx));

        events_tx.send(ChannelEvent::Connected).unwrap();
        events_tx
            .send(ChannelEvent::Inbound(InboundEvent::Status(StatusLine {
                text: "Bob has joined the chat".to_string(),
            })))
            .unwrap();
        drop(events_tx);

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(cmd_tx);
        let client = task.await.unwrap();
        assert_eq!(
            client.view().statuses().collect::<Vec<_>>(),
            vec!["Connected to chat", "Bob has joined the chat"]
        );
    }

    #[tokio::test]
    async fn test_runtime_send_command_reaches_channel() {
        let (channel, mut out) = MemoryChannel::new();
        let (client, inbox) = ChatClient::new(
            channel,
            EmptyHistory,
            TranscriptView::new(),
            ClientOptions::new(Participant::new("Ann", false)),
        );
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let task = tokio::spawn(run(client, inbox, events_rx, cmd_rx));

        cmd_tx.send(Command::Open("3".to_string())).await.unwrap();
        cmd_tx.send(Command::Send("hello".to_string())).await.unwrap();
        cmd_tx.send(Command::Shutdown).await.unwrap();
        task.await.unwrap();

        let events = drain(&mut out);
        assert!(events.contains(&OutboundEvent::Message {
            session_id: "3".to_string(),
            text: "hello".to_string()
        }));
    }
}
