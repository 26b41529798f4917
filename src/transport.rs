//! WebSocket-backed [`Channel`].
//!
//! ## Design
//! - One writer task drains an unbounded queue of outbound events into the socket
//! - One reader task decodes text frames into [`ChannelEvent`]s
//! - The connection flag is an `Arc<AtomicBool>` flipped by whichever task sees
//!   the socket go away first
//!
//! Dropping the [`WsChannel`] closes the queue, which ends the writer task and
//! sends a close frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelEvent};
use crate::error::ChatError;
use crate::protocol::{self, OutboundEvent};

pub struct WsChannel {
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    connected: Arc<AtomicBool>,
}

impl WsChannel {
    /// Open a WebSocket to `url` and start the reader and writer tasks.
    ///
    /// Returns the channel and the stream of events it reports. The first
    /// event is always [`ChannelEvent::Connected`].
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), ChatError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        info!(url, "chat channel connected");
        Ok(Self::from_stream(ws))
    }

    /// Wrap an already-established WebSocket.
    pub fn from_stream<S>(ws: WebSocketStream<S>) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundEvent>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<ChannelEvent>();
        let connected = Arc::new(AtomicBool::new(true));

        let writer_connected = Arc::clone(&connected);
        tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                let frame = match protocol::encode(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, kind = event.kind(), "could not encode outbound event");
                        continue;
                    }
                };
                if let Err(e) = sink.send(WsMessage::Text(frame)).await {
                    warn!(error = %e, "websocket send failed");
                    writer_connected.store(false, Ordering::SeqCst);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader_connected = Arc::clone(&connected);
        tokio::spawn(async move {
            let _ = events_tx.send(ChannelEvent::Connected);
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(WsMessage::Text(text)) => match protocol::decode(&text) {
                        Ok(event) => {
                            if events_tx.send(ChannelEvent::Inbound(event)).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "dropping malformed frame"),
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {} // binary / ping / pong
                    Err(e) => {
                        reader_connected.store(false, Ordering::SeqCst);
                        let _ = events_tx.send(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
            info!("chat channel disconnected");
            let _ = events_tx.send(ChannelEvent::Disconnected);
        });

        let channel = WsChannel {
            outbound: out_tx,
            connected,
        };
        (channel, events_rx)
    }
}

impl Channel for WsChannel {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn emit(&self, event: OutboundEvent) {
        if !self.is_connected() {
            debug!(kind = event.kind(), session_id = event.session_id(), "channel disconnected, dropping event");
            return;
        }
        let _ = self.outbound.send(event);
    }
}
