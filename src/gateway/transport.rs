//! Connection plumbing between a WebSocket and the session loop
//!
//! The socket is split in two. A reader task forwards text to the session
//! over a channel and cancels the connection token when the client goes
//! away; the session writes frames through a [`FrameSink`].

use super::protocol::ChatFrame;
use crate::error::{Error, Result};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, Stream, StreamExt};
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Inbound messages buffered ahead of the session loop. Messages beyond
/// this while a turn is running are dropped so the reader keeps watching
/// for the close frame.
const INBOUND_BUFFER: usize = 32;

/// Where outbound frames go
#[async_trait]
pub trait FrameSink: Send {
    /// Deliver one frame. Fails with [`Error::ConnectionClosed`] once the
    /// peer is gone.
    async fn send_frame(&mut self, frame: &ChatFrame) -> Result<()>;
}

/// Questions arriving from the client, plus the disconnect signal
pub struct Inbound {
    messages: mpsc::Receiver<String>,
    closed: CancellationToken,
}

impl Inbound {
    pub fn new(messages: mpsc::Receiver<String>, closed: CancellationToken) -> Self {
        Inbound { messages, closed }
    }

    /// Next message, or `None` once the connection is closed
    pub async fn recv(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            message = self.messages.recv() => message,
        }
    }

    /// Cancelled when the client disconnects
    pub fn closed(&self) -> &CancellationToken {
        &self.closed
    }
}

/// Outbound half of an axum WebSocket
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
    closed: CancellationToken,
}

impl WsSink {
    /// Best-effort close handshake
    pub async fn close(mut self) {
        let _ = self.inner.close().await;
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: &ChatFrame) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(Error::ConnectionClosed);
        }
        let json = frame.to_json()?;
        if let Err(e) = self.inner.send(Message::Text(json.into())).await {
            debug!("Send failed, treating connection as closed: {}", e);
            self.closed.cancel();
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }
}

/// Split a socket into the session's sink and inbound stream. The returned
/// task owns the read half and ends when the client disconnects.
pub fn split(socket: WebSocket) -> (WsSink, Inbound, JoinHandle<()>) {
    let (sink, stream) = socket.split();
    let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
    let closed = CancellationToken::new();

    let reader = tokio::spawn(read_loop(stream, tx, closed.clone()));

    (
        WsSink {
            inner: sink,
            closed: closed.clone(),
        },
        Inbound::new(rx, closed),
        reader,
    )
}

async fn read_loop<S, E>(mut stream: S, tx: mpsc::Sender<String>, closed: CancellationToken)
where
    S: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    warn!("Dropping binary frame that is not valid UTF-8 ({} bytes)", bytes.len());
                    continue;
                }
            },
            Ok(Message::Close(_)) => break,
            // answered by axum
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                debug!("WebSocket read error: {}", e);
                break;
            }
        };

        match tx.try_send(text) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(text)) => {
                warn!("Session is behind, dropping message ({} bytes)", text.len());
            }
            Err(mpsc::error::TrySendError::Closed(_)) => break,
        }
    }

    closed.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inbound_yields_queued_messages() {
        let (tx, rx) = mpsc::channel(4);
        let mut inbound = Inbound::new(rx, CancellationToken::new());

        tx.send("hello".into()).await.unwrap();
        assert_eq!(inbound.recv().await.as_deref(), Some("hello"));

        drop(tx);
        assert_eq!(inbound.recv().await, None);
    }

    #[tokio::test]
    async fn test_inbound_stops_on_disconnect() {
        let (tx, rx) = mpsc::channel(4);
        let closed = CancellationToken::new();
        let mut inbound = Inbound::new(rx, closed.clone());

        tx.send("late".into()).await.unwrap();
        closed.cancel();
        assert_eq!(inbound.recv().await, None);
    }

    fn text(s: &str) -> std::result::Result<Message, axum::Error> {
        Ok(Message::Text(String::from(s).into()))
    }

    #[tokio::test]
    async fn test_full_buffer_does_not_hide_close() {
        let (tx, mut rx) = mpsc::channel(1);
        let closed = CancellationToken::new();
        let stream = futures::stream::iter(vec![text("first"), text("second"), text("third"), Ok(Message::Close(None))]);

        // nobody drains rx while the reader runs
        read_loop(stream, tx, closed.clone()).await;

        assert!(closed.is_cancelled());
        assert_eq!(rx.recv().await.as_deref(), Some("first"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_reader_forwards_utf8_binary_and_skips_invalid() {
        let (tx, mut rx) = mpsc::channel(4);
        let closed = CancellationToken::new();
        let stream = futures::stream::iter(vec![
            Ok(Message::Binary(vec![0xff, 0xfe].into())),
            Ok(Message::Binary(b"What is 2+2?".to_vec().into())),
            text("next"),
        ]);

        read_loop(stream, tx, closed.clone()).await;

        assert!(closed.is_cancelled());
        assert_eq!(rx.recv().await.as_deref(), Some("What is 2+2?"));
        assert_eq!(rx.recv().await.as_deref(), Some("next"));
        assert_eq!(rx.recv().await, None);
    }
}
