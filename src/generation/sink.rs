//! Output sink: single-producer, single-consumer text channel.
//!
//! The channel is bounded, so a slow consumer makes `send` wait instead of
//! the producer buffering without limit. Closing is idempotent and the
//! consumer sees exactly one terminal event: [`SinkEvent::Closed`] or
//! [`SinkEvent::Failed`].

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;

use crate::types::{PrdError, Result};

/// What the consumer receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Chunk(String),
    /// Clean close: the session finished
    Closed,
    /// Error close: the session failed after streaming started
    Failed(String),
}

impl SinkEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SinkEvent::Chunk(_))
    }
}

/// Create a connected sink/receiver pair with the given channel depth
pub fn output_channel(capacity: usize) -> (OutputSink, SinkReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        OutputSink { tx: Some(tx) },
        SinkReceiver {
            rx,
            terminated: false,
        },
    )
}

/// Producer half
#[derive(Debug)]
pub struct OutputSink {
    tx: Option<mpsc::Sender<SinkEvent>>,
}

impl OutputSink {
    /// Forward text, waiting for consumer capacity.
    ///
    /// Fails with [`PrdError::Cancelled`] once the consumer is gone or the
    /// sink has been closed.
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(PrdError::Cancelled)?;
        tx.send(SinkEvent::Chunk(text.into()))
            .await
            .map_err(|_| PrdError::Cancelled)
    }

    /// Clean close. Subsequent closes are no-ops.
    pub async fn close(&mut self) {
        self.terminate(SinkEvent::Closed).await;
    }

    /// Error close. No-op if already closed.
    pub async fn fail(&mut self, error: &PrdError) {
        self.terminate(SinkEvent::Failed(error.to_string())).await;
    }

    async fn terminate(&mut self, event: SinkEvent) {
        if let Some(tx) = self.tx.take() {
            // A departed consumer has nothing left to observe.
            let _ = tx.send(event).await;
        }
    }

    /// True once closed locally or once the consumer went away
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }

    /// Resolves when the consumer drops its receiver
    pub async fn cancelled(&self) {
        if let Some(tx) = &self.tx {
            tx.closed().await;
        }
    }
}

/// Consumer half
#[derive(Debug)]
pub struct SinkReceiver {
    rx: mpsc::Receiver<SinkEvent>,
    terminated: bool,
}

impl SinkReceiver {
    /// Next event; `None` after the terminal event has been delivered.
    ///
    /// A producer that disappears without closing is reported as a failure.
    pub async fn recv(&mut self) -> Option<SinkEvent> {
        if self.terminated {
            return None;
        }

        let event = self.rx.recv().await.unwrap_or_else(|| {
            SinkEvent::Failed("generation ended without closing the stream".to_string())
        });
        if event.is_terminal() {
            self.terminated = true;
        }
        Some(event)
    }

    /// Drain everything: the concatenated text and the terminal event
    pub async fn collect(mut self) -> (String, SinkEvent) {
        let mut text = String::new();
        loop {
            match self.recv().await {
                Some(SinkEvent::Chunk(chunk)) => text.push_str(&chunk),
                Some(terminal) => return (text, terminal),
                None => return (text, SinkEvent::Failed("stream already drained".to_string())),
            }
        }
    }

    /// Byte stream for an HTTP body: chunks as bytes, a clean end on
    /// `Closed`, and an I/O error (aborting the body) on `Failed`.
    pub fn into_body_stream(self) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
        futures::stream::unfold(self, |mut receiver| async move {
            match receiver.recv().await? {
                SinkEvent::Chunk(text) => Some((Ok(Bytes::from(text)), receiver)),
                SinkEvent::Closed => None,
                SinkEvent::Failed(reason) => Some((Err(std::io::Error::other(reason)), receiver)),
            }
        })
    }
}
