//! Terminal rendering of a streamed document.
//!
//! Chunks are buffered and written on a fixed tick instead of per delta.
//! The tick lives inside the rendering task and stops with it; a final
//! flush writes whatever is left once the stream ends.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;

use crate::generation::{SinkEvent, SinkReceiver};
use crate::types::Result;

#[derive(Debug)]
pub struct Rendered {
    /// Everything written, in order
    pub document: String,
    /// Terminal signal observed on the stream
    pub terminal: SinkEvent,
    /// Number of non-empty writes performed
    pub flushes: usize,
}

impl Rendered {
    pub fn is_clean(&self) -> bool {
        self.terminal == SinkEvent::Closed
    }
}

pub async fn render_stream<W>(
    mut receiver: SinkReceiver,
    out: &mut W,
    interval: Duration,
) -> Result<Rendered>
where
    W: AsyncWrite + Unpin,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    let mut buffer = String::new();
    let mut document = String::new();
    let mut flushes = 0;

    let terminal = loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Some(SinkEvent::Chunk(text)) => buffer.push_str(&text),
                Some(terminal) => break terminal,
                None => break SinkEvent::Failed("stream already drained".to_string()),
            },
            _ = ticker.tick() => {
                flushes += flush(&mut buffer, &mut document, out).await?;
            }
        }
    };

    flushes += flush(&mut buffer, &mut document, out).await?;

    Ok(Rendered {
        document,
        terminal,
        flushes,
    })
}

async fn flush<W>(buffer: &mut String, document: &mut String, out: &mut W) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    if buffer.is_empty() {
        return Ok(0);
    }
    out.write_all(buffer.as_bytes()).await?;
    out.flush().await?;
    document.push_str(buffer);
    buffer.clear();
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::output_channel;
    use crate::types::PrdError;

    #[tokio::test]
    async fn test_renders_all_chunks_with_final_flush() {
        let (mut sink, receiver) = output_channel(64);
        for i in 0..20 {
            sink.send(format!("{i},")).await.unwrap();
        }
        sink.close().await;

        let mut out = Vec::new();
        let rendered = render_stream(receiver, &mut out, Duration::from_secs(60))
            .await
            .unwrap();

        let expected: String = (0..20).map(|i| format!("{i},")).collect();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(rendered.document, expected);
        assert!(rendered.is_clean());
        assert_eq!(rendered.flushes, 1);
    }

    #[tokio::test]
    async fn test_periodic_flush_while_streaming() {
        let (mut sink, receiver) = output_channel(8);
        let producer = tokio::spawn(async move {
            sink.send("a").await.unwrap();
            tokio::time::sleep(Duration::from_millis(80)).await;
            sink.send("b").await.unwrap();
            sink.close().await;
        });

        let mut out = Vec::new();
        let rendered = render_stream(receiver, &mut out, Duration::from_millis(10))
            .await
            .unwrap();
        producer.await.unwrap();

        assert_eq!(rendered.document, "ab");
        assert_eq!(rendered.flushes, 2);
    }

    #[tokio::test]
    async fn test_failure_still_flushes_partial_output() {
        let (mut sink, receiver) = output_channel(8);
        sink.send("partial").await.unwrap();
        sink.fail(&PrdError::Transport("reset".to_string())).await;

        let mut out = Vec::new();
        let rendered = render_stream(receiver, &mut out, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(out, b"partial");
        assert!(!rendered.is_clean());
        assert!(matches!(rendered.terminal, SinkEvent::Failed(_)));
    }
}
