//! Server-sent-event decoding shared by the streaming providers.
//!
//! Network chunks can split lines, and UTF-8 sequences, at any byte. The
//! decoder buffers raw bytes and only decodes complete lines.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;

use super::{EventStream, StreamEvent};
use crate::types::{PrdError, Result};

/// Incremental `data:` line extractor
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed a chunk and return the `data:` payloads of all completed lines
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = Self::data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        Self::data_payload(&line)
    }

    fn data_payload(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);
        let payload = line.strip_prefix("data:")?;
        Some(payload.strip_prefix(' ').unwrap_or(payload).to_string())
    }
}

/// Provider-specific interpretation of `data:` payloads
pub(crate) trait SseParser: Send + 'static {
    fn parse(&mut self, data: &str) -> Result<Vec<StreamEvent>>;

    /// Called when the byte stream ends cleanly
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

struct DecodeState<P> {
    bytes: futures::stream::BoxStream<'static, std::result::Result<Bytes, String>>,
    decoder: SseDecoder,
    parser: P,
    pending: VecDeque<Result<StreamEvent>>,
    finished: bool,
}

impl<P: SseParser> DecodeState<P> {
    fn feed(&mut self, payloads: impl IntoIterator<Item = String>) {
        for payload in payloads {
            match self.parser.parse(&payload) {
                Ok(events) => self.pending.extend(events.into_iter().map(Ok)),
                Err(e) => {
                    self.pending.push_back(Err(e));
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

/// Turn a raw byte stream into an [`EventStream`].
///
/// The stream ends after the first error.
pub(crate) fn decode_sse<S, E, P>(bytes: S, parser: P) -> EventStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Display,
    P: SseParser,
{
    let state = DecodeState {
        bytes: bytes.map(|r| r.map_err(|e| e.to_string())).boxed(),
        decoder: SseDecoder::default(),
        parser,
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                if item.is_err() {
                    st.pending.clear();
                    st.finished = true;
                }
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = st.decoder.push(&chunk);
                    st.feed(payloads);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(PrdError::Transport(e)), st));
                }
                None => {
                    let tail = st.decoder.finish();
                    st.feed(tail);
                    if !st.finished {
                        st.finished = true;
                        if let Err(e) = st.parser.finish() {
                            st.pending.push_back(Err(e));
                        }
                    }
                }
            }
        }
    })
    .boxed()
}
