//! Stream relay: drives one provider call and forwards its text.
//!
//! Every text delta reaches the sink as soon as it arrives, in arrival
//! order. The relay also watches the consumer: if it goes away mid-round,
//! the provider stream is dropped and the round ends with
//! [`PrdError::Cancelled`].

use futures::StreamExt;
use tracing::{debug, trace};

use super::sink::OutputSink;
use crate::ai::conversation::ConversationTurn;
use crate::ai::provider::{ChatProvider, StopReason, StreamEvent};
use crate::types::{PrdError, Result};

/// Result of one streaming round
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Text produced during this round only
    pub text: String,
    /// Last stop reason reported; `None` if the provider never sent one
    pub stop_reason: Option<StopReason>,
}

pub struct StreamRelay<'a> {
    provider: &'a dyn ChatProvider,
    sink: &'a OutputSink,
    max_tokens: u32,
}

impl<'a> StreamRelay<'a> {
    pub fn new(provider: &'a dyn ChatProvider, sink: &'a OutputSink, max_tokens: u32) -> Self {
        Self {
            provider,
            sink,
            max_tokens,
        }
    }

    /// Run one round over `turns`, appending forwarded text to `accumulated`
    pub async fn run(
        &self,
        turns: &[ConversationTurn],
        accumulated: &mut String,
    ) -> Result<RoundOutcome> {
        let mut events = tokio::select! {
            biased;
            _ = self.sink.cancelled() => return Err(PrdError::Cancelled),
            opened = self.provider.stream_chat(turns, self.max_tokens) => opened?,
        };

        let mut outcome = RoundOutcome::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.sink.cancelled() => return Err(PrdError::Cancelled),
                next = events.next() => next,
            };

            match next {
                None => break,
                Some(Err(e)) => return Err(e),
                Some(Ok(StreamEvent::TextDelta { text })) => {
                    accumulated.push_str(&text);
                    outcome.text.push_str(&text);
                    self.sink.send(text).await?;
                }
                Some(Ok(StreamEvent::StopReason { reason })) => {
                    debug!(stop_reason = %reason, "Provider reported stop reason");
                    outcome.stop_reason = Some(reason);
                }
                Some(Ok(StreamEvent::Other { kind })) => {
                    trace!(kind = %kind, "Ignoring stream event");
                }
            }
        }

        Ok(outcome)
    }
}
