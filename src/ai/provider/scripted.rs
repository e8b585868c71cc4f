//! Deterministic provider for tests.
//!
//! Each call to `stream_chat` consumes the next scripted round and records
//! the conversation it was given.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{ChatProvider, EventStream, StopReason, StreamEvent};
use crate::ai::conversation::ConversationTurn;
use crate::types::{ErrorCategory, LlmError, PrdError, Result};

#[derive(Debug, Clone)]
pub(crate) enum ScriptStep {
    Event(StreamEvent),
    /// Mid-stream transport failure; ends the stream
    Fail(String),
    /// Never yields again
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) enum ScriptRound {
    Open(Vec<ScriptStep>),
    /// The call fails before any event is produced
    Refuse(String),
}

impl ScriptRound {
    pub fn deltas(texts: &[&str], stop: Option<StopReason>) -> Self {
        let mut steps: Vec<ScriptStep> = texts
            .iter()
            .map(|t| ScriptStep::Event(StreamEvent::text(*t)))
            .collect();
        if let Some(reason) = stop {
            steps.push(ScriptStep::Event(StreamEvent::stop(reason)));
        }
        ScriptRound::Open(steps)
    }
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedProvider {
    rounds: Arc<Mutex<VecDeque<ScriptRound>>>,
    calls: Arc<Mutex<Vec<Vec<ConversationTurn>>>>,
}

impl ScriptedProvider {
    pub fn new(rounds: Vec<ScriptRound>) -> Self {
        Self {
            rounds: Arc::new(Mutex::new(rounds.into())),
            calls: Arc::default(),
        }
    }

    /// Round that emits the same truncated text forever
    pub fn repeating(round: ScriptRound, times: usize) -> Self {
        Self::new(vec![round; times])
    }

    /// Conversations received so far, one entry per call
    pub fn calls(&self) -> Vec<Vec<ConversationTurn>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn stream_chat(
        &self,
        turns: &[ConversationTurn],
        _max_tokens: u32,
    ) -> Result<EventStream> {
        self.calls.lock().unwrap().push(turns.to_vec());

        let round = self.rounds.lock().unwrap().pop_front().ok_or_else(|| {
            PrdError::Llm(LlmError::new(ErrorCategory::Unknown, "script exhausted"))
        })?;

        let steps = match round {
            ScriptRound::Refuse(message) => return Err(PrdError::Transport(message)),
            ScriptRound::Open(steps) => steps,
        };

        let mut items = Vec::new();
        let mut hang = false;
        for step in steps {
            match step {
                ScriptStep::Event(event) => items.push(Ok(event)),
                ScriptStep::Fail(message) => {
                    items.push(Err(PrdError::Transport(message)));
                    break;
                }
                ScriptStep::Hang => {
                    hang = true;
                    break;
                }
            }
        }

        let stream = futures::stream::iter(items);
        Ok(if hang {
            stream.chain(futures::stream::pending()).boxed()
        } else {
            stream.boxed()
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
