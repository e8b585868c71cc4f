//! Continuation controller
//!
//! Owns one [`GenerationSession`] and drives it through
//! `Idle → Streaming → Evaluating → (Continuing → Streaming | Done | Failed)`.
//!
//! ## Decision rule
//!
//! After each round the controller combines the last stop reason with the
//! completion heuristic:
//!
//! 1. A natural stop (`EndTurn`) finishes the session, whatever the detector says.
//! 2. Truncation, or an incomplete-looking document, continues while fewer
//!    than [`MAX_CONTINUATIONS`] continuations have run.
//! 3. Otherwise the session finishes with what it has. Exhausting the
//!    ceiling is not a failure.
//!
//! A continuation appends the round's text as an assistant turn plus a
//! fixed "continue" user turn, then writes a newline separator to the sink.
//! A round that produced no text adds only the "continue" turn.

use std::fmt;
use std::time::Duration;

use tracing::{Instrument, debug, error, info, info_span, warn};

use super::detector::{CompletionCheck, is_document_complete};
use super::relay::StreamRelay;
use super::sink::OutputSink;
use crate::ai::conversation::{Conversation, ConversationTurn};
use crate::ai::provider::{SharedProvider, StopReason};
use crate::ai::timeout::with_timeout;
use crate::constants::generation::{
    CONTINUATION_PROMPT, CONTINUATION_SEPARATOR, DEFAULT_SESSION_TIMEOUT_SECS, MAX_CONTINUATIONS,
    MAX_TOKENS,
};
use crate::types::{PrdError, Result, SessionId};

// =============================================================================
// Session State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Evaluating,
    Continuing,
    Done,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Streaming => "streaming",
            SessionState::Evaluating => "evaluating",
            SessionState::Continuing => "continuing",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of the `Evaluating` state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Finish,
}

/// Pure decision rule applied after every round
pub fn decide(stop_reason: Option<&StopReason>, complete: bool, continuations: u32) -> Decision {
    if stop_reason.is_some_and(StopReason::is_natural) {
        return Decision::Finish;
    }

    let truncated = stop_reason.is_some_and(StopReason::is_truncated);
    if (truncated || !complete) && continuations < MAX_CONTINUATIONS {
        Decision::Continue
    } else {
        Decision::Finish
    }
}

/// Mutable state of one user-triggered generation
#[derive(Debug)]
pub struct GenerationSession {
    id: SessionId,
    conversation: Conversation,
    accumulated: String,
    stop_reason: Option<StopReason>,
    continuations: u32,
    rounds: u32,
    state: SessionState,
}

impl GenerationSession {
    pub fn new(initial: ConversationTurn) -> Self {
        Self {
            id: SessionId::generate(),
            conversation: Conversation::new(initial),
            accumulated: String::new(),
            stop_reason: None,
            continuations: 0,
            rounds: 0,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Everything forwarded to the sink so far
    pub fn output(&self) -> &str {
        &self.accumulated
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "Session transition");
        self.state = next;
    }

    fn into_report(self, error: Option<PrdError>) -> SessionReport {
        SessionReport {
            session_id: self.id,
            state: self.state,
            rounds: self.rounds,
            continuations: self.continuations,
            stop_reason: self.stop_reason,
            output: self.accumulated,
            error,
        }
    }
}

/// Terminal summary of a session
#[derive(Debug)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub state: SessionState,
    /// Streaming attempts made (initial call included)
    pub rounds: u32,
    pub continuations: u32,
    pub stop_reason: Option<StopReason>,
    /// Full text forwarded to the sink, separators included
    pub output: String,
    pub error: Option<PrdError>,
}

impl SessionReport {
    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Clone)]
pub struct ContinuationController {
    provider: SharedProvider,
    detector: CompletionCheck,
    max_tokens: u32,
    session_timeout: Duration,
}

impl ContinuationController {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            detector: is_document_complete,
            max_tokens: MAX_TOKENS,
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
        }
    }

    /// Total wall-clock budget; expiry fails the session with partial output kept
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_detector(mut self, detector: CompletionCheck) -> Self {
        self.detector = detector;
        self
    }

    /// Run a session to a terminal state and close the sink accordingly.
    ///
    /// The sink always receives exactly one terminal signal: a clean close on
    /// `Done`, an error close on `Failed`.
    pub async fn run(&self, initial: ConversationTurn, mut sink: OutputSink) -> SessionReport {
        let mut session = GenerationSession::new(initial);
        let span = info_span!(
            "generation",
            session_id = %session.id,
            provider = self.provider.name(),
            model = self.provider.model(),
        );

        async move {
            info!("Generation session started");

            let result = with_timeout(
                self.session_timeout,
                self.drive(&mut session, &sink),
                "generation session",
            )
            .await;

            let error = match result {
                Ok(()) => {
                    session.transition(SessionState::Done);
                    sink.close().await;
                    info!(
                        output_len = session.accumulated.len(),
                        stop_reason = ?session.stop_reason,
                        continuations = session.continuations,
                        "Generation complete"
                    );
                    None
                }
                Err(e) => {
                    session.transition(SessionState::Failed);
                    match &e {
                        PrdError::Cancelled => {
                            warn!(output_len = session.accumulated.len(), "Consumer went away")
                        }
                        other => error!(
                            error = %other,
                            category = ?other.category(),
                            output_len = session.accumulated.len(),
                            continuations = session.continuations,
                            "Generation failed"
                        ),
                    }
                    sink.fail(&e).await;
                    Some(e)
                }
            };

            session.into_report(error)
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, session: &mut GenerationSession, sink: &OutputSink) -> Result<()> {
        let relay = StreamRelay::new(self.provider.as_ref(), sink, self.max_tokens);

        loop {
            if sink.is_closed() {
                return Err(PrdError::Cancelled);
            }

            session.transition(SessionState::Streaming);
            session.rounds += 1;
            let round = relay
                .run(session.conversation.turns(), &mut session.accumulated)
                .await?;
            session.stop_reason = round.stop_reason;

            info!(
                round = session.rounds,
                stop_reason = ?session.stop_reason,
                output_len = session.accumulated.len(),
                "Round finished"
            );

            session.transition(SessionState::Evaluating);
            let complete = (self.detector)(&session.accumulated);

            match decide(session.stop_reason.as_ref(), complete, session.continuations) {
                Decision::Finish => {
                    let natural = session.stop_reason.as_ref().is_some_and(StopReason::is_natural);
                    if !natural && session.continuations >= MAX_CONTINUATIONS {
                        warn!(
                            complete,
                            "Continuation ceiling reached, finishing with accumulated output"
                        );
                    }
                    return Ok(());
                }
                Decision::Continue => {
                    session.transition(SessionState::Continuing);
                    session.continuations += 1;
                    info!(
                        attempt = session.continuations,
                        max = MAX_CONTINUATIONS,
                        complete,
                        "Auto-continuing generation"
                    );

                    // Providers reject empty assistant content; an empty round
                    // only adds another continue instruction.
                    if round.text.is_empty() {
                        warn!(round = session.rounds, "Round produced no text");
                    } else {
                        session
                            .conversation
                            .push(ConversationTurn::assistant(round.text));
                    }
                    session
                        .conversation
                        .push(ConversationTurn::user(CONTINUATION_PROMPT));

                    session.accumulated.push_str(CONTINUATION_SEPARATOR);
                    sink.send(CONTINUATION_SEPARATOR).await?;
                    session.stop_reason = None;
                }
            }
        }
    }
}
