//! Streaming generation orchestrator
//!
//! Turns one prompt into a single continuous text stream, even when the
//! model needs several calls to finish the document.
//!
//! - `detector`: structural completion heuristic
//! - `sink`: bounded output channel with exactly-once terminal signal
//! - `relay`: forwards one provider call's text to the sink
//! - `controller`: the continuation state machine tying them together

pub mod controller;
pub mod detector;
pub mod relay;
pub mod sink;

pub use controller::{
    ContinuationController, Decision, GenerationSession, SessionReport, SessionState, decide,
};
pub use detector::{CompletionCheck, is_document_complete};
pub use relay::{RoundOutcome, StreamRelay};
pub use sink::{OutputSink, SinkEvent, SinkReceiver, output_channel};
