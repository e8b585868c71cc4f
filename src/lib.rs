//! DeepPRD - Streaming System Requirements Document Generator
//!
//! Turns a topic plus uploaded reference material into a complete, structured
//! requirements document, streamed to the caller as it is written.
//!
//! ## Core Features
//!
//! - **Auto-Continuation**: truncated output is resumed transparently, up to
//!   five extra rounds, behind one continuous stream
//! - **Completion Heuristic**: structural markers decide whether a document
//!   that stopped early still needs more
//! - **Backpressure**: a bounded output sink paces generation to the reader
//! - **Providers**: Anthropic Messages API and OpenAI-compatible endpoints
//!
//! ## Quick Start
//!
//! ```ignore
//! use deepprd::{ContinuationController, PromptAssembler, TemplateStore, output_channel};
//!
//! let provider = deepprd::create_provider(&config.llm)?;
//! let references = TemplateStore::new("templates").load().await?;
//! let initial = PromptAssembler::assemble(&request, &references);
//!
//! let (sink, receiver) = output_channel(32);
//! tokio::spawn(async move { ContinuationController::new(provider).run(initial, sink).await });
//! let (document, _terminal) = receiver.collect().await;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: conversation model, prompt assembly, streaming providers
//! - [`generation`]: continuation controller, relay, sink, completion detector
//! - [`server`]: HTTP endpoint streaming the document
//! - [`cli`]: wizard, terminal rendering, subcommands
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod generation;
pub mod server;
pub mod templates;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use templates::{ReferenceTexts, TemplateStore};
pub use types::{
    Document, ErrorCategory, GenerationRequest, ImageAttachment, MediaType, PrdError, Result,
    SessionId,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    ChatProvider, Conversation, ConversationTurn, PromptAssembler, SharedProvider, StopReason,
    StreamEvent, create_provider, with_timeout,
};

// =============================================================================
// Generation Re-exports
// =============================================================================

pub use generation::{
    ContinuationController, OutputSink, SessionReport, SessionState, SinkEvent, SinkReceiver,
    is_document_complete, output_channel,
};
