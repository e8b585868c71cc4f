//! LLM Provider Abstraction
//!
//! Defines the [`ChatProvider`] trait for streaming chat completions.
//! A call returns an [`EventStream`]: a lazy, finite, non-restartable
//! sequence of [`StreamEvent`]s consumed by ordinary iteration.
//!
//! ## Modules
//!
//! - `anthropic`: Messages API streaming
//! - `openai`: Chat Completions streaming (and compatible endpoints)
//! - `sse`: server-sent-event line decoding shared by both

mod anthropic;
mod openai;
mod sse;

#[cfg(test)]
pub(crate) mod scripted;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;

use crate::ai::conversation::ConversationTurn;
use crate::config::LlmConfig;
use crate::types::{PrdError, Result};

// =============================================================================
// Stream Events
// =============================================================================

/// Why a single streaming call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The model chose to stop on its own
    EndTurn,
    /// Output hit the token ceiling
    MaxTokens,
    /// A configured stop sequence matched
    StopSequence,
    /// Anything else the provider reports
    Other(String),
}

impl StopReason {
    /// Normalise a provider stop/finish reason string
    pub fn parse(raw: &str) -> Self {
        match raw {
            "end_turn" | "stop" => StopReason::EndTurn,
            "max_tokens" | "length" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }

    /// Natural completion: the model explicitly finished
    pub fn is_natural(&self) -> bool {
        matches!(self, StopReason::EndTurn)
    }

    /// Output was cut off by the length limit
    pub fn is_truncated(&self) -> bool {
        matches!(self, StopReason::MaxTokens)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Incremental event emitted by a provider stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta { text: String },
    StopReason { reason: StopReason },
    /// Event kinds the relay does not act on (pings, block boundaries...)
    Other { kind: String },
}

impl StreamEvent {
    pub fn text(text: impl Into<String>) -> Self {
        StreamEvent::TextDelta { text: text.into() }
    }

    pub fn stop(reason: StopReason) -> Self {
        StreamEvent::StopReason { reason }
    }
}

/// Lazy, finite sequence of provider events for one call
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

// =============================================================================
// Provider Trait
// =============================================================================

/// Streaming chat-completion provider
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Open a streaming call for the given conversation.
    ///
    /// Errors returned here happen before any event was produced; errors
    /// yielded by the stream happen mid-call.
    async fn stream_chat(&self, turns: &[ConversationTurn], max_tokens: u32)
    -> Result<EventStream>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Shared provider type for concurrent sessions.
pub type SharedProvider = Arc<dyn ChatProvider>;

/// Create a shared provider from configuration.
///
/// Fails with a configuration error when no credential can be found.
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config)?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        _ => Err(PrdError::Config(format!(
            "Unknown provider: {}. Supported: anthropic, openai",
            config.provider
        ))),
    }
}

/// Resolve a setting from config, then from the environment
pub(crate) fn config_or_env(value: Option<&String>, env_key: &str) -> Option<String> {
    value
        .cloned()
        .or_else(|| std::env::var(env_key).ok())
        .filter(|v| !v.trim().is_empty())
}
