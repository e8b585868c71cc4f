//! AI Integration Layer
//!
//! Conversation model, prompt assembly and streaming LLM providers.

pub mod conversation;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use conversation::{Content, ContentPart, Conversation, ConversationTurn, Role};
pub use prompt::{PromptAssembler, PromptBuilder, PromptSection};
pub use provider::{
    AnthropicProvider, ChatProvider, EventStream, OpenAiProvider, SharedProvider, StopReason,
    StreamEvent, create_provider,
};
pub use timeout::with_timeout;
