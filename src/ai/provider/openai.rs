//! OpenAI API Provider
//!
//! Streams OpenAI's Chat Completions API (or any compatible endpoint) and
//! maps `delta.content` / `finish_reason` onto [`StreamEvent`]s.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::sse::{SseParser, decode_sse};
use super::{ChatProvider, EventStream, StopReason, StreamEvent, config_or_env};
use crate::ai::conversation::{Content, ContentPart, ConversationTurn};
use crate::config::LlmConfig;
use crate::constants::provider::{DEFAULT_OPENAI_MODEL, OPENAI_API_BASE};
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, PrdError, Result};

const PROVIDER_NAME: &str = "openai";

/// Chat Completions models cap output well below the session ceiling
const MAX_OUTPUT_TOKENS: u32 = 16_384;

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config_or_env(config.api_key.as_ref(), "OPENAI_API_KEY").ok_or_else(|| {
            PrdError::Config(
                "OpenAI API key not found. Set OPENAI_API_KEY env var or provide in config"
                    .to_string(),
            )
        })?;

        let api_base = config_or_env(config.api_base.as_ref(), "OPENAI_BASE_URL")
            .unwrap_or_else(|| OPENAI_API_BASE.to_string());

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PrdError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }

    fn build_request<'a>(
        &'a self,
        turns: &'a [ConversationTurn],
        max_tokens: u32,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: turns.iter().map(ChatMessage::from_turn).collect(),
            max_tokens: max_tokens.min(MAX_OUTPUT_TOKENS),
            stream: true,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn stream_chat(
        &self,
        turns: &[ConversationTurn],
        max_tokens: u32,
    ) -> Result<EventStream> {
        info!(
            "Streaming with OpenAI (model: {}, turns: {})",
            self.model,
            turns.len()
        );

        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&self.build_request(turns, max_tokens))
            .send()
            .await
            .map_err(|e| PrdError::Transport(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status,
                &format!("OpenAI API error ({}): {}", status, body),
                PROVIDER_NAME,
            )
            .into());
        }

        debug!("OpenAI stream opened");
        Ok(decode_sse(response.bytes_stream(), OpenAiParser::default()))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// =============================================================================
// Event Parsing
// =============================================================================

#[derive(Debug, Default)]
struct OpenAiParser {
    saw_finish: bool,
}

impl SseParser for OpenAiParser {
    fn parse(&mut self, data: &str) -> Result<Vec<StreamEvent>> {
        if data.trim() == "[DONE]" {
            self.saw_finish = true;
            return Ok(vec![StreamEvent::Other {
                kind: "done".to_string(),
            }]);
        }

        let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Undecodable stream chunk: {}", e),
                PROVIDER_NAME,
            )
        })?;

        if let Some(error) = chunk.error {
            return Err(ErrorClassifier::classify_error_type(
                error.error_type.as_deref().unwrap_or_default(),
                &error.message,
                PROVIDER_NAME,
            )
            .into());
        }

        let mut events = Vec::new();
        for choice in chunk.choices {
            if let Some(text) = choice.delta.and_then(|d| d.content)
                && !text.is_empty()
            {
                events.push(StreamEvent::text(text));
            }
            if let Some(reason) = choice.finish_reason {
                self.saw_finish = true;
                events.push(StreamEvent::stop(StopReason::parse(&reason)));
            }
        }

        if events.is_empty() {
            events.push(StreamEvent::Other {
                kind: "chunk".to_string(),
            });
        }
        Ok(events)
    }

    fn finish(&mut self) -> Result<()> {
        if self.saw_finish {
            Ok(())
        } else {
            Err(PrdError::Transport(
                "OpenAI stream closed before finish_reason".to_string(),
            ))
        }
    }
}

// =============================================================================
// Request/Response types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

impl<'a> ChatMessage<'a> {
    fn from_turn(turn: &'a ConversationTurn) -> Self {
        let content = match &turn.content {
            Content::Text(text) => MessageContent::Text(text),
            Content::Parts(parts) => MessageContent::Parts(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text(text) => MessagePart::Text { text },
                        ContentPart::Image { media_type, data } => MessagePart::ImageUrl {
                            image_url: ImageUrl {
                                url: format!("data:{};base64,{}", media_type, BASE64.encode(data)),
                            },
                        },
                    })
                    .collect(),
            ),
        };

        Self {
            role: turn.role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<MessagePart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}
