//! Anthropic Messages API Provider
//!
//! Streams `POST /v1/messages` with `stream: true` and maps the SSE events
//! onto [`StreamEvent`]s.

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
use crate::constants::provider::{ANTHROPIC_API_BASE, ANTHROPIC_VERSION, DEFAULT_ANTHROPIC_MODEL};
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, PrdError, Result};

const PROVIDER_NAME: &str = "anthropic";

/// Anthropic provider with secure API key handling
pub struct AnthropicProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config_or_env(config.api_key.as_ref(), "ANTHROPIC_API_KEY").ok_or_else(|| {
            PrdError::Config(
                "Missing ANTHROPIC_API_KEY. Set the env var or llm.api_key in config".to_string(),
            )
        })?;

        let api_base = config_or_env(config.api_base.as_ref(), "ANTHROPIC_BASE_URL")
            .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string());

        let model = config_or_env(config.model.as_ref(), "ANTHROPIC_MODEL")
            .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string());

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
    ) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: turns.iter().map(WireMessage::from_turn).collect(),
            stream: true,
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn stream_chat(
        &self,
        turns: &[ConversationTurn],
        max_tokens: u32,
    ) -> Result<EventStream> {
        info!(
            "Streaming with Anthropic (model: {}, turns: {})",
            self.model,
            turns.len()
        );

        let url = format!("{}/v1/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.build_request(turns, max_tokens))
            .send()
            .await
            .map_err(|e| PrdError::Transport(format!("Anthropic request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or(body);
            return Err(
                ErrorClassifier::classify_http_status(status, &message, PROVIDER_NAME).into(),
            );
        }

        debug!("Anthropic stream opened");
        Ok(decode_sse(response.bytes_stream(), AnthropicParser::default()))
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
struct AnthropicParser {
    saw_message_stop: bool,
}

impl SseParser for AnthropicParser {
    fn parse(&mut self, data: &str) -> Result<Vec<StreamEvent>> {
        let event: WireEvent = serde_json::from_str(data).map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Undecodable stream event: {}", e),
                PROVIDER_NAME,
            )
        })?;

        let parsed = match event.event_type.as_str() {
            "content_block_delta" => match event.delta {
                Some(WireDelta {
                    delta_type: Some(kind),
                    text: Some(text),
                    ..
                }) if kind == "text_delta" => StreamEvent::text(text),
                _ => StreamEvent::Other {
                    kind: event.event_type,
                },
            },
            "message_delta" => match event.delta.and_then(|d| d.stop_reason) {
                Some(reason) => StreamEvent::stop(StopReason::parse(&reason)),
                None => StreamEvent::Other {
                    kind: event.event_type,
                },
            },
            "error" => {
                let error = event.error.unwrap_or_default();
                return Err(ErrorClassifier::classify_error_type(
                    &error.error_type,
                    &error.message,
                    PROVIDER_NAME,
                )
                .into());
            }
            "message_stop" => {
                self.saw_message_stop = true;
                StreamEvent::Other {
                    kind: event.event_type,
                }
            }
            _ => StreamEvent::Other {
                kind: event.event_type,
            },
        };

        Ok(vec![parsed])
    }

    fn finish(&mut self) -> Result<()> {
        if self.saw_message_stop {
            Ok(())
        } else {
            Err(PrdError::Transport(
                "Anthropic stream closed before message_stop".to_string(),
            ))
        }
    }
}

// =============================================================================
// Request/Response types
// =============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: WireContent<'a>,
}

impl<'a> WireMessage<'a> {
    fn from_turn(turn: &'a ConversationTurn) -> Self {
        let content = match &turn.content {
            Content::Text(text) => WireContent::Text(text),
            Content::Parts(parts) => WireContent::Blocks(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text(text) => WireBlock::Text { text },
                        ContentPart::Image { media_type, data } => WireBlock::Image {
                            source: ImageSource {
                                source_type: "base64",
                                media_type: media_type.as_str(),
                                data: BASE64.encode(data),
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
enum WireContent<'a> {
    Text(&'a str),
    Blocks(Vec<WireBlock<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock<'a> {
    Text { text: &'a str },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<WireDelta>,
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireDelta {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
    stop_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: WireError,
}
