//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provider failures are classified so they can be logged and reported
//! with a stable category.
//!
//! ## Error Categories
//!
//! - **RateLimit**: API rate limiting
//! - **TokenLimit**: Context too large
//! - **Auth**: Authentication failures
//! - **Network**: Connectivity issues
//! - **Unavailable**: Provider unavailable
//!
//! ## Propagation
//!
//! Errors raised before the response stream starts become an HTTP 500 with a
//! JSON body. Errors raised afterwards can only end the stream abnormally.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Unified error categories for provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited by the provider
    RateLimit,
    /// Context/token limit exceeded
    TokenLimit,
    /// Authentication failed
    Auth,
    /// Network/connectivity issues
    Network,
    /// Provider unavailable or overloaded
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Provider payload could not be decoded
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Structured provider error with category and context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps provider status codes and error payloads onto categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status code returned by a provider
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            413 => ErrorCategory::TokenLimit,
            404 => ErrorCategory::Unavailable,
            529 => ErrorCategory::Unavailable,
            500 | 502 | 503 | 504 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider)
    }

    /// Classify an error type string carried inside a provider stream
    /// (e.g. Anthropic's `overloaded_error`)
    pub fn classify_error_type(error_type: &str, message: &str, provider: &str) -> LlmError {
        let category = match error_type {
            "rate_limit_error" => ErrorCategory::RateLimit,
            "authentication_error" | "permission_error" => ErrorCategory::Auth,
            "invalid_request_error" => ErrorCategory::BadRequest,
            "request_too_large" => ErrorCategory::TokenLimit,
            "not_found_error" | "overloaded_error" => ErrorCategory::Unavailable,
            "api_error" => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum PrdError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Pre-stream Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Template '{name}' unavailable: {reason}")]
    Template { name: String, reason: String },

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    /// Structured provider error with category
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Connection drop or undecodable stream after the call was opened
    #[error("Transport error: {0}")]
    Transport(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The consumer went away before the session finished
    #[error("Generation cancelled by consumer")]
    Cancelled,
}

impl From<LlmError> for PrdError {
    fn from(err: LlmError) -> Self {
        PrdError::Llm(err)
    }
}

impl From<reqwest::Error> for PrdError {
    fn from(err: reqwest::Error) -> Self {
        PrdError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PrdError>;

impl PrdError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn template(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Template {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Short label used as the `error` field of HTTP error bodies
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Input(_) => "Invalid Input",
            Self::Template { .. } => "Template Error",
            Self::Llm(_) | Self::Transport(_) => "Provider Error",
            Self::Timeout { .. } => "Timeout",
            Self::Cancelled => "Cancelled",
            Self::Io(_) | Self::Json(_) => "Internal Server Error",
        }
    }

    /// Provider error category, if this error came from a provider
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Llm(e) => Some(e.category),
            Self::Transport(_) => Some(ErrorCategory::Network),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::TokenLimit.to_string(), "TOKEN_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(401, "Unauthorized", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server_error = ErrorClassifier::classify_http_status(500, "Server error", "test");
        assert_eq!(server_error.category, ErrorCategory::Transient);

        let overloaded = ErrorClassifier::classify_http_status(529, "Overloaded", "test");
        assert_eq!(overloaded.category, ErrorCategory::Unavailable);
    }

    #[test]
    fn test_classify_error_type() {
        let err = ErrorClassifier::classify_error_type("overloaded_error", "busy", "anthropic");
        assert_eq!(err.category, ErrorCategory::Unavailable);

        let err = ErrorClassifier::classify_error_type("something_new", "?", "anthropic");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_labels_and_categories() {
        assert_eq!(
            PrdError::Config("missing key".into()).label(),
            "Configuration Error"
        );
        assert_eq!(PrdError::Cancelled.category(), None);
        assert_eq!(
            PrdError::Transport("reset".into()).category(),
            Some(ErrorCategory::Network)
        );
    }
}
