//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/deepprd/) and project (.deepprd/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{generation, network, provider, templates};
use crate::types::{PrdError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Generation session settings
    pub generation: GenerationConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Reference template settings
    pub templates: TemplateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            server: ServerConfig::default(),
            templates: TemplateConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `PrdError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.llm.provider.as_str(), "anthropic" | "openai") {
            return Err(PrdError::Config(format!(
                "Unknown provider: {}. Supported: anthropic, openai",
                self.llm.provider
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(PrdError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(base) = &self.llm.api_base {
            url::Url::parse(base).map_err(|e| {
                PrdError::Config(format!("LLM api_base '{}' is not a valid URL: {}", base, e))
            })?;
        }

        if self.generation.session_timeout_secs == 0 {
            return Err(PrdError::Config(
                "generation.session_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.generation.sink_capacity == 0 {
            return Err(PrdError::Config(
                "generation.sink_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Note: the API key is never serialized and is redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider type: "anthropic", "openai"
    pub provider: String,

    /// Model name (provider default when unset)
    pub model: Option<String>,

    /// API key (falls back to the provider's conventional env var)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL (for proxies and compatible endpoints)
    pub api_base: Option<String>,

    /// Connection timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: provider::DEFAULT_PROVIDER.to_string(),
            model: None,
            api_key: None,
            api_base: None,
            timeout_secs: network::CONNECTION_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Total wall-clock budget for one session in seconds
    pub session_timeout_secs: u64,

    /// Output sink channel depth
    pub sink_capacity: usize,
}

impl GenerationConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: generation::DEFAULT_SESSION_TIMEOUT_SECS,
            sink_capacity: generation::DEFAULT_SINK_CAPACITY,
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,

    /// Maximum multipart body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: network::DEFAULT_BIND.to_string(),
            max_upload_bytes: network::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

// =============================================================================
// Template Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory containing the reference texts
    pub dir: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(templates::DEFAULT_DIR),
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
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.generation.session_timeout_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = Config::default();
        config.llm.provider = "claude-code".to_string();
        assert!(matches!(config.validate(), Err(PrdError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_api_base() {
        let mut config = Config::default();
        config.llm.api_base = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.llm.api_base = Some("https://proxy.internal:8443".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.generation.sink_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generation.session_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_redacted_and_not_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());

        let debug = format!("{:?}", config.llm);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
