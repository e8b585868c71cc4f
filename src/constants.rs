//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Generation session constants
pub mod generation {
    /// Maximum continuation rounds after the initial streaming call
    pub const MAX_CONTINUATIONS: u32 = 5;

    /// Output token ceiling sent with every provider request
    pub const MAX_TOKENS: u32 = 64_000;

    /// Separator emitted to the output sink at each continuation boundary
    pub const CONTINUATION_SEPARATOR: &str = "\n";

    /// User instruction appended for every continuation round
    pub const CONTINUATION_PROMPT: &str =
        "请继续完成剩余内容，从你上次停止的地方继续写。不要重复已经写过的内容。";

    /// Default total wall-clock budget for one session (seconds)
    pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;

    /// Default depth of the output sink channel
    pub const DEFAULT_SINK_CAPACITY: usize = 32;
}

/// Completion detector markers
pub mod markers {
    /// Second-level appendix heading
    pub const APPENDIX_H2: &str = "## 8. 附录";

    /// Top-level appendix heading
    pub const APPENDIX_H1: &str = "# 附录";

    /// Explicit end-of-document sentinel
    pub const END_SENTINEL: &str = "---END---";

    /// Data requirements section heading
    pub const SECTION_7: &str = "## 7.";

    /// Closing fence of a code block
    pub const CODE_FENCE: &str = "```";
}

/// Provider constants
pub mod provider {
    pub const DEFAULT_PROVIDER: &str = "anthropic";

    pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";

    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

    pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

    pub const ANTHROPIC_VERSION: &str = "2023-06-01";

    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
}

/// Reference template constants
pub mod templates {
    /// Default directory holding the reference texts
    pub const DEFAULT_DIR: &str = "templates";

    /// Structural template file name
    pub const REQUIREMENTS_TEMPLATE: &str = "system-requirements-template.md";

    /// Writing standard file name
    pub const WRITING_GUIDELINES: &str = "writing-guidelines.md";
}

/// HTTP/Network constants
pub mod network {
    /// Connection timeout for provider calls (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Default server bind address
    pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

    /// Maximum multipart request size (50MB)
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
}

/// CLI rendering constants
pub mod render {
    /// Interval between display flushes (milliseconds)
    pub const FLUSH_INTERVAL_MS: u64 = 100;
}

/// Input wizard constants
pub mod wizard {
    /// Maximum number of visual uploads
    pub const MAX_VISUALS: usize = 10;

    /// File stem used when saving a document without a theme
    pub const DEFAULT_DOCUMENT_NAME: &str = "system-requirements";
}
