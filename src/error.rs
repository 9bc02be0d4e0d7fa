//! Error types for the TeamSkills matcher
//!
//! Every failure carries an `E###` code whose hundreds digit selects the
//! process exit code, plus an optional hint shown under the message.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for matcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Embedding errors (3xx)
    EmbeddingFailed = 300,
    EmbeddingTimeout = 301,
    EmbeddingMalformed = 302,
    EmbeddingRateLimited = 303,
    DimensionMismatch = 304,

    // Request errors (4xx)
    RequestMalformed = 400,

    // Internal errors (9xx)
    InternalError = 900,
}

/// Failure families; each one owns a CLI exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Io,
    Embedding,
    Request,
    Internal,
}

impl ErrorCategory {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Config => 10,
            ErrorCategory::Io => 20,
            ErrorCategory::Embedding => 30,
            ErrorCategory::Request => 40,
            ErrorCategory::Internal => 90,
        }
    }
}

impl ErrorCode {
    /// The hundreds digit picks the category
    pub fn category(self) -> ErrorCategory {
        match self as u16 / 100 {
            1 => ErrorCategory::Config,
            2 => ErrorCategory::Io,
            3 => ErrorCategory::Embedding,
            4 => ErrorCategory::Request,
            _ => ErrorCategory::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", *self as u16)
    }
}

/// Main error type for the matcher
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Invalid tuning input, rejected before any embedding call
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Embedding Errors
    // ─────────────────────────────────────────────────────────────

    /// Upstream embedding call failed (status is None for transport errors)
    #[error("Embedding request failed: {message}")]
    EmbeddingRequest { status: Option<u16>, message: String },

    /// Upstream embedding call timed out
    #[error("Embedding request timed out after {timeout_secs}s")]
    EmbeddingTimeout { timeout_secs: u64 },

    /// Upstream answered with something that is not an embedding
    #[error("Malformed embedding response: {message}")]
    EmbeddingMalformed { message: String },

    /// A batch entry failed after retries
    #[error("Embedding failed for input #{}: {message}", display_index(.index))]
    Embedding { index: Option<usize>, message: String },

    /// Vectors from different models (or a broken provider) were compared
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // ─────────────────────────────────────────────────────────────
    // Request Errors
    // ─────────────────────────────────────────────────────────────

    /// Match request could not be decoded
    #[error("Invalid match request: {message}")]
    InvalidRequest { message: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::RequestMalformed,

            Error::EmbeddingRequest { status: Some(429), .. } => ErrorCode::EmbeddingRateLimited,
            Error::EmbeddingRequest { .. } => ErrorCode::EmbeddingFailed,
            Error::EmbeddingTimeout { .. } => ErrorCode::EmbeddingTimeout,
            Error::EmbeddingMalformed { .. } => ErrorCode::EmbeddingMalformed,
            Error::Embedding { .. } => ErrorCode::EmbeddingFailed,
            Error::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,

            Error::InvalidRequest { .. } => ErrorCode::RequestMalformed,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is worth retrying against the provider
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::EmbeddingRequest { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            Error::EmbeddingTimeout { .. } => true,
            _ => false,
        }
    }

    /// Check if the error is a rejected tuning input
    pub fn is_configuration(&self) -> bool {
        self.code().category() == ErrorCategory::Config
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'teamskills-matcher config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'teamskills-matcher config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the tuning values (top_k, weights, temperatures, strength, anchors) and fix the invalid ones."
            ),

            Error::EmbeddingRequest { status: Some(401), .. }
            | Error::EmbeddingRequest { status: Some(403), .. } => Some(
                "Check the embedding API key (TEAMSKILLS_API_KEY or [embedding].api_key)."
            ),
            Error::EmbeddingRequest { status: Some(429), .. } => Some(
                "The embedding provider is rate limiting requests. Lower [embedding].max_concurrency or retry later."
            ),
            Error::EmbeddingRequest { .. } | Error::Embedding { .. } => Some(
                "Verify the embedding provider URL and model, or run with provider = \"mock\" for an offline dry run."
            ),
            Error::EmbeddingTimeout { .. } => Some(
                "The embedding provider did not answer in time. Increase [embedding].timeout_secs."
            ),
            Error::EmbeddingMalformed { .. } => Some(
                "The provider returned an unexpected payload. Check that the endpoint is an embeddings API."
            ),
            Error::DimensionMismatch { .. } => Some(
                "Cached vectors may come from another model. Run 'teamskills-matcher cache clear'."
            ),

            Error::InvalidRequest { .. } | Error::Json(_) => Some(
                "The request must be a JSON object with 'roles' and 'members' arrays."
            ),

            _ => None,
        }
    }

    /// Red code line plus a yellow hint when one applies
    pub fn format_for_terminal(&self) -> String {
        const RED: &str = "\x1b[31m";
        const YELLOW: &str = "\x1b[33m";
        const RESET: &str = "\x1b[0m";

        let mut output = format!("{RED}Error [{}]{RESET}: {}\n", self.code(), self);
        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n{YELLOW}Hint{RESET}: {hint}\n"));
        }
        output
    }

    /// Single uncoloured line for the log file
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}

fn display_index(index: &Option<usize>) -> String {
    index.map(|i| i.to_string()).unwrap_or_else(|| "?".to_string())
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Wrap a provider failure with the batch index it happened at
    pub fn embedding_at(index: usize, source: &Error) -> Self {
        Error::Embedding {
            index: Some(index),
            message: source.to_string(),
        }
    }

    /// Create a malformed response error
    pub fn embedding_malformed(message: impl Into<String>) -> Self {
        Error::EmbeddingMalformed {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
