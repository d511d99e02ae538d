use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the ragline engine
#[derive(Error, Debug)]
pub enum RaglineError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Corpus directory missing or unreadable (fatal to indexing)
    #[error("Corpus unavailable at {path}: {message}")]
    CorpusUnavailable { path: PathBuf, message: String },

    /// Query vector dimensionality does not match the index
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Query attempted before an index was built or loaded
    #[error("Vector index not ready: {0}")]
    IndexNotReady(String),

    /// Retrieval bounds violate fetch_k >= k >= 1
    #[error("Invalid retrieval bounds: fetch_k ({fetch_k}) must be >= k ({k}) and k must be >= 1")]
    InvalidRetrievalBounds { k: usize, fetch_k: usize },

    /// Persisted index was built with a different embedding model
    #[error("Embedder mismatch: index built with '{indexed}', loaded with '{current}'")]
    EmbedderMismatch { indexed: String, current: String },

    /// Embedding service failure (recoverable at the caller's discretion)
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Generative model failure (recoverable at the caller's discretion)
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for ragline operations
pub type Result<T> = std::result::Result<T, RaglineError>;
