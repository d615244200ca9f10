// src/error.rs

//! Unified error handling for the flat directory.
//!
//! Errors fall into a small number of kinds (see [`ErrorKind`]) so that the
//! directory can log a failing source appropriately and carry on with the
//! remaining ones.

use std::fmt;

use thiserror::Error;

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, DNS or HTTP status failure while fetching a document
    Transport,
    /// Malformed or unsupported document
    Decode,
    /// A required field could not be found or had the wrong shape
    Lookup,
    /// A constructor invariant was violated
    Validation,
    /// Bad configuration file or value
    Config,
    /// Cache or state file access failed
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::Lookup => "lookup",
            ErrorKind::Validation => "validation",
            ErrorKind::Config => "config",
            ErrorKind::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State file could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Document could not be decoded
    #[error("{0}")]
    Decode(String),

    /// Response declared a content type we cannot parse
    #[error("Unknown document type {0}")]
    UnknownDocumentType(String),

    /// Path expression is syntactically invalid
    #[error("Bad path {path} ({message})")]
    Path { path: String, message: String },

    /// Required field missing or malformed
    #[error("{0}")]
    Lookup(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("{0}")]
    Validation(String),
}

impl AppError {
    /// Create a path syntax error.
    pub fn path(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Path {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a lookup error.
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Http(_) => ErrorKind::Transport,
            AppError::Io(_) | AppError::Csv(_) => ErrorKind::Storage,
            AppError::Json(_) | AppError::Decode(_) | AppError::UnknownDocumentType(_) => {
                ErrorKind::Decode
            }
            AppError::Path { .. } | AppError::Lookup(_) => ErrorKind::Lookup,
            AppError::Url(_) | AppError::Validation(_) => ErrorKind::Validation,
            AppError::Toml(_) | AppError::Config(_) => ErrorKind::Config,
        }
    }
}
