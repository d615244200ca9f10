//! Fetched listing documents.

use std::fmt;

use crate::error::{AppError, Result};

/// Kind of a listing document, determined by its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markup,
    Json,
}

impl DocumentKind {
    /// All kinds, in cache lookup order.
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Markup, DocumentKind::Json];

    /// Classify a declared content type (without parameters).
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        match content_type {
            "text/html" => Ok(DocumentKind::Markup),
            "application/json" => Ok(DocumentKind::Json),
            other => Err(AppError::UnknownDocumentType(other.to_string())),
        }
    }

    /// File extension of cached documents of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Markup => "html",
            DocumentKind::Json => "json",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Raw document bytes together with their kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(kind: DocumentKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
        }
    }
}
