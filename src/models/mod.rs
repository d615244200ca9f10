// src/models/mod.rs

//! Domain models for the flat directory.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod ad;
mod config;
mod document;
mod source;

// Re-export all public types
pub use ad::{Ad, AdRecord};
pub use config::{Config, DirectoryConfig, HttpConfig, LocaleConfig};
pub use document::{Document, DocumentKind};
pub use source::{Source, SourceConfig};
