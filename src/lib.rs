// src/lib.rs

//! Flat Directory Library
//!
//! Aggregates flat ads from different real estate companies. Each company
//! publishes a listing document (HTML or JSON); field paths configured per
//! company locate the ads and their fields in it. Ads are stored per company
//! together with the time they were first seen.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, ErrorKind, Result};
pub use models::{Ad, Config, Source, SourceConfig};
pub use pipeline::Directory;
