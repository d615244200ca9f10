//! Service layer of the directory.
//!
//! This module contains the per-source work of an update:
//! - Document fetching with an on-disk cache (`DocumentFetcher`)
//! - Ad extraction from listing documents (`AdExtractor`)

mod extract;
mod fetch;

pub use extract::AdExtractor;
pub use fetch::DocumentFetcher;
