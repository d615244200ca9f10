//! Storage of per-source state.
//!
//! Each source has one state file listing its currently known ads; the file
//! is rewritten in full on every update and is the only input of
//! [`Directory::ads`](crate::pipeline::Directory::ads).
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── example.org.csv       # State: url,title,location,rooms,rent,time
//! ├── example.org.html      # Cached listing document (or .json)
//! └── api.example.com.json
//! ```

pub mod local;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Ad, Source};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for ad storage backends.
pub trait AdStorage {
    /// Load the stored ads of `source`; empty if it was never saved.
    fn load(&self, source: &Source) -> Result<Vec<Ad>>;

    /// Replace the stored ads of `source`.
    fn save(&self, source: &Source, ads: &[Ad]) -> Result<()>;

    /// Time of the last save, if any.
    fn last_saved(&self, source: &Source) -> Result<Option<DateTime<Utc>>>;
}
