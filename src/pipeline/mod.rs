//! Update pipeline of the directory.
//!
//! - `Directory`: owns the sources and updates them one after another
//! - `diff`: carries first-seen times over and summarizes changes

pub mod diff;
pub mod directory;

pub use diff::{AdDiff, calculate_diff, merge_first_seen};
pub use directory::{BoundSource, Directory, SourceFailure, SourceUpdate, UpdateOutcome};
