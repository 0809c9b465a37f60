//! Log directory scanning
//!
//! The [`Scanner`] lists log files in a directory, tallies each one through the
//! record decoder into its own counter table, and hands the per-file results
//! to the aggregator. Dispatch across threads is delegated to
//! [`crate::parallel`].

pub mod core;
pub mod directory;
pub mod parallel;
pub mod types;

// Re-export main types for easier access
pub use types::{FailedFile, FileJob, PerFileResult, ScanMode, Scanner, ScannerConfig};
