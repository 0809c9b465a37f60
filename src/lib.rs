//! # logtally - parallel HTTP status tally over JSON access logs
//!
//! logtally reads every access log in a directory, one JSON record per line,
//! and counts how often each HTTP status code appears. Files are processed by
//! a bounded pool of worker threads; per-file tallies are merged into one
//! report with totals, per-code percentages and the 4xx/5xx error rate.
//!
//! ## Quick Start
//!
//! ```bash
//! # Tally ./logs/access_*.json with one worker per core
//! logtally scan
//!
//! # Four workers, JSON report, different directory
//! logtally scan /var/log/app --workers 4 --format json
//!
//! # Compare recorded run times
//! logtally history show
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use logtally::config::LogtallyConfig;
//! use logtally::scanner::Scanner;
//! use std::path::Path;
//!
//! let config = LogtallyConfig::load(None, None::<&()>)?;
//! let scanner = Scanner::new(&config)?;
//! let report = scanner.scan_directory(Path::new("logs"))?;
//!
//! for (status, count) in report.counts.iter() {
//!     println!("{status}: {count} ({:.2}%)", report.percentage(status));
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Configuration
//!
//! Defaults live in `default-config.toml`; override them with
//! `logtally.toml` in the working directory, `--config FILE`, `LOGTALLY_*`
//! environment variables (`LOGTALLY_PARALLEL__MAX_THREADS=8`) or flags.

pub mod cli;
pub mod config;
pub mod counts;
pub mod decoder;
pub mod history;
pub mod parallel;
pub mod report;
pub mod scanner;

/// Result type alias for logtally operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
