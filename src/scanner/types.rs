use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::counts::StatusCounts;

/// One input file waiting to be tallied
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileJob {
    path: PathBuf,
}

impl FileJob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used in reports and diagnostics
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for FileJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Tally produced by one file
///
/// `total == counts.total()` always holds: a record is only counted once its
/// status has landed in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerFileResult {
    pub file: String,
    pub total: u64,
    pub counts: StatusCounts,
    /// Records that could not be decoded
    pub malformed: u64,
    /// Records whose status falls outside the counter table
    pub out_of_range: u64,
}

impl PerFileResult {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            total: 0,
            counts: StatusCounts::new(),
            malformed: 0,
            out_of_range: 0,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.malformed + self.out_of_range
    }
}

/// A file that produced no result
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// How jobs are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Parallel once enough files are found, sequential below that
    Auto,
    /// Always use the worker pool
    #[default]
    Parallel,
    /// Process files one at a time on the calling thread
    Sequential,
}

/// Scanner settings, merged from the `scan` and `parallel` config sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    pub directory: PathBuf,
    pub include: Vec<String>,
    pub buffer_size_kb: usize,
    pub mode: ScanMode,
    pub max_threads: usize,
    pub thread_percentage: u8,
    pub min_files_for_parallel: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            include: vec!["access_*.json".to_string()],
            buffer_size_kb: 256,
            mode: ScanMode::Parallel,
            max_threads: 0,
            thread_percentage: 100,
            min_files_for_parallel: 2,
        }
    }
}

impl ScannerConfig {
    /// Read buffer size in bytes, never below 4 KiB
    pub fn buffer_size(&self) -> usize {
        self.buffer_size_kb.max(4) * 1024
    }
}

/// Raw `[scan]` section
#[derive(Debug, Deserialize)]
pub(crate) struct ScanSection {
    pub directory: PathBuf,
    pub include: Vec<String>,
    pub buffer_size_kb: usize,
}

/// Raw `[parallel]` section
#[derive(Debug, Deserialize)]
pub(crate) struct ParallelSection {
    pub mode: ScanMode,
    pub max_threads: usize,
    pub thread_percentage: u8,
    pub min_files_for_parallel: usize,
}

/// Main scanner struct - tallies status codes across log files
#[derive(Debug, Clone)]
pub struct Scanner {
    pub(crate) config: ScannerConfig,
    pub(crate) include: globset::GlobSet,
}
