use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;

use super::types::{FileJob, ParallelSection, PerFileResult, ScanSection, Scanner, ScannerConfig};
use crate::config::LogtallyConfig;
use crate::decoder::{DecodeError, JsonLinesDecoder, RecordDecoder};
use crate::parallel::MAX_WORKERS;

impl Scanner {
    pub fn new(config: &LogtallyConfig) -> Result<Self> {
        let scanner_config = Self::parse_scanner_config(config)?;
        Self::with_config(scanner_config)
    }

    pub fn with_config(config: ScannerConfig) -> Result<Self> {
        let include = Self::build_include_set(&config.include)?;
        Ok(Scanner { config, include })
    }

    pub fn parse_scanner_config(config: &LogtallyConfig) -> Result<ScannerConfig> {
        let scan: ScanSection = config.section("scan")?;
        let parallel: ParallelSection = config.section("parallel")?;

        if parallel.thread_percentage == 0 || parallel.thread_percentage > 100 {
            anyhow::bail!(
                "parallel.thread_percentage must be between 1 and 100, got {}",
                parallel.thread_percentage
            );
        }

        if parallel.max_threads > MAX_WORKERS {
            anyhow::bail!(
                "parallel.max_threads must be at most {}, got {}",
                MAX_WORKERS,
                parallel.max_threads
            );
        }

        Ok(ScannerConfig {
            directory: scan.directory,
            include: scan.include,
            buffer_size_kb: scan.buffer_size_kb,
            mode: parallel.mode,
            max_threads: parallel.max_threads,
            thread_percentage: parallel.thread_percentage,
            min_files_for_parallel: parallel.min_files_for_parallel,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Tally one file
    ///
    /// Only opening and reading the file can fail; bad records are counted as
    /// dropped and skipped. The file handle is closed when this returns, on
    /// every path.
    pub fn process_file(&self, job: &FileJob) -> Result<PerFileResult> {
        let file = File::open(job.path())
            .with_context(|| format!("Failed to open {}", job.path().display()))?;
        let reader = BufReader::with_capacity(self.config.buffer_size(), file);
        let mut decoder = JsonLinesDecoder::new(reader);

        let result = Self::tally(job.name(), &mut decoder)
            .with_context(|| format!("Failed to read {}", job.path().display()))?;

        tracing::debug!(
            "Tallied {}: {} records, {} dropped",
            result.file,
            result.total,
            result.dropped()
        );
        Ok(result)
    }

    /// Drain `decoder` into a fresh counter table
    pub fn tally<D: RecordDecoder>(file: String, decoder: &mut D) -> std::io::Result<PerFileResult> {
        let mut result = PerFileResult::new(file);

        while decoder.more()? {
            let status = match decoder.decode() {
                Ok(entry) => entry.status,
                Err(DecodeError::StatusOutOfRange(status)) => {
                    tracing::trace!("{}: skipping out-of-range status {}", result.file, status);
                    result.out_of_range += 1;
                    continue;
                }
                Err(e) => {
                    tracing::trace!("{}: skipping record: {}", result.file, e);
                    result.malformed += 1;
                    continue;
                }
            };

            match result.counts.increment(status) {
                Ok(()) => result.total += 1,
                Err(_) => result.out_of_range += 1,
            }
        }

        Ok(result)
    }
}
