use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::types::{FileJob, Scanner};

impl Scanner {
    /// Compile the configured include patterns
    pub(crate) fn build_include_set(patterns: &[String]) -> Result<GlobSet> {
        if patterns.is_empty() {
            anyhow::bail!("scan.include must list at least one file name pattern");
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob =
                Glob::new(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
            builder.add(glob);
        }
        builder
            .build()
            .with_context(|| "Failed to build include pattern globset")
    }

    /// Whether a bare file name matches one of the include patterns
    pub fn is_log_file(&self, file_name: &str) -> bool {
        self.include.is_match(file_name)
    }

    /// List the log files directly inside `dir`
    ///
    /// The listing is not recursive. Only regular files (symlinks resolved)
    /// are kept, so directories, FIFOs, sockets and devices never reach a
    /// worker. Entries whose target cannot be resolved, like dangling symlinks,
    /// are kept so the open failure shows up in the report. An unreadable
    /// `dir` is fatal for the run. Jobs come back sorted by path.
    pub fn collect_log_files(&self, dir: &Path) -> Result<Vec<FileJob>> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Error opening log directory {}", dir.display()))?;

        let mut jobs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if !self.is_log_file(&entry.file_name().to_string_lossy()) {
                tracing::trace!("Ignoring {}", path.display());
                continue;
            }

            match std::fs::metadata(&path) {
                Ok(metadata) if !metadata.is_file() => {
                    tracing::debug!("Skipping {}: not a regular file", path.display());
                    continue;
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Cannot stat {}: {}", path.display(), e),
            }

            jobs.push(FileJob::new(path));
        }

        jobs.sort();
        tracing::debug!("Found {} log files in {}", jobs.len(), dir.display());
        Ok(jobs)
    }
}
