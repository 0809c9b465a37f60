use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use super::types::{FailedFile, FileJob, ScanMode, Scanner};
use crate::parallel::ExecutionStrategy;
use crate::report::AggregateReport;

impl Scanner {
    /// Pick sequential or pooled execution for `file_count` files
    pub fn execution_strategy(&self, file_count: usize) -> ExecutionStrategy {
        let workers = ExecutionStrategy::calculate_optimal_workers(
            self.config.max_threads,
            self.config.thread_percentage,
        );

        match self.config.mode {
            ScanMode::Sequential => ExecutionStrategy::Sequential,
            ScanMode::Parallel => ExecutionStrategy::Parallel { workers },
            ScanMode::Auto => {
                ExecutionStrategy::auto(file_count, self.config.min_files_for_parallel, workers)
            }
        }
    }

    /// List, tally and merge every log file in `dir`
    ///
    /// Only a directory that cannot be listed fails the call. Files that cannot
    /// be read are logged and listed in the report's `failed_files`.
    pub fn scan_directory(&self, dir: &Path) -> Result<AggregateReport> {
        let start_time = Instant::now();

        let jobs = self.collect_log_files(dir)?;
        let strategy = self.execution_strategy(jobs.len());
        let mut report = self.scan_files(jobs, &strategy)?;

        report.elapsed = start_time.elapsed();
        Ok(report)
    }

    /// Tally `jobs` with the given strategy and merge the results
    pub fn scan_files(&self, jobs: Vec<FileJob>, strategy: &ExecutionStrategy) -> Result<AggregateReport> {
        let start_time = Instant::now();
        let file_count = jobs.len();

        tracing::info!(
            "Processing {} files with {} worker(s)",
            file_count,
            strategy.workers()
        );

        let outcome = strategy.execute(jobs, |job| self.process_file(job))?;

        let failed_files: Vec<FailedFile> = outcome
            .failures
            .into_iter()
            .map(|failure| FailedFile {
                file: failure.job.name(),
                error: format!("{:#}", failure.error),
            })
            .collect();

        let report = AggregateReport::from_results(
            outcome.results,
            failed_files,
            outcome.workers,
            start_time.elapsed(),
        );

        tracing::info!(
            "Tallied {} records from {}/{} files in {:.2}s",
            report.total,
            report.files_processed,
            file_count,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::ScannerConfig;
    use std::fs;
    use tempfile::TempDir;

    fn scanner(mode: ScanMode, max_threads: usize) -> Scanner {
        Scanner::with_config(ScannerConfig {
            mode,
            max_threads,
            ..ScannerConfig::default()
        })
        .unwrap()
    }

    fn lines(statuses: &[u16]) -> String {
        statuses
            .iter()
            .map(|status| format!("{{\"method\":\"GET\",\"status\":{status}}}\n"))
            .collect()
    }

    fn scenario_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("access_a.json"), lines(&[200, 200, 404])).unwrap();
        fs::write(dir.path().join("access_b.json"), lines(&[200, 500, 500])).unwrap();
        fs::write(dir.path().join("access_c.json"), "").unwrap();
        fs::write(dir.path().join("README.md"), "not a log").unwrap();
        dir
    }

    #[test]
    fn test_three_file_scenario() {
        let dir = scenario_dir();
        let report = scanner(ScanMode::Parallel, 0).scan_directory(dir.path()).unwrap();

        assert_eq!(report.total, 6);
        assert_eq!(report.counts.get(200), 3);
        assert_eq!(report.counts.get(404), 1);
        assert_eq!(report.counts.get(500), 2);
        assert_eq!(report.files_processed, 3);
        assert!(report.failed_files.is_empty());
        assert_eq!(format!("{:.2}", report.error_rate()), "50.00");
    }

    #[test]
    fn test_worker_count_does_not_change_report() {
        let dir = TempDir::new().unwrap();
        for i in 0..40u16 {
            let statuses: Vec<u16> = (0..(i % 7 + 1)).map(|j| 200 + (i * 13 + j * 101) % 400).collect();
            fs::write(dir.path().join(format!("access_{i:03}.json")), lines(&statuses)).unwrap();
        }

        let sequential = scanner(ScanMode::Sequential, 0).scan_directory(dir.path()).unwrap();
        for workers in [1, 2, num_cpus::get()] {
            let report = scanner(ScanMode::Parallel, workers).scan_directory(dir.path()).unwrap();
            assert_eq!(report.total, sequential.total, "workers = {workers}");
            assert_eq!(report.counts, sequential.counts, "workers = {workers}");
            assert_eq!(report.files_processed, 40);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unopenable_file_does_not_abort_run() {
        let dir = scenario_dir();
        std::os::unix::fs::symlink(
            dir.path().join("does-not-exist"),
            dir.path().join("access_broken.json"),
        )
        .unwrap();

        let report = scanner(ScanMode::Parallel, 2).scan_directory(dir.path()).unwrap();
        assert_eq!(report.total, 6);
        assert_eq!(report.files_processed, 3);
        assert_eq!(report.failed_files.len(), 1);
        assert_eq!(report.failed_files[0].file, "access_broken.json");
        assert!(report.failed_files[0].error.contains("Failed to open"));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let report = scanner(ScanMode::Parallel, 0).scan_directory(dir.path()).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.files_processed, 0);
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = scanner(ScanMode::Parallel, 0).scan_directory(&dir.path().join("logs"));
        assert!(result.is_err());
    }

    #[test]
    fn test_execution_strategy_by_mode() {
        assert_eq!(
            scanner(ScanMode::Sequential, 0).execution_strategy(100),
            ExecutionStrategy::Sequential
        );
        assert_eq!(
            scanner(ScanMode::Parallel, 3).execution_strategy(1).workers(),
            3
        );
        assert_eq!(
            scanner(ScanMode::Auto, 0).execution_strategy(1),
            ExecutionStrategy::Sequential
        );
        assert!(matches!(
            scanner(ScanMode::Auto, 0).execution_strategy(10),
            ExecutionStrategy::Parallel { .. }
        ));
    }
}
