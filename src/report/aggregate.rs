use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::counts::{ERROR_STATUS_RANGE, StatusCounts};
use crate::scanner::types::{FailedFile, PerFileResult};

/// Run-wide summary, built once after every per-file result is in
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub total: u64,
    #[serde(rename = "status_counts")]
    pub counts: StatusCounts,
    pub files_processed: usize,
    pub failed_files: Vec<FailedFile>,
    pub malformed_records: u64,
    pub out_of_range_records: u64,
    pub workers: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

impl AggregateReport {
    pub fn from_results<I>(results: I, failed_files: Vec<FailedFile>, workers: usize, elapsed: Duration) -> Self
    where
        I: IntoIterator<Item = PerFileResult>,
    {
        let mut aggregator = Aggregator::new();
        for result in results {
            aggregator.add(result);
        }
        aggregator.finish(failed_files, workers, elapsed)
    }

    /// Share of all counted records carrying `status`, in percent
    pub fn percentage(&self, status: u16) -> f64 {
        Self::percent_of(self.counts.get(status), self.total)
    }

    /// Records with a 4xx or 5xx status
    pub fn error_count(&self) -> u64 {
        self.counts.count_in(ERROR_STATUS_RANGE)
    }

    /// Share of 4xx and 5xx records, in percent
    pub fn error_rate(&self) -> f64 {
        Self::percent_of(self.error_count(), self.total)
    }

    pub fn dropped_records(&self) -> u64 {
        self.malformed_records + self.out_of_range_records
    }

    fn percent_of(part: u64, whole: u64) -> f64 {
        if whole == 0 {
            return 0.0;
        }
        part as f64 / whole as f64 * 100.0
    }
}

/// Fan-in accumulator for per-file results
///
/// Pure numeric accumulation; feeding results in any order yields the same
/// report.
#[derive(Debug, Default)]
pub struct Aggregator {
    total: u64,
    counts: StatusCounts,
    files: usize,
    malformed: u64,
    out_of_range: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: PerFileResult) {
        self.total += result.total;
        self.counts.merge(&result.counts);
        self.malformed += result.malformed;
        self.out_of_range += result.out_of_range;
        self.files += 1;
    }

    pub fn finish(self, mut failed_files: Vec<FailedFile>, workers: usize, elapsed: Duration) -> AggregateReport {
        // Failures arrive in completion order
        failed_files.sort();

        AggregateReport {
            total: self.total,
            counts: self.counts,
            files_processed: self.files,
            failed_files,
            malformed_records: self.malformed,
            out_of_range_records: self.out_of_range,
            workers,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_result(name: &str, statuses: &[u16]) -> PerFileResult {
        let mut result = PerFileResult::new(name);
        for status in statuses {
            result.counts.increment(*status).unwrap();
            result.total += 1;
        }
        result
    }

    fn scenario() -> Vec<PerFileResult> {
        vec![
            file_result("a.json", &[200, 200, 404]),
            file_result("b.json", &[200, 500, 500]),
            file_result("c.json", &[]),
        ]
    }

    #[test]
    fn test_three_file_scenario() {
        let report = AggregateReport::from_results(scenario(), Vec::new(), 2, Duration::ZERO);

        assert_eq!(report.total, 6);
        assert_eq!(report.counts.get(200), 3);
        assert_eq!(report.counts.get(404), 1);
        assert_eq!(report.counts.get(500), 2);
        assert_eq!(report.files_processed, 3);
        assert_eq!(report.error_count(), 3);
        assert_eq!(format!("{:.2}", report.error_rate()), "50.00");
        assert_eq!(format!("{:.2}", report.percentage(200)), "50.00");
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let forward = AggregateReport::from_results(scenario(), Vec::new(), 1, Duration::ZERO);

        let permutations: [[usize; 3]; 5] = [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in permutations {
            let results = scenario();
            let shuffled: Vec<PerFileResult> = order.iter().map(|i| results[*i].clone()).collect();
            let report = AggregateReport::from_results(shuffled, Vec::new(), 1, Duration::ZERO);

            assert_eq!(report.total, forward.total);
            assert_eq!(report.counts, forward.counts);
        }
    }

    #[test]
    fn test_total_matches_sum_of_file_totals() {
        let results = scenario();
        let expected: u64 = results.iter().map(|r| r.total).sum();
        let report = AggregateReport::from_results(results, Vec::new(), 1, Duration::ZERO);
        assert_eq!(report.total, expected);
        assert_eq!(report.total, report.counts.total());
    }

    #[test]
    fn test_empty_run_has_no_nan() {
        let report = AggregateReport::from_results(Vec::new(), Vec::new(), 1, Duration::ZERO);
        assert_eq!(report.total, 0);
        assert_eq!(report.error_rate(), 0.0);
        assert_eq!(report.percentage(200), 0.0);
    }

    #[test]
    fn test_dropped_records_and_failures_are_reported() {
        let mut noisy = file_result("noisy.json", &[200]);
        noisy.malformed = 2;
        noisy.out_of_range = 1;

        let failures = vec![
            FailedFile { file: "z.json".into(), error: "denied".into() },
            FailedFile { file: "m.json".into(), error: "gone".into() },
        ];
        let report = AggregateReport::from_results(vec![noisy], failures, 4, Duration::from_millis(1500));

        assert_eq!(report.dropped_records(), 3);
        assert_eq!(report.failed_files[0].file, "m.json");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["status_counts"]["200"], 1);
        assert_eq!(json["malformed_records"], 2);
        assert_eq!(json["elapsed_secs"], 1.5);
        assert_eq!(json["failed_files"][1]["file"], "z.json");
    }
}
