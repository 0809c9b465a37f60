use anyhow::Result;
use console::style;

use super::aggregate::AggregateReport;

/// Human-readable report
///
/// Statuses are grouped by class (`2xx`, `4xx`, ...) and only non-zero
/// statuses are listed.
pub fn render_text(report: &AggregateReport) -> String {
    let mut lines = vec![
        style("=== Results ===").bold().underlined().to_string(),
        format!("Elapsed:        {:.2}s", report.elapsed.as_secs_f64()),
        format!(
            "Files:          {} processed, {} failed ({} workers)",
            report.files_processed,
            report.failed_files.len(),
            report.workers
        ),
        format!("Total requests: {}", style(format_number(report.total)).bold()),
        String::new(),
        style("By status code:").bold().cyan().to_string(),
    ];

    let mut current_class = None;
    for (status, count) in report.counts.iter() {
        let class = status / 100;
        if current_class != Some(class) {
            lines.push(format!("  {}", style(format!("{class}xx")).dim()));
            current_class = Some(class);
        }
        lines.push(format!(
            "    {}: {} ({:.2}%)",
            status,
            format_number(count),
            report.percentage(status)
        ));
    }
    if current_class.is_none() {
        lines.push("  (no records)".to_string());
    }

    lines.push(String::new());
    lines.push(format!(
        "Error rate (4xx, 5xx): {}",
        style(format!("{:.2}%", report.error_rate())).bold()
    ));

    if report.dropped_records() > 0 || !report.failed_files.is_empty() {
        lines.push(String::new());
        lines.push(style("Dropped:").bold().yellow().to_string());
        lines.push(format!("  Malformed records:    {}", format_number(report.malformed_records)));
        lines.push(format!("  Out-of-range status:  {}", format_number(report.out_of_range_records)));
        for failed in &report.failed_files {
            lines.push(format!("  {} {}: {}", style("✖").red(), failed.file, failed.error));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn render_json(report: &AggregateReport) -> Result<String> {
    let mut value = serde_json::to_value(report)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("error_count".to_string(), report.error_count().into());
        object.insert("error_rate".to_string(), report.error_rate().into());
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Thousands separators, e.g. `1234567` -> `1,234,567`
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::{FailedFile, PerFileResult};
    use std::time::Duration;

    fn report(statuses: &[u16], failed: Vec<FailedFile>) -> AggregateReport {
        let mut result = PerFileResult::new("a.json");
        for status in statuses {
            result.counts.increment(*status).unwrap();
            result.total += 1;
        }
        AggregateReport::from_results(vec![result], failed, 2, Duration::from_millis(250))
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(100_000), "100,000");
    }

    #[test]
    fn test_render_text() {
        console::set_colors_enabled(false);
        let text = render_text(&report(&[200, 200, 404, 500, 500], Vec::new()));

        assert!(text.contains("Total requests: 5"));
        assert!(text.contains("  2xx"));
        assert!(text.contains("    200: 2 (40.00%)"));
        assert!(text.contains("    404: 1 (20.00%)"));
        assert!(text.contains("Error rate (4xx, 5xx): 60.00%"));
        assert!(!text.contains("Dropped:"));
        assert!(text.find("404").unwrap() < text.find("500").unwrap());
        assert!(text.ends_with("Error rate (4xx, 5xx): 60.00%\n"));
        assert_eq!(text.lines().next(), Some("=== Results ==="));
    }

    #[test]
    fn test_render_text_lists_failures() {
        console::set_colors_enabled(false);
        let failed = vec![FailedFile {
            file: "access_bad.json".into(),
            error: "Failed to open".into(),
        }];
        let text = render_text(&report(&[], failed));

        assert!(text.contains("(no records)"));
        assert!(text.contains("Dropped:"));
        assert!(text.contains("access_bad.json: Failed to open"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&report(&[200, 503], Vec::new())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total"], 2);
        assert_eq!(value["status_counts"]["503"], 1);
        assert_eq!(value["error_count"], 1);
        assert_eq!(value["error_rate"], 50.0);
        assert_eq!(value["workers"], 2);
    }
}
