//! Run-history ledger
//!
//! After a run the elapsed time is upserted under a label (e.g. `phase4`) in a
//! small text file, one `label=seconds` line per label. Lines other than the
//! baseline carry a speedup annotation relative to the baseline label.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `[history]` config section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub label: String,
    pub baseline: String,
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<()> {
        validate_label(&self.label).context("Invalid history.label")?;
        validate_label(&self.baseline).context("Invalid history.baseline")?;
        Ok(())
    }
}

/// Labels must survive a write/parse cycle of a `label=seconds` line
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        anyhow::bail!("label must not be empty");
    }
    if label.trim() != label {
        anyhow::bail!("label {label:?} has leading or trailing whitespace");
    }
    if label.contains('=') || label.chars().any(char::is_control) {
        anyhow::bail!("label {label:?} must not contain '=' or control characters");
    }
    Ok(())
}

/// Destination for the one timing measurement a run produces
pub trait ResultSink {
    fn record(&self, label: &str, elapsed: Duration) -> Result<()>;
}

/// Text-file ledger of elapsed seconds per label
#[derive(Debug, Clone)]
pub struct RunLedger {
    path: PathBuf,
    baseline: String,
}

impl RunLedger {
    pub fn new(path: impl Into<PathBuf>, baseline: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baseline: baseline.into(),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(&config.path, &config.baseline)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries; a missing or unreadable file reads as empty
    pub fn load(&self) -> BTreeMap<String, f64> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::debug!("No run history at {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
        }
    }

    pub fn save(&self, entries: &BTreeMap<String, f64>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, self.render(entries))
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Parse `label=seconds [annotation]` lines, skipping anything else
    pub fn parse(content: &str) -> BTreeMap<String, f64> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                let (label, rest) = line.split_once('=')?;
                let secs = rest.split_whitespace().next()?.parse::<f64>().ok()?;
                Some((label.trim().to_string(), secs))
            })
            .collect()
    }

    /// Baseline first, then the other labels in name order
    pub fn render(&self, entries: &BTreeMap<String, f64>) -> String {
        let baseline = entries.get(&self.baseline).copied();
        let mut lines = Vec::with_capacity(entries.len());

        if let Some(secs) = baseline {
            lines.push(format!("{}={:.2}", self.baseline, secs));
        }

        for (label, secs) in entries.iter().filter(|(label, _)| **label != self.baseline) {
            let mut line = format!("{label}={secs:.2}");
            if let Some(base) = baseline.filter(|base| *base > 0.0 && *secs > 0.0) {
                let speedup = base / secs;
                let improvement = (base - secs) / base * 100.0;
                line.push_str(&format!(
                    " ({speedup:.2}x faster than {}, {improvement:.1}% improvement)",
                    self.baseline
                ));
            }
            lines.push(line);
        }

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        content
    }
}

impl ResultSink for RunLedger {
    /// Idempotent upsert: recording the same label again replaces its value
    fn record(&self, label: &str, elapsed: Duration) -> Result<()> {
        validate_label(label)?;
        let mut entries = self.load();
        entries.insert(label.to_string(), elapsed.as_secs_f64());
        self.save(&entries)?;
        tracing::debug!("Recorded {}={:.2}s in {}", label, elapsed.as_secs_f64(), self.path.display());
        Ok(())
    }
}
