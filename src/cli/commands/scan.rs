use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::Output;
use crate::config::LogtallyConfig;
use crate::history::{HistoryConfig, ResultSink, RunLedger};
use crate::report::{render_json, render_text};
use crate::scanner::{ScanMode, Scanner};

#[derive(Args)]
pub struct ScanArgs {
    /// Directory holding the access logs (default: scan.directory from config)
    #[arg(value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// File name patterns to include (glob, comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Number of worker threads (default: all available cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Processing mode: parallel, sequential, or auto
    #[arg(long, value_enum)]
    pub mode: Option<ScanMode>,

    /// Read buffer size per file in KiB
    #[arg(long)]
    pub buffer_kb: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Label under which the run time is recorded
    #[arg(long)]
    pub label: Option<String>,

    /// Do not record the run time
    #[arg(long)]
    pub no_history: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON format
    Json,
}

/// Config overrides for the flags the user actually passed
fn scan_overrides(args: &ScanArgs) -> serde_json::Value {
    let mut scan = serde_json::Map::new();
    if let Some(directory) = &args.directory {
        scan.insert("directory".into(), directory.to_string_lossy().into());
    }
    if !args.include.is_empty() {
        scan.insert("include".into(), args.include.clone().into());
    }
    if let Some(buffer_kb) = args.buffer_kb {
        scan.insert("buffer_size_kb".into(), buffer_kb.into());
    }

    let mut parallel = serde_json::Map::new();
    if let Some(workers) = args.workers {
        parallel.insert("max_threads".into(), workers.into());
    }
    if let Some(mode) = args.mode {
        parallel.insert("mode".into(), serde_json::to_value(mode).unwrap_or_default());
    }

    let mut history = serde_json::Map::new();
    if let Some(label) = &args.label {
        history.insert("label".into(), label.clone().into());
    }
    if args.no_history {
        history.insert("enabled".into(), false.into());
    }

    serde_json::json!({
        "scan": scan,
        "parallel": parallel,
        "history": history,
    })
}

pub fn execute(args: ScanArgs, config_path: Option<&str>, output: &Output) -> Result<()> {
    let config = LogtallyConfig::load(config_path, Some(scan_overrides(&args)))?;
    let scanner = Scanner::new(&config)?;
    let history: HistoryConfig = config.section("history")?;
    history.validate()?;

    let directory = scanner.config().directory.clone();
    output.verbose(&format!("Scanning {}", directory.display()));

    let report = scanner.scan_directory(&directory)?;

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    if !report.failed_files.is_empty() {
        output.warning(&format!(
            "{} file(s) could not be processed and are excluded from the totals",
            report.failed_files.len()
        ));
    }

    if history.enabled {
        let ledger = RunLedger::from_config(&history);
        match ledger.record(&history.label, report.elapsed) {
            Ok(()) => output.verbose(&format!(
                "Recorded {} in {}",
                history.label,
                ledger.path().display()
            )),
            Err(e) => output.warning(&format!("Failed to save results: {e:#}")),
        }
    }

    Ok(())
}
