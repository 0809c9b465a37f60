use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::Output;
use crate::config::LogtallyConfig;
use crate::history::{HistoryConfig, RunLedger};

#[derive(Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// Print recorded run times with speedups against the baseline
    Show {
        /// Ledger file (default: history.path from config)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

pub fn execute(args: HistoryArgs, custom_config: Option<&str>, output: &Output) -> Result<()> {
    let config = LogtallyConfig::load(custom_config, None::<&()>)?;
    let history: HistoryConfig = config.section("history")?;

    match args.command {
        HistoryCommand::Show { path } => {
            let path = path.unwrap_or(history.path);
            let ledger = RunLedger::new(&path, &history.baseline);
            let entries = ledger.load();

            if entries.is_empty() {
                output.info(&format!("No runs recorded in {}", path.display()));
            } else {
                print!("{}", ledger.render(&entries));
            }
        }
    }

    Ok(())
}
