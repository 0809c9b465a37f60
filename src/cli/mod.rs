//! Command-line interface for logtally
//!
//! This module provides the main CLI structure and command dispatch.
//! It uses clap for argument parsing and tracing-subscriber for diagnostics.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

pub mod commands;
pub mod output;

pub use output::Output;

/// logtally - parallel HTTP status tally over JSON access logs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Tally HTTP status codes across a directory of access logs
    Scan(commands::scan::ScanArgs),
    /// Configuration management
    Config(commands::config::ConfigArgs),
    /// Recorded run timings
    History(commands::history::HistoryArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let config_path = self.config.as_deref();

        match self.command {
            Some(Commands::Scan(args)) => commands::scan::execute(args, config_path, &output),
            Some(Commands::Config(args)) => commands::config::execute(args, config_path),
            Some(Commands::History(args)) => commands::history::execute(args, config_path, &output),
            None => {
                // Show help when no command is provided
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

/// Diagnostics go to stderr so reports on stdout stay machine-readable
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
