use anyhow::Result;
use clap::Parser;

use logtally::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
