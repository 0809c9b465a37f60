use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{ConfigFormat, LogtallyConfig};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
    /// Get configuration value (e.g. `parallel.max_threads`)
    Get { key: String },
    /// Validate the merged configuration
    Validate,
}

pub fn execute(args: ConfigArgs, custom_config: Option<&str>) -> Result<()> {
    let config = LogtallyConfig::load(custom_config, None::<&()>)?;

    match args.command {
        ConfigCommand::Show { format } => {
            println!("{}", config.export_config(format)?);
        }
        ConfigCommand::Get { key } => {
            let value = config
                .get_section(&key)
                .map_err(|_| anyhow::anyhow!("Configuration key '{}' not found", key))?;
            match value {
                serde_json::Value::String(s) => println!("{s}"),
                serde_json::Value::Array(items) => {
                    for item in items {
                        match item {
                            serde_json::Value::String(s) => println!("{s}"),
                            other => println!("{other}"),
                        }
                    }
                }
                serde_json::Value::Object(_) => println!("{}", serde_json::to_string_pretty(&value)?),
                other => println!("{other}"),
            }
        }
        ConfigCommand::Validate => {
            // Building the scanner runs every check a scan would
            crate::scanner::Scanner::new(&config)?;
            let history: crate::history::HistoryConfig = config.section("history")?;
            history.validate()?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}
