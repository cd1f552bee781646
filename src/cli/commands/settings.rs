use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::config::Config;

#[derive(Args)]
pub struct SettingsCommands {
    #[command(subcommand)]
    pub command: SettingsSubcommands,
}

#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show every setting and its current value
    Show,
    /// Print the value of a single setting
    Get {
        /// Setting name, e.g. production-host
        name: String,
    },
    /// Update a setting and persist the config file
    Set {
        /// Setting name, e.g. production-host
        name: String,
        /// New value
        value: String,
    },
}

/// API keys are still secrets even in a terminal scrollback.
fn masked(name: &str, value: &str) -> String {
    if name.ends_with("api-key") && !value.is_empty() {
        "********".to_string()
    } else {
        value.to_string()
    }
}

pub fn run(cmd: SettingsCommands) -> Result<()> {
    match cmd.command {
        SettingsSubcommands::Show => {
            let config = Config::load()?;
            println!("{}", "Settings".bold());
            for name in Config::setting_names() {
                let value = config.get_value(name)?;
                println!("  {}: {}", name.dimmed(), masked(name, &value));
            }
        }
        SettingsSubcommands::Get { name } => {
            let config = Config::load()?;
            println!("{}", config.get_value(&name)?);
        }
        SettingsSubcommands::Set { name, value } => {
            let mut config = Config::load()?;
            config.set_value(&name, &value)?;
            config.save()?;
            println!("Set {} = {}", name, masked(&name, &value));
        }
    }

    Ok(())
}
