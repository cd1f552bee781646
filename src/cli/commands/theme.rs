use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{finish, start_session};
use crate::api::Env;
use crate::config::Config;
use crate::theme::sync_theme_files;

#[derive(Args)]
pub struct ThemeCommands {
    #[command(subcommand)]
    pub command: ThemeSubcommands,
}

#[derive(Subcommand)]
pub enum ThemeSubcommands {
    /// Rewrite production field ids to sandbox ids in local theme files
    Sync {
        /// Theme directory (falls back to the configured theme-directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

pub async fn run(cmd: ThemeCommands) -> Result<()> {
    let config = Config::load()?;

    match cmd.command {
        ThemeSubcommands::Sync { dir } => {
            let theme_dir = match dir.or_else(|| config.theme_directory.clone()) {
                Some(dir) => dir,
                None => bail!(
                    "No theme directory given. Pass --dir or set it with: zentools-cli settings set theme-directory <path>"
                ),
            };

            let (mut session, printer) = start_session(&config)?;
            let result = async {
                session.fetch_fields(Env::Production).await?;
                session.fetch_fields(Env::Sandbox).await?;
                Ok::<_, crate::migrate::MigrationError>(())
            }
            .await;

            let report = match &result {
                Ok(()) => Some(sync_theme_files(&theme_dir, session.mapper(), session.log())),
                Err(_) => None,
            };
            finish(session, printer).await;
            result?;

            if let Some(report) = report {
                let report = report?;
                println!(
                    "Theme sync complete: {} replacement(s), {} field(s) skipped",
                    report.replacements, report.skipped_fields
                );
            }
        }
    }

    Ok(())
}
