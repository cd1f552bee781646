use anyhow::Result;
use clap::{Args, Subcommand};

use super::{finish, print_pairs, start_session};
use crate::config::Config;

#[derive(Args)]
pub struct DynamicContentCommands {
    #[command(subcommand)]
    pub command: DynamicContentSubcommands,
}

#[derive(Subcommand)]
pub enum DynamicContentSubcommands {
    /// Fetch the production dynamic content snapshot
    Fetch,
    /// Fetch and display production dynamic content
    List,
    /// Migrate every production dynamic content item to the sandbox
    MigrateAll,
    /// Migrate a single production dynamic content item by id
    Migrate {
        /// Production dynamic content item id
        id: i64,
    },
}

pub async fn run(cmd: DynamicContentCommands) -> Result<()> {
    let config = Config::load()?;

    match cmd.command {
        DynamicContentSubcommands::Fetch => {
            let (mut session, printer) = start_session(&config)?;
            let result = session.fetch_dynamic_content().await;
            finish(session, printer).await;
            result?;
        }
        DynamicContentSubcommands::List => {
            let (mut session, printer) = start_session(&config)?;
            let result = session.fetch_dynamic_content().await;
            if result.is_ok() {
                for item in session.dynamic_content() {
                    print_pairs("Dynamic Content", &item.display_pairs());
                }
            }
            finish(session, printer).await;
            result?;
        }
        DynamicContentSubcommands::MigrateAll => {
            let (mut session, printer) = start_session(&config)?;
            let result = async {
                session.fetch_dynamic_content().await?;
                session.migrate_all_dynamic_content().await
            }
            .await;
            finish(session, printer).await;
            result?;
        }
        DynamicContentSubcommands::Migrate { id } => {
            let (mut session, printer) = start_session(&config)?;
            let result = async {
                session.fetch_dynamic_content().await?;
                session.migrate_dynamic_content(id).await
            }
            .await;
            finish(session, printer).await;
            result?;
        }
    }

    Ok(())
}
