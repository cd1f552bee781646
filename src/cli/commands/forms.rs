use anyhow::Result;
use clap::{Args, Subcommand};

use super::{finish, print_pairs, start_session};
use crate::api::Env;
use crate::config::Config;
use crate::migrate::MigrationSession;

#[derive(Args)]
pub struct FormsCommands {
    #[command(subcommand)]
    pub command: FormsSubcommands,
}

#[derive(Subcommand)]
pub enum FormsSubcommands {
    /// Fetch the production ticket form snapshot
    Fetch,
    /// Fetch and display production ticket forms
    List,
    /// Migrate every production ticket form to the sandbox
    MigrateAll,
    /// Migrate a single production ticket form by id
    Migrate {
        /// Production ticket form id
        id: i64,
    },
}

/// Form migration rewrites field references, so both field snapshots have to
/// be in place before the forms themselves.
async fn fetch_prerequisites(session: &mut MigrationSession) -> Result<(), crate::migrate::MigrationError> {
    session.fetch_fields(Env::Production).await?;
    session.fetch_fields(Env::Sandbox).await?;
    session.fetch_forms().await?;
    Ok(())
}

pub async fn run(cmd: FormsCommands) -> Result<()> {
    let config = Config::load()?;

    match cmd.command {
        FormsSubcommands::Fetch => {
            let (mut session, printer) = start_session(&config)?;
            let result = session.fetch_forms().await;
            finish(session, printer).await;
            result?;
        }
        FormsSubcommands::List => {
            let (mut session, printer) = start_session(&config)?;
            let result = session.fetch_forms().await;
            if result.is_ok() {
                for form in session.forms() {
                    print_pairs("Ticket Form", &form.display_pairs());
                }
            }
            finish(session, printer).await;
            result?;
        }
        FormsSubcommands::MigrateAll => {
            let (mut session, printer) = start_session(&config)?;
            let result = async {
                fetch_prerequisites(&mut session).await?;
                session.migrate_all_forms().await
            }
            .await;
            finish(session, printer).await;
            result?;
        }
        FormsSubcommands::Migrate { id } => {
            let (mut session, printer) = start_session(&config)?;
            let result = async {
                fetch_prerequisites(&mut session).await?;
                session.migrate_form(id).await
            }
            .await;
            finish(session, printer).await;
            result?;
        }
    }

    Ok(())
}
