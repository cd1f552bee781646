use anyhow::Result;
use clap::{Args, Subcommand};

use super::{EnvArg, finish, print_pairs, prompt_confirmation, start_session};
use crate::api::Env;
use crate::config::Config;

#[derive(Args)]
pub struct FieldsCommands {
    #[command(subcommand)]
    pub command: FieldsSubcommands,
}

#[derive(Subcommand)]
pub enum FieldsSubcommands {
    /// Fetch the ticket field snapshot for an environment
    Fetch {
        /// Environment to fetch from
        #[arg(long, value_enum, default_value = "production")]
        env: EnvArg,
    },
    /// Fetch and display ticket fields
    List {
        /// Environment to list from
        #[arg(long, value_enum, default_value = "production")]
        env: EnvArg,
    },
    /// Migrate every production ticket field to the sandbox
    MigrateAll,
    /// Migrate a single production ticket field by id
    Migrate {
        /// Production ticket field id
        id: i64,
    },
    /// Delete every ticket field in the sandbox
    DeleteSandbox {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: FieldsCommands) -> Result<()> {
    let config = Config::load()?;

    match cmd.command {
        FieldsSubcommands::Fetch { env } => {
            let (mut session, printer) = start_session(&config)?;
            let result = session.fetch_fields(env.into()).await;
            finish(session, printer).await;
            result?;
        }
        FieldsSubcommands::List { env } => {
            let (mut session, printer) = start_session(&config)?;
            let result = session.fetch_fields(env.into()).await;
            if result.is_ok() {
                let fields = match env.into() {
                    Env::Production => session.mapper().production_fields(),
                    Env::Sandbox => session.mapper().sandbox_fields(),
                };
                for field in fields {
                    print_pairs("Ticket Field", &field.display_pairs());
                }
            }
            finish(session, printer).await;
            result?;
        }
        FieldsSubcommands::MigrateAll => {
            let (mut session, printer) = start_session(&config)?;
            let result = async {
                session.fetch_fields(Env::Production).await?;
                session.migrate_all_fields().await
            }
            .await;
            finish(session, printer).await;
            result?;
        }
        FieldsSubcommands::Migrate { id } => {
            let (mut session, printer) = start_session(&config)?;
            let result = async {
                session.fetch_fields(Env::Production).await?;
                session.migrate_field(id).await
            }
            .await;
            finish(session, printer).await;
            result?;
        }
        FieldsSubcommands::DeleteSandbox { force } => {
            if !force
                && !prompt_confirmation("Delete ALL ticket fields in the sandbox environment?")?
            {
                println!("Aborted");
                return Ok(());
            }
            let (mut session, printer) = start_session(&config)?;
            let result = session.delete_sandbox_fields().await;
            finish(session, printer).await;
            result?;
        }
    }

    Ok(())
}
