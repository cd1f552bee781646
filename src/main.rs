use anyhow::Result;
use clap::Parser;
use log::info;

use zentools_cli::cli::{Cli, Commands, commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("zentools-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting zentools-cli");

    match cli.command {
        Commands::Fields(cmd) => commands::fields::run(cmd).await?,
        Commands::Forms(cmd) => commands::forms::run(cmd).await?,
        Commands::DynamicContent(cmd) => commands::dynamic_content::run(cmd).await?,
        Commands::Theme(cmd) => commands::theme::run(cmd).await?,
        Commands::Settings(cmd) => commands::settings::run(cmd)?,
    }

    Ok(())
}
