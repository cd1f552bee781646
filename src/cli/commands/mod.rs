pub mod dynamic_content;
pub mod fields;
pub mod forms;
pub mod settings;
pub mod theme;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::api::{Env, HttpZendeskClient};
use crate::config::Config;
use crate::migrate::{LogSink, MigrationSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnvArg {
    Production,
    Sandbox,
}

impl From<EnvArg> for Env {
    fn from(arg: EnvArg) -> Self {
        match arg {
            EnvArg::Production => Env::Production,
            EnvArg::Sandbox => Env::Sandbox,
        }
    }
}

/// Build a migration session plus a task printing the log feed live.
pub(crate) fn start_session(config: &Config) -> Result<(MigrationSession, JoinHandle<()>)> {
    let client = HttpZendeskClient::new(config)?;
    let log = LogSink::new();
    let mut rx = log.subscribe();

    let printer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if line.starts_with("ERROR:") {
                eprintln!("{}", line.red());
            } else {
                println!("{line}");
            }
        }
    });

    let session = MigrationSession::new(
        Arc::new(client),
        log,
        config.settings.throttle_config(),
    );
    Ok((session, printer))
}

/// Drop the session (closing the log feed) and wait for the printer to
/// flush the remaining lines.
pub(crate) async fn finish(session: MigrationSession, printer: JoinHandle<()>) {
    drop(session);
    let _ = printer.await;
}

pub(crate) fn print_pairs(heading: &str, pairs: &[(&'static str, String)]) {
    println!("{}", heading.bold());
    for (label, value) in pairs {
        println!("  {}: {}", label.dimmed(), value);
    }
    println!();
}

/// Arrow-key Yes/No confirmation, defaulting to No for safety.
pub(crate) fn prompt_confirmation(prompt: &str) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let selection = dialoguer::Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(1)
        .interact()?;
    Ok(selection == 0)
}
