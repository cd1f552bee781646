use clap::{Parser, Subcommand};

use super::commands::dynamic_content::DynamicContentCommands;
use super::commands::fields::FieldsCommands;
use super::commands::forms::FormsCommands;
use super::commands::settings::SettingsCommands;
use super::commands::theme::ThemeCommands;

#[derive(Parser)]
#[command(name = "zentools-cli")]
#[command(about = "A CLI tool for migrating Zendesk configuration from production to sandbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ticket field operations
    Fields(FieldsCommands),
    /// Ticket form operations
    Forms(FormsCommands),
    /// Dynamic content operations
    DynamicContent(DynamicContentCommands),
    /// Local theme file synchronization
    Theme(ThemeCommands),
    /// Application settings management
    Settings(SettingsCommands),
}
