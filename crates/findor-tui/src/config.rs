use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use findor_core::Session;
use findor_service::DEFAULT_BASE_URL;

#[derive(Debug, Parser)]
#[command(name = "findor", about = "Findor API docs and key console")]
pub struct Config {
    /// Base URL of the key service
    #[arg(long, env = "FINDOR_API_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Signed-in user's email. Without it the key pages are hidden.
    #[arg(long, env = "FINDOR_EMAIL", global = true)]
    pub email: Option<String>,

    /// Background key refresh interval in seconds
    #[arg(long, env = "FINDOR_REFRESH_INTERVAL", default_value = "30", global = true)]
    pub refresh_interval: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "15", global = true)]
    pub timeout: u64,

    /// Write logs here. The TUI logs nowhere without it.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive console (default)
    Tui,
    /// Manage API keys without the TUI
    #[command(subcommand)]
    Keys(KeysCommand),
    /// Print the endpoint reference
    #[command(subcommand)]
    Docs(DocsCommand),
}

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
    /// List keys with masked secrets
    List,
    /// Create a key and print its secret once
    Create {
        /// Display name for the new key
        name: String,
    },
    /// Delete the key with this exact secret
    Delete { secret: String },
}

#[derive(Debug, Subcommand)]
pub enum DocsCommand {
    /// List endpoints
    List {
        /// Only endpoints whose title or description contains this
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one endpoint with a request snippet
    Show {
        id: String,
        /// curl, javascript or python
        #[arg(long, default_value = "curl")]
        lang: String,
    },
}

impl Config {
    pub fn session(&self) -> Session {
        Session::from_optional(self.email.clone())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }

    pub fn is_tui(&self) -> bool {
        matches!(self.command, None | Some(Command::Tui))
    }
}
