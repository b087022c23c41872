use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use gemchat_core::controllers::gemini_connector_builder;
use gemchat_core::repositories::{
    ConversationJsonRepository, ConversationRepository, SettingsJsonRepository,
};
use gemchat_core::{AppController, ConversationsStore};

mod render;
mod repl;

use repl::Repl;

#[derive(Parser, Debug)]
#[command(name = "gemchat", version, about = "Persistent Gemini chats in the terminal")]
struct Cli {
    /// Directory holding config.json and chats.json [default: <config dir>/gemchat]
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (settings, conversations) = match &cli.data_dir {
        Some(dir) => (
            SettingsJsonRepository::with_path(dir.join("config.json")),
            ConversationJsonRepository::with_path(dir.join("chats.json")),
        ),
        None => (
            SettingsJsonRepository::new().context("Failed to locate settings file")?,
            ConversationJsonRepository::new().context("Failed to locate chat store")?,
        ),
    };
    info!(chats = %conversations.storage_path(), "Starting gemchat");

    let settings = Arc::new(settings);
    let store = Arc::new(ConversationsStore::load(Arc::new(conversations)));
    let app = AppController::new(settings, store, gemini_connector_builder());

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Repl::new(app).run(stdin.lock(), stdout.lock())
}
