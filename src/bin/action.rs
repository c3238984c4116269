//! aquarium-action — one-shot operator commands for a single account.
//!
//! Logs in the account at the given position of the query file, runs one
//! command and prints the server payload as pretty JSON on stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use aquarium_poller::accounts;
use aquarium_poller::actions;
use aquarium_poller::api::ApiClient;
use aquarium_poller::config::{AppConfig, CONFIG_PATH};
use aquarium_poller::session;
use aquarium_poller::types::ActionKind;

#[derive(Parser)]
#[command(name = "aquarium-action", about = "Run a single game action for one account")]
struct Cli {
    /// Config file (defaults apply when the default path is absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Query file with one init-data string per line
    #[arg(long)]
    query_file: Option<PathBuf>,

    /// Account number (1-based line among non-blank lines of the query file)
    #[arg(long, default_value_t = 1)]
    account: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove a fish from the tank
    Delete { fish_id: u64 },
    /// Merge a fish with its pair
    Combine { fish_id: u64 },
    /// Buy goods: create an order and report its status
    Order { goods_id: u64 },
    /// List goods available in the shop
    Shop,
    /// List the account's tasks
    Tasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(Path::new(CONFIG_PATH))?,
    };
    if let Some(query_file) = cli.query_file {
        config.settings.query_file = query_file;
    }

    let credentials = accounts::load_credentials(&config.settings.query_file)?;
    let credential = credentials
        .iter()
        .find(|c| c.account == cli.account)
        .with_context(|| {
            format!(
                "account {} not found ({} account(s) in {})",
                cli.account,
                credentials.len(),
                config.settings.query_file.display()
            )
        })?;

    let api = ApiClient::new(&config.api)?;
    let session = session::login(&api, credential)
        .await
        .with_context(|| format!("login failed for account {}", cli.account))?;
    info!("Account {} logged in", session.account());

    let payload: Value = match cli.command {
        Command::Delete { fish_id } => {
            actions::perform_action(&api, &session, ActionKind::Delete, fish_id).await?
        }
        Command::Combine { fish_id } => {
            actions::perform_action(&api, &session, ActionKind::Combine, fish_id).await?
        }
        Command::Order { goods_id } => actions::place_order(&api, &session, goods_id).await?,
        Command::Shop => api.goods_list(&session.token).await?,
        Command::Tasks => api.task_list(&session.token).await?,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
