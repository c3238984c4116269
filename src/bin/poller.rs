use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use aquarium_poller::accounts;
use aquarium_poller::api::ApiClient;
use aquarium_poller::config::{AppConfig, CONFIG_PATH};
use aquarium_poller::poller::{Poller, stop_channel};
use aquarium_poller::session;

#[derive(Parser)]
#[command(name = "aquarium-poller", about = "Happy Aquarium multi-account status poller")]
struct Args {
    /// Config file (defaults apply when the default path is absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Query file with one init-data string per line
    #[arg(long)]
    query_file: Option<PathBuf>,

    /// Seconds between poll cycles
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Stop after this many cycles instead of running until Ctrl+C
    #[arg(long)]
    cycles: Option<u64>,
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

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(std::path::Path::new(CONFIG_PATH))?,
    };
    if let Some(query_file) = args.query_file {
        config.settings.query_file = query_file;
    }
    if let Some(interval) = args.interval {
        config.settings.poll_interval_secs = interval;
    }

    let credentials = accounts::load_credentials(&config.settings.query_file)?;
    let api = ApiClient::new(&config.api)?;

    info!("Logging in {} account(s)...", credentials.len());
    let sessions = session::bootstrap(&api, &credentials).await;
    if sessions.is_empty() {
        anyhow::bail!("no account logged in");
    }

    let mut poller = Poller::new(api, sessions, config.settings.poll_interval());
    if let Some(cycles) = args.cycles {
        poller = poller.with_max_cycles(cycles);
    }

    let (stop, signal) = stop_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                stop.stop();
            }
            Err(e) => {
                // Keep the handle alive so the poller is not stopped by the drop.
                warn!("Unable to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
        }
    });

    info!("Press Ctrl+C to stop.");
    let mut stdout = std::io::stdout();
    poller.run(&mut stdout, signal).await?;

    Ok(())
}
