use std::sync::Arc;

use canvass_core::{CanvassConfig, Dataset};
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use canvass_server::{http, subsystems::bootstrap};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "canvass.toml")]
    config: String,

    /// Load the config and trial table, print a summary, and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match CanvassConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Best-effort layout bootstrap; the dataset load below is the real gate
    bootstrap::ensure_layout(&config.paths);

    // Load the trial table — a missing or malformed table stops startup
    let dataset = match Dataset::load(&config.paths.trials_csv()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to load trial table: {}", e);
            std::process::exit(1);
        }
    };

    if args.check {
        println!("✅ Config loaded from {}", args.config);
        println!(
            "✅ {} trial rows ready in {}",
            dataset.len(),
            config.paths.trials_csv().display()
        );
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(Arc::new(dataset), config, tx.subscribe()).await?;

    Ok(())
}
