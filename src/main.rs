use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{ConfigCommand, Controller, StatusCommand, StudentCommand, TokenCommand};
use config::Config;
use roster_core::{LocalCache, RemoteDataSource, Store};

#[derive(Parser)]
#[command(name = "roster")]
#[command(version)]
#[command(about = "Offline-first client for the student records API", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List, search and edit students
    Student(StudentCommand),

    /// Manage the API token
    Token(TokenCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// Check API connectivity and cache contents
    Status(StatusCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster=warn,roster_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;
    tracing::debug!(
        "api {} (timeout {}s), cache {}",
        config.api_url.value,
        config.timeout_secs.value,
        config.cache_path.value.display()
    );

    match cli.command {
        Some(Commands::Student(cmd)) => {
            let cache = LocalCache::open(&config.cache_path.value).await?;
            let controller = build_controller(&config, cache);
            cmd.run(&controller).await?;
        }
        Some(Commands::Token(cmd)) => {
            let cache = LocalCache::open(&config.cache_path.value).await?;
            cmd.run(&cache).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, cli_config_path)?;
        }
        Some(Commands::Status(cmd)) => {
            let cache = LocalCache::open(&config.cache_path.value).await?;
            let controller = build_controller(&config, cache.clone());
            cmd.run(&controller, &cache, &config).await?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

fn build_controller(config: &Config, cache: LocalCache) -> Controller {
    let remote = RemoteDataSource::new(&config.remote(), cache.clone());
    Controller::new(
        remote,
        cache,
        Arc::new(Store::new()),
        config.sync_options(),
    )
}
