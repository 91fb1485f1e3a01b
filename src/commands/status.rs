use clap::Args;
use serde::Serialize;

use roster_core::SnapshotCache;

use super::{Controller, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct StatusCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Serialize)]
struct StatusReport {
    api_url: String,
    reachable: bool,
    authenticated: bool,
    cache_path: String,
    cached_records: Option<usize>,
}

impl StatusCommand {
    pub async fn run(
        &self,
        controller: &Controller,
        cache: &impl SnapshotCache,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let report = StatusReport {
            api_url: config.api_url.value.clone(),
            reachable: controller.check_connection().await,
            authenticated: cache.read_token().await.is_some(),
            cache_path: config.cache_path.value.display().to_string(),
            cached_records: cache.read_snapshot().await.map(|s| s.records.len()),
        };

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                println!("Status");
                println!("======\n");
                println!("API:      {}", report.api_url);
                println!(
                    "  {}",
                    if report.reachable {
                        "reachable"
                    } else {
                        "unreachable (offline mode)"
                    }
                );
                println!(
                    "Token:    {}",
                    if report.authenticated { "set" } else { "not set" }
                );
                println!("Cache:    {}", report.cache_path);
                match report.cached_records {
                    Some(n) => println!("  {} record(s) cached", n),
                    None => println!("  empty"),
                }
            }
        }
        Ok(())
    }
}
