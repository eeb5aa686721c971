//! Flipscout CLI - aggregate marketplace offers, estimate shipping.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use flipscout::application::Aggregator;
use flipscout::config::load_config;
use flipscout::domain::offer::ItemId;
use flipscout::domain::shipping::{estimate, PackageInput, ShippingRule};
use flipscout::ports::memory::InMemoryStore;
use flipscout::ports::secrets::EnvSecrets;

#[derive(Parser)]
#[command(name = "flipscout", about = "Aggregate marketplace offers and estimate shipping")]
struct Cli {
    /// Path to config.toml; defaults are used when the file is missing.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch offers for a keyword from all enabled sources, print them as JSON
    Refresh {
        /// Item the offers belong to.
        #[arg(long)]
        item_id: i64,
        keyword: String,
    },
    /// Rank the shipping rules that fit a package, cheapest first
    Estimate {
        /// JSON file with an array of shipping rules.
        #[arg(long)]
        rules: PathBuf,
        #[arg(long)]
        length: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long)]
        weight: u32,
        /// Defaults to the configured packaging cost.
        #[arg(long)]
        packaging_cost: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials come from .env / the environment, never from config.toml.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let config = load_config(&cli.config).context("failed to load configuration")?;

    match cli.command {
        Command::Refresh { item_id, keyword } => {
            let store = Arc::new(InMemoryStore::with_default_sources());
            let secrets = Arc::new(EnvSecrets::new());
            let aggregator = Aggregator::new(store.clone(), secrets, &config);

            let count = aggregator.refresh(ItemId(item_id), &keyword).await?;
            tracing::info!(count, "refresh finished");

            println!("{}", serde_json::to_string_pretty(&store.offers())?);
        }
        Command::Estimate {
            rules,
            length,
            width,
            height,
            weight,
            packaging_cost,
        } => {
            let content = std::fs::read_to_string(&rules)
                .with_context(|| format!("failed to read rules file {}", rules.display()))?;
            let all_rules: Vec<ShippingRule> =
                serde_json::from_str(&content).context("failed to parse rules file")?;
            let enabled: Vec<ShippingRule> =
                all_rules.into_iter().filter(|r| r.enabled).collect();

            let input = PackageInput {
                length,
                width,
                height,
                weight,
                packaging_cost: packaging_cost
                    .unwrap_or(config.shipping.default_packaging_cost),
            };

            let estimates = estimate(&enabled, &input);
            if estimates.is_empty() {
                tracing::warn!("no shipping option fits this package");
            }
            println!("{}", serde_json::to_string_pretty(&estimates)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    fmt().with_env_filter(filter).init();
}
