mod analysis;
mod feed;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use analysis::{analyze_reviews, ReviewAnalysis};
use feed::Review;
use settings::Settings;

#[derive(Parser)]
#[command(name = "scrape_reviews", about = "Scrape and summarize App Store reviews")]
struct Cli {
    /// App name (teamsnap, gamechanger, sportsengine) or App Store ID
    #[arg(long)]
    app: Option<String>,
    /// Number of feed entries to read
    #[arg(long)]
    count: Option<usize>,
    /// App Store country code
    #[arg(long)]
    country: Option<String>,
    /// Output JSON file path (default: print the analysis only)
    #[arg(long)]
    output: Option<PathBuf>,
    /// TOML settings file overriding the built-in app list
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ReviewReport {
    scraped_at: DateTime<Local>,
    app_id: String,
    reviews: Vec<Review>,
    analysis: ReviewAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let app = cli
        .app
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or(&settings.default_app);
    let app_id = settings.resolve_app_id(app);
    let country = cli.country.as_deref().unwrap_or(&settings.country);
    let count = cli.count.unwrap_or(settings.count);

    info!("Scraping reviews for app ID: {}", app_id);
    let (reviews, fetch_error) = collect_reviews(&settings, &app_id, country, count).await;
    info!("Found {} reviews", reviews.len());

    let analysis = analyze_reviews(&reviews);

    match &cli.output {
        Some(path) => {
            let report = ReviewReport {
                scraped_at: Local::now(),
                app_id,
                reviews,
                analysis,
                error: fetch_error,
            };
            let json = serde_json::to_string_pretty(&report)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Results saved to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&analysis)?),
    }
    Ok(())
}

/// Fetch failures are logged and degrade to an empty list; the message is kept for the report.
async fn collect_reviews(
    settings: &Settings,
    app_id: &str,
    country: &str,
    count: usize,
) -> (Vec<Review>, Option<String>) {
    let fetched = match feed::build_client(settings) {
        Ok(client) => feed::fetch_reviews(&client, settings, app_id, country, count).await,
        Err(e) => Err(e),
    };
    match fetched {
        Ok(reviews) => (reviews, None),
        Err(e) => {
            error!("Error scraping reviews: {}", e);
            (Vec::new(), Some(e.to_string()))
        }
    }
}
