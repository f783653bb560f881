mod fetch;
mod html;
mod patterns;
mod scrape;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use scrape::{scrape_pricing_page, PriceScrapeResult, PricingReport};
use settings::Settings;

#[derive(Parser)]
#[command(name = "scrape_pricing", about = "Scrape competitor pricing pages")]
struct Cli {
    /// Direct URL to scrape
    #[arg(long)]
    url: Option<String>,
    /// Competitor name (see --all for the known list)
    #[arg(long)]
    competitor: Option<String>,
    /// Scrape all known competitors
    #[arg(long)]
    all: bool,
    /// Output JSON file path (default: print to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
    /// TOML settings file overriding the built-in competitor list
    #[arg(long)]
    config: Option<PathBuf>,
}

enum Selection {
    All,
    Url(String),
    Competitor(String),
}

impl Cli {
    /// `--all` wins over `--url`, which wins over `--competitor`.
    fn selection(&self) -> Option<Selection> {
        if self.all {
            Some(Selection::All)
        } else if let Some(url) = &self.url {
            Some(Selection::Url(url.clone()))
        } else {
            self.competitor.clone().map(Selection::Competitor)
        }
    }
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

    let Some(selection) = cli.selection() else {
        eprintln!("Please specify --url, --competitor, or --all");
        std::process::exit(1);
    };

    let settings = Settings::load(cli.config.as_deref())?;
    let client = fetch::build_client(&settings)?;
    let results = run(&client, &settings, selection).await;

    let report = PricingReport::new(results);
    let json = serde_json::to_string_pretty(&report)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Results saved to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn run(
    client: &reqwest::Client,
    settings: &Settings,
    selection: Selection,
) -> Vec<PriceScrapeResult> {
    match selection {
        Selection::All => {
            info!("Scraping all competitors...");
            scrape_all(client, settings).await
        }
        Selection::Url(url) => {
            info!("Scraping {}...", url);
            vec![scrape_pricing_page(client, &url).await]
        }
        Selection::Competitor(name) => match settings.competitor_url(&name) {
            Some(url) => {
                info!("Scraping {}...", name);
                vec![scrape_pricing_page(client, url).await.with_competitor(&name)]
            }
            None => {
                eprintln!("{}", unknown_competitor_message(&name, settings));
                Vec::new()
            }
        },
    }
}

fn unknown_competitor_message(name: &str, settings: &Settings) -> String {
    format!(
        "Unknown competitor: {}\nAvailable: {}",
        name,
        settings.competitor_names().join(", ")
    )
}

/// One page at a time, no delay between requests.
async fn scrape_all(client: &reqwest::Client, settings: &Settings) -> Vec<PriceScrapeResult> {
    let pb = ProgressBar::new(settings.competitors.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut results = Vec::with_capacity(settings.competitors.len());
    for (name, url) in &settings.competitors {
        pb.set_message(name.clone());
        info!("  Scraping {}...", name);
        results.push(scrape_pricing_page(client, url).await.with_competitor(name));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let ok = results.iter().filter(|r| r.success).count();
    info!("Scraped {} pages ({} ok, {} errors)", results.len(), ok, results.len() - ok);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("scrape_pricing").chain(args.iter().copied()))
    }

    #[test]
    fn no_selection_flag() {
        assert!(parse(&["--output", "out.json"]).selection().is_none());
    }

    #[test]
    fn selection_precedence() {
        let cli = parse(&["--competitor", "teamsnap", "--url", "https://a.test", "--all"]);
        assert!(matches!(cli.selection(), Some(Selection::All)));

        let cli = parse(&["--competitor", "teamsnap", "--url", "https://a.test"]);
        assert!(matches!(cli.selection(), Some(Selection::Url(u)) if u == "https://a.test"));

        let cli = parse(&["--competitor", "TeamSnap"]);
        assert!(matches!(cli.selection(), Some(Selection::Competitor(n)) if n == "TeamSnap"));
    }

    #[tokio::test]
    async fn unknown_competitor_scrapes_nothing() {
        let settings = Settings::load(None).unwrap();
        let client = fetch::build_client(&settings).unwrap();
        let results = run(&client, &settings, Selection::Competitor("hudl".into())).await;
        assert!(results.is_empty());
        assert_eq!(
            unknown_competitor_message("hudl", &settings),
            "Unknown competitor: hudl\nAvailable: gamechanger, sportsengine, teamsnap"
        );
    }

    #[tokio::test]
    async fn direct_url_has_no_competitor() {
        let settings = Settings::load(None).unwrap();
        let client = fetch::build_client(&settings).unwrap();
        let results = run(&client, &settings, Selection::Url("http://127.0.0.1:9/".into())).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].competitor.is_none());
        assert!(!results[0].success);
    }
}
