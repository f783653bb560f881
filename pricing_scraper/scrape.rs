use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, warn};

use crate::fetch;
use crate::html::extract_tag_prices;
use crate::patterns::extract_regex_prices;

/// Outcome of one pricing page fetch.
#[derive(Debug, Clone, Serialize)]
pub struct PriceScrapeResult {
    pub url: String,
    pub prices_found: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_html_length: Option<usize>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor: Option<String>,
}

impl PriceScrapeResult {
    fn failed(url: &str, error: String) -> Self {
        Self {
            url: url.to_string(),
            prices_found: BTreeSet::new(),
            raw_html_length: None,
            success: false,
            error: Some(error),
            competitor: None,
        }
    }

    pub fn with_competitor(mut self, name: &str) -> Self {
        self.competitor = Some(name.to_string());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct PricingReport {
    pub scraped_at: DateTime<Local>,
    pub results: Vec<PriceScrapeResult>,
}

impl PricingReport {
    pub fn new(results: Vec<PriceScrapeResult>) -> Self {
        Self {
            scraped_at: Local::now(),
            results,
        }
    }
}

/// Union of the tag pass and the regex pass, deduplicated.
pub fn extract_prices(html: &str) -> BTreeSet<String> {
    let tagged = extract_tag_prices(html);
    let matched = extract_regex_prices(html);
    debug!(
        "Tag pass found {}, regex pass found {}",
        tagged.len(),
        matched.len()
    );
    tagged.into_iter().chain(matched).collect()
}

/// Fetch one page and extract prices. Never errors: failures land in the result.
pub async fn scrape_pricing_page(client: &reqwest::Client, url: &str) -> PriceScrapeResult {
    match fetch::fetch_html(client, url).await {
        Ok(html) => PriceScrapeResult {
            url: url.to_string(),
            prices_found: extract_prices(&html),
            raw_html_length: Some(html.chars().count()),
            success: true,
            error: None,
            competitor: None,
        },
        Err(e) => {
            warn!("Scrape failed for {}: {}", url, e);
            PriceScrapeResult::failed(url, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn combined_prices_are_unique() {
        let html = r#"<span class="price">$10</span> only $10 a month, free, Free, free"#;
        let prices = extract_prices(html);
        let expected: BTreeSet<String> = ["$10", "free", "Free"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(prices, expected);
    }

    #[test]
    fn fixture_page_prices() {
        let html = std::fs::read_to_string("tests/fixtures/pricing.html").unwrap();
        let prices = extract_prices(&html);
        for want in ["Free", "$8.99/mo", "$12.49 per user", "$12.49", "$8.99", "$99/year"] {
            assert!(prices.contains(want), "missing {want}: {prices:?}");
        }
    }

    #[test]
    fn result_json_shape() {
        let ok = PriceScrapeResult {
            url: "https://example.com/pricing".into(),
            prices_found: ["$5".to_string()].into(),
            raw_html_length: Some(42),
            success: true,
            error: None,
            competitor: None,
        }
        .with_competitor("teamsnap");
        let v = serde_json::to_value(&ok).unwrap();
        assert_eq!(v["raw_html_length"], 42);
        assert_eq!(v["competitor"], "teamsnap");
        assert!(v.get("error").is_none());

        let failed = PriceScrapeResult::failed("https://example.com", "boom".into());
        let v = serde_json::to_value(&failed).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["prices_found"], serde_json::json!([]));
        assert!(v.get("raw_html_length").is_none());
        assert!(v.get("competitor").is_none());
    }

    #[tokio::test]
    async fn unreachable_host_yields_failed_result() {
        let settings = Settings::load(None).unwrap();
        let client = fetch::build_client(&settings).unwrap();
        let result = scrape_pricing_page(&client, "http://127.0.0.1:9/pricing").await;
        assert!(!result.success);
        assert!(result.prices_found.is_empty());
        assert!(!result.error.unwrap_or_default().is_empty());
    }
}
