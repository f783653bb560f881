use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::settings::Settings;

/// One normalized App Store review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    /// 1-5 from the feed; 0 when the entry carries no rating.
    pub rating: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub version: String,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed feed: {0}")]
    Shape(String),

    #[error("unparsable rating label {label:?}")]
    Rating { label: String },
}

pub fn build_client(settings: &Settings) -> Result<reqwest::Client, FeedError> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(FeedError::Client)
}

/// Fetch the most-recent review feed for `app_id` and normalize up to `count` entries.
pub async fn fetch_reviews(
    client: &reqwest::Client,
    settings: &Settings,
    app_id: &str,
    country: &str,
    count: usize,
) -> Result<Vec<Review>, FeedError> {
    let url = settings.feed_url(country, app_id);
    let feed = fetch_feed(client, &url).await?;
    let reviews = parse_reviews(&feed, count)?;
    info!("Parsed {} reviews from {}", reviews.len(), url);
    Ok(reviews)
}

async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Value, FeedError> {
    debug!("GET {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FeedError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            url: url.to_string(),
            status,
        });
    }

    let bytes = response.bytes().await.map_err(|source| FeedError::Body {
        url: url.to_string(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read `feed.entry`, keep the first `count` entries, drop those without `content`.
///
/// `count` applies before filtering, so a leading app-metadata entry uses up a slot.
pub fn parse_reviews(feed: &Value, count: usize) -> Result<Vec<Review>, FeedError> {
    let entries = match feed.get("feed").and_then(|f| f.get("entry")) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(FeedError::Shape("feed.entry is not a list".into())),
    };

    entries
        .iter()
        .take(count)
        .filter(|entry| entry.as_object().is_some_and(|o| o.contains_key("content")))
        .map(parse_entry)
        .collect()
}

fn parse_entry(entry: &Value) -> Result<Review, FeedError> {
    Ok(Review {
        rating: parse_rating(entry)?,
        title: label(entry.get("title")),
        content: label(entry.get("content")),
        author: label(entry.get("author").and_then(|a| a.get("name"))),
        version: label(entry.get("im:version")),
    })
}

fn parse_rating(entry: &Value) -> Result<i64, FeedError> {
    match entry.get("im:rating").and_then(|r| r.get("label")) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| FeedError::Rating {
            label: s.clone(),
        }),
        Some(other) => other.as_i64().ok_or_else(|| FeedError::Rating {
            label: other.to_string(),
        }),
    }
}

fn label(node: Option<&Value>) -> String {
    match node.and_then(|n| n.get("label")) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Value {
        let raw = std::fs::read_to_string("tests/fixtures/reviews.json").unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn parses_fixture_feed() {
        let reviews = parse_reviews(&fixture(), 50).unwrap();
        assert_eq!(reviews.len(), 4);
        assert_eq!(
            reviews[0],
            Review {
                rating: 2,
                title: "Keeps crashing".into(),
                content: "The app keeps crashing when I open the schedule.".into(),
                author: "coach_mike".into(),
                version: "6.12.0".into(),
            }
        );
        assert_eq!(reviews[3].rating, 0);
        assert_eq!(reviews[3].version, "");
    }

    #[test]
    fn count_applies_before_content_filter() {
        // first fixture entry is app metadata without content
        let reviews = parse_reviews(&fixture(), 2).unwrap();
        assert_eq!(reviews.len(), 1);
    }

    #[test]
    fn missing_entry_is_empty() {
        assert!(parse_reviews(&json!({}), 50).unwrap().is_empty());
        assert!(parse_reviews(&json!({ "feed": {} }), 50).unwrap().is_empty());
        assert!(parse_reviews(&json!({ "feed": { "author": {} } }), 50)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn non_list_entry_is_malformed() {
        let feed = json!({ "feed": { "entry": { "content": { "label": "solo" } } } });
        assert!(matches!(parse_reviews(&feed, 50), Err(FeedError::Shape(_))));
    }

    #[test]
    fn bad_rating_is_classified() {
        let feed = json!({ "feed": { "entry": [
            { "content": { "label": "ok" }, "im:rating": { "label": "five" } }
        ] } });
        match parse_reviews(&feed, 50) {
            Err(FeedError::Rating { label }) => assert_eq!(label, "five"),
            other => panic!("expected rating error, got {other:?}"),
        }
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let feed = json!({ "feed": { "entry": [
            "stray",
            { "content": { "label": "fine" }, "im:rating": { "label": " 4 " } }
        ] } });
        let reviews = parse_reviews(&feed, 50).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 4);
        assert_eq!(reviews[0].title, "");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let mut settings = Settings::load(None).unwrap();
        settings.feed_url_template = "http://127.0.0.1:9/{country}/{app_id}".into();
        let client = build_client(&settings).unwrap();
        let err = fetch_reviews(&client, &settings, "393048976", "us", 50)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Request { .. }));
    }
}
