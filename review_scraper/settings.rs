use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULTS: &str = r#"
feed_url_template = "https://itunes.apple.com/{country}/rss/customerreviews/id={app_id}/sortBy=mostRecent/json"
country = "us"
count = 50
default_app = "teamsnap"

[apps]
teamsnap = "393048976"
gamechanger = "476016817"
sportsengine = "521594269"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub feed_url_template: String,
    pub country: String,
    pub count: usize,
    pub default_app: String,
    /// Unset means the feed request may wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// App name → App Store numeric ID.
    pub apps: BTreeMap<String, String>,
}

impl Settings {
    /// Built-in defaults, then the optional TOML file, then `REVIEWS__*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from_str(DEFAULTS, FileFormat::Toml));
        if let Some(p) = path {
            builder = builder.add_source(File::from(p));
        }
        builder
            .add_source(Environment::with_prefix("REVIEWS").separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| match path {
                Some(p) => format!("Failed to load review settings from {:?}", p),
                None => "Failed to load review settings".to_string(),
            })
    }

    /// Mapped ID for a known app name (any case), otherwise the input verbatim.
    pub fn resolve_app_id(&self, app: &str) -> String {
        self.apps
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(app))
            .map(|(_, id)| id.clone())
            .unwrap_or_else(|| app.to_string())
    }

    pub fn feed_url(&self, country: &str, app_id: &str) -> String {
        self.feed_url_template
            .replace("{country}", country)
            .replace("{app_id}", app_id)
    }
}
