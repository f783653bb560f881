use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULTS: &str = r#"
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
timeout_secs = 10

[competitors]
teamsnap = "https://www.teamsnap.com/pricing"
sportsengine = "https://www.sportsengine.com/solutions/team-management"
gamechanger = "https://gc.com/pricing"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Competitor name → pricing page URL.
    pub competitors: BTreeMap<String, String>,
}

impl Settings {
    /// Built-in defaults, then the optional TOML file, then `PRICING__*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from_str(DEFAULTS, FileFormat::Toml));
        if let Some(p) = path {
            builder = builder.add_source(File::from(p));
        }
        builder
            .add_source(Environment::with_prefix("PRICING").separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| match path {
                Some(p) => format!("Failed to load pricing settings from {:?}", p),
                None => "Failed to load pricing settings".to_string(),
            })
    }

    /// Case-insensitive competitor lookup.
    pub fn competitor_url(&self, name: &str) -> Option<&str> {
        self.competitors
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, url)| url.as_str())
    }

    pub fn competitor_names(&self) -> Vec<&str> {
        self.competitors.keys().map(String::as_str).collect()
    }
}
