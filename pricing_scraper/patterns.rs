use std::sync::LazyLock;

use regex::Regex;

// Bare amount, optionally "/mo" or "/month".
static MONTHLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\$\d+(?:\.\d{2})?(?:/mo(?:nth)?)?").unwrap());
static PER_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\d+(?:\.\d{2})?\s*(?:per|/)\s*(?:month|year|team|user)").unwrap()
});
// Matches inside words too ("freedom").
static FREE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)free").unwrap());

/// Every match of every price pattern over the raw document, source case kept.
pub fn extract_regex_prices(html: &str) -> Vec<String> {
    [&*MONTHLY_RE, &*PER_UNIT_RE, &*FREE_RE]
        .iter()
        .flat_map(|re| re.find_iter(html).map(|m| m.as_str().to_string()))
        .collect()
}
