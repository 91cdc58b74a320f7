// src/config.rs
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.amazon.in";
pub const DEFAULT_SEARCH_INPUT_ID: &str = "twotabsearchtextbox";
pub const DEFAULT_QUERY: &str = "laptops";

pub const DEFAULT_RAW_PATH: &str = "data/raw_data.csv";
pub const DEFAULT_CLEAN_PATH: &str = "data/cleaned_data.csv";
pub const DEFAULT_DB_PATH: &str = "data/amazon_products.db";
pub const DEFAULT_TABLE: &str = "products";

// Browser-like UA; the default reqwest one gets a captcha page.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const DEFAULT_REQUEST_DELAY_MS: u64 = 500;
const NAVIGATE_SETTLE_MS: u64 = 2_000;
const SEARCH_SETTLE_MS: u64 = 3_000;

/// CSS selectors locating a listing and its four fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    pub listing: String,
    pub name: String,
    pub price: String,
    pub rating: String,
    pub reviews: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            listing: "div.s-main-slot div.s-result-item".to_string(),
            name: "h2 a span".to_string(),
            price: "span.a-price-whole".to_string(),
            rating: "span.a-icon-alt".to_string(),
            reviews: "span.a-size-base".to_string(),
        }
    }
}

/// Where and how to reach the search-results page.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub search_input_id: String,
    pub user_agent: String,
    /// Pause before every request.
    pub request_delay: Duration,
    /// Pause after the landing page loads.
    pub navigate_settle: Duration,
    /// Pause after the search results load.
    pub search_settle: Duration,
    pub selectors: ListingSelectors,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_input_id: DEFAULT_SEARCH_INPUT_ID.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            navigate_settle: Duration::from_millis(NAVIGATE_SETTLE_MS),
            search_settle: Duration::from_millis(SEARCH_SETTLE_MS),
            selectors: ListingSelectors::default(),
        }
    }
}

impl SiteConfig {
    /// Defaults, overridden by `SCRAPER_BASE_URL`, `SCRAPER_USER_AGENT` and
    /// `SCRAPER_REQUEST_DELAY_MS` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("SCRAPER_BASE_URL") {
            tracing::debug!("Using base URL {} from environment", url);
            config.base_url = url;
        }
        if let Some(agent) = lookup("SCRAPER_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(raw) = lookup("SCRAPER_REQUEST_DELAY_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.request_delay = Duration::from_millis(ms),
                Err(_) => tracing::warn!(
                    "Ignoring SCRAPER_REQUEST_DELAY_MS='{}': not a number of milliseconds",
                    raw
                ),
            }
        }

        config
    }

    /// Drops every delay. Used when the page source is local.
    pub fn without_delays(mut self) -> Self {
        self.request_delay = Duration::ZERO;
        self.navigate_settle = Duration::ZERO;
        self.search_settle = Duration::ZERO;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SCRAPER_BASE_URL", "http://localhost:8080"),
            ("SCRAPER_REQUEST_DELAY_MS", "25"),
        ]
        .into_iter()
        .collect();

        let config = SiteConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.request_delay, Duration::from_millis(25));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.selectors, ListingSelectors::default());
    }

    #[test]
    fn test_bad_delay_keeps_default() {
        let config = SiteConfig::from_lookup(|k| {
            (k == "SCRAPER_REQUEST_DELAY_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.request_delay, Duration::from_millis(DEFAULT_REQUEST_DELAY_MS));
    }
}
