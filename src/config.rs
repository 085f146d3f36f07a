//! YAML configuration for a run.
//!
//! A single config file enumerates the watch lists and every knob the
//! near-duplicate deployments used to hard-code: the recency window, the
//! redirect retry budget, the inter-request pacing interval and the
//! summarizer choice. One pipeline, parameterized; never a flow per
//! variant.

use serde::Deserialize;

use crate::error::RadarError;
use crate::summarize::SummarizerKind;

/// Top-level run configuration, loaded from a YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct RadarConfig {
    /// Tracked organizations, in search order.
    pub companies: Vec<String>,
    /// Tracked topic terms, in search order.
    pub key_terms: Vec<String>,

    /// Maximum article age admitted by the temporal filter.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// Pacing between successive feed requests. A caller-side contract
    /// honoring the provider's implicit rate limits.
    #[serde(default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,

    #[serde(default)]
    pub redirect: RedirectConfig,

    #[serde(default)]
    pub summarizer: SummarizerKind,

    /// Feed provider base URL; the search endpoint is `<base>/rss/search`.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Append-only CSV of emitted articles, doubling as the dedup history.
    #[serde(default = "default_history_path")]
    pub history_path: String,

    /// Plain-text digest of newly found articles, rewritten each run.
    #[serde(default = "default_digest_path")]
    pub digest_path: String,

    #[serde(default)]
    pub smtp: Option<SmtpConfig>,

    #[serde(default)]
    pub receiver_email: Option<String>,
}

/// Redirect resolution knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    /// Navigation attempts before falling back to the input link.
    #[serde(default = "default_redirect_retries")]
    pub retries: u32,

    /// Fixed delay between attempts.
    #[serde(default = "default_redirect_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Bound on concurrently leased rendering contexts.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Base URL of the browserless-style rendering service.
    #[serde(default = "default_render_service_url")]
    pub service_url: String,

    /// Optional API token for the rendering service.
    #[serde(default)]
    pub token: Option<String>,

    /// A resolution that lands on this domain (or a subdomain) has not
    /// left the redirector and counts as failed.
    #[serde(default = "default_redirector_domain")]
    pub redirector_domain: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            retries: default_redirect_retries(),
            retry_delay_ms: default_redirect_retry_delay_ms(),
            pool_size: default_pool_size(),
            service_url: default_render_service_url(),
            token: None,
            redirector_domain: default_redirector_domain(),
        }
    }
}

/// SMTP relay settings for the notification email.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub relay: String,
    pub username: String,
    pub password: String,
    /// From address, e.g. `NewsRadar <radar@example.com>`.
    pub from: String,
}

fn default_max_age_days() -> u32 {
    90
}

fn default_inter_request_delay_ms() -> u64 {
    250
}

fn default_redirect_retries() -> u32 {
    2
}

fn default_redirect_retry_delay_ms() -> u64 {
    500
}

fn default_pool_size() -> usize {
    2
}

fn default_render_service_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_redirector_domain() -> String {
    "google.com".to_string()
}

fn default_feed_url() -> String {
    "https://news.google.com".to_string()
}

fn default_history_path() -> String {
    "news_articles.csv".to_string()
}

fn default_digest_path() -> String {
    "news_articles.txt".to_string()
}

impl RadarConfig {
    /// Load and validate a config file.
    pub async fn load(path: &str) -> Result<Self, RadarError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RadarError::Config(format!("cannot read {path}: {e}")))?;
        let config: RadarConfig = serde_yaml::from_str(&raw)
            .map_err(|e| RadarError::Config(format!("cannot parse {path}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Empty watch lists make the whole run a no-op, so they abort it
    /// rather than silently searching nothing.
    pub fn validate(&self) -> Result<(), RadarError> {
        if self.companies.is_empty() {
            return Err(RadarError::Config("companies list is empty".to_string()));
        }
        if self.key_terms.is_empty() {
            return Err(RadarError::Config("key_terms list is empty".to_string()));
        }
        if self.redirect.pool_size == 0 {
            return Err(RadarError::Config(
                "redirect.pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
