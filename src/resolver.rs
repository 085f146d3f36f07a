//! Redirect resolution through a real browser-rendering context.
//!
//! Search-result links point at the feed provider's redirector, which
//! bounces through client-side scripts a plain HTTP client cannot follow.
//! [`RenderClient`] drives a navigation in a browserless-style rendering
//! service and reports the final address bar URL; [`RetryResolve`] wraps
//! any [`Navigate`] implementation with the retry budget and the sentinel
//! fallback.
//!
//! Rendering contexts are leased from a bounded semaphore pool; the permit
//! is released on every exit path, so contexts never leak across runs.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};
use url::Url;

use crate::config::RedirectConfig;
use crate::error::RadarError;

/// Puppeteer function executed by the rendering service. Mirrors the
/// navigation contract: wait for load, then best-effort for network
/// quiescence with a shorter timeout, then report the final URL.
const NAVIGATE_FN: &str = r#"export default async function ({ page, context }) {
  await page.setUserAgent(context.userAgent);
  await page.goto(context.url, { waitUntil: "load", timeout: 10000 });
  try {
    await page.waitForNetworkIdle({ idleTime: 500, timeout: 5000 });
  } catch (e) {}
  return { data: { url: page.url() }, type: "application/json" };
}"#;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// One navigation attempt: drive a rendering context to `url` and return
/// the address it settled on.
pub trait Navigate {
    async fn navigate(&self, url: &str) -> Result<String, RadarError>;
}

/// The seam the pipeline depends on: raw link in, canonical URL out.
/// Never errors; exhausted retries return the input link as a sentinel
/// the caller recognizes via domain inspection.
pub trait LinkResolver {
    async fn resolve(&self, raw_link: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct NavigateResponse {
    url: String,
}

/// HTTP client for the rendering service's `/function` endpoint.
pub struct RenderClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    pool: Arc<Semaphore>,
}

impl RenderClient {
    pub fn new(config: &RedirectConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            pool: Arc::new(Semaphore::new(config.pool_size.max(1))),
        }
    }
}

impl Navigate for RenderClient {
    async fn navigate(&self, url: &str) -> Result<String, RadarError> {
        // Lease a rendering context; dropped (and thus released) on every
        // exit path below.
        let _permit = self
            .pool
            .acquire()
            .await
            .map_err(|_| RadarError::Resolve("rendering pool closed".to_string()))?;

        let mut endpoint = format!("{}/function", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = serde_json::json!({
            "code": NAVIGATE_FN,
            "context": { "url": url, "userAgent": USER_AGENT },
        });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RadarError::Resolve(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RadarError::Resolve(format!(
                "rendering service returned {status}: {message}"
            )));
        }

        let parsed: NavigateResponse = response
            .json()
            .await
            .map_err(|e| RadarError::Resolve(e.to_string()))?;

        debug!(input = %url, resolved = %parsed.url, "Navigation completed");
        Ok(parsed.url)
    }
}

/// Retry decorator around a [`Navigate`] implementation.
///
/// An attempt counts as failed when navigation errors or when the
/// resulting URL still belongs to the redirector's domain. Attempts are
/// separated by a short fixed delay.
pub struct RetryResolve<T> {
    inner: T,
    retries: u32,
    retry_delay: Duration,
    redirector_domain: String,
}

impl<T: Navigate> RetryResolve<T> {
    pub fn new(inner: T, config: &RedirectConfig) -> Self {
        Self {
            inner,
            retries: config.retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            redirector_domain: config.redirector_domain.clone(),
        }
    }
}

impl<T: Navigate> LinkResolver for RetryResolve<T> {
    async fn resolve(&self, raw_link: &str) -> String {
        for attempt in 1..=self.retries {
            match self.inner.navigate(raw_link).await {
                Ok(url) if !is_redirector(&url, &self.redirector_domain) => {
                    return url;
                }
                Ok(url) => {
                    warn!(
                        attempt,
                        max = self.retries,
                        %url,
                        "Navigation still on redirector domain"
                    );
                }
                Err(e) => {
                    warn!(attempt, max = self.retries, error = %e, "Navigation attempt failed");
                }
            }
            if attempt < self.retries {
                sleep(self.retry_delay).await;
            }
        }

        warn!(link = %raw_link, "All navigation attempts failed; returning input link");
        raw_link.to_string()
    }
}

/// True when `url` belongs to `domain` or one of its subdomains.
pub fn is_redirector(url: &str, domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        // Not even a URL; treat as unresolved.
        return true;
    };
    match parsed.host_str() {
        Some(host) => host == domain || host.ends_with(&format!(".{domain}")),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedNav {
        responses: Mutex<VecDeque<Result<String, RadarError>>>,
    }

    impl ScriptedNav {
        fn new(responses: Vec<Result<String, RadarError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }
    }

    impl Navigate for ScriptedNav {
        async fn navigate(&self, _url: &str) -> Result<String, RadarError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RadarError::Resolve("script exhausted".to_string())))
        }
    }

    fn config(retries: u32) -> RedirectConfig {
        RedirectConfig {
            retries,
            retry_delay_ms: 0,
            ..RedirectConfig::default()
        }
    }

    #[test]
    fn test_is_redirector_matches_domain_and_subdomains() {
        assert!(is_redirector("https://news.google.com/rss/articles/x", "google.com"));
        assert!(is_redirector("https://google.com/x", "google.com"));
        assert!(!is_redirector("https://news.example/a1", "google.com"));
        // Suffix squatting must not count as the redirector.
        assert!(!is_redirector("https://notgoogle.com/x", "google.com"));
    }

    #[test]
    fn test_is_redirector_treats_garbage_as_unresolved() {
        assert!(is_redirector("not a url", "google.com"));
    }

    #[tokio::test]
    async fn test_resolve_returns_first_offsite_url() {
        let nav = ScriptedNav::new(vec![Ok("https://news.example/a1".to_string())]);
        let resolver = RetryResolve::new(nav, &config(2));
        assert_eq!(
            resolver.resolve("https://news.google.com/rss/articles/x").await,
            "https://news.example/a1"
        );
    }

    #[tokio::test]
    async fn test_resolve_retries_past_redirector_url() {
        let nav = ScriptedNav::new(vec![
            Ok("https://news.google.com/rss/articles/x".to_string()),
            Ok("https://news.example/a1".to_string()),
        ]);
        let resolver = RetryResolve::new(nav, &config(2));
        assert_eq!(
            resolver.resolve("https://news.google.com/rss/articles/x").await,
            "https://news.example/a1"
        );
    }

    #[tokio::test]
    async fn test_resolve_exhaustion_returns_input_link() {
        let raw = "https://news.google.com/rss/articles/x";
        let nav = ScriptedNav::new(vec![
            Ok(raw.to_string()),
            Err(RadarError::Resolve("timeout".to_string())),
        ]);
        let resolver = RetryResolve::new(nav, &config(2));
        // Sentinel: the original input, which the caller will recognize by
        // its domain and discard.
        assert_eq!(resolver.resolve(raw).await, raw);
    }

    #[tokio::test]
    async fn test_resolve_recovers_after_navigation_error() {
        let nav = ScriptedNav::new(vec![
            Err(RadarError::Resolve("net::ERR_TIMED_OUT".to_string())),
            Ok("https://news.example/a1".to_string()),
        ]);
        let resolver = RetryResolve::new(nav, &config(2));
        assert_eq!(
            resolver.resolve("https://news.google.com/rss/articles/x").await,
            "https://news.example/a1"
        );
    }
}
