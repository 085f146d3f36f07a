//! Feed discovery against a Google-News-style syndication search endpoint,
//! plus the temporal admission filter.
//!
//! One feed request per query unit, top entry only. Network and parse
//! errors degrade the unit to "no candidate"; one bad query never halts
//! the batch. Request pacing is the caller's job (see the pipeline), not
//! a property of the fetcher.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::RadarError;
use crate::models::{CandidateLink, QueryUnit};
use crate::utils::strip_html;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of raw candidates, one per query unit. The seam the pipeline
/// tests mock out.
pub trait FeedSource {
    /// The highest-ranked entry for this unit, or `None` when the feed is
    /// empty or the fetch failed.
    async fn top_candidate(&self, unit: &QueryUnit) -> Option<CandidateLink>;
}

/// Feed fetcher for the Google News RSS search endpoint.
pub struct GoogleNewsFeed {
    client: Client,
    base_url: String,
}

impl GoogleNewsFeed {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `<base>/rss/search?q=<url-encoded "company company-keyword term">`.
    pub fn search_url(&self, unit: &QueryUnit) -> String {
        let query = format!("{} company {}", unit.company, unit.key_term);
        format!(
            "{}/rss/search?q={}",
            self.base_url,
            urlencoding::encode(&query)
        )
    }

    async fn fetch(&self, unit: &QueryUnit) -> Result<Option<CandidateLink>, RadarError> {
        let url = self.search_url(unit);
        debug!(%url, company = %unit.company, key_term = %unit.key_term, "Fetching search feed");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RadarError::Feed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RadarError::Feed(format!(
                "feed endpoint returned status {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RadarError::Feed(e.to_string()))?;

        parse_top_entry(&body)
    }
}

impl FeedSource for GoogleNewsFeed {
    async fn top_candidate(&self, unit: &QueryUnit) -> Option<CandidateLink> {
        match self.fetch(unit).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(
                    company = %unit.company,
                    key_term = %unit.key_term,
                    error = %e,
                    "Feed fetch failed; unit degraded to no candidate"
                );
                None
            }
        }
    }
}

/// Parse a syndication feed and keep only the highest-ranked entry.
pub fn parse_top_entry(body: &[u8]) -> Result<Option<CandidateLink>, RadarError> {
    let channel =
        rss::Channel::read_from(body).map_err(|e| RadarError::Feed(format!("feed parse: {e}")))?;

    let Some(item) = channel.items().first() else {
        return Ok(None);
    };

    let (Some(title), Some(link)) = (item.title(), item.link()) else {
        return Ok(None);
    };

    let published_raw = item.pub_date().unwrap_or_default().to_string();
    let published = item.pub_date().and_then(parse_feed_date);
    let snippet = item.description().map(strip_html).unwrap_or_default();

    Ok(Some(CandidateLink {
        title: title.to_string(),
        raw_link: link.to_string(),
        published_raw,
        published,
        snippet,
    }))
}

/// Feed dates are RFC 2822; some providers emit RFC 3339.
fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Temporal admission: inside the recency window, or out.
///
/// Fails closed: a candidate with a missing or unparseable publish time
/// cannot be proven recent, so it is rejected.
pub fn within_age_window(
    published: Option<DateTime<Utc>>,
    max_age_days: u32,
    now: DateTime<Utc>,
) -> bool {
    match published {
        Some(ts) => ts >= now - Duration::days(i64::from(max_age_days)),
        None => false,
    }
}
