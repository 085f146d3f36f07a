//! Article page extraction: title, authors, publish date and body text.
//!
//! Extraction is best-effort enrichment. The error surface is explicit —
//! `Result<Extraction, RadarError>` — and the pipeline unwraps it with the
//! feed-supplied fallback, so a dead page or a hostile DOM can never abort
//! a run. An extracted publish date overrides the feed's: the article's
//! own declared date outranks the search index's.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::RadarError;

static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static META_AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());
static META_PUBLISHED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static TIME_DATETIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());
static LD_JSON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static ARTICLE_P: Lazy<Selector> = Lazy::new(|| Selector::parse("article p").unwrap());
static ANY_P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Date segment in article URL paths, e.g. `/2026/03/14/slug`.
static URL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{4})/(\d{1,2})/(\d{1,2})/").unwrap());

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Structured fields pulled out of an article page.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub title: String,
    pub authors: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub text: String,
}

/// The enrichment seam the pipeline depends on.
pub trait ArticleExtractor {
    async fn extract(&self, url: &str) -> Result<Extraction, RadarError>;
}

/// Fetches the resolved article page and parses it with CSS selectors,
/// meta tags and JSON-LD.
pub struct PageExtractor {
    client: Client,
}

impl PageExtractor {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleExtractor for PageExtractor {
    async fn extract(&self, url: &str) -> Result<Extraction, RadarError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RadarError::Extract(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RadarError::Extract(format!(
                "article page returned status {status}"
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| RadarError::Extract(e.to_string()))?;

        let extraction = parse_page(&html, url);
        debug!(
            %url,
            title = %extraction.title,
            bytes = extraction.text.len(),
            authors = extraction.authors.len(),
            "Parsed article page"
        );
        Ok(extraction)
    }
}

/// Parse an article page. Synchronous on purpose: the parsed DOM is not
/// `Send` and must not live across an await point.
pub fn parse_page(html: &str, url: &str) -> Extraction {
    let document = Html::parse_document(html);

    let title = meta_content(&document, &OG_TITLE)
        .or_else(|| first_text(&document, &H1))
        .or_else(|| first_text(&document, &TITLE))
        .unwrap_or_default();

    let ld = ld_json_values(&document);

    let mut authors: Vec<String> = document
        .select(&META_AUTHOR)
        .filter_map(|e| e.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if authors.is_empty() {
        authors = ld.iter().flat_map(ld_authors).collect();
    }
    // Repeated bylines are not necessarily adjacent; keep first occurrence
    // order.
    let mut seen = std::collections::HashSet::new();
    authors.retain(|a| seen.insert(a.clone()));

    let publish_date = meta_content(&document, &META_PUBLISHED)
        .and_then(|raw| parse_date(&raw))
        .or_else(|| {
            ld.iter()
                .filter_map(|v| v.get("datePublished"))
                .filter_map(|v| v.as_str())
                .find_map(parse_date)
        })
        .or_else(|| {
            document
                .select(&TIME_DATETIME)
                .filter_map(|e| e.value().attr("datetime"))
                .find_map(parse_date)
        })
        .or_else(|| date_from_url(url));

    let mut paragraphs: Vec<String> = document
        .select(&ARTICLE_P)
        .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document
            .select(&ANY_P)
            .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    let text = paragraphs.join("\n");

    Extraction {
        title,
        authors,
        publish_date,
        text,
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|e| e.value().attr("content"))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .find(|s| !s.is_empty())
}

/// All top-level JSON-LD objects on the page, with arrays and `@graph`
/// containers flattened one level.
fn ld_json_values(document: &Html) -> Vec<serde_json::Value> {
    let mut values = Vec::new();
    for script in document.select(&LD_JSON) {
        let raw = script.text().collect::<String>();
        let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        match parsed {
            serde_json::Value::Array(items) => values.extend(items),
            serde_json::Value::Object(ref obj) if obj.contains_key("@graph") => {
                if let Some(graph) = obj["@graph"].as_array() {
                    values.extend(graph.iter().cloned());
                }
            }
            other => values.push(other),
        }
    }
    values
}

/// JSON-LD `author` is a string, an object with `name`, or an array of
/// either.
fn ld_authors(value: &serde_json::Value) -> Vec<String> {
    fn name_of(v: &serde_json::Value) -> Option<String> {
        match v {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Object(o) => o
                .get("name")
                .and_then(|n| n.as_str())
                .map(|s| s.trim().to_string()),
            _ => None,
        }
    }

    match value.get("author") {
        Some(serde_json::Value::Array(items)) => items.iter().filter_map(name_of).collect(),
        Some(single) => name_of(single).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Parse the publish-date formats seen in the wild: RFC 3339, RFC 2822
/// and bare dates.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    None
}

/// Last resort: many outlets encode the publish date in the URL path.
fn date_from_url(url: &str) -> Option<DateTime<Utc>> {
    let caps = URL_DATE.captures(url)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<title>Fallback title | Example Wire</title>
<meta property="og:title" content="Acme raises Series C">
<meta name="author" content="Jordan Smith">
<meta property="article:published_time" content="2026-03-13T10:00:00Z">
</head><body>
<h1>Acme raises Series C</h1>
<article>
<p>Acme announced a funding round on Friday.</p>
<p>The company plans to expand its warehouse network.</p>
</article>
</body></html>"#;

    const LD_PAGE: &str = r#"<html><head>
<script type="application/ld+json">
{"@type":"NewsArticle","datePublished":"2026-03-12T08:30:00Z",
 "author":[{"@type":"Person","name":"Sam Lee"},{"@type":"Person","name":"Ada Wong"}]}
</script>
</head><body><h1>Headline</h1><p>Body paragraph.</p></body></html>"#;

    #[test]
    fn test_parse_page_prefers_og_title() {
        let extraction = parse_page(PAGE, "https://news.example/a1");
        assert_eq!(extraction.title, "Acme raises Series C");
    }

    #[test]
    fn test_parse_page_meta_fields() {
        let extraction = parse_page(PAGE, "https://news.example/a1");
        assert_eq!(extraction.authors, vec!["Jordan Smith".to_string()]);
        assert_eq!(
            extraction.publish_date,
            Some(Utc.with_ymd_and_hms(2026, 3, 13, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_page_collects_article_paragraphs() {
        let extraction = parse_page(PAGE, "https://news.example/a1");
        assert!(extraction.text.contains("funding round"));
        assert!(extraction.text.contains("warehouse network"));
    }

    #[test]
    fn test_parse_page_json_ld_fallbacks() {
        let extraction = parse_page(LD_PAGE, "https://news.example/ld");
        assert_eq!(
            extraction.publish_date,
            Some(Utc.with_ymd_and_hms(2026, 3, 12, 8, 30, 0).unwrap())
        );
        assert_eq!(
            extraction.authors,
            vec!["Sam Lee".to_string(), "Ada Wong".to_string()]
        );
        assert_eq!(extraction.title, "Headline");
    }

    #[test]
    fn test_parse_page_drops_non_adjacent_duplicate_authors() {
        let page = r#"<html><head>
<meta name="author" content="Sam Lee">
<meta name="author" content="Ada Wong">
<meta name="author" content="Sam Lee">
</head><body><p>Body.</p></body></html>"#;
        let extraction = parse_page(page, "https://news.example/a1");
        assert_eq!(
            extraction.authors,
            vec!["Sam Lee".to_string(), "Ada Wong".to_string()]
        );
    }

    #[test]
    fn test_parse_page_empty_body_yields_empty_text() {
        let extraction = parse_page("<html><head><title>t</title></head><body></body></html>", "u");
        assert!(extraction.text.is_empty());
    }

    #[test]
    fn test_date_from_url() {
        assert_eq!(
            date_from_url("https://news.example/2026/03/14/acme-expansion"),
            Some(Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap())
        );
        assert!(date_from_url("https://news.example/acme-expansion").is_none());
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2026-03-13T10:00:00Z").is_some());
        assert!(parse_date("Fri, 13 Mar 2026 10:00:00 GMT").is_some());
        assert!(parse_date("2026-03-13").is_some());
        assert!(parse_date("yesterday").is_none());
    }
}
