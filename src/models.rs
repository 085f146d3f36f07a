//! Data models for the discovery pipeline.
//!
//! The pipeline incrementally builds a [`ResolvedArticle`] from a
//! [`QueryUnit`] and the raw [`CandidateLink`] the feed returned for it.
//! Enrichment (body text, authors, summary) is best-effort; a record with
//! blank enrichment fields is still a valid record.

use chrono::{DateTime, Utc};

/// One (company, key term) search pair. Generated fresh each run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryUnit {
    pub company: String,
    pub key_term: String,
}

/// A single raw search-result entry, before redirect resolution.
///
/// `raw_link` points at the feed provider's redirector, not the article.
/// Consumed once by the resolver; never persisted.
#[derive(Debug, Clone)]
pub struct CandidateLink {
    pub title: String,
    pub raw_link: String,
    /// The publish date string exactly as the feed supplied it.
    pub published_raw: String,
    pub published: Option<DateTime<Utc>>,
    /// Feed-supplied description with markup stripped.
    pub snippet: String,
}

/// The unit emitted to the sinks: a candidate resolved to its canonical
/// URL and enriched with whatever extraction produced.
#[derive(Debug, Clone)]
pub struct ResolvedArticle {
    pub company: String,
    pub key_term: String,
    pub title: String,
    /// Canonical destination URL. Never the redirector's own domain; the
    /// pipeline drops candidates whose resolution failed.
    pub url: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub authors: Vec<String>,
    pub text: String,
    pub summary: String,
    pub fetched_at: DateTime<Utc>,
}

impl ResolvedArticle {
    /// Publish date rendered for the digest and the CSV, empty when the
    /// date never parsed.
    pub fn publish_date_display(&self) -> String {
        self.publish_date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// Explicit run-state object published over a `tokio::sync::watch` channel
/// so observers (the CLI progress logger today, a UI tomorrow) never poll
/// shared mutable state.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Idle,
    Running {
        done: usize,
        total: usize,
        message: String,
    },
    Completed {
        found: usize,
        new: usize,
    },
    Failed {
        error: String,
    },
}

/// What a completed run reports back to the caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Query units processed (|companies| x |key terms|).
    pub total_queries: usize,
    /// Articles in the deduplicated batch.
    pub found: usize,
    /// Articles not present in the history set at run start.
    pub new: usize,
    /// Notification subject line.
    pub subject: String,
    /// Notification body: the digest, or the no-new-articles sentence.
    pub body: String,
}
