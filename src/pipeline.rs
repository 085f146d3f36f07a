//! Pipeline orchestration: one bounded batch pass over the query space.
//!
//! Discovery is a paced sequential pass (the inter-request delay is a
//! global contract with the feed provider, not a per-worker one);
//! resolution and enrichment run concurrently, bounded by the rendering
//! pool size. The history diff and the sinks observe the complete,
//! deduplicated batch — never a partial one — and the single storage
//! append happens only after the batch is assembled, so a cancelled run
//! leaves the CSV untouched.

use chrono::{Local, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};
use tracing::{debug, error, info, instrument, warn};

use crate::config::RadarConfig;
use crate::digest;
use crate::error::RadarError;
use crate::extract::ArticleExtractor;
use crate::feed::{FeedSource, within_age_window};
use crate::history::HistoryStore;
use crate::models::{CandidateLink, QueryUnit, ResolvedArticle, RunReport, RunStatus};
use crate::queries;
use crate::resolver::{LinkResolver, is_redirector};
use crate::summarize::summarize;
use crate::utils::truncate_for_log;

/// Run the discovery-resolve-filter-dedup pipeline to completion.
///
/// Per-unit failures degrade to empty results; only configuration errors
/// and the history append can fail the run.
#[instrument(level = "info", skip_all)]
pub async fn run<F, R, E>(
    config: &RadarConfig,
    feed: &F,
    resolver: &R,
    extractor: &E,
    status: &watch::Sender<RunStatus>,
) -> Result<RunReport, RadarError>
where
    F: FeedSource,
    R: LinkResolver,
    E: ArticleExtractor,
{
    if let Err(e) = config.validate() {
        status.send_replace(RunStatus::Failed {
            error: e.to_string(),
        });
        return Err(e);
    }

    let history = HistoryStore::new(&config.history_path);
    let seen = history.load().await;

    let units = queries::cross(&config.companies, &config.key_terms);
    let total = units.len();
    info!(
        companies = config.companies.len(),
        key_terms = config.key_terms.len(),
        total,
        "Query space generated"
    );

    // --- Discovery + temporal admission, paced per provider contract ---
    let pacing = Duration::from_millis(config.inter_request_delay_ms);
    let now = Utc::now();
    let mut discovered: Vec<(QueryUnit, CandidateLink)> = Vec::new();

    for (i, unit) in units.iter().enumerate() {
        status.send_replace(RunStatus::Running {
            done: i,
            total,
            message: format!("Searching {} for {}", unit.company, unit.key_term),
        });

        if let Some(candidate) = feed.top_candidate(unit).await {
            if within_age_window(candidate.published, config.max_age_days, now) {
                discovered.push((unit.clone(), candidate));
            } else {
                debug!(
                    company = %unit.company,
                    key_term = %unit.key_term,
                    published = %candidate.published_raw,
                    title = %truncate_for_log(&candidate.title, 60),
                    "Candidate outside recency window; skipped"
                );
            }
        }

        if i + 1 < total {
            sleep(pacing).await;
        }
    }
    info!(candidates = discovered.len(), "Discovery pass complete");

    // --- Resolve + enrich, bounded by the rendering pool ---
    status.send_replace(RunStatus::Running {
        done: total,
        total,
        message: "Resolving and enriching candidates".to_string(),
    });

    let concurrency = config.redirect.pool_size.max(1);
    let enriched: Vec<Option<ResolvedArticle>> = stream::iter(discovered)
        .map(|(unit, candidate)| enrich(config, resolver, extractor, unit, candidate))
        .buffer_unordered(concurrency)
        .collect()
        .await;

    // In-batch dedup: two query units can surface the same article; the
    // first resolved record wins so the history diff sees each URL once.
    let batch: Vec<ResolvedArticle> = enriched
        .into_iter()
        .flatten()
        .unique_by(|a| a.url.clone())
        .collect();

    let new: Vec<ResolvedArticle> = batch
        .iter()
        .filter(|a| !seen.contains(&a.url))
        .cloned()
        .collect();
    info!(found = batch.len(), new = new.len(), "Batch assembled");

    status.send_replace(RunStatus::Running {
        done: total,
        total,
        message: "Processing results".to_string(),
    });

    // Storage first; its durability outranks every notification step.
    if let Err(e) = history.append(&batch).await {
        error!(error = %e, "History append failed; aborting run");
        status.send_replace(RunStatus::Failed {
            error: e.to_string(),
        });
        return Err(e);
    }

    let run_date = Local::now().date_naive().to_string();
    let subject = digest::subject(&run_date, new.len());
    let body = if new.is_empty() {
        info!("No new articles found");
        digest::NO_NEW_ARTICLES_BODY.to_string()
    } else {
        info!(count = new.len(), "Found new articles");
        if let Err(e) = tokio::fs::write(&config.digest_path, digest::render_digest(&new)).await {
            warn!(path = %config.digest_path, error = %e, "Failed writing digest file");
        }
        digest::render_email_body(&new)
    };

    status.send_replace(RunStatus::Completed {
        found: batch.len(),
        new: new.len(),
    });

    Ok(RunReport {
        total_queries: total,
        found: batch.len(),
        new: new.len(),
        subject,
        body,
    })
}

/// Resolve one candidate to its canonical URL and enrich it.
///
/// Returns `None` when resolution never left the redirector domain; an
/// extraction failure keeps the feed-supplied title, date and snippet.
async fn enrich<R, E>(
    config: &RadarConfig,
    resolver: &R,
    extractor: &E,
    unit: QueryUnit,
    candidate: CandidateLink,
) -> Option<ResolvedArticle>
where
    R: LinkResolver,
    E: ArticleExtractor,
{
    let url = resolver.resolve(&candidate.raw_link).await;
    if is_redirector(&url, &config.redirect.redirector_domain) {
        warn!(
            company = %unit.company,
            key_term = %unit.key_term,
            link = %candidate.raw_link,
            "Redirect resolution failed; discarding candidate"
        );
        return None;
    }

    let mut article = ResolvedArticle {
        company: unit.company,
        key_term: unit.key_term,
        title: candidate.title,
        url,
        publish_date: candidate.published,
        authors: Vec::new(),
        text: String::new(),
        summary: candidate.snippet,
        fetched_at: Utc::now(),
    };

    match extractor.extract(&article.url).await {
        Ok(extraction) => {
            // The article's own declared date outranks the feed's.
            if extraction.publish_date.is_some() {
                article.publish_date = extraction.publish_date;
            }
            article.authors = extraction.authors;
            article.text = extraction.text;
            if !article.text.is_empty() {
                if let Some(summary) = summarize(config.summarizer, &article.text) {
                    article.summary = summary;
                } else {
                    debug!(url = %article.url, "Summarizer produced nothing; keeping feed snippet");
                }
            }
        }
        Err(e) => {
            debug!(
                url = %article.url,
                error = %e,
                "Extraction failed; keeping feed-supplied fields"
            );
        }
    }

    Some(article)
}
