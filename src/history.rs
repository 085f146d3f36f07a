//! The history store: an append-only CSV that doubles as the durable
//! tabular output and the dedup membership source.
//!
//! Columns are fixed: `company, key_term, title, publish_date, url`. The
//! set of previously-seen URLs is reconstructed from the `url` column at
//! run start and never mutated mid-run; the batch is appended once, after
//! the run completes. A crash mid-run therefore leaves the file intact
//! and at worst re-discovers the same article next run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::RadarError;
use crate::models::ResolvedArticle;

const HEADER: &str = "company,key_term,title,publish_date,url";

/// UTF-8 byte order mark, written when the file is created so non-ASCII
/// company names survive spreadsheet imports.
const BOM: &str = "\u{feff}";

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the set of previously-seen URLs.
    ///
    /// A missing file is the normal first-run case and yields the empty
    /// set. An unreadable file degrades to "treat all as new" with a
    /// warning; only the write side is allowed to fail the run.
    pub async fn load(&self) -> HashSet<String> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No existing history file");
                return HashSet::new();
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "History file unreadable; treating all articles as new"
                );
                return HashSet::new();
            }
        };

        let mut seen = HashSet::new();
        for line in raw.trim_start_matches(BOM).lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line == HEADER {
                continue;
            }
            let fields = split_csv_line(line);
            if let Some(url) = fields.get(4) {
                if !url.is_empty() {
                    seen.insert(url.clone());
                }
            }
        }
        info!(path = %self.path.display(), urls = seen.len(), "Loaded history");
        seen
    }

    /// Append the batch's summary fields. Monotonic: rows are only ever
    /// added, never rewritten. Write failure is fatal for the run.
    pub async fn append(&self, batch: &[ResolvedArticle]) -> Result<(), RadarError> {
        if batch.is_empty() {
            debug!("Empty batch; nothing to append");
            return Ok(());
        }

        let fresh = tokio::fs::metadata(&self.path).await.is_err();

        let mut out = String::new();
        if fresh {
            out.push_str(BOM);
            out.push_str(HEADER);
            out.push('\n');
        }
        for article in batch {
            out.push_str(&format_row(article));
            out.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(out.as_bytes()).await?;
        file.flush().await?;

        info!(path = %self.path.display(), rows = batch.len(), "Appended batch to history");
        Ok(())
    }
}

fn format_row(article: &ResolvedArticle) -> String {
    [
        csv_field(&article.company),
        csv_field(&article.key_term),
        csv_field(&article.title),
        csv_field(&article.publish_date_display()),
        csv_field(&article.url),
    ]
    .join(",")
}

/// Quote a field when it contains a delimiter, a quote or a line break;
/// embedded quotes are doubled.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV line into fields, honoring quoting.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
