//! Error taxonomy for the discovery pipeline.
//!
//! Per-unit failures (feed, resolution, extraction) never cross a unit
//! boundary; they degrade the single query to an empty result. Only
//! configuration errors and history-write failures abort a run.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum RadarError {
    /// Invalid configuration (empty watch lists, unreadable config file).
    /// Always fatal.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Feed request or feed parsing failed for one query unit.
    #[error("feed request failed: {0}")]
    Feed(String),

    /// A single navigation attempt against the rendering service failed.
    #[error("redirect navigation failed: {0}")]
    Resolve(String),

    /// Article page fetch or parse failed. The caller falls back to the
    /// feed-supplied title, date and snippet.
    #[error("article extraction failed: {0}")]
    Extract(String),

    /// History CSV I/O failure. Fatal on write: without a durable append
    /// the next run's dedup set would be wrong.
    #[error("history storage failure: {0}")]
    Storage(#[from] std::io::Error),

    /// Notification transport failure. Logged, never fatal.
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_cause() {
        let e = RadarError::Feed("connection refused".to_string());
        assert!(e.to_string().contains("connection refused"));
        assert!(e.to_string().starts_with("feed request failed"));
    }

    #[test]
    fn test_storage_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs");
        let e: RadarError = io.into();
        assert!(matches!(e, RadarError::Storage(_)));
    }
}
