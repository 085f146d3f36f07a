//! Digest and notification rendering.
//!
//! The digest is a plain-text artifact: one block per new article —
//! Title / Publish Date / URL / Summary — blank-line separated. Articles
//! whose title is empty carry nothing a reader can act on and are skipped
//! in both renderings.

use crate::models::ResolvedArticle;

pub const PRODUCT_NAME: &str = "NewsRadar";

/// Fixed body dispatched when the run found nothing new.
pub const NO_NEW_ARTICLES_BODY: &str = "No news articles found this week.";

/// Notification subject: `NewsRadar - <date>` plus the outcome suffix.
pub fn subject(run_date: &str, new_count: usize) -> String {
    let mut subject = format!("{PRODUCT_NAME} - {run_date}");
    if new_count > 0 {
        subject.push_str(&format!("- Found {new_count} new articles"));
    } else {
        subject.push_str(" - No New Articles");
    }
    subject
}

/// The plain-text digest written to disk.
pub fn render_digest(articles: &[ResolvedArticle]) -> String {
    let mut out = String::new();
    for article in articles {
        if article.title.is_empty() {
            continue;
        }
        out.push_str(&format!("Title: {}\n", article.title));
        out.push_str(&format!("Publish Date: {}\n", article.publish_date_display()));
        out.push_str(&format!("URL: {}\n", article.url));
        out.push_str(&format!("Summary: {}\n", article.summary));
        out.push('\n');
    }
    out
}

/// The notification body: the digest blocks prefixed with the watch-list
/// pairing that surfaced each article.
pub fn render_email_body(articles: &[ResolvedArticle]) -> String {
    let mut body = String::from("Found the following news articles:\n\n");
    for article in articles {
        if article.title.is_empty() {
            continue;
        }
        body.push_str(&format!(
            "{} - Focus: {}\n",
            article.company, article.key_term
        ));
        body.push_str(&format!("Title: {}\n", article.title));
        body.push_str(&format!("Publish Date: {}\n", article.publish_date_display()));
        body.push_str(&format!("URL: {}\n", article.url));
        body.push_str(&format!("Summary: {}\n", article.summary));
        body.push('\n');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(title: &str) -> ResolvedArticle {
        ResolvedArticle {
            company: "Acme".to_string(),
            key_term: "Funding".to_string(),
            title: title.to_string(),
            url: "https://news.example/a1".to_string(),
            publish_date: Some(Utc.with_ymd_and_hms(2026, 3, 13, 10, 0, 0).unwrap()),
            authors: vec![],
            text: String::new(),
            summary: "Acme raised a Series C.".to_string(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_subject_with_new_articles() {
        assert_eq!(
            subject("2026-03-14", 3),
            "NewsRadar - 2026-03-14- Found 3 new articles"
        );
    }

    #[test]
    fn test_subject_without_new_articles() {
        assert_eq!(subject("2026-03-14", 0), "NewsRadar - 2026-03-14 - No New Articles");
    }

    #[test]
    fn test_digest_block_layout() {
        let digest = render_digest(&[article("Acme raises Series C")]);
        assert_eq!(
            digest,
            "Title: Acme raises Series C\n\
             Publish Date: 2026-03-13 10:00:00\n\
             URL: https://news.example/a1\n\
             Summary: Acme raised a Series C.\n\n"
        );
    }

    #[test]
    fn test_digest_skips_empty_titles() {
        let mut untitled = article("");
        untitled.url = "https://news.example/untitled".to_string();
        let digest = render_digest(&[untitled, article("Kept")]);
        assert!(!digest.contains("https://news.example/untitled"));
        assert_eq!(digest.matches("Title:").count(), 1);
        assert!(digest.contains("Title: Kept"));
    }

    #[test]
    fn test_email_body_carries_watch_list_pairing() {
        let body = render_email_body(&[article("Acme raises Series C")]);
        assert!(body.starts_with("Found the following news articles:\n\n"));
        assert!(body.contains("Acme - Focus: Funding\n"));
        assert!(body.contains("Title: Acme raises Series C\n"));
    }
}
