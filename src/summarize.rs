//! Pluggable text summarization.
//!
//! The pipeline treats summarization as a black-box text-to-text
//! capability: invoked only when extraction produced body text, and never
//! fatal — when it yields nothing the feed-supplied snippet stands.

use serde::Deserialize;

/// Which summarizer a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerKind {
    /// Frequency-scored extractive summary of the article body.
    #[default]
    Extractive,
    /// No summarization; keep the feed-supplied snippet.
    Snippet,
}

/// Number of sentences an extractive summary keeps.
const SUMMARY_SENTENCES: usize = 3;

/// Summarize `text`, or `None` when this kind produces nothing for it.
pub fn summarize(kind: SummarizerKind, text: &str) -> Option<String> {
    match kind {
        SummarizerKind::Extractive => extractive(text, SUMMARY_SENTENCES),
        SummarizerKind::Snippet => None,
    }
}

/// Classic frequency-based extractive summarization: score each sentence
/// by the document-wide frequency of its content words, keep the top
/// `max_sentences` in document order.
fn extractive(text: &str, max_sentences: usize) -> Option<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return None;
    }
    if sentences.len() <= max_sentences {
        return Some(sentences.join(" "));
    }

    let mut frequency: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for sentence in &sentences {
        for word in content_words(sentence) {
            *frequency.entry(word).or_insert(0) += 1;
        }
    }

    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| {
            let words: Vec<String> = content_words(sentence).collect();
            let score = if words.is_empty() {
                0.0
            } else {
                let total: usize = words.iter().filter_map(|w| frequency.get(w)).sum();
                total as f64 / words.len() as f64
            };
            (i, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let mut keep: Vec<usize> = scored.into_iter().take(max_sentences).map(|(i, _)| i).collect();
    keep.sort_unstable();

    Some(
        keep.into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let trimmed = current.trim();
            if trimmed.chars().filter(|c| c.is_alphanumeric()).count() >= 3 {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trailing = current.trim();
    if trailing.chars().filter(|c| c.is_alphanumeric()).count() >= 3 {
        sentences.push(trailing.to_string());
    }
    sentences
}

fn content_words(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| w.len() > 3)
}
