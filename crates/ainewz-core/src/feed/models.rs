use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a source's feed documents are shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Rss,
    RedditRss,
}

/// A configured feed source with candidate URLs tried in priority order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub key: String,
    pub label: String,
    pub kind: SourceKind,
    pub urls: Vec<String>,
}

/// Canonical normalized record for one feed item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    pub source_label: String,
    pub published_at: DateTime<Utc>,
    pub author: String,
    /// Reserved for future enrichment, always null for now
    pub score: Option<i64>,
    /// Reserved for future enrichment, always null for now
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub saved: bool,
}

/// Aggregate snapshot written to the cache slot and served by the read endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub articles: Vec<Article>,
    pub errors: Vec<String>,
    pub fetched_at: DateTime<Utc>,
    pub count: usize,
}

impl Payload {
    pub fn new(articles: Vec<Article>, errors: Vec<String>, fetched_at: DateTime<Utc>) -> Self {
        let count = articles.len();
        Self {
            articles,
            errors,
            fetched_at,
            count,
        }
    }
}

/// Deterministic article fingerprint: first 12 hex chars of the MD5 digest
/// of the link. Identical link yields an identical id across sources and runs.
pub fn article_id(link: &str) -> String {
    format!("{:x}", md5::compute(link.as_bytes()))[..12].to_string()
}
