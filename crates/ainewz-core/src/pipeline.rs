use std::collections::HashSet;

use chrono::{Duration, Utc};

use crate::feed::{parse_feed, Article, Fetch, Payload, Source};

/// Bodies at or below this size are treated as failed responses
/// (error pages and empty redirect shells, mostly)
const MIN_FEED_BYTES: usize = 200;

/// Run the full ingestion pipeline over the configured sources.
///
/// For each source, candidate URLs are tried in listed order; the first URL
/// whose parse yields at least one article wins and the rest are skipped.
/// Sources where every candidate fails contribute their label to the error
/// set instead. Failures are isolated per source, so this never errors.
pub async fn collect_sources(
    fetcher: &dyn Fetch,
    sources: &[Source],
    window_hours: i64,
) -> Payload {
    let now = Utc::now();
    let window = Duration::hours(window_hours);

    let mut all_articles = Vec::new();
    let mut errors = Vec::new();

    for source in sources {
        let mut fetched = false;

        for url in &source.urls {
            tracing::info!("Fetching {} from {}", source.key, url);

            let body = match fetcher.fetch_text(url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("{}: fetch failed for {}: {}", source.key, url, e);
                    continue;
                }
            };

            if body.len() <= MIN_FEED_BYTES {
                tracing::warn!(
                    "{}: response from {} too small ({} bytes)",
                    source.key,
                    url,
                    body.len()
                );
                continue;
            }

            let articles = parse_feed(&body, source, now, window);
            if articles.is_empty() {
                tracing::warn!("{}: parsed 0 articles from {}", source.key, url);
                continue;
            }

            tracing::info!("{}: {} articles", source.key, articles.len());
            all_articles.extend(articles);
            fetched = true;
            break;
        }

        if !fetched {
            tracing::error!("All candidate URLs failed for source '{}'", source.key);
            errors.push(source.label.clone());
        }
    }

    // Deduplicate by id, first occurrence wins
    let mut seen = HashSet::new();
    let mut unique: Vec<Article> = Vec::with_capacity(all_articles.len());
    for article in all_articles {
        if seen.insert(article.id.clone()) {
            unique.push(article);
        }
    }

    // Newest first
    unique.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    Payload::new(unique, errors, now)
}
