use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::feed::{collect_raw_entries, parse_feed_date, Fetch, Source};

/// Horizon used when counting "recent" items in verification reports
pub const VERIFY_WINDOW_HOURS: i64 = 24;

/// Outcome of probing one source's primary URL
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    Ok { status: u16 },
    Failed { reason: String },
}

/// Per-source verification result
#[derive(Debug, Clone)]
pub struct SourceCheck {
    pub label: String,
    pub url: String,
    pub elapsed: Duration,
    pub outcome: CheckOutcome,
    pub total_items: usize,
    pub recent_items: usize,
}

impl SourceCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Ok { .. })
    }
}

/// Full verification report over all configured sources
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub cutoff: DateTime<Utc>,
    pub checks: Vec<SourceCheck>,
}

impl VerifyReport {
    /// True when every source responded
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(SourceCheck::is_ok)
    }
}

/// Probe each configured source once (its primary candidate URL) and count
/// total vs. recently-published entries using the same date-resolution
/// rules as the ingestion parser, with a 24-hour horizon.
pub async fn verify_sources(fetcher: &dyn Fetch, sources: &[Source]) -> VerifyReport {
    let cutoff = Utc::now() - chrono::Duration::hours(VERIFY_WINDOW_HOURS);
    let mut checks = Vec::with_capacity(sources.len());

    for source in sources {
        let Some(url) = source.urls.first() else {
            checks.push(SourceCheck {
                label: source.label.clone(),
                url: String::new(),
                elapsed: Duration::ZERO,
                outcome: CheckOutcome::Failed {
                    reason: "no candidate URLs configured".to_string(),
                },
                total_items: 0,
                recent_items: 0,
            });
            continue;
        };

        let started = Instant::now();
        let result = fetcher.fetch_with_status(url).await;
        let elapsed = started.elapsed();

        let check = match result {
            Ok((status, body)) if (200..300).contains(&status) => {
                let (total, recent) = count_entries(&body, cutoff);
                SourceCheck {
                    label: source.label.clone(),
                    url: url.clone(),
                    elapsed,
                    outcome: CheckOutcome::Ok { status },
                    total_items: total,
                    recent_items: recent,
                }
            }
            Ok((status, _)) => SourceCheck {
                label: source.label.clone(),
                url: url.clone(),
                elapsed,
                outcome: CheckOutcome::Failed {
                    reason: format!("HTTP {}", status),
                },
                total_items: 0,
                recent_items: 0,
            },
            Err(e) => SourceCheck {
                label: source.label.clone(),
                url: url.clone(),
                elapsed,
                outcome: CheckOutcome::Failed {
                    reason: e.to_string(),
                },
                total_items: 0,
                recent_items: 0,
            },
        };

        checks.push(check);
    }

    VerifyReport { cutoff, checks }
}

/// Count total and recent entries in a feed body (XML or JSON listing).
///
/// An entry with a publish date that is present but unparseable counts as
/// recent (conservative); an entry with no publish date at all does not.
fn count_entries(body: &str, cutoff: DateTime<Utc>) -> (usize, usize) {
    if body.trim_start().starts_with('{') {
        return count_listing_posts(body, cutoff);
    }

    let entries = match collect_raw_entries(body) {
        Ok(entries) => entries,
        Err(_) => return (0, 0),
    };

    let total = entries.len();
    let mut recent = 0;
    for entry in &entries {
        if let Some(raw) = entry.published_raw() {
            match parse_feed_date(&raw) {
                Some(published) if published >= cutoff => recent += 1,
                Some(_) => {}
                None => recent += 1, // can't parse the date, count it
            }
        }
    }

    (total, recent)
}

fn count_listing_posts(body: &str, cutoff: DateTime<Utc>) -> (usize, usize) {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return (0, 0),
    };

    let posts = value["data"]["children"].as_array().cloned().unwrap_or_default();
    let total = posts.len();
    let recent = posts
        .iter()
        .filter(|post| {
            post["data"]["created_utc"]
                .as_f64()
                .is_some_and(|secs| secs >= cutoff.timestamp() as f64)
        })
        .count();

    (total, recent)
}
