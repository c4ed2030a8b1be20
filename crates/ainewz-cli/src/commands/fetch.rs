use std::sync::Arc;

use anyhow::Result;

use ainewz_core::feed::FeedFetcher;
use ainewz_core::pipeline::collect_sources;
use ainewz_core::store::{FilePayloadStore, PayloadStore};
use ainewz_core::AppConfig;

const TITLE_PREVIEW_CHARS: usize = 70;

pub async fn run(config: Arc<AppConfig>) -> Result<()> {
    println!("Fetching {} sources...\n", config.sources.len());

    let fetcher = FeedFetcher::new(&config)?;
    let payload = collect_sources(&fetcher, &config.sources, config.sync.window_hours).await;

    let store = FilePayloadStore::new(config.payload_path());
    store.store_latest(&payload).await?;

    println!("Fetched {} articles.", payload.count);
    if !payload.errors.is_empty() {
        println!("Failed sources: {}", payload.errors.join(", "));
    }

    for article in payload.articles.iter().take(3) {
        println!("  [{}] {}", article.source_label, preview_title(&article.title));
    }

    println!("\nStored payload at {}", config.payload_path().display());

    Ok(())
}

fn preview_title(title: &str) -> String {
    title.chars().take(TITLE_PREVIEW_CHARS).collect()
}
