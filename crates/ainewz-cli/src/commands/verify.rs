use std::sync::Arc;

use anyhow::{bail, Result};

use ainewz_core::feed::FeedFetcher;
use ainewz_core::verify::{verify_sources, CheckOutcome};
use ainewz_core::AppConfig;

pub async fn run(config: Arc<AppConfig>) -> Result<()> {
    println!("Verifying {} sources...\n", config.sources.len());

    let fetcher = FeedFetcher::new(&config)?;
    let report = verify_sources(&fetcher, &config.sources).await;

    for check in &report.checks {
        println!("{}", check.label);
        println!("  URL:     {}", check.url);
        match &check.outcome {
            CheckOutcome::Ok { status } => {
                println!("  Status:  {} ({:.2}s)", status, check.elapsed.as_secs_f64());
                println!("  Items:   {} total, {} in the last 24h", check.total_items, check.recent_items);
            }
            CheckOutcome::Failed { reason } => {
                println!("  FAILED:  {} ({:.2}s)", reason, check.elapsed.as_secs_f64());
            }
        }
        println!();
    }

    let failed: Vec<&str> = report
        .checks
        .iter()
        .filter(|c| !c.is_ok())
        .map(|c| c.label.as_str())
        .collect();

    if failed.is_empty() {
        println!("All sources reachable.");
        Ok(())
    } else {
        bail!("unreachable sources: {}", failed.join(", "));
    }
}
