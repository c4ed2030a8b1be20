use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::feed::{Fetch, Payload};
use crate::pipeline::collect_sources;
use crate::store::PayloadStore;
use crate::{Error, Result};

/// Background service that runs the ingestion pipeline on a fixed cadence
/// (daily by default) and writes the result to the payload store.
pub struct SchedulerService {
    fetcher: Arc<dyn Fetch>,
    store: Arc<dyn PayloadStore>,
    config: Arc<AppConfig>,
}

impl SchedulerService {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        store: Arc<dyn PayloadStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }

    /// Run one pipeline pass bounded by the configured wall-clock budget,
    /// retrying up to the fixed attempt count. The payload is stored on
    /// success and returned to the caller.
    pub async fn run_once(&self) -> Result<Payload> {
        let attempts = self.config.sync.run_attempts.max(1);
        let budget = Duration::from_secs(self.config.sync.run_timeout_secs);

        for attempt in 1..=attempts {
            let run = collect_sources(
                self.fetcher.as_ref(),
                &self.config.sources,
                self.config.sync.window_hours,
            );

            match tokio::time::timeout(budget, run).await {
                Ok(payload) => {
                    self.store.store_latest(&payload).await?;
                    info!(
                        "Run complete: {} articles stored, errors: {:?}",
                        payload.count, payload.errors
                    );
                    return Ok(payload);
                }
                Err(_) => {
                    warn!(
                        "Run exceeded {}s budget (attempt {}/{})",
                        budget.as_secs(),
                        attempt,
                        attempts
                    );
                }
            }
        }

        Err(Error::Other(format!(
            "pipeline run timed out after {} attempts",
            attempts
        )))
    }

    /// Run scheduled passes in a loop until the shutdown signal flips
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let interval_secs = self.config.sync.fetch_interval_secs;

        if interval_secs == 0 {
            info!("Scheduler disabled (fetch_interval_secs = 0)");
            let _ = shutdown.changed().await;
            return;
        }

        info!("Scheduler started: fetch every {}s", interval_secs);

        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // Skip the first tick (fires immediately); the read endpoint covers
        // the cold-start case on demand
        interval.tick().await;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_ok() && *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = interval.tick() => {
                    debug!("Running scheduled fetch");
                    if let Err(e) = self.run_once().await {
                        error!("Scheduled fetch failed: {}", e);
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}
