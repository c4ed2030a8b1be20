use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use ainewz_core::feed::FeedFetcher;
use ainewz_core::scheduler::SchedulerService;
use ainewz_core::store::FilePayloadStore;
use ainewz_core::AppConfig;
use ainewz_server::AppState;

pub async fn run(config: Arc<AppConfig>) -> Result<()> {
    let fetcher = Arc::new(FeedFetcher::new(&config)?);
    let store = Arc::new(FilePayloadStore::new(config.payload_path()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = SchedulerService::new(fetcher.clone(), store.clone(), config.clone());
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    let state = AppState {
        store,
        fetcher,
        config,
    };

    tokio::select! {
        result = ainewz_server::serve(state) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = scheduler_handle.await;

    Ok(())
}
