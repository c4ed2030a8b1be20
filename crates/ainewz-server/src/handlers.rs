use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use ainewz_core::feed::Payload;
use ainewz_core::pipeline::collect_sources;
use ainewz_core::store::PayloadStore;

use crate::AppState;

/// Serve the latest aggregated payload. A cold cache triggers a synchronous
/// collection run so the first request after startup still gets data.
pub async fn get_articles(State(state): State<Arc<AppState>>) -> Response {
    match latest_payload(&state).await {
        Ok(payload) => {
            let cache_control = format!(
                "public, max-age={}",
                state.config.server.cache_max_age_secs
            );
            (
                [(header::CACHE_CONTROL, cache_control)],
                Json(payload),
            )
                .into_response()
        }
        Err(e) => {
            warn!("failed to produce payload: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Load the cached payload, or run a collection pass when the slot is empty.
pub async fn latest_payload(state: &AppState) -> ainewz_core::Result<Payload> {
    if let Some(payload) = state.store.load_latest().await? {
        return Ok(payload);
    }

    info!("no cached payload, collecting synchronously");
    let payload = collect_sources(
        state.fetcher.as_ref(),
        &state.config.sources,
        state.config.sync.window_hours,
    )
    .await;
    state.store.store_latest(&payload).await?;
    Ok(payload)
}
