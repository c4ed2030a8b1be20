use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/articles", get(handlers::get_articles))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind and serve the read API until the task is cancelled.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind_addr.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ainewz_core::feed::{article_id, Article, Fetch, Payload};
    use ainewz_core::store::{MemoryPayloadStore, PayloadStore};
    use ainewz_core::AppConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;

    struct EmptyFetcher;

    #[async_trait]
    impl Fetch for EmptyFetcher {
        async fn fetch_with_status(&self, url: &str) -> ainewz_core::Result<(u16, String)> {
            Err(ainewz_core::Error::Fetch(format!("unreachable: {}", url)))
        }
    }

    async fn app_with_cached_payload() -> Router {
        let store = MemoryPayloadStore::new();
        let article = Article {
            id: article_id("https://example.com/a"),
            title: "Cached".to_string(),
            summary: "Body".to_string(),
            url: "https://example.com/a".to_string(),
            source: "test".to_string(),
            source_label: "Test".to_string(),
            published_at: Utc::now(),
            author: "Test".to_string(),
            score: None,
            thumbnail: None,
            saved: false,
        };
        store
            .store_latest(&Payload::new(vec![article], Vec::new(), Utc::now()))
            .await
            .unwrap();

        create_app(AppState {
            store: Arc::new(store),
            fetcher: Arc::new(EmptyFetcher),
            config: Arc::new(AppConfig::default()),
        })
    }

    #[tokio::test]
    async fn test_articles_route_response_headers() {
        let app = app_with_cached_payload().await;

        let request = Request::builder()
            .uri("/api/articles")
            .header(header::ORIGIN, "https://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );
        // Permissive CORS layer answers any origin
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = app_with_cached_payload().await;

        let request = Request::builder()
            .uri("/api/unknown")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
