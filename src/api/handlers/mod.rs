//! HTTP request handlers.

pub mod admin;
pub mod catalog;
pub mod content;
pub mod pages;
pub mod uploads;

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::warn;

use crate::app::AppState;
use crate::domain::{HealthResponse, HealthStatus};

/// Health check endpoint
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (database, storage) = tokio::join!(
        state.db_health.health_check(),
        state.uploads.store().health_check()
    );
    let status_of = |component: &str, result: Result<(), crate::domain::AppError>| match result {
        Ok(()) => HealthStatus::Healthy,
        Err(e) => {
            warn!(component, error = %e, "health check failed");
            HealthStatus::Unhealthy
        }
    };
    Json(HealthResponse::new(
        status_of("database", database),
        status_of("storage", storage),
    ))
}

/// Liveness probe
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.db_health.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Prometheus scrape output.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn robots_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /api\n\nSitemap: {}/sitemap.xml\n",
        state.pages.site_url()
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{DevAuthProvider, Repositories, SiteSettings};
    use crate::infra::UploadTokenSigner;
    use crate::test_utils::{MockBlobStore, MockHealthCheck};

    fn state_with(db: Arc<MockHealthCheck>, store: Arc<MockBlobStore>) -> Arc<AppState> {
        let repos = Repositories {
            health: db,
            ..Repositories::in_memory()
        };
        Arc::new(AppState::new(
            repos,
            store,
            Arc::new(DevAuthProvider),
            Arc::new(UploadTokenSigner::generate()),
            SiteSettings::default(),
        ))
    }

    #[tokio::test]
    async fn test_health_reports_each_component() {
        let db = Arc::new(MockHealthCheck::new());
        let store = Arc::new(MockBlobStore::new());
        let state = state_with(Arc::clone(&db), Arc::clone(&store));

        let Json(health) = health_check_handler(State(Arc::clone(&state))).await;
        assert_eq!(health.status, HealthStatus::Healthy);

        store.set_healthy(false);
        let Json(health) = health_check_handler(State(Arc::clone(&state))).await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.storage, HealthStatus::Unhealthy);

        db.set_healthy(false);
        let Json(health) = health_check_handler(State(state)).await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(db.call_count(), 3);
    }

    #[tokio::test]
    async fn test_readiness_follows_database() {
        let db = Arc::new(MockHealthCheck::new());
        let state = state_with(Arc::clone(&db), Arc::new(MockBlobStore::new()));
        assert_eq!(readiness_handler(State(Arc::clone(&state))).await, StatusCode::OK);

        db.set_healthy(false);
        assert_eq!(
            readiness_handler(State(state)).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
