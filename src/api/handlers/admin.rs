use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::domain::{AppError, CacheTag, Session};

#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    pub revalidated: Vec<&'static str>,
}

impl From<Vec<CacheTag>> for RevalidateResponse {
    fn from(tags: Vec<CacheTag>) -> Self {
        Self {
            revalidated: tags.into_iter().map(CacheTag::as_str).collect(),
        }
    }
}

/// `GET /api/admin/session`
pub async fn session(Extension(session): Extension<Session>) -> Json<Session> {
    Json(session)
}

/// `POST /api/admin/revalidate`
pub async fn revalidate_all(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Json<RevalidateResponse> {
    let tags = state.cache.revalidate_all().await;
    info!(subject = %session.subject, "all cache tags revalidated");
    Json(tags.into())
}

/// `POST /api/admin/revalidate/{tag}`
pub async fn revalidate_tag(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> Result<Json<RevalidateResponse>, AppError> {
    let tag: CacheTag = tag.parse()?;
    Ok(Json(state.cache.revalidate_tag(tag).await.into()))
}
