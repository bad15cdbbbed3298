//! Upload endpoints. Bodies are raw bytes typed by `Content-Type`.

use std::sync::Arc;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
};
use serde::Deserialize;

use crate::api::error::JsonBody;
use crate::app::AppState;
use crate::domain::upload::{LEGACY_UPLOAD_LIMIT, TOKEN_UPLOAD_LIMIT};
use crate::domain::{
    AppError, StorageError, StoredBlob, UploadToken, UploadTokenRequest, ValidationError,
};

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyParams {
    pub filename: Option<String>,
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Reads at most `limit` bytes, rejecting by declared length before reading.
async fn read_limited(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, AppError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(size) = declared.filter(|&size| size > limit) {
        return Err(StorageError::TooLarge { size, limit }.into());
    }
    axum::body::to_bytes(body, limit).await.map_err(|_| {
        StorageError::TooLarge {
            size: declared.unwrap_or(limit + 1),
            limit,
        }
        .into()
    })
}

/// `POST /api/admin/upload/token`
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<UploadTokenRequest>,
) -> Result<(StatusCode, Json<UploadToken>), AppError> {
    let token = state.uploads.issue_token(request).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// `PUT /api/upload?token=...`
pub async fn upload_with_token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<StoredBlob>), AppError> {
    let token = params
        .token
        .ok_or_else(|| StorageError::InvalidToken("missing token".to_string()))?;
    let bytes = read_limited(&headers, body, TOKEN_UPLOAD_LIMIT).await?;
    let blob = state
        .uploads
        .upload_with_token(&token, content_type(&headers), &bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(blob)))
}

/// `POST /api/admin/upload?filename=...`
pub async fn upload_legacy(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LegacyParams>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<StoredBlob>), AppError> {
    let filename = params
        .filename
        .ok_or_else(|| ValidationError::MissingField("filename".to_string()))?;
    let bytes = read_limited(&headers, body, LEGACY_UPLOAD_LIMIT).await?;
    let blob = state
        .uploads
        .upload_legacy(&filename, content_type(&headers), &bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(blob)))
}
