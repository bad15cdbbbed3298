use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::error::JsonBody;
use crate::app::AppState;
use crate::domain::{
    App, AppError, AppInput, AppTagsInput, RatingInput, RatingSummary, Screenshot,
    ScreenshotInput, Tag, TagInput,
};

pub async fn list_apps(State(state): State<Arc<AppState>>) -> Result<Json<Vec<App>>, AppError> {
    Ok(Json(state.catalog.list_apps().await?))
}

/// Looks an app up by id or slug.
pub async fn get_app(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<App>, AppError> {
    Ok(Json(state.catalog.find_app(&key).await?))
}

pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(state.catalog.list_tags().await?))
}

pub async fn submit_rating(
    State(state): State<Arc<AppState>>,
    Path(app_id): Path<String>,
    JsonBody(input): JsonBody<RatingInput>,
) -> Result<(StatusCode, Json<RatingSummary>), AppError> {
    let summary = state.catalog.submit_rating(&app_id, input).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn create_app(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<AppInput>,
) -> Result<(StatusCode, Json<App>), AppError> {
    let app = state.catalog.create_app(input).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

pub async fn update_app(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<AppInput>,
) -> Result<Json<App>, AppError> {
    Ok(Json(state.catalog.update_app(&id, input).await?))
}

pub async fn delete_app(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_app(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_screenshot(
    State(state): State<Arc<AppState>>,
    Path(app_id): Path<String>,
    JsonBody(input): JsonBody<ScreenshotInput>,
) -> Result<(StatusCode, Json<Screenshot>), AppError> {
    let screenshot = state.catalog.add_screenshot(&app_id, input).await?;
    Ok((StatusCode::CREATED, Json(screenshot)))
}

pub async fn delete_screenshot(
    State(state): State<Arc<AppState>>,
    Path((app_id, screenshot_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .catalog
        .delete_screenshot(&app_id, &screenshot_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_app_tags(
    State(state): State<Arc<AppState>>,
    Path(app_id): Path<String>,
    JsonBody(input): JsonBody<AppTagsInput>,
) -> Result<Json<App>, AppError> {
    Ok(Json(state.catalog.set_app_tags(&app_id, input).await?))
}

pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<TagInput>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let tag = state.catalog.create_tag(input).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_tag(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
