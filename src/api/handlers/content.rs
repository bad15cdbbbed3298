//! Generic handlers for the localized content resources.
//!
//! Every handler is generic over [`Resource`] and picks its service through
//! [`ServiceFor`], so a route is registered as e.g.
//! `get(list_public::<BlogPosts>)`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::api::error::JsonBody;
use crate::api::locale::LocaleQuery;
use crate::app::{AppState, ContentService, ContentServices, ServiceFor};
use crate::domain::{AppError, Banner, BlogPost, Resource};

fn service<R: Resource>(state: &AppState) -> &ContentService<R>
where
    ContentServices: ServiceFor<R>,
{
    <ContentServices as ServiceFor<R>>::service(&state.content)
}

/// `GET /api/<resource>?locale=xx`: published records only.
pub async fn list_public<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
) -> Result<Json<Vec<R::Model>>, AppError>
where
    ContentServices: ServiceFor<R>,
{
    Ok(Json(service::<R>(&state).list_public(locale).await?))
}

/// `GET /api/<resource>/{key}?locale=xx`, where `key` is a slug or an id.
pub async fn get_public<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
    Path(key): Path<String>,
) -> Result<Json<R::Model>, AppError>
where
    ContentServices: ServiceFor<R>,
{
    service::<R>(&state)
        .list_public(locale)
        .await?
        .into_iter()
        .find(|m| R::slug(m) == Some(key.as_str()) || R::id(m) == key)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("{} '{key}'", R::NAME)))
}

/// `GET /api/admin/<resource>?locale=xx`: every record, drafts included.
pub async fn admin_list<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
) -> Result<Json<Vec<R::Model>>, AppError>
where
    ContentServices: ServiceFor<R>,
{
    Ok(Json(service::<R>(&state).list(locale).await?))
}

pub async fn admin_get<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
    Path(id): Path<String>,
) -> Result<Json<R::Model>, AppError>
where
    ContentServices: ServiceFor<R>,
{
    Ok(Json(service::<R>(&state).get(locale, &id).await?))
}

pub async fn admin_create<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
    JsonBody(input): JsonBody<R::Input>,
) -> Result<(StatusCode, Json<R::Model>), AppError>
where
    ContentServices: ServiceFor<R>,
{
    let model = service::<R>(&state).create(locale, input).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn admin_update<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<R::Input>,
) -> Result<Json<R::Model>, AppError>
where
    ContentServices: ServiceFor<R>,
{
    Ok(Json(service::<R>(&state).update(locale, &id, input).await?))
}

pub async fn admin_delete<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    ContentServices: ServiceFor<R>,
{
    service::<R>(&state).delete(locale, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Singleton read (`hero`, `youtube`); `null` until one is saved.
pub async fn singleton_get<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
) -> Result<Json<Option<R::Model>>, AppError>
where
    ContentServices: ServiceFor<R>,
{
    Ok(Json(service::<R>(&state).current(locale).await?))
}

pub async fn singleton_put<R: Resource>(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
    JsonBody(input): JsonBody<R::Input>,
) -> Result<Json<R::Model>, AppError>
where
    ContentServices: ServiceFor<R>,
{
    Ok(Json(service::<R>(&state).upsert(locale, input).await?))
}

/// `GET /api/banners/active?locale=xx`
pub async fn active_banner(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
) -> Result<Json<Option<Banner>>, AppError> {
    Ok(Json(state.content.banners.active(locale, Utc::now()).await?))
}

/// `GET /api/blog-posts/pinned?locale=xx`
pub async fn pinned_post(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
) -> Result<Json<Option<BlogPost>>, AppError> {
    Ok(Json(state.content.blog_posts.pinned(locale).await?))
}

/// `POST /api/admin/blog-posts/{id}/pin?locale=xx`
pub async fn pin_post(
    State(state): State<Arc<AppState>>,
    LocaleQuery(locale): LocaleQuery,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(state.content.blog_posts.pin(locale, &id).await?))
}
