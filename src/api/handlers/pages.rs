//! Localized page payloads under `/{locale}`, plus the sitemap and
//! message catalogs.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde_json::Value;

use crate::api::locale::{LocaleQuery, PagePath};
use crate::app::AppState;
use crate::app::i18n;
use crate::app::pages::{DetailPage, HomePage, ListPage};
use crate::domain::{AppError, BlogPost, CaseStudy, Locale, Service, Update};

pub async fn home(
    State(state): State<Arc<AppState>>,
    PagePath(locale): PagePath<Locale>,
) -> Result<Json<HomePage>, AppError> {
    Ok(Json(state.pages.home(locale).await?))
}

pub async fn blog_index(
    State(state): State<Arc<AppState>>,
    PagePath(locale): PagePath<Locale>,
) -> Result<Json<ListPage<BlogPost>>, AppError> {
    Ok(Json(state.pages.blog_index(locale).await?))
}

pub async fn blog_post(
    State(state): State<Arc<AppState>>,
    PagePath((locale, slug)): PagePath<(Locale, String)>,
) -> Result<Json<DetailPage<BlogPost>>, AppError> {
    Ok(Json(state.pages.blog_post(locale, &slug).await?))
}

pub async fn case_study(
    State(state): State<Arc<AppState>>,
    PagePath((locale, slug)): PagePath<(Locale, String)>,
) -> Result<Json<DetailPage<CaseStudy>>, AppError> {
    Ok(Json(state.pages.case_study(locale, &slug).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    PagePath((locale, slug)): PagePath<(Locale, String)>,
) -> Result<Json<DetailPage<Update>>, AppError> {
    Ok(Json(state.pages.update(locale, &slug).await?))
}

pub async fn service(
    State(state): State<Arc<AppState>>,
    PagePath((locale, slug)): PagePath<(Locale, String)>,
) -> Result<Json<DetailPage<Service>>, AppError> {
    Ok(Json(state.pages.service(locale, &slug).await?))
}

/// `GET /api/messages?locale=xx`
pub async fn messages(LocaleQuery(locale): LocaleQuery) -> Json<&'static Value> {
    Json(i18n::messages(locale))
}

pub async fn sitemap(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let xml = state.pages.sitemap().await?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}
