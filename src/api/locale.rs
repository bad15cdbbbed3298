//! Locale resolution: the `?locale=` query extractor and the path-prefix
//! routing middleware for localized pages.

use axum::{
    body::Body,
    extract::{FromRequestParts, Path, Query},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{AppError, Locale, ValidationError};

#[derive(Debug, Deserialize)]
struct LocaleParams {
    locale: Option<String>,
}

/// Required `locale` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleQuery(pub Locale);

impl<S> FromRequestParts<S> for LocaleQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<LocaleParams>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::Validation(ValidationError::InvalidFormat(e.body_text())))?;
        let raw = params
            .locale
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| ValidationError::MissingField("locale".to_string()))?;
        Ok(Self(raw.parse()?))
    }
}

/// Path parameters of a localized page.
///
/// A first segment that is not a locale (a missing `/favicon.ico`, say)
/// is a missing page rather than a malformed request.
#[derive(Debug, Clone)]
pub struct PagePath<T>(pub T);

impl<T, S> FromRequestParts<S> for PagePath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(path = %parts.uri.path(), reason = %rejection.body_text(), "no such page");
                Err(AppError::not_found(format!("page '{}'", parts.uri.path())))
            }
        }
    }
}

const BYPASS_PREFIXES: [&str; 5] = ["/api", "/admin", "/health", "/metrics", "/uploads"];
const BYPASS_EXACT: [&str; 2] = ["/sitemap.xml", "/robots.txt"];

/// Where a request path should go.
#[derive(Debug, PartialEq, Eq)]
pub enum LocaleRoute {
    /// Not a localized page; route as-is.
    Bypass,
    /// Already carries a supported locale prefix.
    Localized(Locale),
    /// Looks like a locale prefix but is not one we serve.
    Unsupported(String),
    /// Needs the default locale prefix.
    Redirect(String),
}

fn has_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn is_static_asset(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.') && !segment.ends_with('.'))
}

/// Classifies a request path and query.
#[must_use]
pub fn resolve(path: &str, query: Option<&str>) -> LocaleRoute {
    if BYPASS_PREFIXES.iter().any(|p| has_prefix(path, p))
        || BYPASS_EXACT.contains(&path)
        || is_static_asset(path)
    {
        return LocaleRoute::Bypass;
    }

    let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
    match first {
        "" => return LocaleRoute::Redirect(format!("/{}", Locale::DEFAULT)),
        "en" => return LocaleRoute::Localized(Locale::En),
        "pl" => return LocaleRoute::Localized(Locale::Pl),
        _ => {}
    }
    if first.len() == 2 && first.bytes().all(|b| b.is_ascii_alphabetic()) {
        return LocaleRoute::Unsupported(first.to_string());
    }

    let mut target = format!("/{}{}", Locale::DEFAULT, path.trim_end_matches('/'));
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(q);
    }
    LocaleRoute::Redirect(target)
}

/// Ensures every page URL carries a supported locale prefix.
pub async fn locale_middleware(request: Request<Body>, next: Next) -> Response {
    match resolve(request.uri().path(), request.uri().query()) {
        LocaleRoute::Bypass | LocaleRoute::Localized(_) => next.run(request).await,
        LocaleRoute::Unsupported(code) => {
            debug!(%code, "unsupported locale prefix");
            AppError::not_found(format!("locale '{code}'")).into_response()
        }
        LocaleRoute::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}
