//! HTTP middleware for API layer.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::app::AppState;

/// Credentials from `Authorization: Bearer <token>`, else `x-api-key`.
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    bearer
        .or_else(|| headers.get("x-api-key").and_then(|v| v.to_str().ok()))
        .filter(|t| !t.is_empty())
}

/// Admin guard for every `/api/admin` route.
///
/// Resolves the caller through the configured [`AuthProvider`] and stores
/// the resulting [`Session`] in the request extensions. Missing or invalid
/// credentials get a 401 JSON error.
///
/// [`AuthProvider`]: crate::domain::AuthProvider
/// [`Session`]: crate::domain::Session
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = presented_token(request.headers()).map(str::to_owned);
    match state.auth.authenticate(token.as_deref()).await {
        Ok(session) => {
            debug!(subject = %session.subject, provider = %session.provider, "admin authenticated");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
