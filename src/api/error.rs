//! HTTP mapping for application errors and JSON body extraction.

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::domain::{AppError, DatabaseError, ErrorResponse, StorageError};

impl AppError {
    /// Status code and generic message for this error.
    #[must_use]
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(db_err) => match db_err {
                DatabaseError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
                DatabaseError::Duplicate(_) => (StatusCode::CONFLICT, "Already exists"),
                DatabaseError::Connection(_) | DatabaseError::PoolExhausted(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            },
            AppError::Storage(storage_err) => match storage_err {
                StorageError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "File too large"),
                StorageError::UnsupportedType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported file type")
                }
                StorageError::InvalidToken(_) | StorageError::TokenExpired => {
                    (StatusCode::UNAUTHORIZED, "Invalid upload token")
                }
                StorageError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "Invalid upload path"),
                StorageError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
            },
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error"),
            AppError::Deserialization(_) => (StatusCode::BAD_REQUEST, "Malformed request body"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            AppError::NotSupported(_) => (StatusCode::NOT_IMPLEMENTED, "Not supported"),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status();
        let details = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %details, "Server error");
        }

        let body = ErrorResponse::new(message).with_details(details);
        (status, Json(body)).into_response()
    }
}

/// `Json<T>` whose rejections use the JSON error body.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Deserialization(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use http_body_util::BodyExt;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_of(AppError::not_found("blog post 'x'")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
        assert!(body["details"].as_str().unwrap().contains("blog post 'x'"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::duplicate("slug"), StatusCode::CONFLICT),
            (
                AppError::Validation(ValidationError::MissingField("locale".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Authentication("missing".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                StorageError::TooLarge { size: 2, limit: 1 }.into(),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                StorageError::UnsupportedType("text/html".to_string()).into(),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (StorageError::TokenExpired.into(), StatusCode::UNAUTHORIZED),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                DatabaseError::Connection("refused".to_string()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status().0, expected, "{err:?}");
        }
    }
}
