//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use studio_content_api::api::{RouterConfig, create_router};
use studio_content_api::app::{ApiKeyAuthProvider, AppState};
use studio_content_api::infra::LocalBlobStore;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Router over the in-memory backend with uploads in a temporary directory.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let upload_dir = TempDir::new().unwrap();
        let store = Arc::new(
            LocalBlobStore::new(upload_dir.path(), "/uploads")
                .await
                .unwrap(),
        );
        let auth = Arc::new(ApiKeyAuthProvider::new(&SecretString::from(ADMIN_KEY)));
        let state = Arc::new(AppState::in_memory(auth, store));
        let config = RouterConfig {
            upload_dir: upload_dir.path().to_path_buf(),
            upload_public_path: "/uploads".to_string(),
        };
        let router = create_router(Arc::clone(&state), &config);
        Self {
            router,
            state,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", ADMIN_KEY);
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Sends an admin request and returns the JSON body, asserting the status.
    pub async fn admin_json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let response = self.admin(method, uri, body).await;
        assert_eq!(response.status(), expected, "{method} {uri}");
        json_body(response).await
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
