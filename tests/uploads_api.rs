//! Token and legacy upload flows against a temporary upload directory.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};

use common::{ADMIN_KEY, TestApp, json_body};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

async fn issue_token(app: &TestApp, pathname: &str, content_type: &str) -> Value {
    app.admin_json(
        "POST",
        "/api/admin/upload/token",
        Some(json!({ "pathname": pathname, "contentType": content_type })),
        StatusCode::CREATED,
    )
    .await
}

fn put_upload(uri: &str, content_type: &str, body: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_token_upload_is_stored_and_served() {
    let app = TestApp::new().await;
    let issued = issue_token(&app, "Blog/Cover Image.png", "image/png").await;
    assert_eq!(issued["grant"]["pathname"], "blog/coverimage");

    let upload_url = issued["uploadUrl"].as_str().unwrap();
    let response = app.send(put_upload(upload_url, "image/png", PNG_BYTES)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let blob = json_body(response).await;
    let pathname = blob["pathname"].as_str().unwrap();
    assert!(pathname.starts_with("blog/coverimage-"));
    assert!(pathname.ends_with(".png"));
    assert_eq!(blob["size"], PNG_BYTES.len());
    assert!(app.upload_dir.path().join(pathname).is_file());

    let served = app.get(blob["url"].as_str().unwrap()).await;
    assert_eq!(served.status(), StatusCode::OK);
    let bytes = served.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], PNG_BYTES);
}

#[tokio::test]
async fn test_token_upload_rejects_bad_tokens() {
    let app = TestApp::new().await;

    let missing = app.send(put_upload("/api/upload", "image/png", PNG_BYTES)).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let first = issue_token(&app, "a.png", "image/png").await;
    let second = issue_token(&app, "b.png", "image/png").await;
    let (payload, _) = first["token"].as_str().unwrap().split_once('.').unwrap();
    let (_, signature) = second["token"].as_str().unwrap().split_once('.').unwrap();

    let forged = format!("/api/upload?token={payload}.{signature}");
    let response = app.send(put_upload(&forged, "image/png", PNG_BYTES)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .send(put_upload("/api/upload?token=nonsense", "image/png", PNG_BYTES))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_upload_enforces_content_type() {
    let app = TestApp::new().await;

    let pdf = app
        .admin(
            "POST",
            "/api/admin/upload/token",
            Some(json!({ "pathname": "doc.pdf", "contentType": "application/pdf" })),
        )
        .await;
    assert_eq!(pdf.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let issued = issue_token(&app, "cover.png", "image/png").await;
    let response = app
        .send(put_upload(
            issued["uploadUrl"].as_str().unwrap(),
            "image/jpeg",
            PNG_BYTES,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_legacy_upload() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/admin/upload?filename=team/portrait.webp")
                .header("x-api-key", ADMIN_KEY)
                .header(header::CONTENT_TYPE, "image/webp")
                .body(Body::from(PNG_BYTES))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let blob = json_body(response).await;
    assert!(blob["url"].as_str().unwrap().starts_with("/uploads/team/portrait-"));
    assert_eq!(blob["contentType"], "image/webp");
}

#[tokio::test]
async fn test_legacy_upload_limits() {
    let app = TestApp::new().await;

    let oversize = vec![0u8; 5 * 1024 * 1024 + 1];
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/admin/upload?filename=big.png")
                .header("x-api-key", ADMIN_KEY)
                .header(header::CONTENT_TYPE, "image/png")
                .header(header::CONTENT_LENGTH, oversize.len())
                .body(Body::from(oversize))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let no_name = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/admin/upload")
                .header("x-api-key", ADMIN_KEY)
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(PNG_BYTES))
                .unwrap(),
        )
        .await;
    assert_eq!(no_name.status(), StatusCode::BAD_REQUEST);

    let unauthenticated = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/admin/upload?filename=x.png")
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(PNG_BYTES))
                .unwrap(),
        )
        .await;
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_body_over_router_limit_is_json_413() {
    let app = TestApp::new().await;
    let oversize = vec![0u8; 11 * 1024 * 1024];
    let response = app
        .send(
            Request::builder()
                .method("PUT")
                .uri("/api/upload?token=x")
                .header(header::CONTENT_TYPE, "image/png")
                .header(header::CONTENT_LENGTH, oversize.len())
                .body(Body::from(oversize))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert!(body["details"].as_str().unwrap().contains("11534336"));
}
