//! Locale routing, the admin guard, and the localized page payloads.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;

use common::{ADMIN_KEY, TestApp, json_body, text_body};

fn location(response: &axum::http::Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn publish_post(app: &TestApp, locale: &str, slug: &str) {
    app.admin_json(
        "POST",
        &format!("/api/admin/blog-posts?locale={locale}"),
        Some(json!({
            "slug": slug,
            "title": "Designing with clinicians",
            "excerpt": "Notes from the ward",
            "contentHtml": "<p>Body</p>",
        })),
        StatusCode::CREATED,
    )
    .await;
}

#[tokio::test]
async fn test_unprefixed_paths_redirect_to_default_locale() {
    let app = TestApp::new().await;

    let root = app.get("/").await;
    assert_eq!(root.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&root), "/en");

    let about = app.get("/about/?ref=nav").await;
    assert_eq!(about.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&about), "/en/about?ref=nav");
}

#[tokio::test]
async fn test_unsupported_locale_is_404() {
    let app = TestApp::new().await;
    let response = app.get("/de/blog").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Not found");
}

#[tokio::test]
async fn test_missing_static_asset_is_json_404() {
    let app = TestApp::new().await;
    let response = app.get("/favicon.ico").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Not found");
}

#[tokio::test]
async fn test_bypassed_prefixes_are_not_redirected() {
    let app = TestApp::new().await;
    assert_eq!(app.get("/api/tags").await.status(), StatusCode::OK);
    assert_eq!(app.get("/health/live").await.status(), StatusCode::OK);
    assert_eq!(app.get("/robots.txt").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_guard() {
    let app = TestApp::new().await;

    let missing = app.get("/api/admin/session").await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .send(
            Request::builder()
                .uri("/api/admin/session")
                .header("x-api-key", "not-the-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let bearer = app
        .send(
            Request::builder()
                .uri("/api/admin/session")
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(bearer.status(), StatusCode::OK);

    let session = app
        .admin_json("GET", "/api/admin/session", None, StatusCode::OK)
        .await;
    assert!(session.is_object());
}

#[tokio::test]
async fn test_localized_pages() {
    let app = TestApp::new().await;
    publish_post(&app, "pl", "projektowanie").await;

    let home = json_body(app.get("/pl").await).await;
    assert_eq!(home["meta"]["lang"], "pl-PL");
    assert_eq!(home["meta"]["canonical"], "http://localhost:3000/pl");
    assert_eq!(home["latestPosts"][0]["slug"], "projektowanie");
    assert!(home["hero"].is_null());

    let post = app.get("/pl/blog/projektowanie").await;
    assert_eq!(post.status(), StatusCode::OK);
    let post = json_body(post).await;
    assert_eq!(post["item"]["slug"], "projektowanie");
    // Only the Polish translation exists, so there is no English alternate.
    let alternates = post["meta"]["alternates"].as_array().unwrap();
    assert_eq!(alternates.len(), 1);
    assert_eq!(alternates[0]["hreflang"], "pl-PL");

    // Content is per locale.
    assert_eq!(
        app.get("/en/blog/projektowanie").await.status(),
        StatusCode::NOT_FOUND
    );
    let index = json_body(app.get("/en/blog").await).await;
    assert!(index["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sitemap_and_robots() {
    let app = TestApp::new().await;
    publish_post(&app, "en", "clinician-notes").await;

    let sitemap = app.get("/sitemap.xml").await;
    assert_eq!(sitemap.status(), StatusCode::OK);
    let content_type = sitemap.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("application/xml"));
    let xml = text_body(sitemap).await;
    assert!(xml.contains("<loc>http://localhost:3000/en/blog/clinician-notes</loc>"));
    assert!(xml.contains("<loc>http://localhost:3000/pl</loc>"));
    assert!(!xml.contains("/pl/blog/clinician-notes"));

    let robots = text_body(app.get("/robots.txt").await).await;
    assert!(robots.contains("Sitemap: http://localhost:3000/sitemap.xml"));
}

#[tokio::test]
async fn test_message_catalogs() {
    let app = TestApp::new().await;

    let pl = json_body(app.get("/api/messages?locale=pl").await).await;
    assert_eq!(pl["nav"]["contact"], "Kontakt");

    let en = json_body(app.get("/api/messages?locale=en").await).await;
    assert_eq!(en["nav"]["blog"], "Blog");

    let missing = app.get("/api/messages").await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}
