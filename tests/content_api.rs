//! Localized content CRUD through the HTTP API.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, json_body};

fn post(slug: &str, pinned: bool) -> serde_json::Value {
    json!({
        "slug": slug,
        "title": format!("Post {slug}"),
        "excerpt": "Short summary",
        "contentHtml": "<p>Body</p>",
        "isPinned": pinned,
    })
}

#[tokio::test]
async fn test_blog_post_lifecycle() {
    let app = TestApp::new().await;

    let created = app
        .admin_json(
            "POST",
            "/api/admin/blog-posts?locale=en",
            Some(post("first-post", false)),
            StatusCode::CREATED,
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("post_"));
    assert_eq!(created["slug"], "first-post");

    // Public read by slug and by id.
    let by_slug = app.get("/api/blog-posts/first-post?locale=en").await;
    assert_eq!(by_slug.status(), StatusCode::OK);
    let by_id = app.get(&format!("/api/blog-posts/{id}?locale=en")).await;
    assert_eq!(json_body(by_id).await["slug"], "first-post");

    // Locales are separate tables.
    let pl = json_body(app.get("/api/blog-posts?locale=pl").await).await;
    assert_eq!(pl.as_array().unwrap().len(), 0);

    let mut changed = post("first-post", false);
    changed["title"] = json!("Renamed");
    let updated = app
        .admin_json(
            "PUT",
            &format!("/api/admin/blog-posts/{id}?locale=en"),
            Some(changed),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    // The cached public list reflects the write.
    let list = json_body(app.get("/api/blog-posts?locale=en").await).await;
    assert_eq!(list[0]["title"], "Renamed");

    let deleted = app
        .admin("DELETE", &format!("/api/admin/blog-posts/{id}?locale=en"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app.get("/api/blog-posts/first-post?locale=en").await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_or_invalid_locale_is_400() {
    let app = TestApp::new().await;

    for uri in ["/api/blog-posts", "/api/case-studies?locale=de", "/api/hero?locale="] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = json_body(response).await;
        assert!(body["error"].is_string());
        assert!(body["details"].as_str().unwrap().contains("locale"));
    }
}

#[tokio::test]
async fn test_delete_missing_id_is_404() {
    let app = TestApp::new().await;
    let response = app
        .admin("DELETE", "/api/admin/services/service_nope?locale=en", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Not found");
}

#[tokio::test]
async fn test_duplicate_slug_is_409() {
    let app = TestApp::new().await;
    app.admin_json(
        "POST",
        "/api/admin/blog-posts?locale=en",
        Some(post("same", false)),
        StatusCode::CREATED,
    )
    .await;
    let response = app
        .admin("POST", "/api/admin/blog-posts?locale=en", Some(post("same", false)))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Same slug in the other locale is fine.
    app.admin_json(
        "POST",
        "/api/admin/blog-posts?locale=pl",
        Some(post("same", false)),
        StatusCode::CREATED,
    )
    .await;
}

#[tokio::test]
async fn test_invalid_body_is_400() {
    let app = TestApp::new().await;

    let bad_slug = app
        .admin(
            "POST",
            "/api/admin/blog-posts?locale=en",
            Some(post("Not A Slug", false)),
        )
        .await;
    assert_eq!(bad_slug.status(), StatusCode::BAD_REQUEST);

    let malformed = app
        .admin(
            "POST",
            "/api/admin/testimonials?locale=en",
            Some(json!({ "quote": 42 })),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(malformed).await["error"], "Malformed request body");
}

#[tokio::test]
async fn test_pinning_keeps_one_pinned_post() {
    let app = TestApp::new().await;
    let first = app
        .admin_json(
            "POST",
            "/api/admin/blog-posts?locale=en",
            Some(post("one", true)),
            StatusCode::CREATED,
        )
        .await;
    let second = app
        .admin_json(
            "POST",
            "/api/admin/blog-posts?locale=en",
            Some(post("two", false)),
            StatusCode::CREATED,
        )
        .await;

    let pinned = json_body(app.get("/api/blog-posts/pinned?locale=en").await).await;
    assert_eq!(pinned["id"], first["id"]);

    let second_id = second["id"].as_str().unwrap();
    app.admin_json(
        "POST",
        &format!("/api/admin/blog-posts/{second_id}/pin?locale=en"),
        None,
        StatusCode::OK,
    )
    .await;

    let all = app
        .admin_json("GET", "/api/admin/blog-posts?locale=en", None, StatusCode::OK)
        .await;
    let pinned_ids: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["isPinned"] == true)
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(pinned_ids, vec![second_id]);

    let missing = app
        .admin("POST", "/api/admin/blog-posts/post_nope/pin?locale=en", None)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_hero_singleton_upsert() {
    let app = TestApp::new().await;

    let empty = json_body(app.get("/api/hero?locale=pl").await).await;
    assert!(empty.is_null());

    let hero = json!({ "title": "Projektujemy zdrowie", "subtitle": "Studio" });
    let saved = app
        .admin_json("PUT", "/api/admin/hero?locale=pl", Some(hero), StatusCode::OK)
        .await;
    assert_eq!(saved["id"], "hero_pl_1");

    let again = app
        .admin_json(
            "PUT",
            "/api/admin/hero?locale=pl",
            Some(json!({ "title": "Nowy tytuł" })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(again["id"], "hero_pl_1");

    let current = json_body(app.get("/api/hero?locale=pl").await).await;
    assert_eq!(current["title"], "Nowy tytuł");
    assert!(json_body(app.get("/api/hero?locale=en").await).await.is_null());
}

#[tokio::test]
async fn test_active_banner() {
    let app = TestApp::new().await;
    app.admin_json(
        "POST",
        "/api/admin/banners?locale=en",
        Some(json!({ "title": "Off", "isActive": false })),
        StatusCode::CREATED,
    )
    .await;
    assert!(
        json_body(app.get("/api/banners/active?locale=en").await)
            .await
            .is_null()
    );

    app.admin_json(
        "POST",
        "/api/admin/banners?locale=en",
        Some(json!({ "title": "On", "isActive": true })),
        StatusCode::CREATED,
    )
    .await;
    let active = json_body(app.get("/api/banners/active?locale=en").await).await;
    assert_eq!(active["title"], "On");
}

#[tokio::test]
async fn test_unpublished_service_hidden_from_public() {
    let app = TestApp::new().await;
    app.admin_json(
        "POST",
        "/api/admin/services?locale=en",
        Some(json!({ "slug": "draft", "title": "Draft", "isPublished": false })),
        StatusCode::CREATED,
    )
    .await;

    assert_eq!(
        app.get("/api/services/draft?locale=en").await.status(),
        StatusCode::NOT_FOUND
    );
    let admin_list = app
        .admin_json("GET", "/api/admin/services?locale=en", None, StatusCode::OK)
        .await;
    assert_eq!(admin_list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_revalidate_endpoints() {
    let app = TestApp::new().await;

    let all = app
        .admin_json("POST", "/api/admin/revalidate", None, StatusCode::OK)
        .await;
    assert_eq!(all["revalidated"].as_array().unwrap().len(), 12);

    let one = app
        .admin_json("POST", "/api/admin/revalidate/tags", None, StatusCode::OK)
        .await;
    assert_eq!(one["revalidated"], json!(["tags", "apps"]));

    let unknown = app.admin("POST", "/api/admin/revalidate/nope", None).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}
