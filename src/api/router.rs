//! HTTP routing with per-IP rate limiting, locale routing and the admin guard.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use governor::{Quota, RateLimiter};
use metrics::counter;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::app::{AppState, ContentServices, ServiceFor};
use crate::config::RateLimitConfig;
use crate::domain::upload::TOKEN_UPLOAD_LIMIT;
use crate::domain::{
    Advisors, AppError, Banners, BlogPosts, CaseStudies, CaseStudySliders, Heroes,
    RateLimitResponse, Resource, Services, StorageError, Testimonials, Updates, YouTubeEmbeds,
};

use super::handlers::{
    admin, catalog, content, health_check_handler, liveness_handler, metrics_handler,
    pages, readiness_handler, robots_handler, uploads,
};
use super::locale::locale_middleware;
use super::middleware::admin_auth_middleware;

/// Just above the token upload ceiling, so upload handlers report the exact limit.
const BODY_LIMIT: usize = TOKEN_UPLOAD_LIMIT + 64 * 1024;

/// Where uploaded files live and the URL prefix they are served under.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub upload_dir: PathBuf,
    pub upload_public_path: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            upload_public_path: "/uploads".to_string(),
        }
    }
}

type KeyedLimiter = RateLimiter<
    IpAddr,
    governor::state::keyed::DashMapStateStore<IpAddr>,
    governor::clock::DefaultClock,
>;

/// Shared rate limiter state (keyed by client IP to prevent global DoS)
pub struct RateLimitState {
    public_limiter: KeyedLimiter,
    health_limiter: KeyedLimiter,
    config: RateLimitConfig,
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl RateLimitState {
    /// Zero rates or bursts are raised to one.
    pub fn new(config: RateLimitConfig) -> Self {
        let public_quota = Quota::per_second(non_zero(config.general_rps))
            .allow_burst(non_zero(config.general_burst));
        let health_quota = Quota::per_second(non_zero(config.health_rps))
            .allow_burst(non_zero(config.health_burst));

        Self {
            public_limiter: RateLimiter::dashmap(public_quota),
            health_limiter: RateLimiter::dashmap(health_quota),
            config,
        }
    }
}

/// Extract client IP from request (X-Forwarded-For, X-Real-IP, or ConnectInfo).
/// Unknown clients share one bucket.
fn client_ip_from_request<B>(request: &Request<B>) -> IpAddr {
    // Client is first in X-Forwarded-For
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return ip;
    }
    let real_ip = request
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real_ip {
        return ip;
    }
    if let Some(addr) = request
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
    {
        return addr.0.ip();
    }
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

type ClockInstant = <governor::clock::DefaultClock as governor::clock::Clock>::Instant;

fn retry_after_secs(not_until: &governor::NotUntil<ClockInstant>) -> u64 {
    let wait = not_until.wait_time_from(governor::clock::Clock::now(
        &governor::clock::DefaultClock::default(),
    ));
    wait.as_secs().max(1)
}

fn too_many_requests(scope: &'static str, limit: u32, retry_after: u64) -> Response {
    counter!("rate_limited_total", "scope" => scope).increment(1);
    let body = RateLimitResponse {
        error: AppError::RateLimited.status().1.to_string(),
        details: Some("Please slow down your requests.".to_string()),
        retry_after,
    };
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
    headers.insert("Retry-After", HeaderValue::from(retry_after));
    response
}

/// Rate limit middleware for public and upload endpoints
async fn rate_limit_public_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = client_ip_from_request(&request);
    let limit = rate_limit.config.general_rps;
    match rate_limit.public_limiter.check_key(&client_ip) {
        Ok(_) => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("X-RateLimit-Limit", HeaderValue::from(limit));
            response
        }
        Err(not_until) => too_many_requests("public", limit, retry_after_secs(&not_until)),
    }
}

/// Rate limit middleware for health endpoints
async fn rate_limit_health_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = client_ip_from_request(&request);
    match rate_limit.health_limiter.check_key(&client_ip) {
        Ok(_) => next.run(request).await,
        Err(not_until) => too_many_requests(
            "health",
            rate_limit.config.health_rps,
            retry_after_secs(&not_until),
        ),
    }
}

async fn not_found_fallback() -> AppError {
    AppError::not_found("route")
}

/// Rewrites the body-limit layer's plain-text 413 as a JSON error.
async fn body_limit_middleware(request: Request<Body>, next: Next) -> Response {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    let response = next.run(request).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE
        || response.headers().get(header::CONTENT_TYPE)
            == Some(&HeaderValue::from_static("application/json"))
    {
        return response;
    }
    AppError::from(StorageError::TooLarge {
        size: declared.unwrap_or(BODY_LIMIT + 1),
        limit: BODY_LIMIT,
    })
    .into_response()
}

type StateRouter = Router<Arc<AppState>>;

fn public_resource<R: Resource>(router: StateRouter, path: &str) -> StateRouter
where
    ContentServices: ServiceFor<R>,
{
    router
        .route(&format!("/api/{path}"), get(content::list_public::<R>))
        .route(&format!("/api/{path}/{{key}}"), get(content::get_public::<R>))
}

fn admin_resource<R: Resource>(router: StateRouter, path: &str) -> StateRouter
where
    ContentServices: ServiceFor<R>,
{
    router
        .route(
            &format!("/{path}"),
            get(content::admin_list::<R>).post(content::admin_create::<R>),
        )
        .route(
            &format!("/{path}/{{id}}"),
            get(content::admin_get::<R>)
                .put(content::admin_update::<R>)
                .delete(content::admin_delete::<R>),
        )
}

fn public_routes() -> StateRouter {
    let mut router = Router::new()
        .route("/api/banners/active", get(content::active_banner))
        .route("/api/blog-posts/pinned", get(content::pinned_post))
        .route("/api/hero", get(content::singleton_get::<Heroes>))
        .route("/api/youtube", get(content::singleton_get::<YouTubeEmbeds>));
    router = public_resource::<CaseStudies>(router, "case-studies");
    router = public_resource::<CaseStudySliders>(router, "case-study-sliders");
    router = public_resource::<Testimonials>(router, "testimonials");
    router = public_resource::<BlogPosts>(router, "blog-posts");
    router = public_resource::<Banners>(router, "banners");
    router = public_resource::<Updates>(router, "updates");
    router = public_resource::<Services>(router, "services");
    router = public_resource::<Advisors>(router, "advisors");

    router
        .route("/api/apps", get(catalog::list_apps))
        .route("/api/apps/{id}", get(catalog::get_app))
        .route("/api/apps/{id}/ratings", post(catalog::submit_rating))
        .route("/api/tags", get(catalog::list_tags))
        .route("/api/messages", get(pages::messages))
        .route("/api/upload", put(uploads::upload_with_token))
        .route("/{locale}", get(pages::home))
        .route("/{locale}/blog", get(pages::blog_index))
        .route("/{locale}/blog/{slug}", get(pages::blog_post))
        .route("/{locale}/case-studies/{slug}", get(pages::case_study))
        .route("/{locale}/updates/{slug}", get(pages::update))
        .route("/{locale}/services/{slug}", get(pages::service))
        .route("/sitemap.xml", get(pages::sitemap))
        .route("/robots.txt", get(robots_handler))
        .route("/metrics", get(metrics_handler))
}

fn admin_routes(state: &Arc<AppState>) -> StateRouter {
    let mut router = Router::new()
        .route("/session", get(admin::session))
        .route("/revalidate", post(admin::revalidate_all))
        .route("/revalidate/{tag}", post(admin::revalidate_tag))
        .route(
            "/hero",
            get(content::singleton_get::<Heroes>).put(content::singleton_put::<Heroes>),
        )
        .route(
            "/youtube",
            get(content::singleton_get::<YouTubeEmbeds>)
                .put(content::singleton_put::<YouTubeEmbeds>),
        )
        .route("/blog-posts/{id}/pin", post(content::pin_post));
    router = admin_resource::<CaseStudies>(router, "case-studies");
    router = admin_resource::<CaseStudySliders>(router, "case-study-sliders");
    router = admin_resource::<Testimonials>(router, "testimonials");
    router = admin_resource::<BlogPosts>(router, "blog-posts");
    router = admin_resource::<Banners>(router, "banners");
    router = admin_resource::<Updates>(router, "updates");
    router = admin_resource::<Services>(router, "services");
    router = admin_resource::<Advisors>(router, "advisors");

    router
        .route("/apps", post(catalog::create_app))
        .route(
            "/apps/{id}",
            put(catalog::update_app).delete(catalog::delete_app),
        )
        .route("/apps/{id}/screenshots", post(catalog::add_screenshot))
        .route(
            "/apps/{id}/screenshots/{screenshot_id}",
            axum::routing::delete(catalog::delete_screenshot),
        )
        .route("/apps/{id}/tags", put(catalog::set_app_tags))
        .route("/tags", post(catalog::create_tag))
        .route("/tags/{id}", axum::routing::delete(catalog::delete_tag))
        .route("/upload/token", post(uploads::issue_token))
        .route("/upload", post(uploads::upload_legacy))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(state),
            admin_auth_middleware,
        ))
}

fn health_routes() -> StateRouter {
    Router::new()
        .route("/", get(health_check_handler))
        .route("/live", get(liveness_handler))
        .route("/ready", get(readiness_handler))
}

fn assemble(
    state: Arc<AppState>,
    config: &RouterConfig,
    public: StateRouter,
    health: StateRouter,
) -> Router {
    let layers = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ));

    Router::new()
        .merge(public)
        .nest("/api/admin", admin_routes(&state))
        .nest("/health", health)
        .nest_service(
            &config.upload_public_path,
            ServeDir::new(&config.upload_dir),
        )
        .fallback(not_found_fallback)
        .layer(middleware::from_fn(locale_middleware))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(body_limit_middleware))
        .layer(layers)
        .with_state(state)
}

/// Create router without rate limiting
pub fn create_router(app_state: Arc<AppState>, config: &RouterConfig) -> Router {
    assemble(app_state, config, public_routes(), health_routes())
}

/// Create router with per-IP rate limiting on public, upload and health routes
pub fn create_router_with_rate_limit(
    app_state: Arc<AppState>,
    config: &RouterConfig,
    rate_limit: RateLimitConfig,
) -> Router {
    let rate_limit_state = Arc::new(RateLimitState::new(rate_limit));

    let public = public_routes().route_layer(middleware::from_fn_with_state(
        Arc::clone(&rate_limit_state),
        rate_limit_public_middleware,
    ));
    let health = health_routes().route_layer(middleware::from_fn_with_state(
        Arc::clone(&rate_limit_state),
        rate_limit_health_middleware,
    ));

    assemble(app_state, config, public, health)
}
