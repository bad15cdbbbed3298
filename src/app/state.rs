//! Application state management.
//!
//! This module provides the shared application state that is
//! accessible to all request handlers via Axum's State extractor.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::domain::{
    Advisors, AppCatalogRepository, AuthProvider, Banners, BlobStore, BlogPosts, CaseStudies,
    CaseStudySliders, ContentRepository, HealthCheck, Heroes, Services, Testimonials, Updates,
    YouTubeEmbeds,
};
use crate::infra::database::{PgCatalogRepository, PgRepository, PgSliderRepository, PostgresClient};
use crate::infra::memory::{MemoryCatalog, MemoryContentRepository, MemoryHealth};
use crate::infra::observability::PrometheusHandle;
use crate::infra::storage::UploadTokenSigner;

use super::cache::TagCache;
use super::catalog::AppCatalogService;
use super::content::ContentServices;
use super::pages::PageService;
use super::uploads::UploadService;

/// Persistence backends for every entity, behind their traits.
#[derive(Clone)]
pub struct Repositories {
    pub case_studies: Arc<dyn ContentRepository<CaseStudies>>,
    pub case_study_sliders: Arc<dyn ContentRepository<CaseStudySliders>>,
    pub testimonials: Arc<dyn ContentRepository<Testimonials>>,
    pub blog_posts: Arc<dyn ContentRepository<BlogPosts>>,
    pub banners: Arc<dyn ContentRepository<Banners>>,
    pub hero: Arc<dyn ContentRepository<Heroes>>,
    pub updates: Arc<dyn ContentRepository<Updates>>,
    pub services: Arc<dyn ContentRepository<Services>>,
    pub advisors: Arc<dyn ContentRepository<Advisors>>,
    pub youtube: Arc<dyn ContentRepository<YouTubeEmbeds>>,
    pub catalog: Arc<dyn AppCatalogRepository>,
    /// Connectivity probe for the database behind these repositories.
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    /// Process-local storage, for development without a database and for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            case_studies: Arc::new(MemoryContentRepository::new()),
            case_study_sliders: Arc::new(MemoryContentRepository::new()),
            testimonials: Arc::new(MemoryContentRepository::new()),
            blog_posts: Arc::new(MemoryContentRepository::new()),
            banners: Arc::new(MemoryContentRepository::new()),
            hero: Arc::new(MemoryContentRepository::new()),
            updates: Arc::new(MemoryContentRepository::new()),
            services: Arc::new(MemoryContentRepository::new()),
            advisors: Arc::new(MemoryContentRepository::new()),
            youtube: Arc::new(MemoryContentRepository::new()),
            catalog: Arc::new(MemoryCatalog::new()),
            health: Arc::new(MemoryHealth),
        }
    }

    /// PostgreSQL-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(client: Arc<PostgresClient>) -> Self {
        let pool: PgPool = client.pool().clone();
        Self {
            case_studies: Arc::new(PgRepository::new(pool.clone())),
            case_study_sliders: Arc::new(PgSliderRepository::new(pool.clone())),
            testimonials: Arc::new(PgRepository::new(pool.clone())),
            blog_posts: Arc::new(PgRepository::new(pool.clone())),
            banners: Arc::new(PgRepository::new(pool.clone())),
            hero: Arc::new(PgRepository::new(pool.clone())),
            updates: Arc::new(PgRepository::new(pool.clone())),
            services: Arc::new(PgRepository::new(pool.clone())),
            advisors: Arc::new(PgRepository::new(pool.clone())),
            youtube: Arc::new(PgRepository::new(pool.clone())),
            catalog: Arc::new(PgCatalogRepository::new(pool)),
            health: client,
        }
    }
}

/// Site-wide settings the services need.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Absolute origin without a trailing slash.
    pub site_url: String,
    pub cache_ttl: Duration,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:3000".to_string(),
            cache_ttl: super::cache::DEFAULT_REVALIDATE,
        }
    }
}

/// Shared application state for the Axum web server.
///
/// All contained types are wrapped in `Arc` and implement `Send + Sync`,
/// making `AppState` safe to share across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TagCache>,
    pub content: Arc<ContentServices>,
    pub catalog: Arc<AppCatalogService>,
    pub pages: Arc<PageService>,
    pub uploads: Arc<UploadService>,
    pub auth: Arc<dyn AuthProvider>,
    pub db_health: Arc<dyn HealthCheck>,
    pub metrics: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Wires services to the given backends.
    #[must_use]
    pub fn new(
        repos: Repositories,
        blob_store: Arc<dyn BlobStore>,
        auth: Arc<dyn AuthProvider>,
        signer: Arc<UploadTokenSigner>,
        settings: SiteSettings,
    ) -> Self {
        let cache = Arc::new(TagCache::new(settings.cache_ttl));
        let content = Arc::new(ContentServices::new(&repos, &cache));
        let catalog = Arc::new(AppCatalogService::new(
            Arc::clone(&repos.catalog),
            Arc::clone(&cache),
        ));
        let pages = Arc::new(PageService::new(Arc::clone(&content), settings.site_url));
        let uploads = Arc::new(UploadService::new(blob_store, signer));

        Self {
            cache,
            content,
            catalog,
            pages,
            uploads,
            auth,
            db_health: repos.health,
            metrics: None,
        }
    }

    /// In-memory backends with an ephemeral upload key.
    #[must_use]
    pub fn in_memory(auth: Arc<dyn AuthProvider>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self::new(
            Repositories::in_memory(),
            blob_store,
            auth,
            Arc::new(UploadTokenSigner::generate()),
            SiteSettings::default(),
        )
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: Arc<PrometheusHandle>) -> Self {
        self.metrics = Some(handle);
        self
    }
}
