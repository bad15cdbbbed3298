//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::catalog::{App, Rating, Screenshot, Tag};
use super::error::AppError;
use super::locale::Locale;
use super::resource::Resource;
use super::types::{Session, StoredBlob};

/// Persistence for one localized resource. Each locale is a separate table.
///
/// Implementations do no caching; that happens in the service layer.
#[async_trait]
pub trait ContentRepository<R: Resource>: Send + Sync {
    /// All records for a locale in [`Resource::sort`] order.
    async fn list(&self, locale: Locale) -> Result<Vec<R::Model>, AppError>;

    async fn get(&self, locale: Locale, id: &str) -> Result<Option<R::Model>, AppError>;

    async fn insert(&self, locale: Locale, model: &R::Model) -> Result<(), AppError>;

    /// Overwrites the record with the same id. Returns `false` if it does not exist.
    async fn update(&self, locale: Locale, model: &R::Model) -> Result<bool, AppError>;

    /// Returns `false` if no record had the id.
    async fn delete(&self, locale: Locale, id: &str) -> Result<bool, AppError>;

    /// Sets the resource's exclusive flag on `id` and clears it everywhere else
    /// in the locale, in one transaction.
    async fn set_exclusive(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        let _ = (locale, id);
        Err(AppError::NotSupported(format!(
            "{} has no exclusive flag",
            R::NAME
        )))
    }
}

/// Persistence for the locale-independent app catalog.
#[async_trait]
pub trait AppCatalogRepository: Send + Sync {
    /// Apps with their tags and screenshots, ordered by name.
    async fn list_apps(&self) -> Result<Vec<App>, AppError>;

    async fn get_app(&self, id: &str) -> Result<Option<App>, AppError>;

    async fn insert_app(&self, app: &App) -> Result<(), AppError>;

    /// Updates the app's own columns; tags, screenshots and ratings are untouched.
    async fn update_app(&self, app: &App) -> Result<bool, AppError>;

    async fn delete_app(&self, id: &str) -> Result<bool, AppError>;

    async fn insert_screenshot(&self, screenshot: &Screenshot) -> Result<(), AppError>;

    async fn delete_screenshot(&self, app_id: &str, screenshot_id: &str)
    -> Result<bool, AppError>;

    /// Replaces the app's tag set. Unknown tag ids are a validation error.
    async fn replace_app_tags(&self, app_id: &str, tag_ids: &[String]) -> Result<(), AppError>;

    /// Stores a rating and recomputes the app's average over all its ratings.
    /// Returns `(average, count)` after the insert.
    async fn insert_rating(&self, rating: &Rating) -> Result<(f64, i64), AppError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, AppError>;

    /// Fails with a duplicate error when the name is taken.
    async fn insert_tag(&self, tag: &Tag) -> Result<(), AppError>;

    async fn delete_tag(&self, id: &str) -> Result<bool, AppError>;
}

/// Connectivity probe for a backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;
}

/// Object storage for uploaded media.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `pathname` and returns its public location.
    async fn put(
        &self,
        pathname: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Resolves admin sessions from presented credentials.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `token` is the bearer token or API key from the request, if any.
    async fn authenticate(&self, token: Option<&str>) -> Result<Session, AppError>;

    fn name(&self) -> &'static str;
}
