//! App catalog service: apps, screenshots, tags and user ratings.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::{
    App, AppCatalogRepository, AppError, AppInput, AppTagsInput, CacheTag, Rating, RatingInput,
    RatingSummary, Screenshot, ScreenshotInput, StarRating, Tag, TagInput,
};
use crate::domain::rating::MAX_STARS;

use super::cache::{CachePolicy, TagCache};

const APPS_KEY: &str = "apps-all";
const TAGS_KEY: &str = "tags-all";

pub struct AppCatalogService {
    repo: Arc<dyn AppCatalogRepository>,
    cache: Arc<TagCache>,
}

impl AppCatalogService {
    #[must_use]
    pub fn new(repo: Arc<dyn AppCatalogRepository>, cache: Arc<TagCache>) -> Self {
        Self { repo, cache }
    }

    /// All apps with their tags and screenshots, cached under `apps-all`.
    #[instrument(skip(self))]
    pub async fn list_apps(&self) -> Result<Vec<App>, AppError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .get_or_load(
                CacheTag::Apps,
                APPS_KEY.to_string(),
                CachePolicy::Window,
                || async move { repo.list_apps().await },
            )
            .await
    }

    /// Cached lookup by id or slug.
    pub async fn find_app(&self, key: &str) -> Result<App, AppError> {
        self.list_apps()
            .await?
            .into_iter()
            .find(|a| a.id == key || a.slug == key)
            .ok_or_else(|| AppError::not_found(format!("app '{key}'")))
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_app(&self, input: AppInput) -> Result<App, AppError> {
        input.validate()?;
        let now = Utc::now();
        let app = App {
            id: format!("app_{}", uuid::Uuid::new_v4()),
            slug: input.slug,
            name: input.name,
            description: input.description,
            icon_url: input.icon_url,
            store_url: input.store_url,
            average_rating: 0.0,
            rating_count: 0,
            tags: Vec::new(),
            screenshots: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_app(&app).await?;
        self.written(CacheTag::Apps, "create").await;
        info!(id = %app.id, "app created");
        Ok(app)
    }

    #[instrument(skip(self, input))]
    pub async fn update_app(&self, id: &str, input: AppInput) -> Result<App, AppError> {
        input.validate()?;
        let mut app = self.get_app(id).await?;
        app.slug = input.slug;
        app.name = input.name;
        app.description = input.description;
        app.icon_url = input.icon_url;
        app.store_url = input.store_url;
        app.updated_at = Utc::now();

        if !self.repo.update_app(&app).await? {
            return Err(AppError::not_found(format!("app '{id}'")));
        }
        self.written(CacheTag::Apps, "update").await;
        Ok(app)
    }

    #[instrument(skip(self))]
    pub async fn delete_app(&self, id: &str) -> Result<(), AppError> {
        if !self.repo.delete_app(id).await? {
            return Err(AppError::not_found(format!("app '{id}'")));
        }
        self.written(CacheTag::Apps, "delete").await;
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn add_screenshot(
        &self,
        app_id: &str,
        input: ScreenshotInput,
    ) -> Result<Screenshot, AppError> {
        input.validate()?;
        let screenshot = Screenshot {
            id: format!("shot_{}", uuid::Uuid::new_v4()),
            app_id: app_id.to_string(),
            image_url: input.image_url,
            alt: input.alt,
            order_index: input.order_index,
            created_at: Utc::now(),
        };
        self.repo.insert_screenshot(&screenshot).await?;
        self.written(CacheTag::Apps, "update").await;
        Ok(screenshot)
    }

    #[instrument(skip(self))]
    pub async fn delete_screenshot(&self, app_id: &str, screenshot_id: &str) -> Result<(), AppError> {
        if !self.repo.delete_screenshot(app_id, screenshot_id).await? {
            return Err(AppError::not_found(format!("screenshot '{screenshot_id}'")));
        }
        self.written(CacheTag::Apps, "update").await;
        Ok(())
    }

    /// Replaces the app's tags and returns the refreshed app.
    #[instrument(skip(self, input))]
    pub async fn set_app_tags(&self, app_id: &str, input: AppTagsInput) -> Result<App, AppError> {
        self.repo.replace_app_tags(app_id, &input.tag_ids).await?;
        self.written(CacheTag::Apps, "update").await;
        self.get_app(app_id).await
    }

    /// Stores a rating for the app with id or slug `app_id` and returns the
    /// recomputed average.
    #[instrument(skip(self, input))]
    pub async fn submit_rating(
        &self,
        app_id: &str,
        input: RatingInput,
    ) -> Result<RatingSummary, AppError> {
        input.validate()?;
        let app = self.find_app(app_id).await?;
        let rating = Rating {
            id: format!("rating_{}", uuid::Uuid::new_v4()),
            app_id: app.id,
            value: input.value,
            created_at: Utc::now(),
        };
        let (average_rating, rating_count) = self.repo.insert_rating(&rating).await?;
        self.written(CacheTag::Apps, "rate").await;
        info!(app_id = %rating.app_id, average_rating, rating_count, "rating recorded");
        Ok(RatingSummary {
            rating,
            average_rating,
            rating_count,
            stars: StarRating::new(average_rating, MAX_STARS),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .get_or_load(
                CacheTag::Tags,
                TAGS_KEY.to_string(),
                CachePolicy::Window,
                || async move { repo.list_tags().await },
            )
            .await
    }

    #[instrument(skip(self, input))]
    pub async fn create_tag(&self, input: TagInput) -> Result<Tag, AppError> {
        let input = TagInput {
            name: input.name.trim().to_string(),
        };
        input.validate()?;
        let tag = Tag {
            id: format!("tag_{}", uuid::Uuid::new_v4()),
            name: input.name,
            created_at: Utc::now(),
        };
        self.repo.insert_tag(&tag).await?;
        self.written(CacheTag::Tags, "create").await;
        Ok(tag)
    }

    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: &str) -> Result<(), AppError> {
        if !self.repo.delete_tag(id).await? {
            return Err(AppError::not_found(format!("tag '{id}'")));
        }
        self.written(CacheTag::Tags, "delete").await;
        Ok(())
    }

    async fn get_app(&self, id: &str) -> Result<App, AppError> {
        self.repo
            .get_app(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("app '{id}'")))
    }

    async fn written(&self, tag: CacheTag, action: &'static str) {
        self.cache.revalidate_tag(tag).await;
        counter!("content_mutations_total", "resource" => tag.as_str(), "action" => action)
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatabaseError;
    use crate::infra::memory::MemoryCatalog;

    fn service() -> AppCatalogService {
        AppCatalogService::new(Arc::new(MemoryCatalog::new()), Arc::new(TagCache::default()))
    }

    fn app_input(slug: &str) -> AppInput {
        AppInput {
            slug: slug.to_string(),
            name: format!("App {slug}"),
            description: String::new(),
            icon_url: None,
            store_url: Some("https://apps.apple.com/app/id1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_ratings_average() {
        let catalog = service();
        let app = catalog.create_app(app_input("pulse")).await.unwrap();

        let mut last = None;
        for value in [5, 3, 4] {
            last = Some(
                catalog
                    .submit_rating(&app.id, RatingInput { value })
                    .await
                    .unwrap(),
            );
        }
        let summary = last.unwrap();
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.rating_count, 3);
        assert_eq!(summary.stars, StarRating::new(4.0, MAX_STARS));

        // The cached list is refreshed after each rating.
        let listed = catalog.find_app("pulse").await.unwrap();
        assert_eq!(listed.average_rating, 4.0);
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let catalog = service();
        let app = catalog.create_app(app_input("pulse")).await.unwrap();
        let result = catalog.submit_rating(&app.id, RatingInput { value: 6 }).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflict() {
        let catalog = service();
        catalog.create_app(app_input("pulse")).await.unwrap();
        let result = catalog.create_app(app_input("pulse")).await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::Duplicate(_)))
        ));
    }

    #[tokio::test]
    async fn test_tag_changes_refresh_app_list() {
        let catalog = service();
        let app = catalog.create_app(app_input("pulse")).await.unwrap();
        let tag = catalog
            .create_tag(TagInput {
                name: " wellbeing ".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(tag.name, "wellbeing");

        let tagged = catalog
            .set_app_tags(
                &app.id,
                AppTagsInput {
                    tag_ids: vec![tag.id.clone()],
                },
            )
            .await
            .unwrap();
        assert_eq!(tagged.tags.len(), 1);
        assert_eq!(catalog.list_apps().await.unwrap()[0].tags.len(), 1);

        catalog.delete_tag(&tag.id).await.unwrap();
        assert!(catalog.list_apps().await.unwrap()[0].tags.is_empty());
        assert!(catalog.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_tag_name_rejected() {
        let catalog = service();
        for name in ["", "   "] {
            let result = catalog
                .create_tag(TagInput {
                    name: name.to_string(),
                })
                .await;
            assert!(matches!(result, Err(AppError::Validation(_))), "{name:?}");
        }
        assert!(catalog.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rating_by_slug() {
        let catalog = service();
        let app = catalog.create_app(app_input("pulse")).await.unwrap();

        let summary = catalog
            .submit_rating("pulse", RatingInput { value: 5 })
            .await
            .unwrap();
        assert_eq!(summary.rating.app_id, app.id);
        assert_eq!(summary.rating_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_tag_conflict() {
        let catalog = service();
        let input = TagInput {
            name: "health".to_string(),
        };
        catalog.create_tag(input.clone()).await.unwrap();
        assert!(catalog.create_tag(input).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_app_operations_are_not_found() {
        let catalog = service();
        assert!(catalog.delete_app("app_x").await.unwrap_err().is_not_found());
        assert!(
            catalog
                .update_app("app_x", app_input("x"))
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            catalog
                .delete_screenshot("app_x", "shot_x")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_screenshots_listed_in_order() {
        let catalog = service();
        let app = catalog.create_app(app_input("pulse")).await.unwrap();
        for (url, order) in [("/uploads/b.png", 2), ("/uploads/a.png", 1)] {
            catalog
                .add_screenshot(
                    &app.id,
                    ScreenshotInput {
                        image_url: url.to_string(),
                        alt: String::new(),
                        order_index: order,
                    },
                )
                .await
                .unwrap();
        }
        let urls: Vec<_> = catalog
            .find_app(&app.id)
            .await
            .unwrap()
            .screenshots
            .into_iter()
            .map(|s| s.image_url)
            .collect();
        assert_eq!(urls, vec!["/uploads/a.png", "/uploads/b.png"]);
    }
}
