//! In-memory repositories.
//!
//! Used when no `DATABASE_URL` is configured and by the integration tests.
//! Data lives for the lifetime of the process.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    App, AppCatalogRepository, AppError, ContentRepository, HealthCheck, Locale, Rating,
    Resource, Screenshot, Tag, ValidationError, average_rating,
};

/// Per-locale store for one resource.
pub struct MemoryContentRepository<R: Resource> {
    rows: Mutex<HashMap<(Locale, String), R::Model>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> MemoryContentRepository<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            _resource: PhantomData,
        }
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, HashMap<(Locale, String), R::Model>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<R: Resource> Default for MemoryContentRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> ContentRepository<R> for MemoryContentRepository<R> {
    async fn list(&self, locale: Locale) -> Result<Vec<R::Model>, AppError> {
        let mut models: Vec<R::Model> = self
            .rows()
            .iter()
            .filter(|((l, _), _)| *l == locale)
            .map(|(_, m)| m.clone())
            .collect();
        R::sort(&mut models);
        Ok(models)
    }

    async fn get(&self, locale: Locale, id: &str) -> Result<Option<R::Model>, AppError> {
        Ok(self.rows().get(&(locale, id.to_string())).cloned())
    }

    async fn insert(&self, locale: Locale, model: &R::Model) -> Result<(), AppError> {
        let key = (locale, R::id(model).to_string());
        let mut rows = self.rows();
        if rows.contains_key(&key) {
            return Err(AppError::duplicate(format!("{} '{}'", R::NAME, key.1)));
        }
        rows.insert(key, model.clone());
        Ok(())
    }

    async fn update(&self, locale: Locale, model: &R::Model) -> Result<bool, AppError> {
        let key = (locale, R::id(model).to_string());
        let mut rows = self.rows();
        match rows.get_mut(&key) {
            Some(existing) => {
                *existing = model.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        Ok(self.rows().remove(&(locale, id.to_string())).is_some())
    }

    async fn set_exclusive(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        let mut rows = self.rows();
        let Some(target) = rows.get_mut(&(locale, id.to_string())) else {
            return Ok(false);
        };
        if R::exclusive_flag(target).is_none() {
            return Err(AppError::NotSupported(format!(
                "{} has no exclusive flag",
                R::NAME
            )));
        }

        for ((l, key), model) in rows.iter_mut() {
            if *l != locale {
                continue;
            }
            if let Some(flag) = R::exclusive_flag(model) {
                *flag = key == id;
            }
        }
        Ok(true)
    }
}

#[derive(Default)]
struct CatalogData {
    apps: HashMap<String, App>,
    screenshots: Vec<Screenshot>,
    ratings: Vec<Rating>,
    tags: HashMap<String, Tag>,
    app_tags: HashMap<String, Vec<String>>,
}

impl CatalogData {
    fn assemble(&self, app: &App) -> App {
        let mut app = app.clone();

        let mut tags: Vec<Tag> = self
            .app_tags
            .get(&app.id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        app.tags = tags;

        let mut screenshots: Vec<Screenshot> = self
            .screenshots
            .iter()
            .filter(|s| s.app_id == app.id)
            .cloned()
            .collect();
        screenshots.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(a.created_at.cmp(&b.created_at))
        });
        app.screenshots = screenshots;
        app
    }
}

/// In-memory app catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    data: Mutex<CatalogData>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> std::sync::MutexGuard<'_, CatalogData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AppCatalogRepository for MemoryCatalog {
    async fn list_apps(&self) -> Result<Vec<App>, AppError> {
        let data = self.data();
        let mut apps: Vec<App> = data.apps.values().map(|a| data.assemble(a)).collect();
        apps.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(apps)
    }

    async fn get_app(&self, id: &str) -> Result<Option<App>, AppError> {
        let data = self.data();
        Ok(data.apps.get(id).map(|a| data.assemble(a)))
    }

    async fn insert_app(&self, app: &App) -> Result<(), AppError> {
        let mut data = self.data();
        if data.apps.values().any(|a| a.slug == app.slug) {
            return Err(AppError::duplicate(format!("app slug '{}'", app.slug)));
        }
        data.apps.insert(app.id.clone(), app.clone());
        Ok(())
    }

    async fn update_app(&self, app: &App) -> Result<bool, AppError> {
        let mut data = self.data();
        if data
            .apps
            .values()
            .any(|a| a.slug == app.slug && a.id != app.id)
        {
            return Err(AppError::duplicate(format!("app slug '{}'", app.slug)));
        }
        let Some(existing) = data.apps.get_mut(&app.id) else {
            return Ok(false);
        };
        existing.slug = app.slug.clone();
        existing.name = app.name.clone();
        existing.description = app.description.clone();
        existing.icon_url = app.icon_url.clone();
        existing.store_url = app.store_url.clone();
        existing.updated_at = app.updated_at;
        Ok(true)
    }

    async fn delete_app(&self, id: &str) -> Result<bool, AppError> {
        let mut data = self.data();
        if data.apps.remove(id).is_none() {
            return Ok(false);
        }
        data.screenshots.retain(|s| s.app_id != id);
        data.ratings.retain(|r| r.app_id != id);
        data.app_tags.remove(id);
        Ok(true)
    }

    async fn insert_screenshot(&self, screenshot: &Screenshot) -> Result<(), AppError> {
        let mut data = self.data();
        if !data.apps.contains_key(&screenshot.app_id) {
            return Err(AppError::not_found(format!("app '{}'", screenshot.app_id)));
        }
        data.screenshots.push(screenshot.clone());
        Ok(())
    }

    async fn delete_screenshot(
        &self,
        app_id: &str,
        screenshot_id: &str,
    ) -> Result<bool, AppError> {
        let mut data = self.data();
        let before = data.screenshots.len();
        data.screenshots
            .retain(|s| !(s.app_id == app_id && s.id == screenshot_id));
        Ok(data.screenshots.len() != before)
    }

    async fn replace_app_tags(&self, app_id: &str, tag_ids: &[String]) -> Result<(), AppError> {
        let mut data = self.data();
        if !data.apps.contains_key(app_id) {
            return Err(AppError::not_found(format!("app '{app_id}'")));
        }
        if let Some(unknown) = tag_ids.iter().find(|id| !data.tags.contains_key(*id)) {
            return Err(ValidationError::InvalidField {
                field: "tagIds".to_string(),
                message: format!("unknown tag '{unknown}'"),
            }
            .into());
        }
        let mut ids = tag_ids.to_vec();
        ids.sort();
        ids.dedup();
        data.app_tags.insert(app_id.to_string(), ids);
        Ok(())
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(f64, i64), AppError> {
        let mut data = self.data();
        if !data.apps.contains_key(&rating.app_id) {
            return Err(AppError::not_found(format!("app '{}'", rating.app_id)));
        }
        data.ratings.push(rating.clone());

        let values: Vec<i16> = data
            .ratings
            .iter()
            .filter(|r| r.app_id == rating.app_id)
            .map(|r| r.value)
            .collect();
        let average = average_rating(&values);
        let count = values.len() as i64;

        if let Some(app) = data.apps.get_mut(&rating.app_id) {
            app.average_rating = average;
            app.rating_count = count;
            app.updated_at = Utc::now();
        }
        Ok((average, count))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let mut tags: Vec<Tag> = self.data().tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn insert_tag(&self, tag: &Tag) -> Result<(), AppError> {
        let mut data = self.data();
        if data.tags.values().any(|t| t.name == tag.name) {
            return Err(AppError::duplicate(format!("tag '{}'", tag.name)));
        }
        data.tags.insert(tag.id.clone(), tag.clone());
        Ok(())
    }

    async fn delete_tag(&self, id: &str) -> Result<bool, AppError> {
        let mut data = self.data();
        if data.tags.remove(id).is_none() {
            return Ok(false);
        }
        for ids in data.app_tags.values_mut() {
            ids.retain(|t| t != id);
        }
        Ok(true)
    }
}

/// Health probe for the in-memory backend; always healthy.
pub struct MemoryHealth;

#[async_trait]
impl HealthCheck for MemoryHealth {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlogPost, BlogPosts, Testimonial, Testimonials};
    use chrono::{DateTime, Duration};

    fn post(id: &str, pinned: bool, created_at: DateTime<Utc>) -> BlogPost {
        BlogPost {
            id: id.to_string(),
            slug: id.to_string(),
            title: id.to_string(),
            image_url: None,
            image_alt: None,
            excerpt: String::new(),
            content_html: String::new(),
            is_pinned: pinned,
            created_at,
            updated_at: created_at,
        }
    }

    fn app(id: &str, name: &str) -> App {
        let now = Utc::now();
        App {
            id: id.to_string(),
            slug: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            icon_url: None,
            store_url: None,
            average_rating: 0.0,
            rating_count: 0,
            tags: Vec::new(),
            screenshots: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn rating(app_id: &str, value: i16) -> Rating {
        Rating {
            id: format!("rating_{}", uuid::Uuid::new_v4()),
            app_id: app_id.to_string(),
            value,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_locale_scoped() {
        let repo = MemoryContentRepository::<BlogPosts>::new();
        let now = Utc::now();
        repo.insert(Locale::En, &post("older", false, now - Duration::hours(1)))
            .await
            .unwrap();
        repo.insert(Locale::En, &post("newer", false, now))
            .await
            .unwrap();
        repo.insert(Locale::Pl, &post("polski", false, now))
            .await
            .unwrap();

        let ids: Vec<_> = repo
            .list(Locale::En)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing() {
        let repo = MemoryContentRepository::<BlogPosts>::new();
        let missing = post("ghost", false, Utc::now());
        assert!(!repo.update(Locale::En, &missing).await.unwrap());
        assert!(!repo.delete(Locale::En, "ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_exclusive() {
        let repo = MemoryContentRepository::<BlogPosts>::new();
        let now = Utc::now();
        repo.insert(Locale::En, &post("a", true, now)).await.unwrap();
        repo.insert(Locale::En, &post("b", false, now)).await.unwrap();

        assert!(repo.set_exclusive(Locale::En, "b").await.unwrap());
        assert!(!repo.get(Locale::En, "a").await.unwrap().unwrap().is_pinned);
        assert!(repo.get(Locale::En, "b").await.unwrap().unwrap().is_pinned);
        assert!(!repo.set_exclusive(Locale::En, "zzz").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_exclusive_without_flag_not_supported() {
        let repo = MemoryContentRepository::<Testimonials>::new();
        let now = Utc::now();
        let testimonial = Testimonial {
            id: "testimonial_1".to_string(),
            author: "Ada".to_string(),
            role: "CPO".to_string(),
            company: "Clinic".to_string(),
            quote: "Great".to_string(),
            image: None,
            image_alt: None,
            order_index: 0,
            created_at: now,
            updated_at: now,
        };
        repo.insert(Locale::En, &testimonial).await.unwrap();

        let result = repo.set_exclusive(Locale::En, "testimonial_1").await;
        assert!(matches!(result, Err(AppError::NotSupported(_))));
    }

    #[tokio::test]
    async fn test_rating_average_recomputed() {
        let catalog = MemoryCatalog::new();
        catalog.insert_app(&app("app_1", "Pulse")).await.unwrap();

        for value in [5, 3] {
            catalog.insert_rating(&rating("app_1", value)).await.unwrap();
        }
        let (average, count) = catalog.insert_rating(&rating("app_1", 4)).await.unwrap();

        assert_eq!(average, 4.0);
        assert_eq!(count, 3);
        let stored = catalog.get_app("app_1").await.unwrap().unwrap();
        assert_eq!(stored.average_rating, 4.0);
        assert_eq!(stored.rating_count, 3);
    }

    #[tokio::test]
    async fn test_rating_for_missing_app() {
        let catalog = MemoryCatalog::new();
        let err = catalog.insert_rating(&rating("nope", 5)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_tags_are_unique_and_detached_on_delete() {
        let catalog = MemoryCatalog::new();
        let now = Utc::now();
        let tag = Tag {
            id: "tag_1".to_string(),
            name: "health".to_string(),
            created_at: now,
        };
        catalog.insert_tag(&tag).await.unwrap();
        let dup = Tag {
            id: "tag_2".to_string(),
            ..tag.clone()
        };
        assert!(catalog.insert_tag(&dup).await.is_err());

        catalog.insert_app(&app("app_1", "Pulse")).await.unwrap();
        catalog
            .replace_app_tags("app_1", &["tag_1".to_string()])
            .await
            .unwrap();
        assert_eq!(
            catalog.get_app("app_1").await.unwrap().unwrap().tags,
            vec![tag]
        );

        assert!(catalog.delete_tag("tag_1").await.unwrap());
        assert!(catalog.get_app("app_1").await.unwrap().unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tag_ids_rejected() {
        let catalog = MemoryCatalog::new();
        catalog.insert_app(&app("app_1", "Pulse")).await.unwrap();
        let result = catalog
            .replace_app_tags("app_1", &["tag_missing".to_string()])
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_app_cascades() {
        let catalog = MemoryCatalog::new();
        catalog.insert_app(&app("app_1", "Pulse")).await.unwrap();
        catalog
            .insert_screenshot(&Screenshot {
                id: "shot_1".to_string(),
                app_id: "app_1".to_string(),
                image_url: "/uploads/shot.png".to_string(),
                alt: String::new(),
                order_index: 0,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        catalog.insert_rating(&rating("app_1", 5)).await.unwrap();

        assert!(catalog.delete_app("app_1").await.unwrap());
        assert!(catalog.get_app("app_1").await.unwrap().is_none());
        assert!(!catalog.delete_screenshot("app_1", "shot_1").await.unwrap());
    }
}
