//! PostgreSQL-backed app catalog.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::domain::{
    App, AppCatalogRepository, AppError, Rating, Screenshot, Tag, ValidationError,
    average_rating,
};

const APP_COLUMNS: &str = "id, slug, name, description, icon_url, store_url, \
    average_rating, rating_count, created_at, updated_at";
const SCREENSHOT_COLUMNS: &str = "id, app_id, image_url, alt, order_index, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AppRow {
    id: String,
    slug: String,
    name: String,
    description: String,
    icon_url: Option<String>,
    store_url: Option<String>,
    average_rating: f64,
    rating_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ScreenshotRow {
    id: String,
    app_id: String,
    image_url: String,
    alt: String,
    order_index: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
}

/// A tag joined to one of its apps.
#[derive(Debug, sqlx::FromRow)]
struct AppTagRow {
    app_id: String,
    id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Attaches tags and screenshots; both inputs arrive already ordered.
fn assemble(row: AppRow, tags: &[AppTagRow], screenshots: &[ScreenshotRow]) -> App {
    App {
        tags: tags
            .iter()
            .filter(|t| t.app_id == row.id)
            .map(|t| Tag {
                id: t.id.clone(),
                name: t.name.clone(),
                created_at: t.created_at,
            })
            .collect(),
        screenshots: screenshots
            .iter()
            .filter(|s| s.app_id == row.id)
            .map(|s| Screenshot {
                id: s.id.clone(),
                app_id: s.app_id.clone(),
                image_url: s.image_url.clone(),
                alt: s.alt.clone(),
                order_index: s.order_index,
                created_at: s.created_at,
            })
            .collect(),
        id: row.id,
        slug: row.slug,
        name: row.name,
        description: row.description,
        icon_url: row.icon_url,
        store_url: row.store_url,
        average_rating: row.average_rating,
        rating_count: row.rating_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn tags_for(&self, app_id: Option<&str>) -> Result<Vec<AppTagRow>, AppError> {
        let rows = sqlx::query_as::<_, AppTagRow>(
            r#"
            SELECT at.app_id, t.id, t.name, t.created_at
            FROM app_tags at
            JOIN tags t ON t.id = at.tag_id
            WHERE $1::text IS NULL OR at.app_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(app_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn screenshots_for(&self, app_id: Option<&str>) -> Result<Vec<ScreenshotRow>, AppError> {
        let query = format!(
            "SELECT {SCREENSHOT_COLUMNS} FROM app_screenshots \
             WHERE $1::text IS NULL OR app_id = $1 \
             ORDER BY order_index ASC, created_at ASC"
        );
        let rows = sqlx::query_as::<_, ScreenshotRow>(&query)
            .bind(app_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl AppCatalogRepository for PgCatalogRepository {
    #[instrument(skip(self))]
    async fn list_apps(&self) -> Result<Vec<App>, AppError> {
        let query = format!("SELECT {APP_COLUMNS} FROM apps ORDER BY name ASC, id ASC");
        let rows = sqlx::query_as::<_, AppRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        let tags = self.tags_for(None).await?;
        let screenshots = self.screenshots_for(None).await?;
        Ok(rows
            .into_iter()
            .map(|row| assemble(row, &tags, &screenshots))
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_app(&self, id: &str) -> Result<Option<App>, AppError> {
        let query = format!("SELECT {APP_COLUMNS} FROM apps WHERE id = $1");
        let Some(row) = sqlx::query_as::<_, AppRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let tags = self.tags_for(Some(id)).await?;
        let screenshots = self.screenshots_for(Some(id)).await?;
        Ok(Some(assemble(row, &tags, &screenshots)))
    }

    #[instrument(skip(self, app), fields(id = %app.id))]
    async fn insert_app(&self, app: &App) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO apps ({APP_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&query)
            .bind(&app.id)
            .bind(&app.slug)
            .bind(&app.name)
            .bind(&app.description)
            .bind(&app.icon_url)
            .bind(&app.store_url)
            .bind(app.average_rating)
            .bind(app.rating_count)
            .bind(app.created_at)
            .bind(app.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, app), fields(id = %app.id))]
    async fn update_app(&self, app: &App) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE apps
            SET slug = $2, name = $3, description = $4, icon_url = $5,
                store_url = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(&app.id)
        .bind(&app.slug)
        .bind(&app.name)
        .bind(&app.description)
        .bind(&app.icon_url)
        .bind(&app.store_url)
        .bind(app.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_app(&self, id: &str) -> Result<bool, AppError> {
        // Screenshots, ratings and tag links cascade.
        let result = sqlx::query("DELETE FROM apps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, screenshot), fields(app_id = %screenshot.app_id))]
    async fn insert_screenshot(&self, screenshot: &Screenshot) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO app_screenshots ({SCREENSHOT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        );
        let result = sqlx::query(&query)
            .bind(&screenshot.id)
            .bind(&screenshot.app_id)
            .bind(&screenshot.image_url)
            .bind(&screenshot.alt)
            .bind(screenshot.order_index)
            .bind(screenshot.created_at)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(
                AppError::not_found(format!("app '{}'", screenshot.app_id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn delete_screenshot(
        &self,
        app_id: &str,
        screenshot_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM app_screenshots WHERE id = $1 AND app_id = $2")
            .bind(screenshot_id)
            .bind(app_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, tag_ids), fields(count = tag_ids.len()))]
    async fn replace_app_tags(&self, app_id: &str, tag_ids: &[String]) -> Result<(), AppError> {
        let wanted: HashSet<&String> = tag_ids.iter().collect();
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM apps WHERE id = $1 FOR UPDATE")
            .bind(app_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::not_found(format!("app '{app_id}'")));
        }

        let ids: Vec<String> = wanted.iter().map(|id| (*id).clone()).collect();
        let known: Vec<String> = sqlx::query_scalar("SELECT id FROM tags WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await?;
        if let Some(unknown) = ids.iter().find(|id| !known.contains(id)) {
            return Err(ValidationError::InvalidField {
                field: "tagIds".to_string(),
                message: format!("unknown tag '{unknown}'"),
            }
            .into());
        }

        sqlx::query("DELETE FROM app_tags WHERE app_id = $1")
            .bind(app_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO app_tags (app_id, tag_id) SELECT $1, UNNEST($2::text[])")
            .bind(app_id)
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE apps SET updated_at = NOW() WHERE id = $1")
            .bind(app_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, rating), fields(app_id = %rating.app_id))]
    async fn insert_rating(&self, rating: &Rating) -> Result<(f64, i64), AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent ratings for the same app.
        let exists = sqlx::query("SELECT 1 FROM apps WHERE id = $1 FOR UPDATE")
            .bind(&rating.app_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::not_found(format!("app '{}'", rating.app_id)));
        }

        sqlx::query("INSERT INTO app_ratings (id, app_id, value, created_at) VALUES ($1, $2, $3, $4)")
            .bind(&rating.id)
            .bind(&rating.app_id)
            .bind(rating.value)
            .bind(rating.created_at)
            .execute(&mut *tx)
            .await?;

        let values: Vec<i16> = sqlx::query_scalar("SELECT value FROM app_ratings WHERE app_id = $1")
            .bind(&rating.app_id)
            .fetch_all(&mut *tx)
            .await?;
        let average = average_rating(&values);
        let count = values.len() as i64;

        sqlx::query(
            "UPDATE apps SET average_rating = $2, rating_count = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(&rating.app_id)
        .bind(average)
        .bind(count)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok((average, count))
    }

    #[instrument(skip(self))]
    async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id, name, created_at FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    #[instrument(skip(self, tag), fields(name = %tag.name))]
    async fn insert_tag(&self, tag: &Tag) -> Result<(), AppError> {
        sqlx::query("INSERT INTO tags (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(&tag.id)
            .bind(&tag.name)
            .bind(tag.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_tag(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
