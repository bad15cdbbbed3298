//! PostgreSQL client and the per-locale content repositories.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, instrument};

use crate::domain::{
    AppError, CaseStudySlider, CaseStudySliders, ContentRepository, DatabaseError, HealthCheck,
    Locale, Resource,
};

use super::mapper::{SliderImageRow, SliderRow, slider_to_rows};
use super::records::PgResource;

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL database client with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthCheck for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }
}

/// `$1, $2, ..., $n`
fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `col2 = $2, col3 = $3, ...`; `$1` is left for the id.
fn assignments(columns: &[&str]) -> String {
    columns
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| format!("{c} = ${}", i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generic repository over `<table>_<locale>`.
pub struct PgRepository<R> {
    pool: PgPool,
    _resource: PhantomData<fn() -> R>,
}

impl<R: PgResource> PgRepository<R> {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: PgResource> ContentRepository<R> for PgRepository<R> {
    #[instrument(skip(self), fields(table = R::TABLE))]
    async fn list(&self, locale: Locale) -> Result<Vec<R::Model>, AppError> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY {}",
            R::column_list(),
            R::table(locale),
            R::ORDER_BY
        );
        let rows = sqlx::query_as::<_, R::Row>(&query)
            .fetch_all(&self.pool)
            .await?;
        let mut models: Vec<R::Model> = rows.into_iter().map(Into::into).collect();
        R::sort(&mut models);
        Ok(models)
    }

    #[instrument(skip(self), fields(table = R::TABLE))]
    async fn get(&self, locale: Locale, id: &str) -> Result<Option<R::Model>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = $1",
            R::column_list(),
            R::table(locale)
        );
        let row = sqlx::query_as::<_, R::Row>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, model), fields(table = R::TABLE, id = R::id(model)))]
    async fn insert(&self, locale: Locale, model: &R::Model) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::table(locale),
            R::column_list(),
            placeholders(R::COLUMNS.len())
        );
        R::bind_row(sqlx::query(&query), R::Row::from(model))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, model), fields(table = R::TABLE, id = R::id(model)))]
    async fn update(&self, locale: Locale, model: &R::Model) -> Result<bool, AppError> {
        let query = format!(
            "UPDATE {} SET {} WHERE id = $1",
            R::table(locale),
            assignments(R::COLUMNS)
        );
        let result = R::bind_row(sqlx::query(&query), R::Row::from(model))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(table = R::TABLE))]
    async fn delete(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        let query = format!("DELETE FROM {} WHERE id = $1", R::table(locale));
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(table = R::TABLE))]
    async fn set_exclusive(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        let Some(column) = R::EXCLUSIVE_COLUMN else {
            return Err(AppError::NotSupported(format!(
                "{} has no exclusive flag",
                R::NAME
            )));
        };
        let table = R::table(locale);

        let mut tx = self.pool.begin().await?;
        let set = format!("UPDATE {table} SET {column} = TRUE, updated_at = NOW() WHERE id = $1");
        let flagged = sqlx::query(&set).bind(id).execute(&mut *tx).await?;
        if flagged.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        let clear = format!(
            "UPDATE {table} SET {column} = FALSE, updated_at = NOW() \
             WHERE {column} = TRUE AND id <> $1"
        );
        sqlx::query(&clear).bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(true)
    }
}

const SLIDER_COLUMNS: &str = "id, theme, created_at, updated_at";
const SLIDER_IMAGE_COLUMNS: &str = "slider_id, image, alt, position";

/// Sliders keep their images in a child table, replaced wholesale on update.
pub struct PgSliderRepository {
    pool: PgPool,
}

impl PgSliderRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn tables(locale: Locale) -> (String, String) {
        (
            format!("case_study_sliders_{}", locale.as_str()),
            format!("case_study_slider_images_{}", locale.as_str()),
        )
    }

    async fn insert_images(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        images_table: &str,
        images: Vec<SliderImageRow>,
    ) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO {images_table} ({SLIDER_IMAGE_COLUMNS}) VALUES ($1, $2, $3, $4)"
        );
        for image in images {
            sqlx::query(&query)
                .bind(image.slider_id)
                .bind(image.image)
                .bind(image.alt)
                .bind(image.position)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentRepository<CaseStudySliders> for PgSliderRepository {
    #[instrument(skip(self))]
    async fn list(&self, locale: Locale) -> Result<Vec<CaseStudySlider>, AppError> {
        let (sliders, images) = Self::tables(locale);
        let headers = sqlx::query_as::<_, SliderRow>(&format!(
            "SELECT {SLIDER_COLUMNS} FROM {sliders} ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        let image_rows = sqlx::query_as::<_, SliderImageRow>(&format!(
            "SELECT {SLIDER_IMAGE_COLUMNS} FROM {images} ORDER BY slider_id, position"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut models: Vec<CaseStudySlider> = headers
            .into_iter()
            .map(|h| h.into_domain(&image_rows))
            .collect();
        CaseStudySliders::sort(&mut models);
        Ok(models)
    }

    #[instrument(skip(self))]
    async fn get(&self, locale: Locale, id: &str) -> Result<Option<CaseStudySlider>, AppError> {
        let (sliders, images) = Self::tables(locale);
        let Some(header) = sqlx::query_as::<_, SliderRow>(&format!(
            "SELECT {SLIDER_COLUMNS} FROM {sliders} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };
        let image_rows = sqlx::query_as::<_, SliderImageRow>(&format!(
            "SELECT {SLIDER_IMAGE_COLUMNS} FROM {images} WHERE slider_id = $1 ORDER BY position"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(header.into_domain(&image_rows)))
    }

    #[instrument(skip(self, model), fields(id = %model.id))]
    async fn insert(&self, locale: Locale, model: &CaseStudySlider) -> Result<(), AppError> {
        let (sliders, images) = Self::tables(locale);
        let (header, image_rows) = slider_to_rows(model);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO {sliders} ({SLIDER_COLUMNS}) VALUES ($1, $2, $3, $4)"
        ))
        .bind(header.id)
        .bind(header.theme)
        .bind(header.created_at)
        .bind(header.updated_at)
        .execute(&mut *tx)
        .await?;
        Self::insert_images(&mut tx, &images, image_rows).await?;
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, model), fields(id = %model.id))]
    async fn update(&self, locale: Locale, model: &CaseStudySlider) -> Result<bool, AppError> {
        let (sliders, images) = Self::tables(locale);
        let (header, image_rows) = slider_to_rows(model);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&format!(
            "UPDATE {sliders} SET theme = $2, updated_at = $3 WHERE id = $1"
        ))
        .bind(&header.id)
        .bind(header.theme)
        .bind(header.updated_at)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        sqlx::query(&format!("DELETE FROM {images} WHERE slider_id = $1"))
            .bind(&header.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_images(&mut tx, &images, image_rows).await?;
        tx.commit().await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        let (sliders, _) = Self::tables(locale);
        // Images go with the header via ON DELETE CASCADE.
        let result = sqlx::query(&format!("DELETE FROM {sliders} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(3), "$1, $2, $3");
    }

    #[test]
    fn test_assignments_skip_id() {
        let sql = assignments(&["id", "title", "created_at", "updated_at"]);
        assert_eq!(sql, "title = $2, created_at = $3, updated_at = $4");
    }
}
