//! Mock implementations for testing.
//!
//! These mocks wrap the in-memory backends and can be configured to fail,
//! count calls or report themselves unhealthy.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::{
    AppError, BlobStore, ContentRepository, DatabaseError, HealthCheck, Locale, Resource,
    StorageError, StoredBlob,
};
use crate::infra::memory::MemoryContentRepository;

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
    /// Simulated latency in milliseconds.
    pub latency_ms: Option<u64>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
            latency_ms: None,
        }
    }

    /// Adds simulated latency.
    #[must_use]
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = Some(ms);
        self
    }

    async fn simulate(&self) {
        if let Some(ms) = self.latency_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn message(&self, fallback: &str) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Content repository mock backed by [`MemoryContentRepository`].
///
/// # Example
///
/// ```
/// use studio_content_api::domain::BlogPosts;
/// use studio_content_api::test_utils::{MockContentRepository, mocks::MockConfig};
///
/// let mock = MockContentRepository::<BlogPosts>::new();
/// let failing = MockContentRepository::<BlogPosts>::with_config(MockConfig::failure("DB error"));
/// ```
pub struct MockContentRepository<R: Resource> {
    inner: MemoryContentRepository<R>,
    config: MockConfig,
    call_count: AtomicU64,
}

impl<R: Resource> MockContentRepository<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            inner: MemoryContentRepository::new(),
            config,
            call_count: AtomicU64::new(0),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Number of repository calls made so far.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    async fn enter(&self) -> Result<(), AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.config.simulate().await;
        if self.config.should_fail {
            return Err(AppError::Database(DatabaseError::Query(
                self.config.message("Mock database error"),
            )));
        }
        Ok(())
    }
}

impl<R: Resource> Default for MockContentRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> ContentRepository<R> for MockContentRepository<R> {
    async fn list(&self, locale: Locale) -> Result<Vec<R::Model>, AppError> {
        self.enter().await?;
        self.inner.list(locale).await
    }

    async fn get(&self, locale: Locale, id: &str) -> Result<Option<R::Model>, AppError> {
        self.enter().await?;
        self.inner.get(locale, id).await
    }

    async fn insert(&self, locale: Locale, model: &R::Model) -> Result<(), AppError> {
        self.enter().await?;
        self.inner.insert(locale, model).await
    }

    async fn update(&self, locale: Locale, model: &R::Model) -> Result<bool, AppError> {
        self.enter().await?;
        self.inner.update(locale, model).await
    }

    async fn delete(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        self.enter().await?;
        self.inner.delete(locale, id).await
    }

    async fn set_exclusive(&self, locale: Locale, id: &str) -> Result<bool, AppError> {
        self.enter().await?;
        self.inner.set_exclusive(locale, id).await
    }
}

/// Health probe whose status can be flipped at runtime.
pub struct MockHealthCheck {
    is_healthy: AtomicBool,
    call_count: AtomicU64,
}

impl MockHealthCheck {
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_healthy: AtomicBool::new(true),
            call_count: AtomicU64::new(0),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for MockHealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthCheck for MockHealthCheck {
    async fn health_check(&self) -> Result<(), AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock database unhealthy".to_string(),
            )));
        }
        Ok(())
    }
}

/// Blob store keeping uploads in memory.
pub struct MockBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    config: MockConfig,
    is_healthy: AtomicBool,
}

impl MockBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            config,
            is_healthy: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Stored pathnames.
    pub fn pathnames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn put(
        &self,
        pathname: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, AppError> {
        self.config.simulate().await;
        if self.config.should_fail {
            return Err(StorageError::Io(self.config.message("Mock storage error")).into());
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(pathname.to_string(), bytes.to_vec());
        Ok(StoredBlob {
            url: format!("/uploads/{pathname}"),
            pathname: pathname.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(StorageError::Io("Mock storage unhealthy".to_string()).into());
        }
        Ok(())
    }
}
