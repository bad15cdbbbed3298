//! Application layer containing business logic and shared state.

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod content;
pub mod i18n;
pub mod pages;
pub mod state;
pub mod uploads;

pub use auth::{ApiKeyAuthProvider, DevAuthProvider};
pub use cache::{CachePolicy, TagCache};
pub use catalog::AppCatalogService;
pub use content::{ContentService, ContentServices, ServiceFor};
pub use pages::PageService;
pub use state::{AppState, Repositories, SiteSettings};
pub use uploads::UploadService;
