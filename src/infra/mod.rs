//! Infrastructure layer implementations.

pub mod database;
pub mod memory;
pub mod observability;
pub mod storage;

pub use database::{PgCatalogRepository, PgRepository, PgSliderRepository, PostgresClient, PostgresConfig};
pub use memory::{MemoryCatalog, MemoryContentRepository, MemoryHealth};
pub use storage::{LocalBlobStore, UploadTokenSigner};
