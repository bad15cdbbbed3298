//! PostgreSQL persistence: one table per entity and locale, plus the
//! locale-independent app catalog.

pub mod catalog;
pub mod mapper;
pub mod postgres;
pub mod records;

pub use catalog::PgCatalogRepository;
pub use postgres::{PgRepository, PgSliderRepository, PostgresClient, PostgresConfig};
pub use records::PgResource;
