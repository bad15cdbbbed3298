//! The API layer, containing web handlers and routing.

pub mod error;
pub mod handlers;
pub mod locale;
pub mod middleware;
pub mod router;

pub use error::JsonBody;
pub use locale::LocaleQuery;
pub use router::{RouterConfig, create_router, create_router_with_rate_limit};
