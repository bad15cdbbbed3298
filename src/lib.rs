//! Studio Content API
//!
//! Localized (English/Polish) content API for a digital-health design
//! agency site: editorial content per locale, an app catalog with ratings,
//! signed media uploads and the page payloads the public site renders.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │ routing, locale prefixes, admin guard, JSON  │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │  content services, tag cache, pages, uploads │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │      models, resources, traits, errors       │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │   Postgres, in-memory store, blob storage    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every localized entity is described by a [`domain::Resource`] marker, so
//! repositories, services and route handlers are written once and
//! instantiated per entity.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use studio_content_api::api::{RouterConfig, create_router};
//! use studio_content_api::app::{AppState, DevAuthProvider};
//! use studio_content_api::infra::LocalBlobStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(LocalBlobStore::new("./uploads", "/uploads").await?);
//!     let state = Arc::new(AppState::in_memory(Arc::new(DevAuthProvider), store));
//!
//!     let router = create_router(state, &RouterConfig::default());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

// Test utilities are available in tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
