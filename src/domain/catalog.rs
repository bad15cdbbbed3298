//! App catalog: apps with screenshots, user ratings and tags.
//!
//! Unlike the editorial content, the catalog is shared across locales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::content::validate_slug;
use super::rating::StarRating;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TagInput {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub id: String,
    pub app_id: String,
    pub image_url: String,
    pub alt: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotInput {
    #[validate(length(min = 1, max = 2048))]
    pub image_url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub app_id: String,
    pub value: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RatingInput {
    #[validate(range(min = 1, max = 5))]
    pub value: i16,
}

/// Result of submitting a rating: the stored rating plus the recomputed mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: Rating,
    pub average_rating: f64,
    pub rating_count: i64,
    pub stars: StarRating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub store_url: Option<String>,
    pub average_rating: f64,
    pub rating_count: i64,
    pub tags: Vec<Tag>,
    pub screenshots: Vec<Screenshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppInput {
    #[validate(custom(function = "validate_slug"), length(max = 200))]
    pub slug: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub icon_url: Option<String>,
    #[validate(url)]
    pub store_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTagsInput {
    pub tag_ids: Vec<String>,
}
