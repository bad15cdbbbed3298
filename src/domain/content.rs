//! Localized content entities and the request payloads that create them.
//!
//! Models serialize in camelCase; the persisted (snake_case) shape lives in
//! the infrastructure layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Validates a URL slug: lowercase ASCII letters, digits and single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let well_formed = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(validator::ValidationError::new("slug"))
    }
}

fn validate_video_url(url: &str) -> Result<(), validator::ValidationError> {
    if parse_youtube_id(url).is_some() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("youtube_url"))
    }
}

/// An image with alternative text, as stored inside case studies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ImageRef {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    #[serde(default)]
    pub alt: String,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Case studies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub tags: Vec<String>,
    pub images: Vec<ImageRef>,
    pub color: String,
    pub background_color: String,
    pub theme: String,
    pub order_index: i32,
    pub cta_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudyInput {
    #[validate(custom(function = "validate_slug"), length(max = 200))]
    pub slug: String,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub order_index: i32,
    pub cta_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Case study sliders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SliderImage {
    #[validate(length(min = 1, max = 2048))]
    pub image: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudySlider {
    pub id: String,
    pub theme: String,
    pub images: Vec<SliderImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudySliderInput {
    #[validate(length(min = 1, max = 50))]
    pub theme: String,
    #[serde(default)]
    #[validate(nested)]
    pub images: Vec<SliderImage>,
}

// ---------------------------------------------------------------------------
// Testimonials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub author: String,
    pub role: String,
    pub company: String,
    pub quote: String,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialInput {
    #[validate(length(min = 1, max = 200))]
    pub author: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[validate(length(min = 1, max = 5000))]
    pub quote: String,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    #[serde(default)]
    pub order_index: i32,
}

// ---------------------------------------------------------------------------
// Blog posts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub excerpt: String,
    pub content_html: String,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostInput {
    #[validate(custom(function = "validate_slug"), length(max = 200))]
    pub slug: String,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub is_pinned: bool,
}

// ---------------------------------------------------------------------------
// Banners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub content: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub cta_button_text: Option<String>,
    pub cta_button_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// Whether the banner is switched on and `now` falls inside its optional window.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.is_none_or(|start| start <= now)
            && self.end_date.is_none_or(|end| now <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BannerInput {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    pub cta_button_text: Option<String>,
    pub cta_button_link: Option<String>,
}

impl BannerInput {
    /// Rejects windows that end before they start.
    pub fn check_window(&self) -> Result<(), validator::ValidationError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end < start => {
                Err(validator::ValidationError::new("end_before_start"))
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Hero
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub background_image: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HeroInput {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub background_image: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub publish_date: DateTime<Utc>,
    pub content_html: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub is_published: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInput {
    #[validate(custom(function = "validate_slug"), length(max = 200))]
    pub slug: String,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub excerpt: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub order_index: i32,
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content_html: String,
    pub excerpt: String,
    pub keywords: Vec<String>,
    pub is_published: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    #[validate(custom(function = "validate_slug"), length(max = 200))]
    pub slug: String,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub order_index: i32,
}

// ---------------------------------------------------------------------------
// Advisors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisor {
    pub id: String,
    pub name: String,
    pub role: String,
    pub bio: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub linkedin_url: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bio: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub order_index: i32,
}

// ---------------------------------------------------------------------------
// YouTube embed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeEmbed {
    pub id: String,
    pub title: String,
    pub video_url: String,
    pub video_id: String,
    pub embed_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeEmbedInput {
    #[serde(default)]
    #[validate(length(max = 300))]
    pub title: String,
    #[validate(custom(function = "validate_video_url"))]
    pub video_url: String,
}

/// Privacy-enhanced embed URL for a video id.
#[must_use]
pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube-nocookie.com/embed/{video_id}")
}

/// Extracts the 11-character video id from the URL shapes editors paste.
///
/// Accepts `watch?v=`, `youtu.be/`, `/embed/`, `/shorts/` and bare ids.
#[must_use]
pub fn parse_youtube_id(input: &str) -> Option<String> {
    fn is_id(candidate: &str) -> bool {
        candidate.len() == 11
            && candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    let input = input.trim();
    if is_id(input) {
        return Some(input.to_string());
    }

    let without_scheme = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);
    let (host, rest) = without_scheme.split_once('/')?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let host = host.strip_prefix("m.").unwrap_or(host);

    let candidate = match host {
        "youtu.be" => rest.split(['?', '&', '#', '/']).next(),
        "youtube.com" | "youtube-nocookie.com" => {
            if let Some(query) = rest.strip_prefix("watch?") {
                query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("v="))
                    .map(|v| v.split('#').next().unwrap_or(v))
            } else if let Some(path) = rest
                .strip_prefix("embed/")
                .or_else(|| rest.strip_prefix("shorts/"))
                .or_else(|| rest.strip_prefix("live/"))
            {
                path.split(['?', '&', '#', '/']).next()
            } else {
                None
            }
        }
        _ => None,
    }?;

    is_id(candidate).then(|| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("telehealth-app-2024").is_ok());
        assert!(validate_slug("a").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Upper").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("double--hyphen").is_err());
        assert!(validate_slug("spaces here").is_err());
    }

    #[test]
    fn test_parse_youtube_id_variants() {
        let id = "dQw4w9WgXcQ";
        assert_eq!(parse_youtube_id(id).as_deref(), Some(id));
        assert_eq!(
            parse_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some(id)
        );
        assert_eq!(
            parse_youtube_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ")
                .as_deref(),
            Some(id)
        );
        assert_eq!(
            parse_youtube_id("https://youtu.be/dQw4w9WgXcQ?si=abc").as_deref(),
            Some(id)
        );
        assert_eq!(
            parse_youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some(id)
        );
        assert_eq!(
            parse_youtube_id("youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
            Some(id)
        );
    }

    #[test]
    fn test_parse_youtube_id_rejects_other_hosts() {
        assert!(parse_youtube_id("https://vimeo.com/123456789").is_none());
        assert!(parse_youtube_id("https://www.youtube.com/watch?v=short").is_none());
        assert!(parse_youtube_id("not a url").is_none());
    }

    #[test]
    fn test_youtube_input_validation() {
        let ok = YouTubeEmbedInput {
            title: "Showreel".to_string(),
            video_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = YouTubeEmbedInput {
            title: "Showreel".to_string(),
            video_url: "https://example.com/video".to_string(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_case_study_input_nested_image_validation() {
        let input = CaseStudyInput {
            slug: "care-app".to_string(),
            title: "Care App".to_string(),
            subtitle: String::new(),
            description: String::new(),
            tags: vec![],
            images: vec![ImageRef::new("", "empty url")],
            color: String::new(),
            background_color: String::new(),
            theme: String::new(),
            order_index: 0,
            cta_url: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_banner_live_window() {
        let now = Utc::now();
        let mut banner = Banner {
            id: "banner_1".to_string(),
            title: "Launch".to_string(),
            content: String::new(),
            subtitle: None,
            image_url: None,
            start_date: None,
            end_date: None,
            is_active: true,
            cta_button_text: None,
            cta_button_link: None,
            created_at: now,
            updated_at: now,
        };
        assert!(banner.is_live_at(now));

        banner.start_date = Some(now + Duration::hours(1));
        assert!(!banner.is_live_at(now));

        banner.start_date = Some(now - Duration::hours(2));
        banner.end_date = Some(now - Duration::hours(1));
        assert!(!banner.is_live_at(now));

        banner.end_date = None;
        banner.is_active = false;
        assert!(!banner.is_live_at(now));
    }

    #[test]
    fn test_banner_input_window_check() {
        let now = Utc::now();
        let input = BannerInput {
            title: "Sale".to_string(),
            content: String::new(),
            subtitle: None,
            image_url: None,
            start_date: Some(now),
            end_date: Some(now - Duration::days(1)),
            is_active: true,
            cta_button_text: None,
            cta_button_link: None,
        };
        assert!(input.check_window().is_err());
    }

    #[test]
    fn test_model_serializes_camel_case() {
        let now = Utc::now();
        let post = BlogPost {
            id: "post_1".to_string(),
            slug: "hello".to_string(),
            title: "Hello".to_string(),
            image_url: None,
            image_alt: None,
            excerpt: String::new(),
            content_html: "<p>hi</p>".to_string(),
            is_pinned: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["isPinned"], true);
        assert_eq!(json["contentHtml"], "<p>hi</p>");
        assert!(json.get("is_pinned").is_none());
    }
}
