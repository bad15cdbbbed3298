//! Persisted row shapes and their conversion to and from domain models.
//!
//! Array fields are stored as JSON text. Rows written by older tooling may
//! hold comma-separated text instead, or something unparseable; reads accept
//! both and fall back to an empty list rather than failing the whole page.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{
    Advisor, Banner, BlogPost, CaseStudy, CaseStudySlider, Hero, ImageRef, Service, SliderImage,
    Testimonial, Update, YouTubeEmbed, parse_youtube_id, youtube_embed_url,
};

/// Parses a JSON array column, logging and discarding malformed values.
pub fn parse_json_list<T: DeserializeOwned>(raw: Option<&str>, column: &str) -> Vec<T> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(column, error = %e, "unparseable JSON column, using empty list");
        Vec::new()
    })
}

/// Parses a string list stored either as a JSON array or as comma-separated text.
pub fn parse_string_list(raw: Option<&str>, column: &str) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    if raw.starts_with('[') {
        return parse_json_list(Some(raw), column);
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serializes a list column. Always JSON, whatever the row held before.
pub fn to_json_text<T: serde::Serialize>(values: &[T]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Parses a text date (RFC 3339 or `YYYY-MM-DD`), falling back to `fallback`.
pub fn parse_text_date(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return fallback;
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(fallback, |naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseStudyRow {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub tags: Option<String>,
    pub images: Option<String>,
    pub color: String,
    pub background_color: String,
    pub theme: String,
    pub order_index: i32,
    pub cta_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CaseStudyRow> for CaseStudy {
    fn from(row: CaseStudyRow) -> Self {
        CaseStudy {
            tags: parse_string_list(row.tags.as_deref(), "case_studies.tags"),
            images: parse_json_list::<ImageRef>(row.images.as_deref(), "case_studies.images"),
            id: row.id,
            slug: row.slug,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            color: row.color,
            background_color: row.background_color,
            theme: row.theme,
            order_index: row.order_index,
            cta_url: row.cta_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&CaseStudy> for CaseStudyRow {
    fn from(model: &CaseStudy) -> Self {
        CaseStudyRow {
            id: model.id.clone(),
            slug: model.slug.clone(),
            title: model.title.clone(),
            subtitle: model.subtitle.clone(),
            description: model.description.clone(),
            tags: Some(to_json_text(&model.tags)),
            images: Some(to_json_text(&model.images)),
            color: model.color.clone(),
            background_color: model.background_color.clone(),
            theme: model.theme.clone(),
            order_index: model.order_index,
            cta_url: model.cta_url.clone(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Slider header; images live in a child table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SliderRow {
    pub id: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SliderImageRow {
    pub slider_id: String,
    pub image: String,
    pub alt: String,
    pub position: i32,
}

impl SliderRow {
    /// Joins the header with its images, ordered by position.
    pub fn into_domain(self, images: &[SliderImageRow]) -> CaseStudySlider {
        let mut own: Vec<&SliderImageRow> =
            images.iter().filter(|i| i.slider_id == self.id).collect();
        own.sort_by_key(|i| i.position);
        CaseStudySlider {
            images: own
                .into_iter()
                .map(|i| SliderImage {
                    image: i.image.clone(),
                    alt: i.alt.clone(),
                })
                .collect(),
            id: self.id,
            theme: self.theme,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub fn slider_to_rows(model: &CaseStudySlider) -> (SliderRow, Vec<SliderImageRow>) {
    let header = SliderRow {
        id: model.id.clone(),
        theme: model.theme.clone(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    };
    let images = model
        .images
        .iter()
        .zip(0..)
        .map(|(image, position)| SliderImageRow {
            slider_id: model.id.clone(),
            image: image.image.clone(),
            alt: image.alt.clone(),
            position,
        })
        .collect();
    (header, images)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TestimonialRow {
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

impl From<TestimonialRow> for Testimonial {
    fn from(row: TestimonialRow) -> Self {
        Testimonial {
            id: row.id,
            author: row.author,
            role: row.role,
            company: row.company,
            quote: row.quote,
            image: row.image,
            image_alt: row.image_alt,
            order_index: row.order_index,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Testimonial> for TestimonialRow {
    fn from(model: &Testimonial) -> Self {
        TestimonialRow {
            id: model.id.clone(),
            author: model.author.clone(),
            role: model.role.clone(),
            company: model.company.clone(),
            quote: model.quote.clone(),
            image: model.image.clone(),
            image_alt: model.image_alt.clone(),
            order_index: model.order_index,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BlogPostRow {
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

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        BlogPost {
            id: row.id,
            slug: row.slug,
            title: row.title,
            image_url: row.image_url,
            image_alt: row.image_alt,
            excerpt: row.excerpt,
            content_html: row.content_html,
            is_pinned: row.is_pinned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&BlogPost> for BlogPostRow {
    fn from(model: &BlogPost) -> Self {
        BlogPostRow {
            id: model.id.clone(),
            slug: model.slug.clone(),
            title: model.title.clone(),
            image_url: model.image_url.clone(),
            image_alt: model.image_alt.clone(),
            excerpt: model.excerpt.clone(),
            content_html: model.content_html.clone(),
            is_pinned: model.is_pinned,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BannerRow {
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

impl From<BannerRow> for Banner {
    fn from(row: BannerRow) -> Self {
        Banner {
            id: row.id,
            title: row.title,
            content: row.content,
            subtitle: row.subtitle,
            image_url: row.image_url,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            cta_button_text: row.cta_button_text,
            cta_button_link: row.cta_button_link,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Banner> for BannerRow {
    fn from(model: &Banner) -> Self {
        BannerRow {
            id: model.id.clone(),
            title: model.title.clone(),
            content: model.content.clone(),
            subtitle: model.subtitle.clone(),
            image_url: model.image_url.clone(),
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            cta_button_text: model.cta_button_text.clone(),
            cta_button_link: model.cta_button_link.clone(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HeroRow {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub background_image: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HeroRow> for Hero {
    fn from(row: HeroRow) -> Self {
        Hero {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            background_image: row.background_image,
            cta_text: row.cta_text,
            cta_link: row.cta_link,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Hero> for HeroRow {
    fn from(model: &Hero) -> Self {
        HeroRow {
            id: model.id.clone(),
            title: model.title.clone(),
            subtitle: model.subtitle.clone(),
            background_image: model.background_image.clone(),
            cta_text: model.cta_text.clone(),
            cta_link: model.cta_link.clone(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UpdateRow {
    pub id: String,
    pub slug: String,
    pub title: String,
    /// Text column; see [`parse_text_date`].
    pub publish_date: Option<String>,
    pub content_html: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub is_published: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UpdateRow> for Update {
    fn from(row: UpdateRow) -> Self {
        Update {
            publish_date: parse_text_date(row.publish_date.as_deref(), row.created_at),
            id: row.id,
            slug: row.slug,
            title: row.title,
            content_html: row.content_html,
            excerpt: row.excerpt,
            image_url: row.image_url,
            image_alt: row.image_alt,
            is_published: row.is_published,
            order_index: row.order_index,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Update> for UpdateRow {
    fn from(model: &Update) -> Self {
        UpdateRow {
            id: model.id.clone(),
            slug: model.slug.clone(),
            title: model.title.clone(),
            publish_date: Some(model.publish_date.to_rfc3339()),
            content_html: model.content_html.clone(),
            excerpt: model.excerpt.clone(),
            image_url: model.image_url.clone(),
            image_alt: model.image_alt.clone(),
            is_published: model.is_published,
            order_index: model.order_index,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content_html: String,
    pub excerpt: String,
    pub keywords: Option<String>,
    pub is_published: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            keywords: parse_string_list(row.keywords.as_deref(), "services.keywords"),
            id: row.id,
            slug: row.slug,
            title: row.title,
            content_html: row.content_html,
            excerpt: row.excerpt,
            is_published: row.is_published,
            order_index: row.order_index,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Service> for ServiceRow {
    fn from(model: &Service) -> Self {
        ServiceRow {
            id: model.id.clone(),
            slug: model.slug.clone(),
            title: model.title.clone(),
            content_html: model.content_html.clone(),
            excerpt: model.excerpt.clone(),
            keywords: Some(to_json_text(&model.keywords)),
            is_published: model.is_published,
            order_index: model.order_index,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdvisorRow {
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

impl From<AdvisorRow> for Advisor {
    fn from(row: AdvisorRow) -> Self {
        Advisor {
            id: row.id,
            name: row.name,
            role: row.role,
            bio: row.bio,
            image_url: row.image_url,
            image_alt: row.image_alt,
            linkedin_url: row.linkedin_url,
            order_index: row.order_index,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Advisor> for AdvisorRow {
    fn from(model: &Advisor) -> Self {
        AdvisorRow {
            id: model.id.clone(),
            name: model.name.clone(),
            role: model.role.clone(),
            bio: model.bio.clone(),
            image_url: model.image_url.clone(),
            image_alt: model.image_alt.clone(),
            linkedin_url: model.linkedin_url.clone(),
            order_index: model.order_index,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct YouTubeRow {
    pub id: String,
    pub title: String,
    pub video_url: String,
    pub video_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<YouTubeRow> for YouTubeEmbed {
    fn from(row: YouTubeRow) -> Self {
        let video_id = row
            .video_id
            .filter(|id| !id.is_empty())
            .or_else(|| parse_youtube_id(&row.video_url))
            .unwrap_or_default();
        YouTubeEmbed {
            embed_url: youtube_embed_url(&video_id),
            video_id,
            id: row.id,
            title: row.title,
            video_url: row.video_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&YouTubeEmbed> for YouTubeRow {
    fn from(model: &YouTubeEmbed) -> Self {
        YouTubeRow {
            id: model.id.clone(),
            title: model.title.clone(),
            video_url: model.video_url.clone(),
            video_id: Some(model.video_id.clone()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
