//! Domain layer containing core business types, traits, and error definitions.

pub mod catalog;
pub mod content;
pub mod error;
pub mod locale;
pub mod rating;
pub mod resource;
pub mod traits;
pub mod types;
pub mod upload;

pub use catalog::{
    App, AppInput, AppTagsInput, Rating, RatingInput, RatingSummary, Screenshot,
    ScreenshotInput, Tag, TagInput,
};
pub use content::{
    Advisor, AdvisorInput, Banner, BannerInput, BlogPost, BlogPostInput, CaseStudy,
    CaseStudyInput, CaseStudySlider, CaseStudySliderInput, Hero, HeroInput, ImageRef, Service,
    ServiceInput, SliderImage, Testimonial, TestimonialInput, Update, UpdateInput, YouTubeEmbed,
    YouTubeEmbedInput, parse_youtube_id, youtube_embed_url,
};
pub use error::{AppError, ConfigError, DatabaseError, StorageError, ValidationError};
pub use locale::Locale;
pub use rating::{StarRating, average_rating};
pub use resource::{
    Advisors, Banners, BlogPosts, CacheTag, CaseStudies, CaseStudySliders, Heroes, Resource,
    Services, Testimonials, Updates, YouTubeEmbeds,
};
pub use traits::{AppCatalogRepository, AuthProvider, BlobStore, ContentRepository, HealthCheck};
pub use types::{
    ErrorResponse, HealthResponse, HealthStatus, RateLimitResponse, Session, StoredBlob,
};
pub use upload::{UploadGrant, UploadToken, UploadTokenRequest};
