//! Resource descriptors tying each localized entity to its input payload,
//! cache tag and identity rules.
//!
//! Repositories and services are generic over [`Resource`], so adding an
//! entity means adding one marker type here plus its persistence record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use validator::Validate;

use super::content::{
    Advisor, AdvisorInput, Banner, BannerInput, BlogPost, BlogPostInput, CaseStudy,
    CaseStudyInput, CaseStudySlider, CaseStudySliderInput, Hero, HeroInput, Service,
    ServiceInput, Testimonial, TestimonialInput, Update, UpdateInput, YouTubeEmbed,
    YouTubeEmbedInput, parse_youtube_id, youtube_embed_url,
};
use super::error::ValidationError;
use super::locale::Locale;

/// Cache tags. Every cached read is stored under exactly one of these and a
/// successful write invalidates the tag of the entity it touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheTag {
    CaseStudies,
    CaseStudySliders,
    Testimonials,
    BlogPosts,
    Banners,
    Hero,
    Updates,
    Services,
    Advisors,
    YouTube,
    Apps,
    Tags,
}

impl CacheTag {
    pub const ALL: [CacheTag; 12] = [
        CacheTag::CaseStudies,
        CacheTag::CaseStudySliders,
        CacheTag::Testimonials,
        CacheTag::BlogPosts,
        CacheTag::Banners,
        CacheTag::Hero,
        CacheTag::Updates,
        CacheTag::Services,
        CacheTag::Advisors,
        CacheTag::YouTube,
        CacheTag::Apps,
        CacheTag::Tags,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CacheTag::CaseStudies => "case-studies",
            CacheTag::CaseStudySliders => "case-study-sliders",
            CacheTag::Testimonials => "testimonials",
            CacheTag::BlogPosts => "blog-posts",
            CacheTag::Banners => "banners",
            CacheTag::Hero => "hero",
            CacheTag::Updates => "updates",
            CacheTag::Services => "services",
            CacheTag::Advisors => "advisors",
            CacheTag::YouTube => "youtube",
            CacheTag::Apps => "apps",
            CacheTag::Tags => "tags",
        }
    }

    /// Tags whose cached reads embed data owned by this tag.
    #[must_use]
    pub fn dependents(self) -> &'static [CacheTag] {
        match self {
            CacheTag::Tags => &[CacheTag::Apps],
            _ => &[],
        }
    }

    /// Cache key for a per-locale read under this tag.
    #[must_use]
    pub fn key(self, locale: Locale) -> String {
        format!("{}-{}", self.as_str(), locale.as_str())
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "tag".to_string(),
                message: format!("unknown cache tag '{s}'"),
            })
    }
}

/// Describes one localized entity.
pub trait Resource: Send + Sync + 'static {
    /// Domain shape returned to callers.
    type Model: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Create/update payload.
    type Input: fmt::Debug + Validate + DeserializeOwned + Send + Sync + 'static;

    const TAG: CacheTag;
    /// Human-readable singular name used in error messages.
    const NAME: &'static str;
    const ID_PREFIX: &'static str;
    /// Cached reads are kept until the next write instead of expiring.
    const CACHE_UNTIL_WRITE: bool = false;

    fn id(model: &Self::Model) -> &str;

    fn created_at(model: &Self::Model) -> DateTime<Utc>;

    fn build(
        id: String,
        input: Self::Input,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self::Model;

    fn slug(_model: &Self::Model) -> Option<&str> {
        None
    }

    fn input_slug(_input: &Self::Input) -> Option<&str> {
        None
    }

    /// Cross-field checks the derive cannot express.
    fn check(_input: &Self::Input) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Listing order; persistence backends must agree with it.
    fn sort(_models: &mut [Self::Model]) {}

    fn is_public(_model: &Self::Model) -> bool {
        true
    }

    /// Flag that at most one record per locale may carry.
    fn exclusive_flag(_model: &mut Self::Model) -> Option<&mut bool> {
        None
    }

    /// Singletons use one well-known id per locale.
    fn fixed_id(_locale: Locale) -> Option<String> {
        None
    }

    fn new_id(locale: Locale) -> String {
        Self::fixed_id(locale)
            .unwrap_or_else(|| format!("{}_{}", Self::ID_PREFIX, uuid::Uuid::new_v4()))
    }
}

pub struct CaseStudies;
pub struct CaseStudySliders;
pub struct Testimonials;
pub struct BlogPosts;
pub struct Banners;
pub struct Heroes;
pub struct Updates;
pub struct Services;
pub struct Advisors;
pub struct YouTubeEmbeds;

impl Resource for CaseStudies {
    type Model = CaseStudy;
    type Input = CaseStudyInput;

    const TAG: CacheTag = CacheTag::CaseStudies;
    const NAME: &'static str = "case study";
    const ID_PREFIX: &'static str = "cs";

    fn id(model: &CaseStudy) -> &str {
        &model.id
    }

    fn created_at(model: &CaseStudy) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: CaseStudyInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> CaseStudy {
        CaseStudy {
            id,
            slug: input.slug,
            title: input.title,
            subtitle: input.subtitle,
            description: input.description,
            tags: input
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            images: input.images,
            color: input.color,
            background_color: input.background_color,
            theme: input.theme,
            order_index: input.order_index,
            cta_url: input.cta_url,
            created_at,
            updated_at,
        }
    }

    fn slug(model: &CaseStudy) -> Option<&str> {
        Some(&model.slug)
    }

    fn input_slug(input: &CaseStudyInput) -> Option<&str> {
        Some(&input.slug)
    }

    fn sort(models: &mut [CaseStudy]) {
        models.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(a.created_at.cmp(&b.created_at))
        });
    }
}

impl Resource for CaseStudySliders {
    type Model = CaseStudySlider;
    type Input = CaseStudySliderInput;

    const TAG: CacheTag = CacheTag::CaseStudySliders;
    const NAME: &'static str = "case study slider";
    const ID_PREFIX: &'static str = "slider";

    fn id(model: &CaseStudySlider) -> &str {
        &model.id
    }

    fn created_at(model: &CaseStudySlider) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: CaseStudySliderInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> CaseStudySlider {
        CaseStudySlider {
            id,
            theme: input.theme,
            images: input.images,
            created_at,
            updated_at,
        }
    }

    fn sort(models: &mut [CaseStudySlider]) {
        models.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }
}

impl Resource for Testimonials {
    type Model = Testimonial;
    type Input = TestimonialInput;

    const TAG: CacheTag = CacheTag::Testimonials;
    const NAME: &'static str = "testimonial";
    const ID_PREFIX: &'static str = "testimonial";

    fn id(model: &Testimonial) -> &str {
        &model.id
    }

    fn created_at(model: &Testimonial) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: TestimonialInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Testimonial {
        Testimonial {
            id,
            author: input.author,
            role: input.role,
            company: input.company,
            quote: input.quote,
            image: input.image,
            image_alt: input.image_alt,
            order_index: input.order_index,
            created_at,
            updated_at,
        }
    }

    fn sort(models: &mut [Testimonial]) {
        models.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(a.created_at.cmp(&b.created_at))
        });
    }
}

impl Resource for BlogPosts {
    type Model = BlogPost;
    type Input = BlogPostInput;

    const TAG: CacheTag = CacheTag::BlogPosts;
    const NAME: &'static str = "blog post";
    const ID_PREFIX: &'static str = "post";

    fn id(model: &BlogPost) -> &str {
        &model.id
    }

    fn created_at(model: &BlogPost) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: BlogPostInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> BlogPost {
        BlogPost {
            id,
            slug: input.slug,
            title: input.title,
            image_url: input.image_url,
            image_alt: input.image_alt,
            excerpt: input.excerpt,
            content_html: input.content_html,
            is_pinned: input.is_pinned,
            created_at,
            updated_at,
        }
    }

    fn slug(model: &BlogPost) -> Option<&str> {
        Some(&model.slug)
    }

    fn input_slug(input: &BlogPostInput) -> Option<&str> {
        Some(&input.slug)
    }

    fn sort(models: &mut [BlogPost]) {
        models.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    }

    fn exclusive_flag(model: &mut BlogPost) -> Option<&mut bool> {
        Some(&mut model.is_pinned)
    }
}

impl Resource for Banners {
    type Model = Banner;
    type Input = BannerInput;

    const TAG: CacheTag = CacheTag::Banners;
    const NAME: &'static str = "banner";
    const ID_PREFIX: &'static str = "banner";

    fn id(model: &Banner) -> &str {
        &model.id
    }

    fn created_at(model: &Banner) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: BannerInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Banner {
        Banner {
            id,
            title: input.title,
            content: input.content,
            subtitle: input.subtitle,
            image_url: input.image_url,
            start_date: input.start_date,
            end_date: input.end_date,
            is_active: input.is_active,
            cta_button_text: input.cta_button_text,
            cta_button_link: input.cta_button_link,
            created_at,
            updated_at,
        }
    }

    fn check(input: &BannerInput) -> Result<(), ValidationError> {
        input
            .check_window()
            .map_err(|_| ValidationError::InvalidField {
                field: "endDate".to_string(),
                message: "must not be before startDate".to_string(),
            })
    }

    fn sort(models: &mut [Banner]) {
        models.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    }
}

impl Resource for Heroes {
    type Model = Hero;
    type Input = HeroInput;

    const TAG: CacheTag = CacheTag::Hero;
    const NAME: &'static str = "hero";
    const ID_PREFIX: &'static str = "hero";
    const CACHE_UNTIL_WRITE: bool = true;

    fn id(model: &Hero) -> &str {
        &model.id
    }

    fn created_at(model: &Hero) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: HeroInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Hero {
        Hero {
            id,
            title: input.title,
            subtitle: input.subtitle,
            background_image: input.background_image,
            cta_text: input.cta_text,
            cta_link: input.cta_link,
            created_at,
            updated_at,
        }
    }

    fn fixed_id(locale: Locale) -> Option<String> {
        Some(format!("hero_{}_1", locale.as_str()))
    }
}

impl Resource for Updates {
    type Model = Update;
    type Input = UpdateInput;

    const TAG: CacheTag = CacheTag::Updates;
    const NAME: &'static str = "update";
    const ID_PREFIX: &'static str = "update";

    fn id(model: &Update) -> &str {
        &model.id
    }

    fn created_at(model: &Update) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: UpdateInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Update {
        Update {
            id,
            slug: input.slug,
            title: input.title,
            publish_date: input.publish_date.unwrap_or(created_at),
            content_html: input.content_html,
            excerpt: input.excerpt,
            image_url: input.image_url,
            image_alt: input.image_alt,
            is_published: input.is_published,
            order_index: input.order_index,
            created_at,
            updated_at,
        }
    }

    fn slug(model: &Update) -> Option<&str> {
        Some(&model.slug)
    }

    fn input_slug(input: &UpdateInput) -> Option<&str> {
        Some(&input.slug)
    }

    fn sort(models: &mut [Update]) {
        models.sort_by(|a, b| {
            b.publish_date
                .cmp(&a.publish_date)
                .then(a.order_index.cmp(&b.order_index))
        });
    }

    fn is_public(model: &Update) -> bool {
        model.is_published
    }
}

impl Resource for Services {
    type Model = Service;
    type Input = ServiceInput;

    const TAG: CacheTag = CacheTag::Services;
    const NAME: &'static str = "service";
    const ID_PREFIX: &'static str = "service";

    fn id(model: &Service) -> &str {
        &model.id
    }

    fn created_at(model: &Service) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: ServiceInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Service {
        Service {
            id,
            slug: input.slug,
            title: input.title,
            content_html: input.content_html,
            excerpt: input.excerpt,
            keywords: input
                .keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            is_published: input.is_published,
            order_index: input.order_index,
            created_at,
            updated_at,
        }
    }

    fn slug(model: &Service) -> Option<&str> {
        Some(&model.slug)
    }

    fn input_slug(input: &ServiceInput) -> Option<&str> {
        Some(&input.slug)
    }

    fn sort(models: &mut [Service]) {
        models.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(a.created_at.cmp(&b.created_at))
        });
    }

    fn is_public(model: &Service) -> bool {
        model.is_published
    }
}

impl Resource for Advisors {
    type Model = Advisor;
    type Input = AdvisorInput;

    const TAG: CacheTag = CacheTag::Advisors;
    const NAME: &'static str = "advisor";
    const ID_PREFIX: &'static str = "advisor";

    fn id(model: &Advisor) -> &str {
        &model.id
    }

    fn created_at(model: &Advisor) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: AdvisorInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Advisor {
        Advisor {
            id,
            name: input.name,
            role: input.role,
            bio: input.bio,
            image_url: input.image_url,
            image_alt: input.image_alt,
            linkedin_url: input.linkedin_url,
            order_index: input.order_index,
            created_at,
            updated_at,
        }
    }

    fn sort(models: &mut [Advisor]) {
        models.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(a.created_at.cmp(&b.created_at))
        });
    }
}

impl Resource for YouTubeEmbeds {
    type Model = YouTubeEmbed;
    type Input = YouTubeEmbedInput;

    const TAG: CacheTag = CacheTag::YouTube;
    const NAME: &'static str = "youtube embed";
    const ID_PREFIX: &'static str = "youtube";
    const CACHE_UNTIL_WRITE: bool = true;

    fn id(model: &YouTubeEmbed) -> &str {
        &model.id
    }

    fn created_at(model: &YouTubeEmbed) -> DateTime<Utc> {
        model.created_at
    }

    fn build(
        id: String,
        input: YouTubeEmbedInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> YouTubeEmbed {
        let video_id = parse_youtube_id(&input.video_url).unwrap_or_default();
        YouTubeEmbed {
            id,
            title: input.title,
            embed_url: youtube_embed_url(&video_id),
            video_id,
            video_url: input.video_url,
            created_at,
            updated_at,
        }
    }

    fn fixed_id(locale: Locale) -> Option<String> {
        Some(format!("youtube_{}_1", locale.as_str()))
    }
}
