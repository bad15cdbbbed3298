//! SQL descriptors binding each resource to its per-locale tables.

use sqlx::Postgres;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;

use crate::domain::{
    Advisors, Banners, BlogPosts, CaseStudies, Heroes, Locale, Resource, Services, Testimonials,
    Updates, YouTubeEmbeds,
};

use super::mapper::{
    AdvisorRow, BannerRow, BlogPostRow, CaseStudyRow, HeroRow, ServiceRow, TestimonialRow,
    UpdateRow, YouTubeRow,
};

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A resource stored in `<TABLE>_<locale>` tables.
pub trait PgResource: Resource {
    type Row: for<'r> sqlx::FromRow<'r, PgRow>
        + Into<Self::Model>
        + for<'a> From<&'a Self::Model>
        + Send
        + Unpin;

    const TABLE: &'static str;
    /// Column list in bind order; `id` first.
    const COLUMNS: &'static [&'static str];
    /// Must agree with [`Resource::sort`].
    const ORDER_BY: &'static str;
    const EXCLUSIVE_COLUMN: Option<&'static str> = None;

    /// Binds every column of `row` in [`Self::COLUMNS`] order.
    fn bind_row(query: PgQuery<'_>, row: Self::Row) -> PgQuery<'_>;

    fn table(locale: Locale) -> String {
        format!("{}_{}", Self::TABLE, locale.as_str())
    }

    fn column_list() -> String {
        Self::COLUMNS.join(", ")
    }
}

impl PgResource for CaseStudies {
    type Row = CaseStudyRow;

    const TABLE: &'static str = "case_studies";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "slug",
        "title",
        "subtitle",
        "description",
        "tags",
        "images",
        "color",
        "background_color",
        "theme",
        "order_index",
        "cta_url",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "order_index ASC, created_at ASC";

    fn bind_row(query: PgQuery<'_>, row: CaseStudyRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.slug)
            .bind(row.title)
            .bind(row.subtitle)
            .bind(row.description)
            .bind(row.tags)
            .bind(row.images)
            .bind(row.color)
            .bind(row.background_color)
            .bind(row.theme)
            .bind(row.order_index)
            .bind(row.cta_url)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for Testimonials {
    type Row = TestimonialRow;

    const TABLE: &'static str = "testimonials";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "author",
        "role",
        "company",
        "quote",
        "image",
        "image_alt",
        "order_index",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "order_index ASC, created_at ASC";

    fn bind_row(query: PgQuery<'_>, row: TestimonialRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.author)
            .bind(row.role)
            .bind(row.company)
            .bind(row.quote)
            .bind(row.image)
            .bind(row.image_alt)
            .bind(row.order_index)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for BlogPosts {
    type Row = BlogPostRow;

    const TABLE: &'static str = "blog_posts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "slug",
        "title",
        "image_url",
        "image_alt",
        "excerpt",
        "content_html",
        "is_pinned",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";
    const EXCLUSIVE_COLUMN: Option<&'static str> = Some("is_pinned");

    fn bind_row(query: PgQuery<'_>, row: BlogPostRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.slug)
            .bind(row.title)
            .bind(row.image_url)
            .bind(row.image_alt)
            .bind(row.excerpt)
            .bind(row.content_html)
            .bind(row.is_pinned)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for Banners {
    type Row = BannerRow;

    const TABLE: &'static str = "banners";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "content",
        "subtitle",
        "image_url",
        "start_date",
        "end_date",
        "is_active",
        "cta_button_text",
        "cta_button_link",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn bind_row(query: PgQuery<'_>, row: BannerRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.title)
            .bind(row.content)
            .bind(row.subtitle)
            .bind(row.image_url)
            .bind(row.start_date)
            .bind(row.end_date)
            .bind(row.is_active)
            .bind(row.cta_button_text)
            .bind(row.cta_button_link)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for Heroes {
    type Row = HeroRow;

    const TABLE: &'static str = "hero";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "subtitle",
        "background_image",
        "cta_text",
        "cta_link",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at ASC";

    fn bind_row(query: PgQuery<'_>, row: HeroRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.title)
            .bind(row.subtitle)
            .bind(row.background_image)
            .bind(row.cta_text)
            .bind(row.cta_link)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for Updates {
    type Row = UpdateRow;

    const TABLE: &'static str = "updates";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "slug",
        "title",
        "publish_date",
        "content_html",
        "excerpt",
        "image_url",
        "image_alt",
        "is_published",
        "order_index",
        "created_at",
        "updated_at",
    ];
    // publish_date is text; rows are re-sorted after mapping.
    const ORDER_BY: &'static str = "publish_date DESC, order_index ASC";

    fn bind_row(query: PgQuery<'_>, row: UpdateRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.slug)
            .bind(row.title)
            .bind(row.publish_date)
            .bind(row.content_html)
            .bind(row.excerpt)
            .bind(row.image_url)
            .bind(row.image_alt)
            .bind(row.is_published)
            .bind(row.order_index)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for Services {
    type Row = ServiceRow;

    const TABLE: &'static str = "services";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "slug",
        "title",
        "content_html",
        "excerpt",
        "keywords",
        "is_published",
        "order_index",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "order_index ASC, created_at ASC";

    fn bind_row(query: PgQuery<'_>, row: ServiceRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.slug)
            .bind(row.title)
            .bind(row.content_html)
            .bind(row.excerpt)
            .bind(row.keywords)
            .bind(row.is_published)
            .bind(row.order_index)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for Advisors {
    type Row = AdvisorRow;

    const TABLE: &'static str = "advisors";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "role",
        "bio",
        "image_url",
        "image_alt",
        "linkedin_url",
        "order_index",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "order_index ASC, created_at ASC";

    fn bind_row(query: PgQuery<'_>, row: AdvisorRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.name)
            .bind(row.role)
            .bind(row.bio)
            .bind(row.image_url)
            .bind(row.image_alt)
            .bind(row.linkedin_url)
            .bind(row.order_index)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

impl PgResource for YouTubeEmbeds {
    type Row = YouTubeRow;

    const TABLE: &'static str = "youtube";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "video_url",
        "video_id",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at ASC";

    fn bind_row(query: PgQuery<'_>, row: YouTubeRow) -> PgQuery<'_> {
        query
            .bind(row.id)
            .bind(row.title)
            .bind(row.video_url)
            .bind(row.video_id)
            .bind(row.created_at)
            .bind(row.updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_per_locale() {
        assert_eq!(BlogPosts::table(Locale::En), "blog_posts_en");
        assert_eq!(Heroes::table(Locale::Pl), "hero_pl");
    }

    #[test]
    fn test_columns_start_with_id() {
        assert_eq!(CaseStudies::COLUMNS[0], "id");
        assert_eq!(YouTubeEmbeds::COLUMNS[0], "id");
        assert!(BlogPosts::column_list().contains("is_pinned"));
        assert_eq!(BlogPosts::EXCLUSIVE_COLUMN, Some("is_pinned"));
        assert_eq!(Services::EXCLUSIVE_COLUMN, None);
    }
}
