//! Localized page payloads assembled from the content services.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::domain::{
    Advisor, AppError, Banner, BlogPost, CaseStudy, CaseStudySlider, Hero, Locale, Resource,
    Service, Testimonial, Update, YouTubeEmbed,
};

use super::content::{ContentService, ContentServices};
use super::i18n;

/// Posts shown under the pinned one on the home page.
const HOME_LATEST_POSTS: usize = 3;
const HOME_LATEST_UPDATES: usize = 3;

/// An `hreflang` alternate link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateLink {
    pub hreflang: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub lang: &'static str,
    pub canonical: String,
    pub alternates: Vec<AlternateLink>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub meta: PageMeta,
    pub hero: Option<Hero>,
    pub banner: Option<Banner>,
    pub case_studies: Vec<CaseStudy>,
    pub case_study_sliders: Vec<CaseStudySlider>,
    pub testimonials: Vec<Testimonial>,
    pub pinned_post: Option<BlogPost>,
    pub latest_posts: Vec<BlogPost>,
    pub services: Vec<Service>,
    pub updates: Vec<Update>,
    pub advisors: Vec<Advisor>,
    pub youtube: Option<YouTubeEmbed>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub meta: PageMeta,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailPage<T> {
    pub meta: PageMeta,
    pub item: T,
}

pub struct PageService {
    content: Arc<ContentServices>,
    site_url: String,
}

impl PageService {
    #[must_use]
    pub fn new(content: Arc<ContentServices>, site_url: impl Into<String>) -> Self {
        Self {
            content,
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Configured site origin without a trailing slash.
    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Absolute URL of `/{locale}{path}`.
    fn url(&self, locale: Locale, path: &str) -> String {
        format!("{}/{}{}", self.site_url, locale.as_str(), path)
    }

    /// Page meta with alternates for the locales in `available`.
    fn meta(
        &self,
        locale: Locale,
        path: &str,
        title: String,
        description: String,
        available: &[Locale],
    ) -> PageMeta {
        let mut alternates: Vec<AlternateLink> = available
            .iter()
            .map(|&l| AlternateLink {
                hreflang: l.language_tag().to_string(),
                href: self.url(l, path),
            })
            .collect();
        if available.contains(&Locale::DEFAULT) {
            alternates.push(AlternateLink {
                hreflang: "x-default".to_string(),
                href: self.url(Locale::DEFAULT, path),
            });
        }

        PageMeta {
            title,
            description,
            lang: locale.language_tag(),
            canonical: self.url(locale, path),
            alternates,
        }
    }

    fn section_meta(&self, locale: Locale, section: &str, path: &str) -> PageMeta {
        let site = i18n::text_or_key(locale, "meta.siteName");
        let title = i18n::text_or_key(locale, &format!("meta.{section}.title"));
        let description = i18n::text_or_key(locale, &format!("meta.{section}.description"));
        self.meta(
            locale,
            path,
            format!("{title} | {site}"),
            description,
            &Locale::ALL,
        )
    }

    /// Meta for a detail page; alternates only name locales that publish
    /// the same slug.
    async fn detail_meta<R: Resource>(
        &self,
        service: &ContentService<R>,
        locale: Locale,
        path: &str,
        slug: &str,
        title: &str,
        description: &str,
    ) -> Result<PageMeta, AppError> {
        let mut available = Vec::with_capacity(Locale::ALL.len());
        for candidate in Locale::ALL {
            match service.find_by_slug(candidate, slug).await {
                Ok(_) => available.push(candidate),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        let site = i18n::text_or_key(locale, "meta.siteName");
        Ok(self.meta(
            locale,
            path,
            format!("{title} | {site}"),
            description.to_string(),
            &available,
        ))
    }

    #[instrument(skip(self))]
    pub async fn home(&self, locale: Locale) -> Result<HomePage, AppError> {
        let c = &self.content;
        let (hero, banner, case_studies, case_study_sliders, testimonials, posts) = tokio::try_join!(
            c.hero.current(locale),
            c.banners.active(locale, Utc::now()),
            c.case_studies.list_public(locale),
            c.case_study_sliders.list_public(locale),
            c.testimonials.list_public(locale),
            c.blog_posts.list_public(locale),
        )?;
        let (services, updates, advisors, youtube) = tokio::try_join!(
            c.services.list_public(locale),
            c.updates.list_public(locale),
            c.advisors.list_public(locale),
            c.youtube.current(locale),
        )?;

        let pinned_post = posts.iter().find(|p| p.is_pinned).cloned();
        let latest_posts = posts
            .into_iter()
            .filter(|p| !p.is_pinned)
            .take(HOME_LATEST_POSTS)
            .collect();

        Ok(HomePage {
            meta: self.section_meta(locale, "home", ""),
            hero,
            banner,
            case_studies,
            case_study_sliders,
            testimonials,
            pinned_post,
            latest_posts,
            services,
            updates: updates.into_iter().take(HOME_LATEST_UPDATES).collect(),
            advisors,
            youtube,
        })
    }

    pub async fn blog_index(&self, locale: Locale) -> Result<ListPage<BlogPost>, AppError> {
        let mut items = self.content.blog_posts.list_public(locale).await?;
        // Pinned post first, the rest newest first.
        items.sort_by_key(|p| !p.is_pinned);
        Ok(ListPage {
            meta: self.section_meta(locale, "blog", "/blog"),
            items,
        })
    }

    pub async fn blog_post(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<DetailPage<BlogPost>, AppError> {
        let posts = &self.content.blog_posts;
        let item = posts.find_by_slug(locale, slug).await?;
        let path = format!("/blog/{slug}");
        let meta = self
            .detail_meta(posts, locale, &path, slug, &item.title, &item.excerpt)
            .await?;
        Ok(DetailPage { meta, item })
    }

    pub async fn case_study(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<DetailPage<CaseStudy>, AppError> {
        let studies = &self.content.case_studies;
        let item = studies.find_by_slug(locale, slug).await?;
        let path = format!("/case-studies/{slug}");
        let meta = self
            .detail_meta(studies, locale, &path, slug, &item.title, &item.subtitle)
            .await?;
        Ok(DetailPage { meta, item })
    }

    pub async fn update(&self, locale: Locale, slug: &str) -> Result<DetailPage<Update>, AppError> {
        let updates = &self.content.updates;
        let item = updates.find_by_slug(locale, slug).await?;
        let path = format!("/updates/{slug}");
        let meta = self
            .detail_meta(updates, locale, &path, slug, &item.title, &item.excerpt)
            .await?;
        Ok(DetailPage { meta, item })
    }

    pub async fn service(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<DetailPage<Service>, AppError> {
        let services = &self.content.services;
        let item = services.find_by_slug(locale, slug).await?;
        let path = format!("/services/{slug}");
        let meta = self
            .detail_meta(services, locale, &path, slug, &item.title, &item.excerpt)
            .await?;
        Ok(DetailPage { meta, item })
    }

    /// `sitemap.xml` covering the section and detail pages of both locales.
    #[instrument(skip(self))]
    pub async fn sitemap(&self) -> Result<String, AppError> {
        let mut entries: Vec<(String, Option<DateTime<Utc>>)> = Vec::new();
        for locale in Locale::ALL {
            let c = &self.content;
            let (posts, case_studies, updates, services) = tokio::try_join!(
                c.blog_posts.list_public(locale),
                c.case_studies.list_public(locale),
                c.updates.list_public(locale),
                c.services.list_public(locale),
            )?;

            entries.push((self.url(locale, ""), None));
            entries.push((self.url(locale, "/blog"), None));
            entries.extend(
                posts
                    .iter()
                    .map(|p| (self.url(locale, &format!("/blog/{}", p.slug)), Some(p.updated_at))),
            );
            entries.extend(case_studies.iter().map(|cs| {
                (
                    self.url(locale, &format!("/case-studies/{}", cs.slug)),
                    Some(cs.updated_at),
                )
            }));
            entries.extend(updates.iter().map(|u| {
                (
                    self.url(locale, &format!("/updates/{}", u.slug)),
                    Some(u.updated_at),
                )
            }));
            entries.extend(services.iter().map(|s| {
                (
                    self.url(locale, &format!("/services/{}", s.slug)),
                    Some(s.updated_at),
                )
            }));
        }

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for (loc, lastmod) in entries {
            let _ = write!(xml, "  <url><loc>{}</loc>", escape_xml(&loc));
            if let Some(at) = lastmod {
                let _ = write!(xml, "<lastmod>{}</lastmod>", at.format("%Y-%m-%d"));
            }
            xml.push_str("</url>\n");
        }
        xml.push_str("</urlset>\n");
        Ok(xml)
    }
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
