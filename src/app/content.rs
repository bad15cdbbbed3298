//! Per-entity content services.
//!
//! A [`ContentService`] wraps one resource's repository: reads go through the
//! shared [`TagCache`], writes hit the repository directly and then revalidate
//! the resource's cache tag. There is no optimistic locking; the last write
//! wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{
    Advisors, AppError, Banner, Banners, BlogPost, BlogPosts, CaseStudies, CaseStudySliders,
    ContentRepository, Heroes, Locale, Resource, Services, Testimonials, Updates, YouTubeEmbeds,
};

use super::cache::{CachePolicy, TagCache};
use super::state::Repositories;

/// Service for one localized resource.
pub struct ContentService<R: Resource> {
    repo: Arc<dyn ContentRepository<R>>,
    cache: Arc<TagCache>,
}

impl<R: Resource> ContentService<R> {
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository<R>>, cache: Arc<TagCache>) -> Self {
        Self { repo, cache }
    }

    fn policy() -> CachePolicy {
        if R::CACHE_UNTIL_WRITE {
            CachePolicy::Indefinite
        } else {
            CachePolicy::Window
        }
    }

    /// All records for `locale`, served from the cache under `<tag>-<locale>`.
    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn list(&self, locale: Locale) -> Result<Vec<R::Model>, AppError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .get_or_load(R::TAG, R::TAG.key(locale), Self::policy(), || async move {
                repo.list(locale).await
            })
            .await
    }

    /// Cached records visible on the public site.
    pub async fn list_public(&self, locale: Locale) -> Result<Vec<R::Model>, AppError> {
        let mut models = self.list(locale).await?;
        models.retain(|m| R::is_public(m));
        Ok(models)
    }

    /// Cached lookup by id.
    pub async fn find(&self, locale: Locale, id: &str) -> Result<R::Model, AppError> {
        self.list(locale)
            .await?
            .into_iter()
            .find(|m| R::id(m) == id)
            .ok_or_else(|| AppError::not_found(format!("{} '{id}'", R::NAME)))
    }

    /// Cached lookup of a publicly visible record by slug.
    pub async fn find_by_slug(&self, locale: Locale, slug: &str) -> Result<R::Model, AppError> {
        self.list_public(locale)
            .await?
            .into_iter()
            .find(|m| R::slug(m) == Some(slug))
            .ok_or_else(|| AppError::not_found(format!("{} '{slug}'", R::NAME)))
    }

    /// Uncached read straight from the repository, for admin edit forms.
    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn get(&self, locale: Locale, id: &str) -> Result<R::Model, AppError> {
        self.repo
            .get(locale, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} '{id}'", R::NAME)))
    }

    #[instrument(skip(self, input), fields(resource = R::NAME))]
    pub async fn create(&self, locale: Locale, input: R::Input) -> Result<R::Model, AppError> {
        Self::validate(&input)?;
        if let Some(slug) = R::input_slug(&input) {
            self.ensure_unique_slug(locale, slug, None).await?;
        }

        let id = R::new_id(locale);
        let now = Utc::now();
        let mut model = R::build(id, input, now, now);

        self.repo.insert(locale, &model).await?;
        self.apply_exclusive(locale, &mut model).await?;
        self.revalidate().await;

        counter!("content_mutations_total", "resource" => R::TAG.as_str(), "action" => "create")
            .increment(1);
        info!(id = %R::id(&model), %locale, "{} created", R::NAME);
        Ok(model)
    }

    #[instrument(skip(self, input), fields(resource = R::NAME))]
    pub async fn update(
        &self,
        locale: Locale,
        id: &str,
        input: R::Input,
    ) -> Result<R::Model, AppError> {
        Self::validate(&input)?;
        let existing = self.get(locale, id).await?;
        if let Some(slug) = R::input_slug(&input) {
            self.ensure_unique_slug(locale, slug, Some(id)).await?;
        }

        let created_at = R::created_at(&existing);
        let mut model = R::build(id.to_string(), input, created_at, Utc::now());

        if !self.repo.update(locale, &model).await? {
            return Err(AppError::not_found(format!("{} '{id}'", R::NAME)));
        }
        self.apply_exclusive(locale, &mut model).await?;
        self.revalidate().await;

        counter!("content_mutations_total", "resource" => R::TAG.as_str(), "action" => "update")
            .increment(1);
        info!(%id, %locale, "{} updated", R::NAME);
        Ok(model)
    }

    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn delete(&self, locale: Locale, id: &str) -> Result<(), AppError> {
        if !self.repo.delete(locale, id).await? {
            warn!(%id, %locale, "delete of missing {}", R::NAME);
            return Err(AppError::not_found(format!("{} '{id}'", R::NAME)));
        }
        self.revalidate().await;

        counter!("content_mutations_total", "resource" => R::TAG.as_str(), "action" => "delete")
            .increment(1);
        info!(%id, %locale, "{} deleted", R::NAME);
        Ok(())
    }

    /// Gives `id` the resource's exclusive flag, clearing it on every other
    /// record in the locale.
    ///
    /// Two admins flagging different records concurrently can still race; the
    /// later transaction wins.
    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn make_exclusive(&self, locale: Locale, id: &str) -> Result<R::Model, AppError> {
        if !self.repo.set_exclusive(locale, id).await? {
            return Err(AppError::not_found(format!("{} '{id}'", R::NAME)));
        }
        self.revalidate().await;
        self.get(locale, id).await
    }

    /// The singleton record for `locale`, if one was saved.
    pub async fn current(&self, locale: Locale) -> Result<Option<R::Model>, AppError> {
        let Some(id) = R::fixed_id(locale) else {
            return Err(AppError::NotSupported(format!("{} is not a singleton", R::NAME)));
        };
        Ok(self
            .list(locale)
            .await?
            .into_iter()
            .find(|m| R::id(m) == id))
    }

    /// Creates or replaces the singleton record for `locale`.
    #[instrument(skip(self, input), fields(resource = R::NAME))]
    pub async fn upsert(&self, locale: Locale, input: R::Input) -> Result<R::Model, AppError> {
        let Some(id) = R::fixed_id(locale) else {
            return Err(AppError::NotSupported(format!("{} is not a singleton", R::NAME)));
        };
        match self.repo.get(locale, &id).await? {
            Some(_) => self.update(locale, &id, input).await,
            None => self.create(locale, input).await,
        }
    }

    async fn revalidate(&self) {
        self.cache.revalidate_tag(R::TAG).await;
    }

    fn validate(input: &R::Input) -> Result<(), AppError> {
        input.validate()?;
        R::check(input)?;
        Ok(())
    }

    async fn ensure_unique_slug(
        &self,
        locale: Locale,
        slug: &str,
        except_id: Option<&str>,
    ) -> Result<(), AppError> {
        let taken = self
            .repo
            .list(locale)
            .await?
            .iter()
            .any(|m| R::slug(m) == Some(slug) && Some(R::id(m)) != except_id);
        if taken {
            return Err(AppError::duplicate(format!(
                "{} slug '{slug}' already exists in locale '{locale}'",
                R::NAME
            )));
        }
        Ok(())
    }

    async fn apply_exclusive(&self, locale: Locale, model: &mut R::Model) -> Result<(), AppError> {
        let flagged = R::exclusive_flag(model).is_some_and(|flag| *flag);
        if flagged {
            let id = R::id(model).to_string();
            self.repo.set_exclusive(locale, &id).await?;
        }
        Ok(())
    }
}

/// One service per localized resource.
pub struct ContentServices {
    pub case_studies: ContentService<CaseStudies>,
    pub case_study_sliders: ContentService<CaseStudySliders>,
    pub testimonials: ContentService<Testimonials>,
    pub blog_posts: ContentService<BlogPosts>,
    pub banners: ContentService<Banners>,
    pub hero: ContentService<Heroes>,
    pub updates: ContentService<Updates>,
    pub services: ContentService<Services>,
    pub advisors: ContentService<Advisors>,
    pub youtube: ContentService<YouTubeEmbeds>,
}

impl ContentServices {
    #[must_use]
    pub fn new(repos: &Repositories, cache: &Arc<TagCache>) -> Self {
        Self {
            case_studies: ContentService::new(Arc::clone(&repos.case_studies), Arc::clone(cache)),
            case_study_sliders: ContentService::new(
                Arc::clone(&repos.case_study_sliders),
                Arc::clone(cache),
            ),
            testimonials: ContentService::new(Arc::clone(&repos.testimonials), Arc::clone(cache)),
            blog_posts: ContentService::new(Arc::clone(&repos.blog_posts), Arc::clone(cache)),
            banners: ContentService::new(Arc::clone(&repos.banners), Arc::clone(cache)),
            hero: ContentService::new(Arc::clone(&repos.hero), Arc::clone(cache)),
            updates: ContentService::new(Arc::clone(&repos.updates), Arc::clone(cache)),
            services: ContentService::new(Arc::clone(&repos.services), Arc::clone(cache)),
            advisors: ContentService::new(Arc::clone(&repos.advisors), Arc::clone(cache)),
            youtube: ContentService::new(Arc::clone(&repos.youtube), Arc::clone(cache)),
        }
    }
}

/// Selects the service for `R`, letting route handlers stay generic.
pub trait ServiceFor<R: Resource> {
    fn service(&self) -> &ContentService<R>;
}

macro_rules! service_for {
    ($($resource:ty => $field:ident),* $(,)?) => {
        $(
            impl ServiceFor<$resource> for ContentServices {
                fn service(&self) -> &ContentService<$resource> {
                    &self.$field
                }
            }
        )*
    };
}

service_for! {
    CaseStudies => case_studies,
    CaseStudySliders => case_study_sliders,
    Testimonials => testimonials,
    BlogPosts => blog_posts,
    Banners => banners,
    Heroes => hero,
    Updates => updates,
    Services => services,
    Advisors => advisors,
    YouTubeEmbeds => youtube,
}

impl ContentService<BlogPosts> {
    /// The pinned post for `locale`, if any.
    pub async fn pinned(&self, locale: Locale) -> Result<Option<BlogPost>, AppError> {
        Ok(self.list(locale).await?.into_iter().find(|p| p.is_pinned))
    }

    pub async fn pin(&self, locale: Locale, id: &str) -> Result<BlogPost, AppError> {
        self.make_exclusive(locale, id).await
    }
}

impl ContentService<Banners> {
    /// First active banner whose optional date window contains `now`.
    pub async fn active(
        &self,
        locale: Locale,
        now: DateTime<Utc>,
    ) -> Result<Option<Banner>, AppError> {
        Ok(self
            .list(locale)
            .await?
            .into_iter()
            .find(|b| b.is_live_at(now)))
    }
}
