//! Local content mode: serves a TOML archive from disk when no CMS is configured.
//!
//! ```toml
//! [settings]
//! site_title = "Field Notes"
//! default_homepage_layout = "grid"
//!
//! [[categories]]
//! name = "Guides"
//! layout_type = "grid"
//!
//! [[posts]]
//! slug = "hello"
//! title = "Hello"
//! published_at = "2024-05-01T10:00:00Z"
//! category = "Guides"
//! tags = ["intro"]
//! body = "First post."
//! ```
//!
//! The archive is re-read on every call so edits show up without a restart.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::application::repos::{CategoryLookup, ContentSource, SourceError};
use crate::domain::entities::{CategoryRecord, IndexSettings, PostRecord};
use crate::domain::error::DomainError;

use super::records::{
    RawArticle, RawCategory, RawIndexSettings, sort_newest_first, validate_articles,
    validate_categories,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocalArchive {
    settings: Option<RawIndexSettings>,
    categories: Vec<RawCategory>,
    posts: Vec<RawArticle>,
}

#[derive(Debug, Clone, Default)]
pub struct LocalContentSource {
    archive: Option<PathBuf>,
}

impl LocalContentSource {
    pub fn new(archive: Option<PathBuf>) -> Self {
        Self { archive }
    }

    pub fn archive(&self) -> Option<&Path> {
        self.archive.as_deref()
    }

    async fn load(&self) -> Result<LocalArchive, SourceError> {
        let Some(path) = self.archive.as_deref() else {
            return Ok(LocalArchive::default());
        };
        let data = tokio::fs::read_to_string(path).await?;
        toml::from_str(&data).map_err(|err| {
            SourceError::decode(format!("invalid archive `{}`: {err}", path.display()))
        })
    }

    async fn categories(&self) -> Result<Vec<CategoryRecord>, SourceError> {
        Ok(validate_categories(self.load().await?.categories))
    }
}

#[async_trait]
impl ContentSource for LocalContentSource {
    async fn sorted_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        let archive = self.load().await?;
        let mut posts = validate_articles(archive.posts, OffsetDateTime::now_utc());

        if let Some(duplicate) = first_duplicate_slug(&posts) {
            return Err(DomainError::validation(format!(
                "duplicate post slug `{duplicate}` in archive"
            ))
            .into());
        }

        sort_newest_first(&mut posts);
        Ok(posts)
    }

    async fn index_settings(&self) -> Result<IndexSettings, SourceError> {
        self.load()
            .await?
            .settings
            .map(RawIndexSettings::into_settings)
            .ok_or(SourceError::Missing("index settings"))
    }

    async fn category_by_slug(&self, slug: &str) -> Result<CategoryLookup, SourceError> {
        let data = self
            .categories()
            .await?
            .into_iter()
            .filter(|category| category.slug == slug)
            .collect();
        Ok(CategoryLookup { data })
    }

    async fn category_by_name(&self, name: &str) -> Result<CategoryLookup, SourceError> {
        let data = self
            .categories()
            .await?
            .into_iter()
            .filter(|category| category.name == name)
            .collect();
        Ok(CategoryLookup { data })
    }
}

fn first_duplicate_slug(posts: &[PostRecord]) -> Option<String> {
    let mut seen = HashSet::new();
    posts
        .iter()
        .find(|post| !seen.insert(post.slug.as_str()))
        .map(|post| post.slug.clone())
}
