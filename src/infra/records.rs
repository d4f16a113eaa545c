//! Loosely-shaped CMS records and their validation into domain entities.
//!
//! Strapi answers in camelCase with most fields nullable; the local archive is
//! written by hand in snake_case. Both deserialize into the raw structs here,
//! which are then validated once into the strict records the rest of the crate
//! uses.

use serde::Deserialize;
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

use crate::domain::categories::DEFAULT_CATEGORY_COLOR;
use crate::domain::entities::{CategoryRecord, CoverImage, IndexSettings, LayoutType, PostRecord};
use crate::domain::error::DomainError;

const SOURCE: &str = "infra::records";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn as_string(&self) -> String {
        match self {
            RawId::Number(value) => value.to_string(),
            RawId::Text(value) => value.clone(),
        }
    }
}

/// A relation that may be serialized as a bare name or as an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNamed {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
    },
}

impl RawNamed {
    fn name(&self) -> Option<&str> {
        let name = match self {
            RawNamed::Name(name) => Some(name.as_str()),
            RawNamed::Object { name } => name.as_deref(),
        };
        name.map(str::trim).filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMedia {
    Url(String),
    Object {
        url: String,
        #[serde(default)]
        mime: Option<String>,
    },
}

impl RawMedia {
    fn into_cover(self) -> Option<CoverImage> {
        let (url, mime) = match self {
            RawMedia::Url(url) => (url, None),
            RawMedia::Object { url, mime } => (url, mime),
        };
        let url = url.trim();
        (!url.is_empty()).then(|| CoverImage {
            url: url.to_string(),
            mime: mime.filter(|mime| !mime.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArticle {
    pub id: Option<RawId>,
    #[serde(alias = "documentId")]
    pub document_id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "excerpt")]
    pub description: Option<String>,
    #[serde(alias = "publishedAt", alias = "published")]
    pub published_at: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: Option<String>,
    pub cover: Option<RawMedia>,
    pub tags: Option<Vec<RawNamed>>,
    pub category: Option<RawNamed>,
    pub categories: Option<Vec<RawNamed>>,
    #[serde(alias = "content")]
    pub body: Option<String>,
    pub author: Option<RawNamed>,
}

impl RawArticle {
    /// Validate into a [`PostRecord`], stamping `fetched_at` when no timestamp parses.
    pub fn into_post(self, fetched_at: OffsetDateTime) -> Result<PostRecord, DomainError> {
        let slug = required(self.slug, "slug")?;
        let title = required(self.title, "title")?;

        let published_at = parse_timestamp(self.published_at.as_deref())
            .or_else(|| parse_timestamp(self.created_at.as_deref()))
            .unwrap_or(fetched_at);

        let id = self
            .document_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.id.as_ref().map(RawId::as_string))
            .unwrap_or_else(|| slug.clone());

        let category = self
            .category
            .as_ref()
            .and_then(RawNamed::name)
            .or_else(|| {
                self.categories
                    .as_deref()
                    .and_then(|categories| categories.iter().find_map(RawNamed::name))
            })
            .map(str::to_string);

        let tags = self
            .tags
            .unwrap_or_default()
            .iter()
            .filter_map(RawNamed::name)
            .map(str::to_string)
            .collect();

        Ok(PostRecord {
            id,
            slug,
            title,
            description: non_blank(self.description),
            published_at,
            cover: self.cover.and_then(RawMedia::into_cover),
            tags,
            category,
            body: non_blank(self.body),
            author: self
                .author
                .as_ref()
                .and_then(RawNamed::name)
                .map(str::to_string),
        })
    }
}

/// Validate a batch of articles, dropping invalid ones with a warning.
pub fn validate_articles(
    articles: Vec<RawArticle>,
    fetched_at: OffsetDateTime,
) -> Vec<PostRecord> {
    articles
        .into_iter()
        .enumerate()
        .filter_map(|(index, article)| match article.into_post(fetched_at) {
            Ok(post) => Some(post),
            Err(err) => {
                warn!(target = SOURCE, index, error = %err, "dropping invalid article");
                None
            }
        })
        .collect()
}

/// Newest first; equal timestamps keep their incoming order.
pub fn sort_newest_first(posts: &mut [PostRecord]) {
    posts.sort_by(|left, right| right.published_at.cmp(&left.published_at));
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCategory {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(alias = "layoutType", alias = "layout")]
    pub layout_type: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<i32>,
}

impl RawCategory {
    pub fn into_record(self) -> Result<CategoryRecord, DomainError> {
        let name = required(self.name, "name")
            .map_err(|_| DomainError::missing_field("category", "name"))?;
        let slug = non_blank(self.slug).unwrap_or_else(|| name.to_lowercase());

        Ok(CategoryRecord {
            id: self.id.unwrap_or_default(),
            name,
            slug,
            description: non_blank(self.description),
            color: non_blank(self.color).unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            layout: self.layout_type.as_deref().and_then(LayoutType::parse),
            sort_order: self.sort_order.unwrap_or_default(),
        })
    }
}

pub fn validate_categories(categories: Vec<RawCategory>) -> Vec<CategoryRecord> {
    categories
        .into_iter()
        .filter_map(|category| match category.into_record() {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(target = SOURCE, error = %err, "dropping invalid category");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawIndexSettings {
    pub default_homepage_layout: Option<String>,
    pub site_title: Option<String>,
    pub site_subtitle: Option<String>,
    pub site_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawIndexSettings {
    pub fn into_settings(self) -> IndexSettings {
        IndexSettings {
            default_homepage_layout: self
                .default_homepage_layout
                .as_deref()
                .and_then(LayoutType::parse),
            site_title: non_blank(self.site_title),
            site_subtitle: non_blank(self.site_subtitle),
            site_description: non_blank(self.site_description),
            extra: self.extra,
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, DomainError> {
    non_blank(value).ok_or(DomainError::missing_field("post", field))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_timestamp(value: Option<&str>) -> Option<OffsetDateTime> {
    let value = value?.trim();
    match OffsetDateTime::parse(value, &Rfc3339) {
        Ok(timestamp) => Some(timestamp),
        Err(err) => {
            warn!(target = SOURCE, value, error = %err, "ignoring unparsable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    fn article(value: Value) -> RawArticle {
        serde_json::from_value(value).expect("article should deserialize")
    }

    #[test]
    fn strapi_article_is_validated() {
        let raw = article(json!({
            "id": 4,
            "documentId": "doc-4",
            "title": "Async in practice",
            "slug": "async-in-practice",
            "excerpt": "Notes on tokio",
            "content": "# Hello",
            "publishedAt": "2024-05-01T10:00:00.000Z",
            "cover": { "url": "/uploads/cover.png", "mime": "image/png" },
            "category": { "name": "Guides", "slug": "guides" },
            "tags": [{ "name": "rust" }, { "name": "async" }],
            "author": { "name": "Ada" }
        }));

        let post = raw
            .into_post(OffsetDateTime::UNIX_EPOCH)
            .expect("valid article");

        assert_eq!(post.id, "doc-4");
        assert_eq!(post.description.as_deref(), Some("Notes on tokio"));
        assert_eq!(post.body.as_deref(), Some("# Hello"));
        assert_eq!(post.published_at, datetime!(2024-05-01 10:00 UTC));
        assert_eq!(post.category.as_deref(), Some("Guides"));
        assert_eq!(post.tags, vec!["rust".to_string(), "async".to_string()]);
        assert_eq!(post.author.as_deref(), Some("Ada"));
        let cover = post.cover.expect("cover");
        assert_eq!(cover.mime.as_deref(), Some("image/png"));
    }

    #[test]
    fn missing_publish_date_falls_back_to_created_then_fetch_time() {
        let created = article(json!({
            "title": "Draft",
            "slug": "draft",
            "publishedAt": null,
            "createdAt": "2023-01-02T03:04:05Z"
        }))
        .into_post(OffsetDateTime::UNIX_EPOCH)
        .expect("valid article");
        assert_eq!(created.published_at, datetime!(2023-01-02 03:04:05 UTC));

        let fetched = datetime!(2025-06-01 00:00 UTC);
        let bare = article(json!({ "title": "Bare", "slug": "bare" }))
            .into_post(fetched)
            .expect("valid article");
        assert_eq!(bare.published_at, fetched);
        assert!(bare.tags.is_empty());
    }

    #[test]
    fn articles_without_slug_or_title_are_dropped() {
        let posts = validate_articles(
            vec![
                article(json!({ "title": "No slug" })),
                article(json!({ "slug": "no-title", "title": "  " })),
                article(json!({ "slug": "kept", "title": "Kept", "tags": null })),
            ],
            OffsetDateTime::UNIX_EPOCH,
        );

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "kept");
        assert_eq!(posts[0].id, "kept");
    }

    #[test]
    fn category_falls_back_to_first_of_many() {
        let post = article(json!({
            "slug": "multi",
            "title": "Multi",
            "categories": [{ "name": "" }, { "name": "Tips" }]
        }))
        .into_post(OffsetDateTime::UNIX_EPOCH)
        .expect("valid article");
        assert_eq!(post.category.as_deref(), Some("Tips"));
    }

    #[test]
    fn category_layout_is_lenient() {
        let raw: RawCategory = serde_json::from_value(json!({
            "id": 3,
            "name": "Tutorials",
            "slug": "tutorials",
            "color": null,
            "layout_type": "MASONRY",
            "sortOrder": 2
        }))
        .expect("category should deserialize");

        let record = raw.into_record().expect("valid category");
        assert_eq!(record.layout, Some(LayoutType::Masonry));
        assert_eq!(record.color, DEFAULT_CATEGORY_COLOR);
        assert_eq!(record.sort_order, 2);

        let unknown: RawCategory =
            serde_json::from_value(json!({ "name": "Odd", "layout_type": "carousel" }))
                .expect("category should deserialize");
        let record = unknown.into_record().expect("valid category");
        assert_eq!(record.layout, None);
        assert_eq!(record.slug, "odd");
    }

    #[test]
    fn settings_ignore_unknown_layouts() {
        let raw: RawIndexSettings = serde_json::from_value(json!({
            "default_homepage_layout": "timeline",
            "site_title": "Field Notes",
            "banner": { "enabled": true }
        }))
        .expect("settings should deserialize");

        let settings = raw.into_settings();
        assert_eq!(settings.default_homepage_layout, None);
        assert_eq!(settings.title(), Some("Field Notes"));
        assert!(settings.extra.contains_key("banner"));
    }

    #[test]
    fn sorting_is_newest_first() {
        let mut posts = validate_articles(
            vec![
                article(json!({ "slug": "old", "title": "Old", "publishedAt": "2020-01-01T00:00:00Z" })),
                article(json!({ "slug": "new", "title": "New", "publishedAt": "2024-01-01T00:00:00Z" })),
            ],
            OffsetDateTime::UNIX_EPOCH,
        );
        sort_newest_first(&mut posts);
        assert_eq!(posts[0].slug, "new");
    }
}
