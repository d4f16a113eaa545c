#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use bloglane::application::repos::{CategoryLookup, ContentSource, SourceError};
use bloglane::domain::entities::{CategoryRecord, CoverImage, IndexSettings, LayoutType, PostRecord};

/// In-memory content source that counts every call.
#[derive(Default)]
pub struct CountingSource {
    pub posts: Vec<PostRecord>,
    pub settings: Option<IndexSettings>,
    pub categories: Vec<CategoryRecord>,
    pub fail_posts: AtomicBool,
    pub fail_categories: AtomicBool,
    pub post_fetches: AtomicUsize,
    pub settings_fetches: AtomicUsize,
    pub slug_lookups: AtomicUsize,
    pub name_lookups: AtomicUsize,
}

impl CountingSource {
    pub fn with_posts(posts: Vec<PostRecord>) -> Self {
        Self {
            posts,
            ..Default::default()
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn post_fetches(&self) -> usize {
        self.post_fetches.load(Ordering::SeqCst)
    }

    pub fn set_fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentSource for CountingSource {
    async fn sorted_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        self.post_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(SourceError::transport("connection refused"));
        }
        Ok(self.posts.clone())
    }

    async fn index_settings(&self) -> Result<IndexSettings, SourceError> {
        self.settings_fetches.fetch_add(1, Ordering::SeqCst);
        self.settings
            .clone()
            .ok_or(SourceError::Missing("index settings"))
    }

    async fn category_by_slug(&self, slug: &str) -> Result<CategoryLookup, SourceError> {
        self.slug_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_categories.load(Ordering::SeqCst) {
            return Err(SourceError::transport("connection refused"));
        }
        Ok(CategoryLookup {
            data: self
                .categories
                .iter()
                .filter(|category| category.slug == slug)
                .cloned()
                .collect(),
        })
    }

    async fn category_by_name(&self, name: &str) -> Result<CategoryLookup, SourceError> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_categories.load(Ordering::SeqCst) {
            return Err(SourceError::transport("connection refused"));
        }
        Ok(CategoryLookup {
            data: self
                .categories
                .iter()
                .filter(|category| category.name == name)
                .cloned()
                .collect(),
        })
    }
}

/// Posts are published one day apart, newest first in the order given.
pub fn post(slug: &str, category: Option<&str>, tags: &[&str], days_ago: i64) -> PostRecord {
    PostRecord {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        title: format!("Post {slug}"),
        description: Some(format!("About {slug}")),
        published_at: OffsetDateTime::UNIX_EPOCH + Duration::days(20_000 - days_ago),
        cover: None,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        category: category.map(str::to_string),
        body: Some(format!("Body of **{slug}**")),
        author: None,
    }
}

pub fn with_cover(mut post: PostRecord, url: &str, mime: Option<&str>) -> PostRecord {
    post.cover = Some(CoverImage {
        url: url.to_string(),
        mime: mime.map(str::to_string),
    });
    post
}

pub fn category(name: &str, slug: &str, layout: Option<LayoutType>) -> CategoryRecord {
    CategoryRecord {
        id: 42,
        name: name.to_string(),
        slug: slug.to_string(),
        description: Some(format!("{name} from the CMS")),
        color: "#ff0000".to_string(),
        layout,
        sort_order: 1,
    }
}

pub fn sample_posts() -> Vec<PostRecord> {
    vec![
        post("tokio-intro", Some("Rust Tips"), &["async", "tokio"], 0),
        post("go-channels", Some("Go"), &["concurrency"], 1),
        post("ownership", Some("rust tips"), &["async"], 2),
        post("misc-notes", None, &[], 3),
        post("lifetimes", Some("Rust%20Tips"), &["borrowck"], 4),
    ]
}
