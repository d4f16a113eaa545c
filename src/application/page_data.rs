//! Page data handed to the renderer, serialized as JSON by the HTTP and export surfaces.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::{CategoryRecord, IndexSettings, LayoutType, NameCount, PostRecord};

#[derive(Debug, Clone, Serialize)]
pub struct IndexPageData {
    pub posts: Arc<[PostRecord]>,
    pub index_settings: IndexSettings,
    pub total_posts: usize,
    pub categories: Vec<NameCount>,
    pub tags: Vec<NameCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPageData {
    pub posts: Arc<[PostRecord]>,
    pub category: CategoryRecord,
    pub layout: LayoutType,
    pub total_posts: usize,
    pub category_name: String,
    pub category_slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub post: PostRecord,
    pub related_posts: Vec<PostRecord>,
    pub navigation: PostNavigation,
    /// Every post, newest first, for sidebars and archives.
    pub all_posts: Arc<[PostRecord]>,
}

/// Neighbours of a post in the newest-first list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostNavigation {
    pub prev: Option<PostRecord>,
    pub next: Option<PostRecord>,
}
