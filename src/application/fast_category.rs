//! Category fast path: filtered post lists kept across requests.
//!
//! Both loaders degrade to an empty result when the content source fails, and
//! failures are never cached, so the next request retries.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::application::page_data::CategoryPageData;
use crate::application::repos::{ContentSource, SourceError};
use crate::cache::{CategorySlice, FastCache, FastCacheKey};
use crate::config::SiteMode;
use crate::domain::categories::{category_record, matches_category};
use crate::domain::entities::{LayoutType, PostRecord};

const SOURCE: &str = "application::fast_category";

#[derive(Clone)]
pub struct FastCategoryLoader {
    cache: Arc<FastCache>,
    source: Arc<dyn ContentSource>,
    mode: SiteMode,
}

impl FastCategoryLoader {
    pub fn new(cache: Arc<FastCache>, source: Arc<dyn ContentSource>, mode: SiteMode) -> Self {
        Self {
            cache,
            source,
            mode,
        }
    }

    pub fn cache(&self) -> &Arc<FastCache> {
        &self.cache
    }

    /// Posts whose category matches `identifier`, newest first.
    pub async fn category_posts(&self, identifier: &str) -> Arc<[PostRecord]> {
        match self.load_slice(identifier).await {
            Ok(slice) => slice.posts,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    identifier,
                    error = %err,
                    "fast category lookup failed"
                );
                Arc::from(Vec::new())
            }
        }
    }

    /// Category page data composed with a fixed grid descriptor.
    pub async fn category_page_data(&self, identifier: &str) -> CategoryPageData {
        let key = FastCacheKey::page_data(identifier);
        if let Some(slice) = self.cache.get(&key) {
            if self.mode.is_development() {
                debug!(target = SOURCE, identifier, "fast page data cache hit");
            }
            return compose_page_data(identifier, slice);
        }

        let started = Instant::now();
        match self.load_slice(identifier).await {
            Ok(slice) => {
                self.cache.insert(&key, slice.clone());
                if self.mode.is_development() {
                    debug!(
                        target = SOURCE,
                        identifier,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        entries = self.cache.len(),
                        "fast page data composed"
                    );
                }
                compose_page_data(identifier, slice)
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    identifier,
                    error = %err,
                    "fast category page data failed"
                );
                compose_page_data(identifier, CategorySlice::empty())
            }
        }
    }

    async fn load_slice(&self, identifier: &str) -> Result<CategorySlice, SourceError> {
        let key = FastCacheKey::posts(identifier);
        if let Some(slice) = self.cache.get(&key) {
            if self.mode.is_development() {
                debug!(target = SOURCE, identifier, "fast category cache hit");
            }
            return Ok(slice);
        }

        let started = Instant::now();
        let all_posts = self.source.sorted_posts().await?;
        let matching: Vec<PostRecord> = all_posts
            .iter()
            .filter(|post| {
                post.category
                    .as_deref()
                    .is_some_and(|category| matches_category(category, identifier))
            })
            .cloned()
            .collect();

        if self.mode.is_development() {
            debug!(
                target = SOURCE,
                identifier,
                count = matching.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "fast category posts filtered"
            );
            if matching.is_empty() {
                debug!(
                    target = SOURCE,
                    identifier,
                    available = ?unique_categories(&all_posts),
                    "no posts matched category"
                );
            }
        }

        let slice = CategorySlice::complete(matching);
        self.cache.insert(&key, slice.clone());
        Ok(slice)
    }
}

fn compose_page_data(identifier: &str, slice: CategorySlice) -> CategoryPageData {
    CategoryPageData {
        total_posts: slice.total_posts,
        posts: slice.posts,
        category: category_record(identifier, LayoutType::Grid),
        layout: LayoutType::Grid,
        category_name: identifier.to_string(),
        category_slug: identifier.to_string(),
    }
}

/// Distinct category names in first-seen order.
fn unique_categories(posts: &[PostRecord]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for category in posts.iter().filter_map(|post| post.category.as_deref()) {
        if !seen.contains(&category) {
            seen.push(category);
        }
    }
    seen
}
