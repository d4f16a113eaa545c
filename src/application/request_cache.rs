//! Request-scoped cache for one page render.
//!
//! Every primitive is fetched at most once per request: the posts list and the
//! index settings live in [`OnceCell`]s so concurrent callers inside a request
//! share a single fetch, and category metadata is memoized per identifier.
//! The HTTP layer builds a fresh cache for each request; the export command
//! calls [`RequestCache::reset`] between pages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::application::repos::{ContentSource, SourceError};
use crate::cache::lock::mutex_lock;
use crate::domain::categories::{local_category, synthesized_category};
use crate::domain::entities::{CategoryRecord, IndexSettings, PostRecord};

const SOURCE: &str = "application::request_cache";

/// Ordered ways of turning a category identifier into metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryResolution {
    RemoteSlug,
    RemoteName,
    LocalTable,
    Synthesized,
}

impl CategoryResolution {
    pub const ORDER: [CategoryResolution; 4] = [
        CategoryResolution::RemoteSlug,
        CategoryResolution::RemoteName,
        CategoryResolution::LocalTable,
        CategoryResolution::Synthesized,
    ];

    fn is_remote(self) -> bool {
        matches!(
            self,
            CategoryResolution::RemoteSlug | CategoryResolution::RemoteName
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryResolution::RemoteSlug => "remote_slug",
            CategoryResolution::RemoteName => "remote_name",
            CategoryResolution::LocalTable => "local_table",
            CategoryResolution::Synthesized => "synthesized",
        }
    }
}

pub struct RequestCache {
    source: Arc<dyn ContentSource>,
    posts: OnceCell<Arc<[PostRecord]>>,
    settings: OnceCell<IndexSettings>,
    categories: Mutex<HashMap<String, CategoryRecord>>,
}

impl RequestCache {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            posts: OnceCell::new(),
            settings: OnceCell::new(),
            categories: Mutex::new(HashMap::new()),
        }
    }

    /// Forget everything fetched so far.
    pub fn reset(&mut self) {
        self.posts.take();
        self.settings.take();
        self.categories
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// All posts, newest first. Empty when the source fails.
    pub async fn posts(&self) -> Arc<[PostRecord]> {
        self.posts
            .get_or_init(|| async {
                match self.source.sorted_posts().await {
                    Ok(posts) => {
                        debug!(target = SOURCE, count = posts.len(), "posts fetched");
                        Arc::<[PostRecord]>::from(posts)
                    }
                    Err(err) => {
                        warn!(target = SOURCE, error = %err, "failed to fetch posts");
                        Arc::<[PostRecord]>::from(Vec::new())
                    }
                }
            })
            .await
            .clone()
    }

    /// Site settings, or the built-in fallback when the source fails.
    pub async fn index_settings(&self) -> IndexSettings {
        self.settings
            .get_or_init(|| async {
                match self.source.index_settings().await {
                    Ok(settings) => settings,
                    Err(err) => {
                        warn!(
                            target = SOURCE,
                            error = %err,
                            "failed to fetch index settings, using fallback"
                        );
                        IndexSettings::fallback()
                    }
                }
            })
            .await
            .clone()
    }

    /// Category metadata for `identifier`; always yields a record.
    pub async fn category(&self, identifier: &str) -> CategoryRecord {
        let cached = mutex_lock(&self.categories, SOURCE, "category.get")
            .get(identifier)
            .cloned();
        if let Some(record) = cached {
            return record;
        }

        let record = self.resolve_category(identifier).await;
        mutex_lock(&self.categories, SOURCE, "category.insert")
            .insert(identifier.to_string(), record.clone());
        record
    }

    async fn resolve_category(&self, identifier: &str) -> CategoryRecord {
        let mut remote_failed = false;

        for strategy in CategoryResolution::ORDER {
            if remote_failed && strategy.is_remote() {
                continue;
            }

            match self.try_strategy(strategy, identifier).await {
                Ok(Some(record)) => {
                    debug!(
                        target = SOURCE,
                        identifier,
                        strategy = strategy.as_str(),
                        "category resolved"
                    );
                    return record;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        target = SOURCE,
                        identifier,
                        strategy = strategy.as_str(),
                        error = %err,
                        "remote category lookup failed, using local defaults"
                    );
                    remote_failed = true;
                }
            }
        }

        synthesized_category(identifier)
    }

    async fn try_strategy(
        &self,
        strategy: CategoryResolution,
        identifier: &str,
    ) -> Result<Option<CategoryRecord>, SourceError> {
        let record = match strategy {
            CategoryResolution::RemoteSlug => {
                self.source.category_by_slug(identifier).await?.first()
            }
            CategoryResolution::RemoteName => {
                self.source.category_by_name(identifier).await?.first()
            }
            CategoryResolution::LocalTable => local_category(identifier),
            CategoryResolution::Synthesized => Some(synthesized_category(identifier)),
        };
        Ok(record)
    }
}
