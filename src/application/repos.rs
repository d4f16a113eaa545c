//! Content source trait describing the CMS adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CategoryRecord, IndexSettings, PostRecord};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content source unreachable: {0}")]
    Transport(String),
    #[error("content source answered `{status}` for `{path}`")]
    Status { status: u16, path: String },
    #[error("content source payload could not be decoded: {0}")]
    Decode(String),
    #[error("content source has no `{0}` configured")]
    Missing(&'static str),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result of a category query; `data` is empty when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryLookup {
    pub data: Vec<CategoryRecord>,
}

impl CategoryLookup {
    pub fn first(self) -> Option<CategoryRecord> {
        self.data.into_iter().next()
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// All published posts, newest first.
    async fn sorted_posts(&self) -> Result<Vec<PostRecord>, SourceError>;

    async fn index_settings(&self) -> Result<IndexSettings, SourceError>;

    async fn category_by_slug(&self, slug: &str) -> Result<CategoryLookup, SourceError>;

    async fn category_by_name(&self, name: &str) -> Result<CategoryLookup, SourceError>;
}
