//! Fast-path cache key definitions.

use std::fmt;

/// Key of a fast-path cache entry.
///
/// Rendered as `posts_<identifier>` or `pagedata_<identifier>`; the identifier
/// is used verbatim, so differently-spelled identifiers get separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FastCacheKey {
    /// Filtered post list for a category.
    Posts(String),
    /// Composed category page data.
    PageData(String),
}

impl FastCacheKey {
    pub fn posts(identifier: &str) -> Self {
        Self::Posts(identifier.to_string())
    }

    pub fn page_data(identifier: &str) -> Self {
        Self::PageData(identifier.to_string())
    }

    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FastCacheKey::Posts(_) => "posts",
            FastCacheKey::PageData(_) => "pagedata",
        }
    }
}

impl fmt::Display for FastCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FastCacheKey::Posts(identifier) => write!(f, "posts_{identifier}"),
            FastCacheKey::PageData(identifier) => write!(f, "pagedata_{identifier}"),
        }
    }
}
