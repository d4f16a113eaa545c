//! Fast-path cache configuration.
//!
//! The entry lifetime depends on the site mode: development keeps entries for
//! a second so content edits show up immediately, production for ten minutes.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::config::{CacheSettings, SiteMode};

pub const DEFAULT_DEVELOPMENT_TTL: Duration = Duration::from_secs(1);
pub const DEFAULT_PRODUCTION_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastCacheConfig {
    /// How long an entry stays fresh after it was stored.
    pub ttl: Duration,
    /// Maximum number of entries kept; least recently used go first.
    pub capacity: usize,
}

impl FastCacheConfig {
    pub fn for_mode(mode: SiteMode) -> Self {
        let ttl = match mode {
            SiteMode::Development => DEFAULT_DEVELOPMENT_TTL,
            SiteMode::Production => DEFAULT_PRODUCTION_TTL,
        };
        Self {
            ttl,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Pick the configured lifetime for `mode`.
    pub fn from_settings(mode: SiteMode, settings: &CacheSettings) -> Self {
        let ttl = match mode {
            SiteMode::Development => settings.development_ttl,
            SiteMode::Production => settings.production_ttl,
        };
        Self {
            ttl,
            capacity: settings.capacity,
        }
    }

    /// Capacity as `NonZeroUsize`, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for FastCacheConfig {
    fn default() -> Self {
        Self::for_mode(SiteMode::Production)
    }
}
