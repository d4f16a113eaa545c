//! Category fast-path cache.
//!
//! A process-wide, time-bounded map from category identifier to the posts of
//! that category. It lives across requests, unlike the request-scoped cache in
//! [`crate::application::request_cache`].
//!
//! ## Configuration
//!
//! Entry lifetime follows the site mode; lifetime and entry capacity can be
//! overridden in `bloglane.toml`:
//!
//! ```toml
//! [cache]
//! development_ttl_seconds = 1
//! production_ttl_seconds = 600
//! capacity = 1024
//! ```

mod clock;
mod config;
mod keys;
pub(crate) mod lock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_CAPACITY, DEFAULT_DEVELOPMENT_TTL, DEFAULT_PRODUCTION_TTL, FastCacheConfig};
pub use keys::FastCacheKey;
pub use store::{CategorySlice, FastCache};

pub(crate) use store::{METRIC_FAST_CACHE_EXPIRED, METRIC_FAST_CACHE_HIT, METRIC_FAST_CACHE_MISS};
