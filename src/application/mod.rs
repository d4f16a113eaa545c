//! Application services: request-scoped caching, page data assembly, syndication.

pub mod error;
pub mod export;
pub mod fast_category;
pub mod markdown;
pub mod page_data;
pub mod repos;
pub mod request_cache;
pub mod site_data;
pub mod syndication;
