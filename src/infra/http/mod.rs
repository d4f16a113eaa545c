//! HTTP surface: page data as JSON, the RSS feed and embedded scripts.

mod middleware;
mod public;

pub use middleware::RequestContext;
pub use public::{HttpState, build_router};
