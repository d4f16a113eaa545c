//! Category identifier matching and the local category defaults.
//!
//! Routing hands us identifiers that may be a slug, a display name, or either
//! of those still percent-encoded. Matching has to tolerate all of them.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use super::entities::{CategoryRecord, LayoutType};

pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// Layout hints for the categories a site ships with when the CMS has none.
const LOCAL_CATEGORY_LAYOUTS: &[(&str, LayoutType)] = &[
    ("Guides", LayoutType::Grid),
    ("guides", LayoutType::Grid),
    ("Tutorials", LayoutType::Masonry),
    ("tutorials", LayoutType::Masonry),
    ("Projects", LayoutType::Grid),
    ("projects", LayoutType::Grid),
    ("Blog", LayoutType::Grid),
    ("blog", LayoutType::Grid),
    ("News", LayoutType::Grid),
    ("news", LayoutType::Grid),
    ("Reviews", LayoutType::Grid),
    ("reviews", LayoutType::Grid),
    ("Tips", LayoutType::Masonry),
    ("tips", LayoutType::Masonry),
];

/// Returns true when a post's category refers to the requested identifier.
///
/// Strategies, any of which matches: case-insensitive comparison of the
/// trimmed values, exact comparison, and comparison after percent-decoding
/// either side. A side that does not decode to UTF-8 simply fails that
/// strategy.
pub fn matches_category(post_category: &str, requested: &str) -> bool {
    let post_normalized = post_category.trim().to_lowercase();
    let requested_normalized = requested.trim().to_lowercase();

    post_normalized == requested_normalized
        || post_category == requested
        || percent_decode(&post_normalized).is_some_and(|decoded| decoded == requested_normalized)
        || percent_decode(&requested_normalized).is_some_and(|decoded| decoded == post_normalized)
}

fn percent_decode(value: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(value).decode_utf8().ok()
}

/// Category record from the local static table, if the name is known.
pub fn local_category(identifier: &str) -> Option<CategoryRecord> {
    LOCAL_CATEGORY_LAYOUTS
        .iter()
        .find(|(name, _)| *name == identifier)
        .map(|(_, layout)| category_record(identifier, *layout))
}

/// Generic record for identifiers nobody knows about.
pub fn synthesized_category(identifier: &str) -> CategoryRecord {
    category_record(identifier, LayoutType::Masonry)
}

/// Build a locally-derived category record for `identifier`.
pub fn category_record(identifier: &str, layout: LayoutType) -> CategoryRecord {
    CategoryRecord {
        id: 0,
        name: identifier.to_string(),
        slug: identifier.to_lowercase(),
        description: Some(format!("{identifier} category")),
        color: DEFAULT_CATEGORY_COLOR.to_string(),
        layout: Some(layout),
        sort_order: 0,
    }
}
