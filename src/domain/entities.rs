//! Strictly-typed content records handed out by the content source adapters.
//!
//! Adapters validate loosely-shaped CMS payloads into these types, so the
//! caching and assembly layers never deal with missing required fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Visual arrangement of a post listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    #[default]
    Grid,
    Masonry,
}

impl LayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Grid => "grid",
            LayoutType::Masonry => "masonry",
        }
    }

    /// Parse a layout hint, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grid" => Some(LayoutType::Grid),
            "masonry" => Some(LayoutType::Masonry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub url: String,
    #[serde(default)]
    pub mime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(default)]
    pub cover: Option<CoverImage>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    #[serde(rename = "layout_type", default)]
    pub layout: Option<LayoutType>,
    #[serde(default)]
    pub sort_order: i32,
}

impl CategoryRecord {
    /// Layout to render with; records without a hint use the grid.
    pub fn effective_layout(&self) -> LayoutType {
        self.layout.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default)]
    pub default_homepage_layout: Option<LayoutType>,
    #[serde(default)]
    pub site_title: Option<String>,
    #[serde(default)]
    pub site_subtitle: Option<String>,
    #[serde(default)]
    pub site_description: Option<String>,
    /// Fields the CMS returns that this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexSettings {
    /// Settings used when the CMS cannot be reached.
    pub fn fallback() -> Self {
        Self {
            default_homepage_layout: Some(LayoutType::Masonry),
            site_title: Some("My Blog".to_string()),
            site_subtitle: Some("Sharing tech and life".to_string()),
            site_description: Some("A modern blog built on Strapi".to_string()),
            extra: Map::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(self.site_title.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.site_description.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// A category or tag name with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_parse_is_lenient() {
        assert_eq!(LayoutType::parse(" Masonry "), Some(LayoutType::Masonry));
        assert_eq!(LayoutType::parse("GRID"), Some(LayoutType::Grid));
        assert_eq!(LayoutType::parse("list"), None);
    }

    #[test]
    fn category_without_layout_uses_grid() {
        let record = CategoryRecord {
            id: 7,
            name: "Notes".to_string(),
            slug: "notes".to_string(),
            description: None,
            color: "#000000".to_string(),
            layout: None,
            sort_order: 0,
        };
        assert_eq!(record.effective_layout(), LayoutType::Grid);
    }

    #[test]
    fn blank_settings_title_is_ignored() {
        let settings = IndexSettings {
            site_title: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.title(), None);
        assert_eq!(IndexSettings::fallback().title(), Some("My Blog"));
    }

    #[test]
    fn settings_keep_unknown_fields() {
        let settings: IndexSettings = serde_json::from_value(serde_json::json!({
            "site_title": "Field Notes",
            "default_homepage_layout": "grid",
            "banner_enabled": true
        }))
        .expect("settings should deserialize");

        assert_eq!(settings.default_homepage_layout, Some(LayoutType::Grid));
        assert_eq!(settings.extra.get("banner_enabled"), Some(&Value::Bool(true)));
    }
}
