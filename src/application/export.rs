//! Static export of page data and the feed into a directory.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::{
    application::{
        error::AppError, repos::ContentSource, request_cache::RequestCache,
        site_data::SiteDataService, syndication::SyndicationService,
    },
    infra::{assets, error::InfraError},
};

const SOURCE: &str = "application::export";

/// Counts of what an export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub categories: usize,
    pub posts: usize,
    pub assets: usize,
}

/// Write `index.json`, one file per category and post, `rss.xml` and the
/// embedded scripts under `out_dir`.
pub async fn export_site(
    source: Arc<dyn ContentSource>,
    syndication: &SyndicationService,
    out_dir: &Path,
) -> Result<ExportSummary, AppError> {
    create_dir(out_dir).await?;
    create_dir(&out_dir.join("categories")).await?;
    create_dir(&out_dir.join("posts")).await?;

    let mut cache = RequestCache::new(source);
    let mut summary = ExportSummary::default();

    let index = SiteDataService::new(&cache).index_page_data().await;
    write_json(&out_dir.join("index.json"), &index).await?;

    let category_names: Vec<String> = index
        .categories
        .iter()
        .map(|category| category.name.clone())
        .collect();
    let post_slugs: Vec<String> = index.posts.iter().map(|post| post.slug.clone()).collect();

    for name in &category_names {
        cache.reset();
        let data = SiteDataService::new(&cache).category_page_data(name).await;
        let file = format!("{}.json", file_stem(&data.category_slug));
        write_json(&out_dir.join("categories").join(file), &data).await?;
        summary.categories += 1;
    }

    for slug in &post_slugs {
        cache.reset();
        let Some(data) = SiteDataService::new(&cache).post_page_data(slug).await else {
            continue;
        };
        let file = format!("{}.json", file_stem(slug));
        write_json(&out_dir.join("posts").join(file), &data).await?;
        summary.posts += 1;
    }

    let feed = syndication.rss_feed().await?;
    write_bytes(&out_dir.join("rss.xml"), feed.as_bytes()).await?;

    for path in assets::asset_paths() {
        if let Some(bytes) = assets::asset_bytes(path) {
            let target = out_dir.join(path);
            if let Some(parent) = target.parent() {
                create_dir(parent).await?;
            }
            write_bytes(&target, bytes).await?;
            summary.assets += 1;
        }
    }

    info!(
        target = SOURCE,
        out_dir = %out_dir.display(),
        categories = summary.categories,
        posts = summary.posts,
        assets = summary.assets,
        "export finished"
    );
    Ok(summary)
}

/// File-system safe stem: lowercase alphanumerics, everything else folded to `-`.
pub fn file_stem(value: &str) -> String {
    let mut stem = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if ch.is_alphanumeric() {
            stem.extend(ch.to_lowercase());
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.to_string()
    }
}

async fn create_dir(path: &Path) -> Result<(), AppError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let encoded =
        serde_json::to_vec_pretty(value).map_err(|err| AppError::from(InfraError::from(err)))?;
    write_bytes(path, &encoded).await
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_path_safe() {
        assert_eq!(file_stem("Rust Tips"), "rust-tips");
        assert_eq!(file_stem("../etc/passwd"), "etc-passwd");
        assert_eq!(file_stem("入门 指南"), "入门-指南");
        assert_eq!(file_stem("///"), "untitled");
    }
}
