//! Page data assembly over the request cache.
//!
//! Nothing here returns an error: the request cache already substitutes
//! defaults for unreachable content, so assembly only composes.

use std::collections::HashMap;

use tracing::info;

use crate::application::page_data::{
    CategoryPageData, IndexPageData, PostNavigation, PostPageData,
};
use crate::application::request_cache::RequestCache;
use crate::domain::categories::matches_category;
use crate::domain::entities::{NameCount, PostRecord};

const SOURCE: &str = "application::site_data";
const RELATED_POSTS_LIMIT: usize = 3;

/// Assembles page data from the primitives held by one [`RequestCache`].
pub struct SiteDataService<'a> {
    cache: &'a RequestCache,
}

impl<'a> SiteDataService<'a> {
    pub fn new(cache: &'a RequestCache) -> Self {
        Self { cache }
    }

    pub async fn index_page_data(&self) -> IndexPageData {
        let (posts, index_settings) = tokio::join!(self.cache.posts(), self.cache.index_settings());

        IndexPageData {
            total_posts: posts.len(),
            categories: count_categories(&posts),
            tags: count_tags(&posts),
            posts,
            index_settings,
        }
    }

    pub async fn category_page_data(&self, identifier: &str) -> CategoryPageData {
        info!(target = SOURCE, identifier, "assembling category page data");

        let (posts, category) = tokio::join!(
            self.category_posts(identifier),
            self.cache.category(identifier)
        );

        let category_name = non_empty_or(&category.name, identifier);
        let category_slug = non_empty_or(&category.slug, identifier);

        CategoryPageData {
            total_posts: posts.len(),
            posts: posts.into(),
            layout: category.effective_layout(),
            category,
            category_name,
            category_slug,
        }
    }

    /// Post by slug with related posts and neighbours; `None` for unknown slugs.
    pub async fn post_page_data(&self, slug: &str) -> Option<PostPageData> {
        info!(target = SOURCE, slug, "assembling post page data");

        let posts = self.cache.posts().await;
        let position = posts.iter().position(|post| post.slug == slug)?;
        let post = posts[position].clone();

        Some(PostPageData {
            related_posts: related_posts(&posts, &post),
            navigation: navigation(&posts, position),
            post,
            all_posts: posts,
        })
    }

    async fn category_posts(&self, identifier: &str) -> Vec<PostRecord> {
        self.cache
            .posts()
            .await
            .iter()
            .filter(|post| {
                post.category
                    .as_deref()
                    .is_some_and(|category| matches_category(category, identifier))
            })
            .cloned()
            .collect()
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Up to three posts sharing the category of `post`, in list order.
fn related_posts(posts: &[PostRecord], post: &PostRecord) -> Vec<PostRecord> {
    let Some(category) = post.category.as_deref() else {
        return Vec::new();
    };

    posts
        .iter()
        .filter(|candidate| candidate.slug != post.slug)
        .filter(|candidate| candidate.category.as_deref() == Some(category))
        .take(RELATED_POSTS_LIMIT)
        .cloned()
        .collect()
}

fn navigation(posts: &[PostRecord], position: usize) -> PostNavigation {
    PostNavigation {
        prev: position
            .checked_sub(1)
            .and_then(|index| posts.get(index))
            .cloned(),
        next: posts.get(position + 1).cloned(),
    }
}

pub fn count_categories(posts: &[PostRecord]) -> Vec<NameCount> {
    count_names(posts.iter().filter_map(|post| post.category.as_deref()))
}

pub fn count_tags(posts: &[PostRecord]) -> Vec<NameCount> {
    count_names(posts.iter().flat_map(|post| post.tags.iter().map(String::as_str)))
}

/// Occurrence counts in first-seen order.
fn count_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<NameCount> {
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<NameCount> = Vec::new();

    for name in names {
        match positions.get(name) {
            Some(&index) => counts[index].count += 1,
            None => {
                positions.insert(name, counts.len());
                counts.push(NameCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn post(slug: &str, category: Option<&str>, tags: &[&str]) -> PostRecord {
        PostRecord {
            id: slug.to_string(),
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            description: None,
            published_at: OffsetDateTime::UNIX_EPOCH,
            cover: None,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            category: category.map(str::to_string),
            body: None,
            author: None,
        }
    }

    #[test]
    fn counts_keep_first_seen_order() {
        let posts = vec![
            post("a", Some("Rust"), &["async", "tokio"]),
            post("b", Some("Go"), &["async"]),
            post("c", Some("Rust"), &[]),
            post("d", None, &["tokio"]),
        ];

        assert_eq!(
            count_categories(&posts),
            vec![
                NameCount {
                    name: "Rust".to_string(),
                    count: 2
                },
                NameCount {
                    name: "Go".to_string(),
                    count: 1
                },
            ]
        );

        let tags = count_tags(&posts);
        assert_eq!(tags[0].name, "async");
        assert_eq!(tags[0].count, 2);
        assert_eq!(tags[1].name, "tokio");
        assert_eq!(tags[1].count, 2);
    }

    #[test]
    fn related_posts_share_category_and_cap_at_three() {
        let posts = vec![
            post("a", Some("Rust"), &[]),
            post("b", Some("Rust"), &[]),
            post("c", Some("Go"), &[]),
            post("d", Some("Rust"), &[]),
            post("e", Some("Rust"), &[]),
            post("f", Some("Rust"), &[]),
        ];

        let related = related_posts(&posts, &posts[0]);
        let slugs: Vec<&str> = related.iter().map(|post| post.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "d", "e"]);
    }

    #[test]
    fn posts_without_category_have_no_related_posts() {
        let posts = vec![post("a", None, &[]), post("b", None, &[])];
        assert!(related_posts(&posts, &posts[0]).is_empty());
    }

    #[test]
    fn navigation_follows_list_position() {
        let posts = vec![post("a", None, &[]), post("b", None, &[]), post("c", None, &[])];

        let first = navigation(&posts, 0);
        assert!(first.prev.is_none());
        assert_eq!(first.next.map(|post| post.slug), Some("b".to_string()));

        let last = navigation(&posts, 2);
        assert_eq!(last.prev.map(|post| post.slug), Some("b".to_string()));
        assert!(last.next.is_none());
    }
}
