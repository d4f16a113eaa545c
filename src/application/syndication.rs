//! Syndication service for RSS feed generation.
//!
//! This service encapsulates the business logic for generating the feed,
//! keeping the HTTP layer focused on request/response handling.

use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;
use time::format_description::well_known::Rfc2822;
use tracing::warn;
use url::Url;

use crate::application::markdown::MarkdownRenderer;
use crate::application::repos::{ContentSource, SourceError};
use crate::config::SiteSettings;
use crate::domain::entities::{IndexSettings, PostRecord};

const SOURCE: &str = "application::syndication";
const DEFAULT_ENCLOSURE_MIME: &str = "image/jpeg";

/// Service for generating the RSS feed.
#[derive(Clone)]
pub struct SyndicationService {
    source: Arc<dyn ContentSource>,
    site: SiteSettings,
    renderer: Arc<MarkdownRenderer>,
}

#[derive(Debug, Error)]
pub enum SyndicationError {
    #[error("failed to list posts: {0}")]
    Posts(#[from] SourceError),
    #[error("failed to format feed: {0}")]
    Format(#[from] std::fmt::Error),
}

impl SyndicationService {
    pub fn new(source: Arc<dyn ContentSource>, site: SiteSettings) -> Self {
        Self {
            source,
            site,
            renderer: Arc::new(MarkdownRenderer::new()),
        }
    }

    /// Generate RSS 2.0 feed XML.
    ///
    /// Channel title and description come from the CMS settings when present,
    /// otherwise from the configured site identity.
    pub async fn rss_feed(&self) -> Result<String, SyndicationError> {
        let (posts, settings) = tokio::join!(self.source.sorted_posts(), self.source.index_settings());
        let posts = posts?;

        let settings = settings.unwrap_or_else(|err| {
            warn!(target = SOURCE, error = %err, "failed to fetch index settings for feed");
            IndexSettings::default()
        });
        let title = settings.title().unwrap_or(&self.site.title);
        let description = settings.description().unwrap_or(&self.site.description);
        let base = &self.site.url;

        let mut items = String::new();
        for post in &posts {
            self.write_item(&mut items, base, post)?;
        }

        let mut channel = String::new();
        write!(
            channel,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n{}  </channel>\n</rss>\n",
            xml_escape(&strip_invalid_xml_chars(title)),
            xml_escape(base.as_str()),
            xml_escape(&strip_invalid_xml_chars(description)),
            items
        )?;

        Ok(channel)
    }

    fn write_item(
        &self,
        out: &mut String,
        base: &Url,
        post: &PostRecord,
    ) -> Result<(), std::fmt::Error> {
        let link = post_link(base, &post.slug);
        let pub_date = post
            .published_at
            .format(&Rfc2822)
            .unwrap_or_else(|_| post.published_at.to_string());
        let content = post
            .body
            .as_deref()
            .map(|body| self.renderer.render(body))
            .unwrap_or_default();
        let author = post
            .author
            .as_deref()
            .filter(|author| !author.trim().is_empty())
            .unwrap_or(&self.site.author);

        write!(
            out,
            "    <item>\n      <title>{}</title>\n      <link>{link}</link>\n      <guid>{link}</guid>\n      <pubDate>{pub_date}</pubDate>\n      <description>{}</description>\n      <content:encoded>{}</content:encoded>\n      <author>{}</author>\n",
            xml_escape(&strip_invalid_xml_chars(&post.title)),
            xml_escape(&strip_invalid_xml_chars(
                post.description.as_deref().unwrap_or_default()
            )),
            xml_escape(&strip_invalid_xml_chars(&content)),
            xml_escape(author),
            link = xml_escape(&link),
        )?;

        if let Some(category) = post.category.as_deref() {
            writeln!(
                out,
                "      <category>{}</category>",
                xml_escape(&strip_invalid_xml_chars(category))
            )?;
        }

        if let Some(cover) = post.cover.as_ref() {
            match base.join(&cover.url) {
                Ok(url) => writeln!(
                    out,
                    "      <enclosure url=\"{}\" length=\"0\" type=\"{}\"/>",
                    xml_escape(url.as_str()),
                    xml_escape(cover.mime.as_deref().unwrap_or(DEFAULT_ENCLOSURE_MIME)),
                )?,
                Err(err) => warn!(
                    target = SOURCE,
                    slug = %post.slug,
                    cover = %cover.url,
                    error = %err,
                    "skipping enclosure with invalid cover url"
                ),
            }
        }

        out.push_str("    </item>\n");
        Ok(())
    }
}

fn post_link(base: &Url, slug: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    if slug.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{slug}/")
    }
}

/// Remove characters that XML 1.0 documents may not contain.
pub fn strip_invalid_xml_chars(input: &str) -> String {
    input.chars().filter(|ch| !is_invalid_xml_char(*ch)).collect()
}

fn is_invalid_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{00}'..='\u{08}'
            | '\u{0B}'
            | '\u{0C}'
            | '\u{0E}'..='\u{1F}'
            | '\u{7F}'..='\u{9F}'
            | '\u{FDD0}'..='\u{FDEF}'
            | '\u{FFFE}'
            | '\u{FFFF}'
    )
}

pub fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_and_noncharacters() {
        let dirty = "ok\u{0}\u{8}\t\n\r\u{B}\u{1F}\u{7F}\u{85}\u{FDD0}\u{FFFE}\u{FFFF}end";
        assert_eq!(strip_invalid_xml_chars(dirty), "ok\t\n\rend");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            xml_escape("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
    }

    #[test]
    fn post_links_end_with_slash() {
        let base = Url::parse("https://blog.example.com/").expect("valid url");
        assert_eq!(post_link(&base, "hello"), "https://blog.example.com/hello/");
        assert_eq!(post_link(&base, ""), "https://blog.example.com/");
    }
}
