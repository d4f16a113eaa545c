//! Markdown to sanitized HTML for feed item bodies.

use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::{Options, markdown_to_html};

/// Renders post bodies with GFM extensions and strips anything unsafe for feed readers.
pub struct MarkdownRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_sanitizer(),
        }
    }

    pub fn render(&self, markdown: &str) -> String {
        let html = markdown_to_html(markdown, &self.options);
        self.sanitizer.clean(&html).to_string()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.superscript = true;
    ext.front_matter_delimiter = Some("---".to_string());

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.r#unsafe = true;
    render.figure_with_caption = true;

    options
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    // Media elements are kept so embedded images and clips survive in readers.
    builder.add_tags(&[
        "img",
        "video",
        "audio",
        "source",
        "track",
        "figure",
        "figcaption",
        "picture",
    ]);
    builder.add_tag_attributes("img", &["src", "alt", "title", "width", "height", "loading"]);
    builder.add_tag_attributes(
        "video",
        &["src", "poster", "controls", "width", "height", "loop", "muted"],
    );
    builder.add_tag_attributes("audio", &["src", "controls", "loop", "muted"]);
    builder.add_tag_attributes("source", &["src", "srcset", "type", "media"]);
    builder.add_tag_attributes("track", &["src", "kind", "srclang", "label", "default"]);

    let generic: HashSet<&'static str> = HashSet::from(["title", "lang", "dir"]);
    builder.generic_attributes(generic);
    builder.add_url_schemes(["http", "https", "mailto"].iter().copied());

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_gfm_markdown() {
        let html = MarkdownRenderer::new().render("# Title\n\n~~old~~ **new**");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<strong>new</strong>"));
    }

    #[test]
    fn strips_scripts_but_keeps_media() {
        let markdown = "<script>alert(1)</script>\n\n<video src=\"https://cdn.example.com/clip.mp4\" controls></video>\n\n![cat](https://cdn.example.com/cat.png)";
        let html = MarkdownRenderer::new().render(markdown);

        assert!(!html.contains("<script"));
        assert!(html.contains("<video"));
        assert!(html.contains("src=\"https://cdn.example.com/cat.png\""));
    }
}
