//! Renderer - turns posts and listings into finished pages
//!
//! Everything here is a pure function of the configuration and the posts:
//! no clock, no file system. The generator decides where output goes.

mod highlight;
pub mod html;
mod layout;
pub mod tree;

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{Collection, ContentError, Post};
use crate::helpers::{
    absolutize_urls, archive_route, date_xml, escape_xml, format_date, full_url_for,
    index_route, post_route, route_to_file, strip_invalid_xml_chars, tag_route, tag_slug,
    url_for,
};
use crate::templates::{
    ArchiveYearData, PageData, PaginationData, PostData, PostLink, SiteData, TagLink,
    TemplateRenderer,
};

pub use highlight::Highlighter;
pub use html::{BodyHtml, TocEntry};
pub use layout::Layout;
pub use tree::Node;

/// Whether an HTML comment is the `<!-- more -->` excerpt marker
fn is_more_marker(html: &str) -> bool {
    html.trim()
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
        .is_some_and(|inner| inner.trim() == "more")
}

/// Top-level nodes before the excerpt marker. The marker may be a block of its
/// own or sit inside a paragraph, where the paragraph is cut at the marker.
fn excerpt_nodes(nodes: &[Node]) -> Option<Vec<Node>> {
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Html(html) if is_more_marker(html) => return Some(nodes[..i].to_vec()),
            Node::Paragraph(children) => {
                let Some(at) = children
                    .iter()
                    .position(|c| matches!(c, Node::Html(h) if is_more_marker(h)))
                else {
                    continue;
                };
                let mut excerpt = nodes[..i].to_vec();
                let head = &children[..at];
                if !tree::plain_text(head).trim().is_empty() {
                    excerpt.push(Node::Paragraph(head.to_vec()));
                }
                return Some(excerpt);
            }
            _ => {}
        }
    }
    None
}

/// Plain-text summary of a body, whitespace collapsed
fn summary_text(nodes: &[Node]) -> String {
    let text: Vec<String> = nodes.iter().map(Node::plain_text).collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A post after rendering
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPost {
    pub slug: String,
    pub title: String,
    pub date: DateTime<FixedOffset>,
    pub tags: Vec<String>,
    pub layout: Layout,
    /// Output route relative to the public directory
    pub route: String,
    /// Route under the site root
    pub url: String,
    /// Body HTML without the page shell
    pub body: String,
    pub toc: Vec<TocEntry>,
    /// The full page
    pub html: String,
}

impl RenderedPost {
    /// File this post is written to, relative to the public directory
    pub fn output_path(&self) -> PathBuf {
        route_to_file(&self.route)
    }
}

/// A listing page or feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPage {
    pub route: String,
    pub html: String,
}

impl OutputPage {
    pub fn output_path(&self) -> PathBuf {
        route_to_file(&self.route)
    }
}

/// Renders posts with the embedded templates
pub struct Renderer {
    config: SiteConfig,
    highlighter: Option<Highlighter>,
    templates: TemplateRenderer,
}

impl Renderer {
    /// Create a renderer for `config`
    pub fn new(config: &SiteConfig) -> Result<Self, ContentError> {
        Ok(Self {
            config: config.clone(),
            highlighter: Highlighter::from_config(&config.highlight),
            templates: TemplateRenderer::new()?,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Render body markup to HTML. Total over any input.
    pub fn render_body(&self, markup: &str) -> BodyHtml {
        html::write(&tree::parse(markup), self.highlighter.as_ref())
    }

    /// HTML of the part before `<!-- more -->`, if the body has the marker
    pub fn render_excerpt(&self, markup: &str) -> Option<String> {
        let nodes = excerpt_nodes(&tree::parse(markup))?;
        Some(html::write(&nodes, self.highlighter.as_ref()).html)
    }

    /// Render one post into its layout
    pub fn render(&self, post: &Post) -> Result<RenderedPost, ContentError> {
        let layout = Layout::resolve(post)?;
        let body = self.render_body(post.body());
        let route = post_route(&self.config, post);
        let url = url_for(&self.config, &route);

        let page = PageData {
            title: post.title().to_string(),
            slug: post.slug().to_string(),
            layout: layout.name().to_string(),
            date: format_date(&post.date(), &self.config.date_format),
            date_iso: date_xml(&post.date()),
            url: url.clone(),
            tags: self.tag_links(post),
            toc: body.toc.clone(),
            content: body.html.clone(),
        };

        let mut context = self.base_context();
        context.insert("page", &page);
        let html = self.templates.render(layout.template(), &context)?;

        Ok(RenderedPost {
            slug: post.slug().to_string(),
            title: post.title().to_string(),
            date: post.date(),
            tags: post.tags().iter().cloned().collect(),
            layout,
            route,
            url,
            body: body.html,
            toc: body.toc,
            html,
        })
    }

    /// Home pages, `per_page` posts each. An empty collection still gets one page.
    pub fn render_index(&self, collection: &Collection) -> Result<Vec<OutputPage>, ContentError> {
        let posts: Vec<&Post> = collection.by_date().collect();
        let per_page = self.config.page_size();
        let total = posts.len().div_ceil(per_page).max(1);

        let mut pages = Vec::with_capacity(total);
        for current in 1..=total {
            let start = ((current - 1) * per_page).min(posts.len());
            let end = (start + per_page).min(posts.len());
            let items: Vec<PostData> = posts[start..end]
                .iter()
                .map(|post| self.list_item(post))
                .collect();

            let pagination = PaginationData {
                per_page,
                total,
                current,
                prev_link: (current > 1)
                    .then(|| url_for(&self.config, &index_route(&self.config, current - 1))),
                next_link: (current < total)
                    .then(|| url_for(&self.config, &index_route(&self.config, current + 1))),
            };

            let mut context = self.base_context();
            context.insert("posts", &items);
            context.insert("pagination", &pagination);
            pages.push(OutputPage {
                route: index_route(&self.config, current),
                html: self.templates.render("index.html", &context)?,
            });
        }
        Ok(pages)
    }

    /// Listing of the posts carrying `tag`
    pub fn render_tag(&self, collection: &Collection, tag: &str) -> Result<OutputPage, ContentError> {
        let items: Vec<PostData> = collection
            .by_tag(tag)
            .map(|post| self.list_item(post))
            .collect();

        let mut context = self.base_context();
        context.insert("tag", tag);
        context.insert("posts", &items);
        Ok(OutputPage {
            route: tag_route(&self.config, tag),
            html: self.templates.render("tag.html", &context)?,
        })
    }

    /// Every post grouped by year
    pub fn render_archive(&self, collection: &Collection) -> Result<OutputPage, ContentError> {
        let years: Vec<ArchiveYearData> = collection
            .by_year()
            .into_iter()
            .map(|(year, posts)| ArchiveYearData {
                year,
                posts: posts.into_iter().map(|post| self.post_link(post)).collect(),
            })
            .collect();

        let mut context = self.base_context();
        context.insert("years", &years);
        Ok(OutputPage {
            route: archive_route(&self.config),
            html: self.templates.render("archive.html", &context)?,
        })
    }

    /// Atom feed of the newest posts, or `None` when the feed is disabled.
    ///
    /// `updated` is the newest post's date so the feed only changes with content.
    pub fn render_feed(&self, collection: &Collection) -> Option<OutputPage> {
        let feed_config = &self.config.feed;
        if !feed_config.enable {
            return None;
        }

        let site_url = full_url_for(&self.config, "");
        let base_url = self.config.url.trim_end_matches('/');
        let updated = collection
            .by_date()
            .next()
            .map(|post| post.date().to_rfc3339())
            .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string());

        let mut feed = String::new();
        feed.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        feed.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
        feed.push_str(&format!(
            "  <title>{}</title>\n",
            escape_xml(&self.config.title)
        ));
        if !self.config.subtitle.is_empty() {
            feed.push_str(&format!(
                "  <subtitle>{}</subtitle>\n",
                escape_xml(&self.config.subtitle)
            ));
        }
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            escape_xml(&full_url_for(&self.config, &feed_config.path))
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", escape_xml(&site_url)));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}</id>\n", escape_xml(&site_url)));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&self.config.author)
        ));

        for post in collection.by_date().take(feed_config.limit) {
            let link = full_url_for(&self.config, &post_route(&self.config, post));
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(post.title())));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", escape_xml(&link)));
            feed.push_str(&format!("    <id>{}</id>\n", escape_xml(&link)));
            feed.push_str(&format!(
                "    <published>{}</published>\n",
                post.date().to_rfc3339()
            ));
            feed.push_str(&format!(
                "    <updated>{}</updated>\n",
                post.date().to_rfc3339()
            ));
            for tag in post.tags() {
                feed.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
            }

            let content = self
                .render_excerpt(post.body())
                .unwrap_or_else(|| self.render_body(post.body()).html);
            let content = strip_invalid_xml_chars(&absolutize_urls(&content, base_url));
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                content.replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }
        feed.push_str("</feed>\n");

        Some(OutputPage {
            route: feed_config.path.trim_start_matches('/').to_string(),
            html: feed,
        })
    }

    fn base_context(&self) -> Context {
        let site = SiteData {
            title: self.config.title.clone(),
            subtitle: self.config.subtitle.clone(),
            description: self.config.description.clone(),
            author: self.config.author.clone(),
            language: self.config.language.clone(),
            root: url_for(&self.config, ""),
            archive_url: url_for(&self.config, &archive_route(&self.config)),
            feed_url: self
                .config
                .feed
                .enable
                .then(|| url_for(&self.config, &self.config.feed.path)),
        };
        let mut context = Context::new();
        context.insert("site", &site);
        context
    }

    /// Tags with a usable URL. A tag made only of symbols has none and is left out.
    fn tag_links(&self, post: &Post) -> Vec<TagLink> {
        post.tags()
            .iter()
            .filter(|tag| !tag_slug(tag).is_empty())
            .map(|tag| TagLink {
                name: tag.clone(),
                url: url_for(&self.config, &tag_route(&self.config, tag)),
            })
            .collect()
    }

    fn post_link(&self, post: &Post) -> PostLink {
        PostLink {
            title: post.title().to_string(),
            date: format_date(&post.date(), &self.config.date_format),
            date_iso: date_xml(&post.date()),
            url: url_for(&self.config, &post_route(&self.config, post)),
        }
    }

    fn list_item(&self, post: &Post) -> PostData {
        let link = self.post_link(post);
        let nodes = tree::parse(post.body());
        PostData {
            title: link.title,
            date: link.date,
            date_iso: link.date_iso,
            url: link.url,
            summary: summary_text(&nodes),
            excerpt: excerpt_nodes(&nodes)
                .map(|nodes| html::write(&nodes, self.highlighter.as_ref()).html),
        }
    }
}
