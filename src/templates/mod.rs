//! Built-in templates using the Tera template engine
//!
//! All templates are embedded in the binary; the renderer picks one per
//! layout or listing page.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::ContentError;
use crate::helpers::truncate;
use crate::render::TocEntry;

/// Template renderer with the embedded default theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self, ContentError> {
        let mut tera = Tera::default();

        // Bodies are already HTML; text fields are escaped in the templates
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("base.html", include_str!("default/base.html")),
            ("post.html", include_str!("default/post.html")),
            ("page.html", include_str!("default/page.html")),
            ("post_list.html", include_str!("default/post_list.html")),
            ("index.html", include_str!("default/index.html")),
            ("tag.html", include_str!("default/tag.html")),
            ("archive.html", include_str!("default/archive.html")),
        ])
        .map_err(|error| ContentError::Template {
            template: "default theme".to_string(),
            error,
        })?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String, ContentError> {
        self.tera
            .render(template_name, context)
            .map_err(|error| ContentError::Template {
                template: template_name.to_string(),
                error,
            })
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => " ...".to_string(),
    };
    Ok(tera::Value::String(truncate(s.trim(), length, &omission)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub root: String,
    pub archive_url: String,
    pub feed_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

/// A post as shown on its own page
#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub title: String,
    pub slug: String,
    pub layout: String,
    pub date: String,
    pub date_iso: String,
    pub url: String,
    pub tags: Vec<TagLink>,
    pub toc: Vec<TocEntry>,
    pub content: String,
}

/// A post as shown in a listing
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub date: String,
    pub date_iso: String,
    pub url: String,
    /// Body as plain text, unescaped
    pub summary: String,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub per_page: usize,
    pub total: usize,
    pub current: usize,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

/// Title and link, for the archive
#[derive(Debug, Clone, Serialize)]
pub struct PostLink {
    pub title: String,
    pub date: String,
    pub date_iso: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveYearData {
    pub year: i32,
    pub posts: Vec<PostLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteData {
        SiteData {
            title: "T & Co".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "A".to_string(),
            language: "en".to_string(),
            root: "/".to_string(),
            archive_url: "/archives/".to_string(),
            feed_url: None,
        }
    }

    #[test]
    fn test_all_templates_parse() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_render_page_escapes_title_not_content() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert(
            "page",
            &PageData {
                title: "<Hello>".to_string(),
                slug: "hello".to_string(),
                layout: "page".to_string(),
                date: "2020-01-01".to_string(),
                date_iso: "2020-01-01T00:00:00+00:00".to_string(),
                url: "/hello/".to_string(),
                tags: Vec::new(),
                toc: Vec::new(),
                content: "<p>body</p>".to_string(),
            },
        );
        let html = renderer.render("page.html", &context).unwrap();
        assert!(html.contains("&lt;Hello&gt;"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("T &amp; Co"));
    }

    #[test]
    fn test_truncate_filter() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(5));
        let out = truncate_chars_filter(&tera::Value::from("Hello World"), &args).unwrap();
        assert_eq!(out, tera::Value::from("Hello ..."));
    }

    #[test]
    fn test_missing_template_is_error() {
        let renderer = TemplateRenderer::new().unwrap();
        let err = renderer.render("nope.html", &Context::new()).unwrap_err();
        assert!(matches!(err, ContentError::Template { ref template, .. } if template == "nope.html"));
    }
}
