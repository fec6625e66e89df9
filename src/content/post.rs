//! Post model

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::Path;

use super::frontmatter::{parse_date, FrontMatter};
use super::ContentError;

/// A blog post.
///
/// Posts are immutable once loaded. Replacing one means building a new value
/// and swapping it in the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    slug: String,
    title: String,
    date: DateTime<FixedOffset>,
    tags: BTreeSet<String>,
    layout: String,
    body: String,
    source: String,
    extra: IndexMap<String, serde_yaml::Value>,
}

impl Post {
    /// Build a post from parsed front-matter.
    ///
    /// `source` names the origin; its file stem is the slug unless the
    /// front-matter sets one.
    pub fn from_front_matter(
        source: &str,
        fm: FrontMatter,
        body: &str,
        tz: Tz,
        default_layout: &str,
    ) -> Result<Self, ContentError> {
        let title = fm
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ContentError::MissingField {
                name: source.to_string(),
                field: "title",
            })?;

        let raw_date = fm.date.ok_or_else(|| ContentError::MissingField {
            name: source.to_string(),
            field: "date",
        })?;
        let date = parse_date(&raw_date, tz).ok_or_else(|| ContentError::InvalidDate {
            name: source.to_string(),
            value: raw_date.clone(),
        })?;

        let slug = match fm.slug.as_deref() {
            Some(explicit) => slug::slugify(explicit),
            None => slug_from_source(source),
        };
        if slug.is_empty() {
            return Err(ContentError::MalformedFrontMatter {
                name: source.to_string(),
                reason: "cannot derive a slug".to_string(),
            });
        }

        let layout = fm
            .layout
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| default_layout.to_string());

        Ok(Self {
            slug,
            title: title.trim().to_string(),
            date,
            tags: normalize_tags(&fm.tags),
            layout,
            body: body.to_string(),
            source: source.to_string(),
            extra: fm.extra,
        })
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    /// Normalized tags, sorted
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether the post carries `tag` (compared after normalization)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&normalize_tag(tag))
    }

    /// Layout name as written; resolved at render time
    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// Raw markup body, verbatim from the source
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Name of the source this post was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Front-matter keys with no meaning to the pipeline
    pub fn extra(&self) -> &IndexMap<String, serde_yaml::Value> {
        &self.extra
    }

    /// Same post with a different body
    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..self.clone()
        }
    }

    /// Front-matter describing this post. The slug is always written out so
    /// the post reloads under the same slug whatever its file is called.
    pub fn front_matter(&self) -> FrontMatter {
        FrontMatter {
            title: Some(self.title.clone()),
            date: Some(self.date.to_rfc3339()),
            tags: self.tags.iter().cloned().collect(),
            layout: Some(self.layout.clone()),
            slug: Some(self.slug.clone()),
            extra: self.extra.clone(),
        }
    }

    /// Write the post back out as a source document
    pub fn to_source(&self) -> String {
        format!("{}{}", self.front_matter().render(), self.body)
    }
}

/// Lowercase and trim a tag
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

fn normalize_tags(tags: &[String]) -> BTreeSet<String> {
    tags.iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect()
}

fn slug_from_source(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    slug::slugify(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fm(title: &str, date: &str) -> FrontMatter {
        FrontMatter {
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_slug_from_filename() {
        let post =
            Post::from_front_matter("posts/Hello World.md", fm("Hi", "2020-01-01"), "", Tz::UTC, "post")
                .unwrap();
        assert_eq!(post.slug(), "hello-world");
        assert_eq!(post.layout(), "post");
    }

    #[test]
    fn test_explicit_slug_wins() {
        let mut matter = fm("Hi", "2020-01-01");
        matter.slug = Some("Intro Post".to_string());
        let post = Post::from_front_matter("a.md", matter, "", Tz::UTC, "post").unwrap();
        assert_eq!(post.slug(), "intro-post");
    }

    #[test]
    fn test_tags_normalized_and_deduplicated() {
        let mut matter = fm("Hi", "2020-01-01");
        matter.tags = vec![
            "Rust".to_string(),
            " rust ".to_string(),
            "CSharp".to_string(),
            "".to_string(),
        ];
        let post = Post::from_front_matter("a.md", matter, "", Tz::UTC, "post").unwrap();
        let tags: Vec<_> = post.tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["csharp", "rust"]);
        assert!(post.has_tag("RUST"));
    }

    #[test]
    fn test_missing_title_and_date() {
        let matter = FrontMatter {
            date: Some("2020-01-01".to_string()),
            ..Default::default()
        };
        let err = Post::from_front_matter("a.md", matter, "", Tz::UTC, "post").unwrap_err();
        assert!(matches!(err, ContentError::MissingField { field: "title", .. }));

        let matter = FrontMatter {
            title: Some("Hi".to_string()),
            ..Default::default()
        };
        let err = Post::from_front_matter("a.md", matter, "", Tz::UTC, "post").unwrap_err();
        assert!(matches!(err, ContentError::MissingField { field: "date", .. }));
    }

    #[test]
    fn test_invalid_date() {
        let err = Post::from_front_matter("a.md", fm("Hi", "2020-13-01"), "", Tz::UTC, "post")
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidDate { ref value, .. } if value == "2020-13-01"));
    }

    #[test]
    fn test_with_body_keeps_metadata() {
        let post = Post::from_front_matter("a.md", fm("Hi", "2020-01-01"), "old", Tz::UTC, "post")
            .unwrap();
        let changed = post.with_body("new");
        assert_eq!(changed.body(), "new");
        assert_eq!(changed.slug(), post.slug());
        assert_eq!(post.body(), "old");
    }
}
