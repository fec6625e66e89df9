//! Page layouts

use std::fmt;

use crate::content::{ContentError, Post};

/// Closed set of layouts a post can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Dated article with tags and a table of contents
    Post,
    /// Standalone page without date or tags in the shell
    Page,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::Post, Layout::Page];

    pub fn name(self) -> &'static str {
        match self {
            Layout::Post => "post",
            Layout::Page => "page",
        }
    }

    /// Template file this layout renders with
    pub fn template(self) -> &'static str {
        match self {
            Layout::Post => "post.html",
            Layout::Page => "page.html",
        }
    }

    /// The layout `post` asks for
    pub fn resolve(post: &Post) -> Result<Self, ContentError> {
        let requested = post.layout();
        Layout::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(requested))
            .ok_or_else(|| ContentError::UnknownLayout {
                layout: requested.to_string(),
                slug: post.slug().to_string(),
            })
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
