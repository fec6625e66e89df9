//! Errors raised while loading, querying and rendering content

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between a source file and a rendered page
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{name}: no front-matter block at the start of the file")]
    MissingFrontMatter { name: String },

    #[error("{name}: malformed front-matter: {reason}")]
    MalformedFrontMatter { name: String, reason: String },

    #[error("{name}: missing required front-matter field `{field}`")]
    MissingField { name: String, field: &'static str },

    #[error("{name}: invalid date {value:?}")]
    InvalidDate { name: String, value: String },

    #[error("{name}: slug `{slug}` is already used by another post")]
    DuplicateSlug { slug: String, name: String },

    #[error("no post with slug `{slug}`")]
    NotFound { slug: String },

    #[error("{slug}: unknown layout `{layout}`")]
    UnknownLayout { layout: String, slug: String },

    #[error("I/O error on {path:?}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("template `{template}` failed: {error}")]
    Template {
        template: String,
        #[source]
        error: tera::Error,
    },
}

impl ContentError {
    /// Name of the source (or slug) this error is about
    pub fn subject(&self) -> String {
        match self {
            ContentError::MissingFrontMatter { name }
            | ContentError::MalformedFrontMatter { name, .. }
            | ContentError::MissingField { name, .. }
            | ContentError::InvalidDate { name, .. }
            | ContentError::DuplicateSlug { name, .. } => name.clone(),
            ContentError::NotFound { slug } | ContentError::UnknownLayout { slug, .. } => {
                slug.clone()
            }
            ContentError::Io { path, .. } => path.display().to_string(),
            ContentError::Template { template, .. } => template.clone(),
        }
    }
}
