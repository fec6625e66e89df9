//! Content module - front matter, posts, loading and the post index

mod error;
pub mod frontmatter;
mod index;
pub mod loader;
mod post;

pub use error::ContentError;
pub use frontmatter::FrontMatter;
pub use index::{ByDate, Collection};
pub use loader::{LoadReport, Loader};
pub use post::{normalize_tag, Post};
