//! In-memory post collection

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;

use super::post::normalize_tag;
use super::{ContentError, Post};

/// Newest first, slug breaks ties
fn newest_first(a: &Post, b: &Post) -> Ordering {
    b.date()
        .cmp(&a.date())
        .then_with(|| a.slug().cmp(b.slug()))
}

/// All loaded posts, keyed by slug and kept in date order
#[derive(Debug, Clone, Default)]
pub struct Collection {
    posts: HashMap<String, Post>,
    order: Vec<String>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post. Fails without touching the collection if the slug is taken.
    pub fn add(&mut self, post: Post) -> Result<(), ContentError> {
        if self.posts.contains_key(post.slug()) {
            return Err(ContentError::DuplicateSlug {
                slug: post.slug().to_string(),
                name: post.source().to_string(),
            });
        }

        let at = self
            .order
            .partition_point(|slug| newest_first(&self.posts[slug], &post) == Ordering::Less);
        self.order.insert(at, post.slug().to_string());
        self.posts.insert(post.slug().to_string(), post);
        Ok(())
    }

    /// Remove and return the post with `slug`
    pub fn remove(&mut self, slug: &str) -> Result<Post, ContentError> {
        let post = self
            .posts
            .remove(slug)
            .ok_or_else(|| ContentError::NotFound {
                slug: slug.to_string(),
            })?;
        self.order.retain(|s| s != slug);
        Ok(post)
    }

    pub fn find(&self, slug: &str) -> Result<&Post, ContentError> {
        self.posts.get(slug).ok_or_else(|| ContentError::NotFound {
            slug: slug.to_string(),
        })
    }

    /// Posts by date, newest first. Clone the iterator to walk it again.
    pub fn by_date(&self) -> ByDate<'_> {
        ByDate {
            posts: &self.posts,
            slugs: self.order.iter(),
        }
    }

    /// The `by_date` posts carrying `tag`
    pub fn by_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a Post> + Clone + 'a {
        let tag = normalize_tag(tag);
        self.by_date().filter(move |post| post.tags().contains(&tag))
    }

    /// Every tag with the number of posts carrying it, sorted by tag
    pub fn tags(&self) -> BTreeMap<String, usize> {
        let mut tags = BTreeMap::new();
        for post in self.posts.values() {
            for tag in post.tags() {
                *tags.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        tags
    }

    /// Posts grouped by year, newest year first
    pub fn by_year(&self) -> Vec<(i32, Vec<&Post>)> {
        let mut years: Vec<(i32, Vec<&Post>)> = Vec::new();
        for post in self.by_date() {
            let year = post.date().year();
            match years.last_mut() {
                Some((y, posts)) if *y == year => posts.push(post),
                _ => years.push((year, vec![post])),
            }
        }
        years
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Iterator returned by [`Collection::by_date`]
#[derive(Debug, Clone)]
pub struct ByDate<'a> {
    posts: &'a HashMap<String, Post>,
    slugs: std::slice::Iter<'a, String>,
}

impl<'a> Iterator for ByDate<'a> {
    type Item = &'a Post;

    fn next(&mut self) -> Option<&'a Post> {
        let slug = self.slugs.next()?;
        self.posts.get(slug)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slugs.size_hint()
    }
}

impl ExactSizeIterator for ByDate<'_> {}
