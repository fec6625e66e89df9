//! Generator module - writes rendered pages into the public directory

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::content::loader::is_markdown_file;
use crate::content::{Collection, ContentError, Post};
use crate::helpers::tag_slug;
use crate::render::{RenderedPost, Renderer};
use crate::Site;

/// What a run wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub pages: usize,
    pub assets: usize,
}

/// Static site generator using the embedded templates
pub struct Generator {
    source_dir: PathBuf,
    posts_dir: PathBuf,
    public_dir: PathBuf,
    renderer: Renderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = Renderer::new(&site.config)?;

        Ok(Self {
            source_dir: site.source_dir.clone(),
            posts_dir: site.posts_dir.clone(),
            public_dir: site.public_dir.clone(),
            renderer,
        })
    }

    /// Generate the entire site.
    ///
    /// A post that fails to render is logged and skipped; once everything else
    /// is written the run fails listing those posts.
    pub fn generate(&self, collection: &Collection) -> Result<GenerateStats> {
        fs::create_dir_all(&self.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.public_dir))?;

        let mut stats = GenerateStats::default();
        let mut failed = Vec::new();

        // Posts render independently; the collection is only read
        let posts: Vec<&Post> = collection.by_date().collect();
        let rendered: Vec<Result<RenderedPost, ContentError>> = posts
            .par_iter()
            .map(|post| self.renderer.render(post))
            .collect();

        for result in rendered {
            match result {
                Ok(post) => {
                    self.write(&post.output_path(), &post.html)?;
                    stats.posts += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to render {}: {}", e.subject(), e);
                    failed.push(e);
                }
            }
        }
        tracing::info!("Generated {} posts", stats.posts);

        stats.pages += self.generate_index_pages(collection)?;
        stats.pages += self.generate_tag_pages(collection)?;
        stats.pages += self.generate_archive_page(collection)?;
        stats.pages += self.generate_feed(collection)?;
        stats.assets = self.copy_source_assets()?;

        if !failed.is_empty() {
            let names: Vec<String> = failed.iter().map(ContentError::subject).collect();
            anyhow::bail!(
                "{} post(s) could not be rendered: {}",
                failed.len(),
                names.join(", ")
            );
        }

        Ok(stats)
    }

    /// Generate index pages with pagination
    fn generate_index_pages(&self, collection: &Collection) -> Result<usize> {
        let pages = self.renderer.render_index(collection)?;
        for page in &pages {
            self.write(&page.output_path(), &page.html)?;
        }
        tracing::info!("Generated {} index pages", pages.len());
        Ok(pages.len())
    }

    /// Generate one listing per tag
    fn generate_tag_pages(&self, collection: &Collection) -> Result<usize> {
        // Distinct tags can share a URL; the first one in tag order keeps it
        let mut routes: BTreeMap<String, String> = BTreeMap::new();
        for tag in collection.tags().into_keys() {
            let slug = tag_slug(&tag);
            if slug.is_empty() {
                tracing::warn!("Tag {:?} has no URL-safe name, skipping its page", tag);
                continue;
            }
            match routes.get(&slug) {
                Some(owner) => tracing::warn!(
                    "Tag {:?} shares the URL of tag {:?}, skipping its page",
                    tag,
                    owner
                ),
                None => {
                    routes.insert(slug, tag);
                }
            }
        }

        for tag in routes.values() {
            let page = self.renderer.render_tag(collection, tag)?;
            self.write(&page.output_path(), &page.html)?;
        }
        tracing::info!("Generated {} tag pages", routes.len());
        Ok(routes.len())
    }

    fn generate_archive_page(&self, collection: &Collection) -> Result<usize> {
        let page = self.renderer.render_archive(collection)?;
        self.write(&page.output_path(), &page.html)?;
        tracing::info!("Generated archive page");
        Ok(1)
    }

    /// Generate the Atom feed, if enabled
    fn generate_feed(&self, collection: &Collection) -> Result<usize> {
        match self.renderer.render_feed(collection) {
            Some(feed) => {
                self.write(&feed.output_path(), &feed.html)?;
                tracing::info!("Generated {}", feed.route);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Copy source assets (images, etc.) to public directory
    fn copy_source_assets(&self) -> Result<usize> {
        if !self.source_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(&self.source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable asset: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || path.starts_with(&self.posts_dir) {
                continue;
            }

            // Markdown outside the posts directory is not published
            if is_markdown_file(path) {
                continue;
            }

            // Hidden files and folders starting with `_` stay private
            let relative = path.strip_prefix(&self.source_dir)?;
            let private = relative.components().any(|c| {
                let name = c.as_os_str().to_string_lossy();
                name.starts_with('_') || name.starts_with('.')
            });
            if private {
                continue;
            }

            let dest = self.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest).with_context(|| format!("Failed to copy {:?}", path))?;
            tracing::debug!("Copied {:?}", relative);
            copied += 1;
        }

        if copied > 0 {
            tracing::info!("Copied {} assets", copied);
        }
        Ok(copied)
    }

    /// Write `contents` to `relative` under the public directory
    fn write(&self, relative: &Path, contents: &str) -> Result<()> {
        let path = self.public_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Generated {:?}", relative);
        Ok(())
    }
}
