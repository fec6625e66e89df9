//! folio: a static site generator for front-matter Markdown posts
//!
//! Sources are loaded into an in-memory collection, rendered with
//! embedded Tera templates and written out as a static site.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod render;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Configuration file looked up in the site directory
pub const CONFIG_FILE: &str = "_config.yml";

/// A site on disk: its configuration and where things live
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Posts directory, inside the source directory
    pub posts_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Open the site in `base_dir`, reading `_config.yml` if there is one
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Site in `base_dir` using `config` as given
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let posts_dir = source_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            posts_dir,
            public_dir,
        }
    }

    /// Load every post; bad sources are reported, not fatal
    pub fn load(&self) -> Result<content::LoadReport> {
        let loader = content::Loader::new(&self.config)?;
        Ok(loader.load_dir(&self.posts_dir))
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_without_config() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "Folio");
        assert_eq!(site.posts_dir, dir.path().join("source").join("_posts"));
        assert_eq!(site.public_dir, dir.path().join("public"));
    }

    #[test]
    fn test_new_reads_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "title: Notes\npublic_dir: out\nposts_dir: posts\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "Notes");
        assert_eq!(site.public_dir, dir.path().join("out"));
        assert_eq!(site.posts_dir, dir.path().join("source").join("posts"));
    }

    #[test]
    fn test_bad_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "timezone: Mars/Olympus\n").unwrap();
        assert!(Site::new(dir.path()).is_err());
    }
}
