//! Content loader - turns source files into posts

use anyhow::Result;
use chrono_tz::Tz;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{Collection, ContentError, FrontMatter, Post};
use crate::config::SiteConfig;

/// Outcome of loading a directory: every good post, plus what went wrong
#[derive(Debug, Default)]
pub struct LoadReport {
    pub collection: Collection,
    pub errors: Vec<ContentError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Loads posts using the site's timezone and default layout
#[derive(Debug, Clone)]
pub struct Loader {
    tz: Tz,
    default_layout: String,
}

impl Loader {
    /// Create a new loader
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            tz: config.tz()?,
            default_layout: config.default_layout.clone(),
        })
    }

    /// Parse one source. `name` identifies it in errors and supplies the
    /// fallback slug.
    pub fn load_str(&self, name: &str, content: &str) -> Result<Post, ContentError> {
        let (fm, body) = FrontMatter::parse(name, content)?;
        Post::from_front_matter(name, fm, body, self.tz, &self.default_layout)
    }

    /// Read and parse a single file, naming it `name`
    pub fn load_file(&self, path: &Path, name: &str) -> Result<Post, ContentError> {
        let content = fs::read_to_string(path).map_err(|error| ContentError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        self.load_str(name, &content)
    }

    /// Load every markdown file under `dir`.
    ///
    /// A bad file is recorded in the report and skipped; the others still load.
    /// Files are visited in name order so duplicate slugs resolve the same way
    /// on every run.
    pub fn load_dir(&self, dir: &Path) -> LoadReport {
        let mut report = LoadReport::default();
        if !dir.exists() {
            tracing::warn!("Posts directory {:?} does not exist", dir);
            return report;
        }

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    let error = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    tracing::warn!("Failed to read {:?}: {}", path, error);
                    report.errors.push(ContentError::Io { path, error });
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            let name = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();

            let loaded = self
                .load_file(path, &name)
                .and_then(|post| report.collection.add(post));
            if let Err(e) = loaded {
                tracing::warn!("Skipping {}: {}", name, e);
                report.errors.push(e);
            }
        }

        tracing::debug!(
            "Loaded {} posts from {:?} ({} rejected)",
            report.collection.len(),
            dir,
            report.errors.len()
        );
        report
    }
}

/// Check if a file is a markdown file
/// Whether `path` has a Markdown extension, in any case
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> Loader {
        Loader::new(&SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_load_str() {
        let post = loader()
            .load_str(
                "hello.md",
                "---\ntitle: Hello\ndate: 2020-01-01\ntags: [a, b]\n---\n# Hi\n",
            )
            .unwrap();
        assert_eq!(post.slug(), "hello");
        assert_eq!(post.title(), "Hello");
        assert_eq!(post.body(), "# Hi\n");
        assert_eq!(post.layout(), "post");
        assert!(post.has_tag("a") && post.has_tag("b"));
    }

    #[test]
    fn test_default_layout_from_config() {
        let config = SiteConfig {
            default_layout: "page".to_string(),
            ..Default::default()
        };
        let post = Loader::new(&config)
            .unwrap()
            .load_str("about.md", "---\ntitle: About\ndate: 2020-01-01\n---\n")
            .unwrap();
        assert_eq!(post.layout(), "page");
    }

    #[test]
    fn test_load_dir_collects_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("good.md"),
            "---\ntitle: Good\ndate: 2020-01-01\n---\nbody\n",
        )
        .unwrap();
        fs::write(dir.path().join("nodate.md"), "---\ntitle: No date\n---\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a post").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/deep.markdown"),
            "---\ntitle: Deep\ndate: 2021-01-01\n---\n",
        )
        .unwrap();

        let report = loader().load_dir(dir.path());
        assert_eq!(report.collection.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            ContentError::MissingField { name, field: "date" } if name == "nodate.md"
        ));
        assert!(report.collection.find("deep").is_ok());
    }

    #[test]
    fn test_markdown_extension_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Upper.MD"),
            "---\ntitle: Upper\ndate: 2020-01-01\n---\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("mixed.Markdown"),
            "---\ntitle: Mixed\ndate: 2020-01-02\n---\n",
        )
        .unwrap();

        let report = loader().load_dir(dir.path());
        assert!(report.is_clean());
        assert!(report.collection.find("upper").is_ok());
        assert!(report.collection.find("mixed").is_ok());
        assert!(!is_markdown_file(Path::new("notes.txt")));
        assert!(!is_markdown_file(Path::new("README")));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = loader().load_dir(&dir.path().join("absent"));
        assert!(report.collection.is_empty());
        assert!(report.is_clean());
    }
}
