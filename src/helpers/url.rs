//! URL and route helpers
//!
//! A *route* is a path relative to the public directory (`2020/01/01/hello/`).
//! A *URL* is the route under the site root (`/blog/2020/01/01/hello/`).

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::Post;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Expand the permalink pattern for a post
pub fn post_route(config: &SiteConfig, post: &Post) -> String {
    expand_permalink(&config.permalink, &post.date(), post.slug())
}

fn expand_permalink(pattern: &str, date: &DateTime<FixedOffset>, slug: &str) -> String {
    let route = pattern
        .replace(":year", &date.format("%Y").to_string())
        .replace(":i_month", &date.format("%-m").to_string())
        .replace(":month", &date.format("%m").to_string())
        .replace(":i_day", &date.format("%-d").to_string())
        .replace(":day", &date.format("%d").to_string())
        .replace(":title", slug)
        .replace(":slug", slug);
    route.trim_start_matches('/').to_string()
}

/// URL-safe name for a tag. Keeps `c#` and `c++` apart from `c`.
pub fn tag_slug(tag: &str) -> String {
    slug::slugify(tag.replace('#', "-sharp").replace('+', "-plus"))
}

/// Route of a tag listing page
pub fn tag_route(config: &SiteConfig, tag: &str) -> String {
    format!("{}/{}/", config.tag_dir.trim_matches('/'), tag_slug(tag))
}

/// Route of the archive page
pub fn archive_route(config: &SiteConfig) -> String {
    format!("{}/", config.archive_dir.trim_matches('/'))
}

/// Route of the `page_num`-th home page (1-based)
pub fn index_route(config: &SiteConfig, page_num: usize) -> String {
    if page_num <= 1 {
        String::new()
    } else {
        format!("{}/{}/", config.pagination_dir.trim_matches('/'), page_num)
    }
}

/// File a route is written to, relative to the public directory
pub fn route_to_file(route: &str) -> PathBuf {
    let route = route.trim_start_matches('/');
    if route.is_empty() || route.ends_with('/') {
        PathBuf::from(route).join("index.html")
    } else {
        PathBuf::from(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Loader;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com".to_string(),
            root: "/blog/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/css/style.css"), "/blog/css/style.css");
        assert_eq!(url_for(&config, "about/"), "/blog/about/");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/about/"),
            "https://example.com/blog/about/"
        );
    }

    #[test]
    fn test_post_route() {
        let config = SiteConfig::default();
        let post = Loader::new(&config)
            .unwrap()
            .load_str("hello.md", "---\ntitle: Hello\ndate: 2020-03-07\n---\n")
            .unwrap();
        assert_eq!(post_route(&config, &post), "2020/03/07/hello/");

        let flat = SiteConfig {
            permalink: "/:year/:i_month/:title.html".to_string(),
            ..Default::default()
        };
        assert_eq!(post_route(&flat, &post), "2020/3/hello.html");
    }

    #[test]
    fn test_tag_slug() {
        assert_eq!(tag_slug("c#"), "c-sharp");
        assert_eq!(tag_slug("c++"), "c-plus-plus");
        assert_eq!(tag_slug("specflow"), "specflow");
        assert_eq!(tag_route(&SiteConfig::default(), ".net"), "tags/net/");
    }

    #[test]
    fn test_route_to_file() {
        assert_eq!(route_to_file(""), PathBuf::from("index.html"));
        assert_eq!(
            route_to_file("2020/01/01/a/"),
            PathBuf::from("2020/01/01/a/index.html")
        );
        assert_eq!(route_to_file("atom.xml"), PathBuf::from("atom.xml"));
        assert_eq!(index_route(&SiteConfig::default(), 1), "");
        assert_eq!(index_route(&SiteConfig::default(), 3), "page/3/");
    }
}
