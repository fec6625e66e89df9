//! List site content

use anyhow::Result;

use crate::content::Post;
use crate::helpers::{post_route, url_for};
use crate::render::Layout;
use crate::Site;

/// List posts or tags. `tag` narrows the post list.
pub fn run(site: &Site, content_type: &str, tag: Option<&str>) -> Result<()> {
    let report = site.load()?;
    let collection = &report.collection;

    match content_type {
        "post" | "posts" => {
            let posts: Vec<&Post> = match tag {
                Some(tag) => collection.by_tag(tag).collect(),
                None => collection.by_date().collect(),
            };
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} ({}) [{}]",
                    post.date().format("%Y-%m-%d"),
                    post.title(),
                    post.slug(),
                    post.source()
                );
            }
        }
        "tag" | "tags" => {
            let tags = collection.tags();
            println!("Tags ({}):", tags.len());
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    if !report.is_clean() {
        println!("Rejected ({}):", report.errors.len());
        for error in &report.errors {
            println!("  {}", error);
        }
    }

    Ok(())
}

/// Print one post's metadata
pub fn show(site: &Site, slug: &str) -> Result<()> {
    let report = site.load()?;
    let post = report.collection.find(slug)?;
    let layout = match Layout::resolve(post) {
        Ok(layout) => layout.to_string(),
        Err(e) => format!("{} ({})", post.layout(), e),
    };

    println!("Title:  {}", post.title());
    println!("Slug:   {}", post.slug());
    println!("Date:   {}", post.date().to_rfc3339());
    println!(
        "Tags:   {}",
        post.tags().iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!("Layout: {}", layout);
    println!("URL:    {}", url_for(&site.config, &post_route(&site.config, post)));
    println!("Source: {}", post.source());
    for (key, value) in post.extra() {
        let value = serde_yaml::to_string(value)?;
        println!("{}: {}", key, value.trim_end());
    }
    Ok(())
}
