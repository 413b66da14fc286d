//! List site content

use anyhow::Result;
use indexmap::IndexMap;
use std::fmt::Write;

use crate::content::{PostMeta, PostStore};
use crate::helpers::iso_date;
use crate::Site;

/// Print posts or tags
pub fn run(site: &Site, content_type: &str, json: bool) -> Result<()> {
    let posts = site.repository().list_posts()?;
    print!("{}", listing(&posts, content_type, json)?);
    Ok(())
}

/// Format a listing of `content_type` for the given posts
pub fn listing(posts: &[PostMeta], content_type: &str, json: bool) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            if json {
                out = serde_json::to_string_pretty(posts)?;
                out.push('\n');
            } else {
                writeln!(out, "Posts ({}):", posts.len())?;
                for post in posts {
                    writeln!(
                        out,
                        "  {} - {} [{}]",
                        iso_date(&post.date),
                        post.title,
                        post.slug
                    )?;
                }
            }
        }
        "tag" | "tags" => {
            let counts = tag_counts(posts);
            if json {
                out = serde_json::to_string_pretty(&counts)?;
                out.push('\n');
            } else {
                writeln!(out, "Tags ({}):", counts.len())?;
                for (tag, count) in &counts {
                    writeln!(out, "  {} ({})", tag, count)?;
                }
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(out)
}

/// Posts per tag, most used first; ties keep first-seen order
fn tag_counts(posts: &[PostMeta]) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for post in posts {
        for tag in &post.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts.sort_by(|_, a, _, b| b.cmp(a));
    counts
}
