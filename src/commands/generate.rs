//! Export the site as static files

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::{collect_tags, PostStore};
use crate::helpers::TagAnchors;
use crate::og::OgCard;
use crate::render::{OgLinks, PageRenderer};
use crate::Site;

/// Render every page into the public directory
pub fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    let repository = site.repository();
    let metas = repository.list_posts()?;
    let posts = metas
        .iter()
        .map(|meta| repository.get_post(&meta.slug))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!("Loaded {} posts", posts.len());

    let pages = PageRenderer::new(&site.config)?.with_og_links(OgLinks::Static);
    let out = &site.public_dir;
    fs::create_dir_all(out)?;

    // Static files first so generated pages win on conflicts
    copy_static_files(&site.static_dir, out)?;

    write_output(&out.join("index.html"), &pages.home(&metas)?)?;
    write_output(&out.join("posts").join("index.html"), &pages.post_list(&metas)?)?;

    let anchors = TagAnchors::new(collect_tags(&metas));
    for post in &posts {
        let slug = &post.meta.slug;
        let html = pages.post(post, &anchors)?;
        write_output(&out.join("posts").join(slug).join("index.html"), &html)?;
        write_output(&out.join("post").join(slug).join("index.html"), &html)?;

        let card = OgCard::new(&post.meta.title, post.meta.description.as_deref());
        write_output(
            &out.join("og").join(format!("{}.svg", slug)),
            &pages.og_image(&card)?,
        )?;
        tracing::debug!("Generated post: {}", slug);
    }

    let index = crate::content::build_tag_index(&metas);
    write_output(&out.join("tags").join("index.html"), &pages.tags(&index)?)?;
    write_output(&out.join("404.html"), &pages.not_found("/404.html")?)?;
    write_output(&out.join("atom.xml"), &pages.feed(&posts)?)?;

    tracing::info!(
        "Generated {} posts and {} tags in {:?}",
        posts.len(),
        index.len(),
        start.elapsed()
    );

    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}

/// Copy the static directory into the output, keeping its layout
fn copy_static_files(static_dir: &Path, out: &Path) -> Result<()> {
    if !static_dir.is_dir() {
        tracing::debug!("No static directory at {:?}", static_dir);
        return Ok(());
    }

    for entry in WalkDir::new(static_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let relative = path.strip_prefix(static_dir)?;
        let dest = out.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &dest).with_context(|| format!("Failed to copy {:?}", path))?;
    }

    Ok(())
}
