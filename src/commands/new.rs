//! Create a new post

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::Site;

#[derive(Serialize)]
struct Scaffold<'a> {
    title: &'a str,
    date: String,
    tags: &'a [String],
}

/// Scaffold `{posts_dir}/{slug}.md` dated today
pub fn create_post(site: &Site, title: &str, tags: &[String]) -> Result<PathBuf> {
    let title = title.trim();
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    fs::create_dir_all(&site.posts_dir)?;
    let file_path = site.posts_dir.join(format!("{}.md", slug));

    let scaffold = Scaffold {
        title,
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        tags,
    };
    let front_matter = serde_yaml::to_string(&scaffold)?;
    let content = format!("---\n{}---\n\n", front_matter);

    // Never clobber an existing post, even one created after the slug was picked
    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&file_path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            anyhow::bail!("File already exists: {:?}", file_path)
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to create {:?}", file_path)),
    };
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {:?}", file_path))?;
    println!("Created: {:?}", file_path);

    Ok(file_path)
}
