//! Post repository - reads posts from the posts directory

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ContentError, FrontMatter, Post, PostMeta, PostStore};

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Reads posts straight from disk on every call
#[derive(Debug, Clone)]
pub struct PostRepository {
    dir: PathBuf,
}

impl PostRepository {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// The posts directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Markdown files directly inside the posts directory, keyed by slug
    fn markdown_files(&self) -> Result<Vec<(String, PathBuf)>, ContentError> {
        let mut by_slug: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.dir).to_path_buf();
                ContentError::io(path, e.into())
            })?;
            let path = entry.path();

            if !entry.file_type().is_file() || !is_markdown_file(path) {
                continue;
            }
            // Hidden files (editor backups, lock files) are never posts
            if entry.file_name().to_string_lossy().starts_with('.') {
                tracing::debug!("Skipping hidden file: {:?}", path);
                continue;
            }
            // Anything listed must be loadable by its slug
            let slug = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| is_valid_slug(s))
                .ok_or_else(|| ContentError::UnusableFileName {
                    path: path.to_path_buf(),
                })?;

            if let Some(first) = by_slug.insert(slug.to_string(), path.to_path_buf()) {
                return Err(ContentError::DuplicateSlug {
                    slug: slug.to_string(),
                    first,
                    second: path.to_path_buf(),
                });
            }
        }

        Ok(by_slug.into_iter().collect())
    }

    /// Resolve a slug to its source file
    fn find(&self, slug: &str) -> Result<PathBuf, ContentError> {
        if !is_valid_slug(slug) {
            return Err(ContentError::InvalidSlug(slug.to_string()));
        }

        let mut found = MARKDOWN_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{slug}.{ext}")))
            .filter(|p| p.is_file());

        match (found.next(), found.next()) {
            (Some(first), Some(second)) => Err(ContentError::DuplicateSlug {
                slug: slug.to_string(),
                first,
                second,
            }),
            (Some(path), None) => Ok(path),
            _ => Err(ContentError::NotFound(slug.to_string())),
        }
    }

    /// Load and validate a single post
    fn load(&self, slug: &str, path: &Path) -> Result<Post, ContentError> {
        let content = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
        let (fm, body) =
            FrontMatter::parse(&content).map_err(|source| ContentError::FrontMatter {
                path: path.to_path_buf(),
                source,
            })?;

        let title = fm
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ContentError::MissingField {
                path: path.to_path_buf(),
                field: "title",
            })?
            .to_string();

        let raw_date = fm.date.as_deref().ok_or_else(|| ContentError::MissingField {
            path: path.to_path_buf(),
            field: "date",
        })?;
        let date = fm.parse_date().ok_or_else(|| ContentError::InvalidDate {
            path: path.to_path_buf(),
            value: raw_date.to_string(),
        })?;

        let mut tags: Vec<String> = Vec::with_capacity(fm.tags.len());
        for tag in &fm.tags {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(ContentError::EmptyTag {
                    path: path.to_path_buf(),
                });
            }
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        let description = fm
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Post {
            meta: PostMeta {
                slug: slug.to_string(),
                title,
                date,
                tags,
                description,
                extra: fm.extra,
                source: path.to_path_buf(),
            },
            body: body.to_string(),
        })
    }
}

impl PostStore for PostRepository {
    fn list_posts(&self) -> Result<Vec<PostMeta>, ContentError> {
        let mut posts = self
            .markdown_files()?
            .into_iter()
            .map(|(slug, path)| self.load(&slug, &path).map(|post| post.meta))
            .collect::<Result<Vec<_>, _>>()?;

        // Newest first; slug breaks ties so the order is total
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        tracing::debug!("Loaded {} posts from {:?}", posts.len(), self.dir);
        Ok(posts)
    }

    fn get_post(&self, slug: &str) -> Result<Post, ContentError> {
        let path = self.find(slug)?;
        self.load(slug, &path)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// A slug names a file inside the posts directory and nothing else
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
}
