//! Errors raised while reading posts

use std::path::PathBuf;
use thiserror::Error;

use super::frontmatter::FrontMatterError;

/// Failure while listing or loading posts
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("post not found: {0}")]
    NotFound(String),

    #[error("invalid post slug: {0:?}")]
    InvalidSlug(String),

    #[error("{}: file name is not a usable post slug", path.display())]
    UnusableFileName { path: PathBuf },

    #[error("duplicate slug {slug:?}: {} and {}", first.display(), second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("malformed front-matter in {}: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("{}: missing required front-matter field `{field}`", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{}: unparseable date {value:?}", path.display())]
    InvalidDate { path: PathBuf, value: String },

    #[error("{}: tags must be non-empty strings", path.display())]
    EmptyTag { path: PathBuf },
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller should answer with "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidSlug(_))
    }
}
