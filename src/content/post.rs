//! Post models

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Metadata of a post, everything except its body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostMeta {
    /// URL-safe identifier, the file name without extension
    pub slug: String,

    /// Post title
    pub title: String,

    /// Publication date
    pub date: NaiveDate,

    /// Distinct tags, in front-matter order
    pub tags: Vec<String>,

    /// Short summary, also used as the OG subtitle
    pub description: Option<String>,

    /// Front-matter keys with no dedicated field
    pub extra: HashMap<String, serde_yaml::Value>,

    /// Source file
    #[serde(skip)]
    pub source: PathBuf,
}

impl PostMeta {
    /// Site-relative URL of the post
    pub fn path(&self) -> String {
        format!("/posts/{}", self.slug)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A post with its markdown body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMeta,

    /// Raw markdown body, front-matter removed
    pub body: String,
}
