//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,

    // URL
    pub url: String,

    // Directory
    pub posts_dir: String,
    pub public_dir: String,
    pub static_dir: String,

    // Writing
    /// chrono format used for post dates on every page
    pub date_format: String,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Layout
    pub nav: Vec<LinkConfig>,
    #[serde(default)]
    pub about: AboutConfig,
    #[serde(default)]
    pub og: OgConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "folio".to_string(),
            author: "John Doe".to_string(),
            description: String::new(),
            language: "en".to_string(),

            url: "http://localhost:4000".to_string(),

            posts_dir: "posts".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            date_format: "%b %d, %Y".to_string(),
            highlight: HighlightConfig::default(),

            nav: vec![
                LinkConfig::new("Home", "/"),
                LinkConfig::new("Posts", "/posts"),
            ],
            about: AboutConfig::default(),
            og: OgConfig::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig =
            serde_yaml::from_str(&content).with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    /// Host part of the site URL, shown in the footer
    pub fn host(&self) -> &str {
        let without_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or(without_scheme)
    }
}

/// A labelled link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub title: String,
    pub href: String,
}

impl LinkConfig {
    pub fn new(title: &str, href: &str) -> Self {
        Self {
            title: title.to_string(),
            href: href.to_string(),
        }
    }
}

/// The "about me" block of the home page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutConfig {
    /// Display name, defaults to the site author
    pub name: Option<String>,
    /// Paragraphs of inline markdown
    pub bio: Vec<String>,
    pub email: Option<String>,
    /// Path or URL of a downloadable CV
    pub cv: Option<String>,
    /// External profiles
    pub links: Vec<LinkConfig>,
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: crate::content::DEFAULT_THEME.to_string(),
            line_number: false,
        }
    }
}

/// Open Graph image look
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OgConfig {
    pub background: String,
    pub foreground: String,
    pub font_family: String,
}

impl Default for OgConfig {
    fn default() -> Self {
        Self {
            background: "white".to_string(),
            foreground: "black".to_string(),
            font_family: "Work Sans, Helvetica, Arial, sans-serif".to_string(),
        }
    }
}
