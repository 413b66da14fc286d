//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary, so a site directory
//! only needs posts and a config file.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{LinkConfig, OgConfig};
use crate::helpers::format_date;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Escape HTML, SVG and XML output, but leave `/` alone so URLs stay readable
        tera.autoescape_on(vec![".html", ".svg", ".xml"]);
        tera.set_escape_fn(escape_markup);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("posts.html", include_str!("site/posts.html")),
            ("post.html", include_str!("site/post.html")),
            ("tags.html", include_str!("site/tags.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            ("og.svg", include_str!("site/og.svg")),
            ("atom.xml", include_str!("site/atom.xml")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/footer.html",
                include_str!("site/partials/footer.html"),
            ),
            ("partials/style.css", include_str!("site/partials/style.css")),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Escape the five markup-significant characters
pub fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Tera filter: format an ISO `YYYY-MM-DD` date with a chrono format string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%b %d, %Y".to_string(),
    };

    match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        Ok(date) => Ok(tera::Value::String(format_date(&date, &format))),
        // Not a date we produced; show it unchanged
        Err(_) => Ok(tera::Value::String(s)),
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
    /// Base URL without trailing slash
    pub url: String,
    pub host: String,
    pub year: i32,
    pub date_format: String,
    pub nav: Vec<LinkConfig>,
}

/// Head metadata of a page
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: Option<String>,
    pub canonical: String,
    pub og: Option<OgMeta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OgMeta {
    pub kind: String,
    pub title: String,
    pub published_time: Option<String>,
    pub image: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLink {
    pub name: String,
    pub anchor: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    /// ISO date, formatted in templates with `date_format`
    pub date: String,
    pub path: String,
    pub description: Option<String>,
    pub tags: Vec<TagLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeEntry {
    /// Zero-padded position counted from the oldest post
    pub number: String,
    pub post: PostSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutData {
    pub name: String,
    /// Rendered HTML paragraphs
    pub bio: Vec<String>,
    pub email: Option<String>,
    pub cv: Option<String>,
    pub links: Vec<LinkConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagSection {
    pub name: String,
    pub anchor: String,
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextLine {
    pub text: String,
    pub y: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OgImageData {
    pub width: u32,
    pub height: u32,
    pub center_x: u32,
    pub title_size: u32,
    pub subtitle_size: u32,
    pub title_lines: Vec<TextLine>,
    pub subtitle_lines: Vec<TextLine>,
    pub style: OgConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    pub published: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub content: String,
}
