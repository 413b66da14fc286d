//! Atom feed

use anyhow::Result;
use tera::Context;

use super::PageRenderer;
use crate::content::Post;
use crate::helpers::{date_xml, full_url_for};
use crate::templates::FeedEntry;

/// Number of posts carried by the feed
pub const FEED_LIMIT: usize = 20;

impl PageRenderer {
    /// Render the Atom feed for posts already sorted newest first
    pub fn feed(&self, posts: &[Post]) -> Result<String> {
        let base_url = self.config.url.trim_end_matches('/');

        let mut entries = Vec::new();
        for post in posts.iter().take(FEED_LIMIT) {
            let html = self.markdown.render(&post.body)?;
            let content = convert_relative_urls_to_absolute(&html, base_url);
            let content = strip_invalid_xml_chars(&content).replace("]]>", "]]&gt;");

            entries.push(FeedEntry {
                title: strip_invalid_xml_chars(&post.meta.title),
                url: full_url_for(&self.config, &post.meta.path()),
                published: date_xml(&post.meta.date),
                summary: post.meta.description.as_deref().map(strip_invalid_xml_chars),
                tags: post.meta.tags.clone(),
                content,
            });
        }

        let updated = posts
            .first()
            .map(|p| date_xml(&p.meta.date))
            .unwrap_or_else(|| date_xml(&chrono::Local::now().date_naive()));

        let mut context = Context::new();
        context.insert("site", &self.site_data());
        context.insert("feed_url", &full_url_for(&self.config, "/atom.xml"));
        context.insert("updated", &updated);
        context.insert("entries", &entries);

        self.templates.render("atom.xml", &context)
    }
}

/// Point site-relative links at the public URL
fn convert_relative_urls_to_absolute(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}

/// Drop characters XML 1.0 does not allow (tab, newline and carriage return are kept)
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::PostMeta;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn post(slug: &str, day: u32, body: &str) -> Post {
        Post {
            meta: PostMeta {
                slug: slug.to_string(),
                title: format!("Post <{slug}>"),
                date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                tags: vec!["rust".to_string()],
                description: Some("About things".to_string()),
                extra: HashMap::new(),
                source: PathBuf::new(),
            },
            body: body.to_string(),
        }
    }

    fn renderer() -> PageRenderer {
        let mut config = SiteConfig::default();
        config.url = "https://blog.example.com/".to_string();
        PageRenderer::new(&config).unwrap()
    }

    #[test]
    fn test_feed() {
        let posts = vec![
            post("second", 2, "See [first](/posts/first) and ![img](/img/a.png)."),
            post("first", 1, "Hello"),
        ];
        let xml = renderer().feed(&posts).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains(r#"<link href="https://blog.example.com/atom.xml" rel="self"/>"#));
        assert!(xml.contains("<updated>2024-03-02T00:00:00Z</updated>"));
        assert!(xml.contains("<title>Post &lt;second&gt;</title>"));
        assert!(xml.contains("<id>https://blog.example.com/posts/second</id>"));
        assert!(xml.contains("<summary>About things</summary>"));
        assert!(xml.contains(r#"<category term="rust"/>"#));
        assert!(xml.contains(r#"href="https://blog.example.com/posts/first""#));
        assert!(xml.contains(r#"src="https://blog.example.com/img/a.png""#));
        assert!(xml.find("posts/second") < xml.find("posts/first<"));
    }

    #[test]
    fn test_feed_is_capped() {
        let posts: Vec<Post> = (0..30).map(|i| post(&format!("p{i}"), 1, "x")).collect();
        let xml = renderer().feed(&posts).unwrap();
        assert_eq!(xml.matches("<entry>").count(), FEED_LIMIT);
    }

    #[test]
    fn test_cdata_terminator_escaped() {
        let posts = vec![post("cdata", 1, "Inline `]]>` text")];
        let xml = renderer().feed(&posts).unwrap();
        assert_eq!(xml.matches("]]>").count(), 1);
    }

    #[test]
    fn test_strip_invalid_xml_chars() {
        assert_eq!(strip_invalid_xml_chars("a\u{0}b\u{8}c\td\n"), "abc\td\n");
    }
}
