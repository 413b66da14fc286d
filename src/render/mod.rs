//! Page renderer - turns posts into HTML documents using the built-in templates

mod feed;

pub use feed::FEED_LIMIT;

use anyhow::Result;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{collect_tags, MarkdownRenderer, Post, PostMeta, TagIndex};
use crate::helpers::{
    current_year, date_xml, full_url_for, iso_date, og_image_path, static_og_image_path,
    TagAnchors,
};
use crate::og::{self, OgCard};
use crate::templates::{
    AboutData, HomeEntry, OgMeta, PageMeta, PostSummary, SiteData, TagLink, TagSection,
    TemplateRenderer,
};

/// Where post pages point their `og:image`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OgLinks {
    /// The `/api/og` endpoint of a running server
    Dynamic,
    /// Pre-rendered `/og/{slug}.svg` files of a static export
    Static,
}

/// Renders every page of the site
pub struct PageRenderer {
    config: SiteConfig,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
    og_links: OgLinks,
}

impl PageRenderer {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let templates = TemplateRenderer::new()?;
        let markdown =
            MarkdownRenderer::with_options(&config.highlight.theme, config.highlight.line_number);

        Ok(Self {
            config: config.clone(),
            templates,
            markdown,
            og_links: OgLinks::Dynamic,
        })
    }

    pub fn with_og_links(mut self, og_links: OgLinks) -> Self {
        self.og_links = og_links;
        self
    }

    /// Home page: about block followed by every post
    pub fn home(&self, posts: &[PostMeta]) -> Result<String> {
        let about = &self.config.about;
        let bio = about
            .bio
            .iter()
            .map(|p| self.markdown.render_inline(p))
            .collect::<Result<Vec<_>>>()?;
        let about = AboutData {
            name: about
                .name
                .clone()
                .unwrap_or_else(|| self.config.author.clone()),
            bio,
            email: about.email.clone(),
            cv: about.cv.clone(),
            links: about.links.clone(),
        };

        let anchors = TagAnchors::new(collect_tags(posts));
        let entries: Vec<HomeEntry> = posts
            .iter()
            .enumerate()
            .map(|(i, post)| HomeEntry {
                number: format!("{:02}", posts.len() - i - 1),
                post: summarize(post, &anchors),
            })
            .collect();

        let meta = PageMeta {
            title: self.config.title.clone(),
            description: non_empty(&self.config.description),
            canonical: full_url_for(&self.config, "/"),
            og: None,
        };
        let mut context = self.base_context(meta);
        context.insert("about", &about);
        context.insert("entries", &entries);

        self.templates.render("home.html", &context)
    }

    /// Post list page
    pub fn post_list(&self, posts: &[PostMeta]) -> Result<String> {
        let anchors = TagAnchors::new(collect_tags(posts));
        let summaries: Vec<PostSummary> = posts.iter().map(|p| summarize(p, &anchors)).collect();

        let meta = PageMeta {
            title: format!("Posts - {}", self.config.author),
            description: non_empty(&self.config.description),
            canonical: full_url_for(&self.config, "/posts"),
            og: None,
        };
        let mut context = self.base_context(meta);
        context.insert("posts", &summaries);

        self.templates.render("posts.html", &context)
    }

    /// A single post with its rendered body.
    ///
    /// `anchors` must come from the whole site so tag links match the tag page.
    pub fn post(&self, post: &Post, anchors: &TagAnchors) -> Result<String> {
        let meta = &post.meta;
        let content = self.markdown.render(&post.body)?;

        let image = match self.og_links {
            OgLinks::Dynamic => og_image_path(&meta.title, meta.description.as_deref()),
            OgLinks::Static => static_og_image_path(&meta.slug),
        };
        let page_meta = PageMeta {
            title: format!("{} ✦ {}", meta.title, self.config.author),
            description: meta.description.clone(),
            canonical: full_url_for(&self.config, &meta.path()),
            og: Some(OgMeta {
                kind: "article".to_string(),
                title: meta.title.clone(),
                published_time: Some(date_xml(&meta.date)),
                image: full_url_for(&self.config, &image),
                width: og::WIDTH,
                height: og::HEIGHT,
            }),
        };

        let mut context = self.base_context(page_meta);
        context.insert("post", &summarize(meta, anchors));
        context.insert("content", &content);

        self.templates.render("post.html", &context)
    }

    /// Tag index: every tag with the posts carrying it
    pub fn tags(&self, index: &TagIndex) -> Result<String> {
        let anchors = TagAnchors::new(index.keys());
        let sections: Vec<TagSection> = index
            .iter()
            .map(|(tag, posts)| TagSection {
                name: tag.clone(),
                anchor: anchors.get(tag),
                posts: posts.iter().map(|p| summarize(p, &anchors)).collect(),
            })
            .collect();

        let meta = PageMeta {
            title: format!("Tags - {}", self.config.author),
            description: None,
            canonical: full_url_for(&self.config, "/tags"),
            og: None,
        };
        let mut context = self.base_context(meta);
        context.insert("sections", &sections);

        self.templates.render("tags.html", &context)
    }

    /// The 404 page
    pub fn not_found(&self, path: &str) -> Result<String> {
        let meta = PageMeta {
            title: format!("Not found - {}", self.config.author),
            description: None,
            canonical: full_url_for(&self.config, path),
            og: None,
        };
        let mut context = self.base_context(meta);
        context.insert("path", path);

        self.templates.render("not_found.html", &context)
    }

    /// Open Graph image for a card
    pub fn og_image(&self, card: &OgCard) -> Result<String> {
        card.render(&self.templates, &self.config.og)
    }

    fn site_data(&self) -> SiteData {
        SiteData {
            title: self.config.title.clone(),
            author: self.config.author.clone(),
            description: self.config.description.clone(),
            language: self.config.language.clone(),
            url: self.config.url.trim_end_matches('/').to_string(),
            host: self.config.host().to_string(),
            year: current_year(),
            date_format: self.config.date_format.clone(),
            nav: self.config.nav.clone(),
        }
    }

    fn base_context(&self, meta: PageMeta) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site_data());
        context.insert("meta", &meta);
        context
    }
}

fn summarize(post: &PostMeta, anchors: &TagAnchors) -> PostSummary {
    PostSummary {
        slug: post.slug.clone(),
        title: post.title.clone(),
        date: iso_date(&post.date),
        path: post.path(),
        description: post.description.clone(),
        tags: post
            .tags
            .iter()
            .map(|t| TagLink {
                name: t.clone(),
                anchor: anchors.get(t),
            })
            .collect(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    Some(s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::content::build_tag_index;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.title = "Jane Doe".to_string();
        config.author = "Jane Doe".to_string();
        config.url = "https://jane.example.com".to_string();
        config.about.bio = vec!["Working at [Acme](https://acme.test).".to_string()];
        config.about.email = Some("jane@example.com".to_string());
        config.about.cv = Some("/cv.pdf".to_string());
        config.about.links = vec![
            LinkConfig::new("GitHub", "https://github.com/jane"),
            LinkConfig::new("LinkedIn", "https://linkedin.com/in/jane"),
        ];
        config
    }

    fn meta(slug: &str, title: &str, (y, m, d): (i32, u32, u32), tags: &[&str]) -> PostMeta {
        PostMeta {
            slug: slug.to_string(),
            title: title.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            description: None,
            extra: HashMap::new(),
            source: PathBuf::from(format!("posts/{slug}.md")),
        }
    }

    fn posts() -> Vec<PostMeta> {
        vec![
            meta("june", "June Post", (2024, 6, 1), &["rust", "Web Dev"]),
            meta("january", "January Post", (2024, 1, 1), &["rust"]),
        ]
    }

    fn renderer() -> PageRenderer {
        PageRenderer::new(&config()).unwrap()
    }

    #[test]
    fn test_home_page() {
        let html = renderer().home(&posts()).unwrap();

        assert!(html.contains("<title>Jane Doe</title>"));
        assert!(html.contains(r#"Working at <a href="https://acme.test">Acme</a>."#));
        assert!(html.contains(r#"<a href="mailto:jane@example.com">jane@example.com</a>"#));
        assert!(html.contains(r#"<a href="/cv.pdf""#));
        assert!(html.contains("<span>✦</span>"));

        // Newest first, numbered down from the total
        let june = html.find(r#"01.</span> <a href="/posts/june">June Post</a>"#);
        let january = html.find(r#"00.</span> <a href="/posts/january">January Post</a>"#);
        assert!(june.is_some() && january.is_some());
        assert!(june < january);
    }

    #[test]
    fn test_layout_chrome() {
        let html = renderer().home(&[]).unwrap();
        assert!(html.contains(r#"<a href="/">home</a>"#));
        assert!(html.contains(r#"<a href="/posts">posts</a>"#));
        assert!(html.contains(&format!("&copy; {} jane.example.com", current_year())));
        assert!(html.contains(r##"<a href="#top">[top]</a>"##));
    }

    #[test]
    fn test_post_list_page() {
        let html = renderer().post_list(&posts()).unwrap();

        assert!(html.contains("<title>Posts - Jane Doe</title>"));
        assert!(html.contains(r#"<a href="/tags">all tags</a>"#));
        assert!(html.contains("Jun 01, 2024"));
        assert!(html.contains(r#"<a href="/posts/june">June Post</a>"#));
        assert!(html.contains("#rust #Web Dev"));
        assert!(!html.contains("No posts yet."));
    }

    #[test]
    fn test_empty_post_list() {
        let html = renderer().post_list(&[]).unwrap();
        assert!(html.contains("No posts yet."));
    }

    #[test]
    fn test_post_page() {
        let mut m = meta("june", "June & Co", (2024, 6, 1), &["rust", "Web Dev"]);
        m.description = Some("Summer notes".to_string());
        let post = Post {
            meta: m,
            body: "## Intro\n\nHello *world*.\n".to_string(),
        };

        let html = renderer().post(&post, &TagAnchors::default()).unwrap();

        assert!(html.contains("<title>June &amp; Co ✦ Jane Doe</title>"));
        assert!(html.contains(r#"<h1 class="strong">June &amp; Co</h1>"#));
        assert!(html.contains(r#"<h2 id="intro">Intro</h2>"#));
        assert!(html.contains("<em>world</em>"));
        assert!(html.contains(r#"<meta property="og:type" content="article">"#));
        assert!(html.contains(
            r#"<meta property="article:published_time" content="2024-06-01T00:00:00Z">"#
        ));
        assert!(html.contains(
            r#"content="https://jane.example.com/api/og?title=June%20%26%20Co&amp;subtitle=Summer%20notes""#
        ));
        assert!(html.contains(r#"<meta property="og:image:width" content="1200">"#));
        assert!(html.contains(r#"<meta property="og:image:height" content="630">"#));
        assert!(html.contains(r#"<a href="/tags#rust">rust</a>, <a href="/tags#web-dev">Web Dev</a>"#));
    }

    #[test]
    fn test_post_page_static_og_links() {
        let post = Post {
            meta: meta("june", "June", (2024, 6, 1), &[]),
            body: String::new(),
        };
        let html = renderer()
            .with_og_links(OgLinks::Static)
            .post(&post, &TagAnchors::default())
            .unwrap();

        assert!(html.contains(r#"content="https://jane.example.com/og/june.svg""#));
        assert!(!html.contains("Tags:"));
    }

    #[test]
    fn test_tags_page() {
        let index = build_tag_index(&posts());
        let html = renderer().tags(&index).unwrap();

        assert!(html.contains(r##"<a href="#rust">rust</a>, <a href="#web-dev">Web Dev</a>"##));
        assert!(html.contains(r#"<section id="rust">"#));
        assert!(html.contains(r#"<section id="web-dev">"#));
        let rust_section = &html[html.find(r#"<section id="rust">"#).unwrap()..];
        let rust_section = &rust_section[..rust_section.find("</section>").unwrap()];
        assert!(rust_section.contains("/posts/june"));
        assert!(rust_section.contains("/posts/january"));
    }

    #[test]
    fn test_colliding_tag_anchors() {
        let posts = vec![
            meta("a", "A", (2024, 6, 1), &["Web Dev"]),
            meta("b", "B", (2024, 5, 1), &["web-dev"]),
        ];
        let html = renderer().tags(&build_tag_index(&posts)).unwrap();

        assert_eq!(html.matches(r#"<section id="web-dev">"#).count(), 1);
        assert_eq!(html.matches(r#"<section id="web-dev-1">"#).count(), 1);
        assert!(html.contains(r##"<a href="#web-dev">Web Dev</a>, <a href="#web-dev-1">web-dev</a>"##));

        // Post pages link to the same sections
        let anchors = TagAnchors::new(collect_tags(&posts));
        let post = Post {
            meta: posts[1].clone(),
            body: String::new(),
        };
        let page = renderer().post(&post, &anchors).unwrap();
        assert!(page.contains(r#"<a href="/tags#web-dev-1">web-dev</a>"#));
    }

    #[test]
    fn test_empty_tags_page() {
        let html = renderer().tags(&TagIndex::new()).unwrap();
        assert!(html.contains("No tags yet."));
    }

    #[test]
    fn test_not_found_page() {
        let html = renderer().not_found("/posts/<missing>").unwrap();
        assert!(html.contains("<h1>404</h1>"));
        assert!(html.contains("<code>/posts/&lt;missing&gt;</code>"));
    }

    #[test]
    fn test_og_image() {
        let svg = renderer().og_image(&OgCard::new("Hello", None)).unwrap();
        assert!(svg.contains(r#"width="1200" height="630""#));
        assert!(svg.contains(r#"fill="white""#));
    }
}
