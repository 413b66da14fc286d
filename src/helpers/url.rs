//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::{HashMap, HashSet};

use crate::config::SiteConfig;

/// Characters escaped inside a query value
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/posts/hello") // -> "https://example.com/posts/hello"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Encode a single query value
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Site-relative URL of the dynamic OG image endpoint for a title/subtitle
pub fn og_image_path(title: &str, subtitle: Option<&str>) -> String {
    let mut path = format!("/api/og?title={}", encode_query_value(title));
    if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
        path.push_str("&subtitle=");
        path.push_str(&encode_query_value(subtitle));
    }
    path
}

/// Site-relative URL of a post's pre-rendered OG image in a static export
pub fn static_og_image_path(slug: &str) -> String {
    format!("/og/{}.svg", encode_query_value(slug))
}

/// Fragment id of a tag section on the tag index page
pub fn tag_anchor(tag: &str) -> String {
    let anchor = slug::slugify(tag);
    if anchor.is_empty() {
        encode_query_value(tag)
    } else {
        anchor
    }
}

/// Fragment ids for every tag of the site.
///
/// Distinct tags can slugify to the same anchor (`Web Dev`, `web-dev`), so
/// later tags in index order get a numeric suffix. Build it from the full tag
/// list so every page links to the same section.
#[derive(Debug, Clone, Default)]
pub struct TagAnchors {
    anchors: HashMap<String, String>,
}

impl TagAnchors {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut anchors = HashMap::new();
        let mut used = HashSet::new();

        for tag in tags {
            let tag = tag.as_ref();
            if anchors.contains_key(tag) {
                continue;
            }
            let base = tag_anchor(tag);
            let mut anchor = base.clone();
            let mut n = 1;
            while used.contains(&anchor) {
                anchor = format!("{}-{}", base, n);
                n += 1;
            }
            used.insert(anchor.clone());
            anchors.insert(tag.to_string(), anchor);
        }

        Self { anchors }
    }

    /// Anchor of `tag`; tags outside the list fall back to their plain anchor
    pub fn get(&self, tag: &str) -> String {
        self.anchors
            .get(tag)
            .cloned()
            .unwrap_or_else(|| tag_anchor(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_for() {
        let mut config = SiteConfig::default();
        config.url = "https://example.com/".to_string();
        assert_eq!(
            full_url_for(&config, "/posts/hello"),
            "https://example.com/posts/hello"
        );
        assert_eq!(full_url_for(&config, "atom.xml"), "https://example.com/atom.xml");
    }

    #[test]
    fn test_og_image_path() {
        assert_eq!(og_image_path("Hello", None), "/api/og?title=Hello");
        assert_eq!(og_image_path("Hello", Some("")), "/api/og?title=Hello");
        assert_eq!(
            og_image_path("Rust & Me", Some("a/b?c")),
            "/api/og?title=Rust%20%26%20Me&subtitle=a%2Fb%3Fc"
        );
    }

    #[test]
    fn test_static_og_image_path() {
        assert_eq!(static_og_image_path("my-post"), "/og/my-post.svg");
    }

    #[test]
    fn test_tag_anchor() {
        assert_eq!(tag_anchor("Web Dev"), "web-dev");
        assert_eq!(tag_anchor("rust"), "rust");
        assert_eq!(tag_anchor("+++"), "%2B%2B%2B");
    }

    #[test]
    fn test_tag_anchors_are_unique() {
        let anchors = TagAnchors::new(["Web Dev", "web-dev", "web-dev-1", "rust", "Web Dev"]);
        assert_eq!(anchors.get("Web Dev"), "web-dev");
        assert_eq!(anchors.get("web-dev"), "web-dev-1");
        assert_eq!(anchors.get("web-dev-1"), "web-dev-1-1");
        assert_eq!(anchors.get("rust"), "rust");
        assert_eq!(anchors.get("unlisted tag"), "unlisted-tag");
    }
}
