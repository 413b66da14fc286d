//! Open Graph image generation
//!
//! Every card is a fixed 1200x630 SVG: a title and an optional subtitle,
//! centered and word-wrapped inside the horizontal padding.

use anyhow::Result;
use tera::Context;

use crate::config::OgConfig;
use crate::templates::{OgImageData, TemplateRenderer, TextLine};

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

/// Longer titles are cut before layout
pub const MAX_TITLE_CHARS: usize = 100;

const PADDING_X: u32 = 200;
const TITLE_SIZE: u32 = 40;
const SUBTITLE_SIZE: u32 = 24;
const TITLE_LINE_HEIGHT: u32 = 48;
const SUBTITLE_LINE_HEIGHT: u32 = 30;
const SUBTITLE_GAP: u32 = 16;
const MAX_SUBTITLE_LINES: usize = 4;

/// Average glyph advance as a fraction of the font size
const TITLE_ADVANCE: f32 = 0.6;
const SUBTITLE_ADVANCE: f32 = 0.55;

const PLACEHOLDER_TITLE: &str = "Open Graph image";
const PLACEHOLDER_SUBTITLE: &str = "Usage: /api/og?title=<title>&subtitle=<subtitle>";

/// The text content of one image
#[derive(Debug, Clone, PartialEq)]
pub struct OgCard {
    title: String,
    subtitle: Option<String>,
}

impl OgCard {
    pub fn new(title: &str, subtitle: Option<&str>) -> Self {
        let title: String = title.trim().chars().take(MAX_TITLE_CHARS).collect();
        let subtitle = subtitle
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { title, subtitle }
    }

    /// The card shown when no title was supplied
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_TITLE, Some(PLACEHOLDER_SUBTITLE))
    }

    /// Build a card from raw query parameters
    pub fn from_query(title: Option<&str>, subtitle: Option<&str>) -> Self {
        match title.filter(|t| !t.trim().is_empty()) {
            Some(title) => Self::new(title, subtitle),
            None => Self::placeholder(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    /// Position every line of text on the canvas
    pub fn layout(&self, style: &OgConfig) -> OgImageData {
        let title_lines = wrap(&self.title, chars_per_line(TITLE_SIZE, TITLE_ADVANCE));
        let subtitle_lines = self
            .subtitle
            .as_deref()
            .map(|s| {
                let mut lines = wrap(s, chars_per_line(SUBTITLE_SIZE, SUBTITLE_ADVANCE));
                if lines.len() > MAX_SUBTITLE_LINES {
                    lines.truncate(MAX_SUBTITLE_LINES);
                    if let Some(last) = lines.last_mut() {
                        last.push('…');
                    }
                }
                lines
            })
            .unwrap_or_default();

        let title_height = title_lines.len() as u32 * TITLE_LINE_HEIGHT;
        let subtitle_height = if subtitle_lines.is_empty() {
            0
        } else {
            SUBTITLE_GAP + subtitle_lines.len() as u32 * SUBTITLE_LINE_HEIGHT
        };
        let top = HEIGHT.saturating_sub(title_height + subtitle_height) / 2;

        let title_lines: Vec<TextLine> = title_lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextLine {
                text,
                y: top + i as u32 * TITLE_LINE_HEIGHT + TITLE_SIZE,
            })
            .collect();

        let subtitle_top = top + title_height + SUBTITLE_GAP;
        let subtitle_lines: Vec<TextLine> = subtitle_lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextLine {
                text,
                y: subtitle_top + i as u32 * SUBTITLE_LINE_HEIGHT + SUBTITLE_SIZE,
            })
            .collect();

        OgImageData {
            width: WIDTH,
            height: HEIGHT,
            center_x: WIDTH / 2,
            title_size: TITLE_SIZE,
            subtitle_size: SUBTITLE_SIZE,
            title_lines,
            subtitle_lines,
            style: style.clone(),
        }
    }

    /// Render the card as an SVG document
    pub fn render(&self, templates: &TemplateRenderer, style: &OgConfig) -> Result<String> {
        let context = Context::from_serialize(self.layout(style))?;
        templates.render("og.svg", &context)
    }
}

fn chars_per_line(font_size: u32, advance: f32) -> usize {
    let usable = (WIDTH - 2 * PADDING_X) as f32;
    (usable / (font_size as f32 * advance)).floor().max(1.0) as usize
}

/// Greedy word wrap; words longer than a line are split
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 {
            word.len()
        } else {
            current_len + 1 + word.len()
        };
        if needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(card: &OgCard) -> String {
        let templates = TemplateRenderer::new().unwrap();
        card.render(&templates, &OgConfig::default()).unwrap()
    }

    #[test]
    fn test_hello_renders_fixed_size_image() {
        let svg = render(&OgCard::from_query(Some("Hello"), None));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="1200" height="630""#));
        assert!(svg.contains(r#"viewBox="0 0 1200 630""#));
        assert!(svg.contains(">Hello</text>"));
        assert!(!svg.contains(r#"font-size="24""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_subtitle_rendered() {
        let svg = render(&OgCard::new("Hello", Some("A subtitle")));
        assert!(svg.contains(">A subtitle</text>"));
        assert!(svg.contains(r#"font-size="24""#));
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = render(&OgCard::new("<script>&", Some("\"quoted\"")));
        assert!(svg.contains("&lt;script&gt;&amp;"));
        assert!(svg.contains("&quot;quoted&quot;"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn test_missing_title_yields_placeholder() {
        assert_eq!(OgCard::from_query(None, Some("ignored")), OgCard::placeholder());
        assert_eq!(OgCard::from_query(Some("   "), None), OgCard::placeholder());

        let svg = render(&OgCard::from_query(None, None));
        assert!(svg.contains("Usage: /api/og?title="));
        assert!(svg.contains(r#"width="1200" height="630""#));
    }

    #[test]
    fn test_title_truncated() {
        let long = "x".repeat(250);
        let card = OgCard::new(&long, None);
        assert_eq!(card.title().chars().count(), MAX_TITLE_CHARS);

        let multibyte = "é".repeat(150);
        assert_eq!(
            OgCard::new(&multibyte, None).title().chars().count(),
            MAX_TITLE_CHARS
        );
    }

    #[test]
    fn test_blank_subtitle_dropped() {
        assert_eq!(OgCard::new("T", Some("  ")).subtitle(), None);
    }

    #[test]
    fn test_layout_stays_on_canvas() {
        let card = OgCard::new(&"word ".repeat(40), Some(&"longer subtitle text ".repeat(30)));
        let data = card.layout(&OgConfig::default());

        assert!(data.title_lines.len() > 1);
        assert_eq!(data.subtitle_lines.len(), MAX_SUBTITLE_LINES);
        assert!(data.subtitle_lines.last().unwrap().text.ends_with('…'));

        let last = data.subtitle_lines.last().unwrap();
        assert!(last.y < HEIGHT);
        assert!(data.title_lines[0].y > 0);
        for pair in data.title_lines.windows(2) {
            assert!(pair[0].y < pair[1].y);
        }
        assert!(data.title_lines.last().unwrap().y < data.subtitle_lines[0].y);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("hi abcdefghij", 4), vec!["hi", "abcd", "efgh", "ij"]);
        assert!(wrap("   ", 10).is_empty());

        for line in wrap(&"lorem ipsum dolor sit amet ".repeat(10), 33) {
            assert!(line.chars().count() <= 33);
        }
    }
}
