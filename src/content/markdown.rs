//! Markdown rendering with syntax highlighting

use anyhow::Result;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use std::collections::HashMap;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::templates::escape_markup;

/// Default highlighting theme, a light one
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

/// A fenced or indented code block being collected
struct CodeBlock {
    lang: Option<String>,
    source: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(DEFAULT_THEME, false)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        // Front-matter is stripped before we get here, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<CodeBlock> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        // The language lands in a class attribute
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|l| {
                                l.chars()
                                    .filter(|c| c.is_alphanumeric() || "+-_#.".contains(*c))
                                    .collect::<String>()
                            })
                            .filter(|l| !l.is_empty()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some(CodeBlock {
                        lang,
                        source: String::new(),
                    });
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code_block.take() {
                        let highlighted = self.highlight_code(&block.source, block.lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                event => match code_block.as_mut() {
                    Some(block) => {
                        if let Event::Text(text) = event {
                            block.source.push_str(&text);
                        }
                    }
                    None => events.push(event),
                },
            }
        }

        let headings = assign_heading_ids(&mut events);
        insert_table_of_contents(&mut events, &headings);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Render a short snippet without the wrapping paragraph
    pub fn render_inline(&self, markdown: &str) -> Result<String> {
        let html = self.render(markdown)?;
        let trimmed = html.trim_end();
        let inner = trimmed
            .strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
            .filter(|s| !s.contains("<p>"));
        Ok(inner.unwrap_or(trimmed).to_string())
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        // Try to find syntax for the language
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self.theme() else {
            return plain_code_block(code, lang);
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let highlighted = highlighter
                .highlight_line(line, &self.syntax_set)
                .and_then(|ranges| styled_line_to_highlighted_html(&ranges, IncludeBackground::No));
            match highlighted {
                Ok(html) => lines.push(html),
                Err(e) => {
                    tracing::debug!("Highlighting {} failed: {}", lang, e);
                    return plain_code_block(code, lang);
                }
            }
        }

        let background = theme
            .settings
            .background
            .map(|c| format!("background-color:#{:02x}{:02x}{:02x};", c.r, c.g, c.b))
            .unwrap_or_default();

        if self.line_numbers {
            self.add_line_numbers(&lines, lang, &background)
        } else {
            format!(
                r#"<figure class="highlight {}"><pre style="{}"><code class="language-{}">{}</code></pre></figure>"#,
                lang,
                background,
                lang,
                lines.concat()
            )
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, lines: &[String], lang: &str, background: &str) -> String {
        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");
        let code = lines.concat();

        format!(
            r#"<figure class="highlight {}"><table style="{}"><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            lang,
            background,
            gutter,
            code.trim_end_matches('\n')
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A heading of the rendered document
struct Heading {
    /// Index of its `Start` event
    start: usize,
    /// Index of its `End` event
    end: usize,
    level: HeadingLevel,
    id: String,
    text: String,
}

/// Give every heading without an explicit id a slug id, unique per document
fn assign_heading_ids(events: &mut [Event<'_>]) -> Vec<Heading> {
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut headings = Vec::new();
    let mut i = 0;

    while i < events.len() {
        if let Event::Start(Tag::Heading { level, id, .. }) = &events[i] {
            let level = *level;
            let explicit = id.as_ref().map(|id| id.to_string());

            let mut text = String::new();
            let mut j = i + 1;
            while j < events.len() && !matches!(events[j], Event::End(TagEnd::Heading(_))) {
                if let Event::Text(t) | Event::Code(t) = &events[j] {
                    text.push_str(t);
                }
                j += 1;
            }

            let id = match explicit {
                Some(id) => id,
                None => {
                    let id = unique_id(&mut used, slug::slugify(&text));
                    if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                        *slot = Some(CowStr::from(id.clone()));
                    }
                    id
                }
            };

            headings.push(Heading {
                start: i,
                end: j,
                level,
                id,
                text,
            });
            i = j;
        }
        i += 1;
    }

    headings
}

/// Fill a "Table of contents" (or "Contents", "TOC") section with links to
/// the headings that follow it. Whatever the section held before is replaced.
fn insert_table_of_contents(events: &mut Vec<Event<'_>>, headings: &[Heading]) {
    let Some(pos) = headings.iter().position(|h| is_toc_heading(&h.text)) else {
        return;
    };
    let entries = &headings[pos + 1..];
    let Some(base) = entries.iter().map(|h| h.level as usize).min() else {
        return;
    };

    let mut html = String::new();
    let mut depth = 0;
    for heading in entries {
        let target = heading.level as usize - base + 1;
        if target > depth {
            while depth < target {
                html.push_str("<ul>\n<li>");
                depth += 1;
            }
        } else {
            while depth > target {
                html.push_str("</li>\n</ul>\n");
                depth -= 1;
            }
            html.push_str("</li>\n<li>");
        }
        html.push_str(&format!(
            r##"<a href="#{}">{}</a>"##,
            escape_markup(&heading.id),
            escape_markup(&heading.text)
        ));
    }
    while depth > 0 {
        html.push_str("</li>\n</ul>\n");
        depth -= 1;
    }

    let section = headings[pos].end + 1..entries[0].start;
    events.splice(section, [Event::Html(CowStr::from(html))]);
}

fn is_toc_heading(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    let rest = text
        .strip_prefix("table")
        .and_then(|t| t.strip_prefix([' ', '-']))
        .and_then(|t| t.strip_prefix("of"))
        .and_then(|t| t.strip_prefix([' ', '-']))
        .unwrap_or(text.as_str());
    text == "toc" || rest == "contents" || rest == "content"
}

fn unique_id(used: &mut HashMap<String, usize>, base: String) -> String {
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };
    let seen = used.entry(base.clone()).or_insert(0);
    let id = if *seen == 0 {
        base
    } else {
        format!("{}-{}", base, seen)
    };
    *seen += 1;
    id
}

fn plain_code_block(code: &str, lang: &str) -> String {
    format!(
        r#"<pre><code class="language-{}">{}</code></pre>"#,
        lang,
        escape_markup(code)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains(r#"<figure class="highlight rust">"#));
        assert!(html.contains("main"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_code_block_line_numbers() {
        let renderer = MarkdownRenderer::with_options(DEFAULT_THEME, true);
        let html = renderer.render("```\nfirst\nsecond\n```").unwrap();
        assert!(html.contains(r#"<span class="line-number">1</span>"#));
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
        assert!(!html.contains(r#"<span class="line-number">3</span>"#));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_text() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```nosuchlang\na < b\n```").unwrap();
        assert!(html.contains("highlight nosuchlang"));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let renderer = MarkdownRenderer::with_options("no-such-theme", false);
        let html = renderer.render("```rust\nlet x = 1;\n```").unwrap();
        assert!(html.contains("highlight rust"));
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("## Setup\n\ntext\n\n## Setup\n\n## `code` Heading\n")
            .unwrap();
        assert!(html.contains(r#"<h2 id="setup">Setup</h2>"#));
        assert!(html.contains(r#"<h2 id="setup-1">Setup</h2>"#));
        assert!(html.contains(r#"id="code-heading""#));
    }

    #[test]
    fn test_explicit_heading_id_kept() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Intro {#start}\n").unwrap();
        assert!(html.contains(r#"<h2 id="start">Intro</h2>"#));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("<div class=\"note\">raw</div>\n\nafter")
            .unwrap();
        assert!(html.contains(r#"<div class="note">raw</div>"#));
    }

    #[test]
    fn test_gfm_table() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn test_render_inline() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render_inline("Working at [Acme](https://acme.test)")
            .unwrap();
        assert_eq!(html, r#"Working at <a href="https://acme.test">Acme</a>"#);
    }

    #[test]
    fn test_plain_code_block_is_escaped() {
        assert_eq!(
            plain_code_block("<a & 'b'>", "text"),
            r#"<pre><code class="language-text">&lt;a &amp; &#39;b&#39;&gt;</code></pre>"#
        );
    }

    #[test]
    fn test_table_of_contents() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("Intro\n\n## Table of contents\n\nold list\n\n## Setup\n\n### Install & run\n\n## Usage\n")
            .unwrap();

        assert!(html.contains(r#"<h2 id="table-of-contents">Table of contents</h2>"#));
        assert!(!html.contains("old list"));
        assert!(html.contains(
            "<ul>\n<li><a href=\"#setup\">Setup</a><ul>\n<li><a href=\"#install-run\">Install &amp; run</a></li>\n</ul>\n</li>\n<li><a href=\"#usage\">Usage</a></li>\n</ul>\n"
        ));
        // Headings before the table are not listed
        assert!(!html.contains(r##"href="#table-of-contents""##));
    }

    #[test]
    fn test_toc_heading_names() {
        for name in ["Table of Contents", "table-of-contents", "Contents", "TOC"] {
            assert!(is_toc_heading(name), "{name}");
        }
        assert!(!is_toc_heading("Setup"));
        assert!(!is_toc_heading("Table of figures"));
    }

    #[test]
    fn test_no_table_without_heading() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Setup\n\n## Usage\n").unwrap();
        assert!(!html.contains("<ul>"));
    }
}
