//! Markdown to HTML conversion.

use std::fmt;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use pulldown_cmark_escape::{escape_href, escape_html};

/// Renders markup source bytes into an HTML fragment.
///
/// Implementations must be pure: the same input always yields the same
/// output and the input is never modified.
pub trait Converter: Send + Sync {
    /// Render `source` to HTML bytes.
    fn render(&self, source: &[u8]) -> Vec<u8>;
}

/// CommonMark converter backed by `pulldown-cmark`.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    options: Options,
    external_links_blank: bool,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter {
    /// Create a converter with tables, footnotes, strikethrough and smart
    /// punctuation enabled.
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_SMART_PUNCTUATION,
            external_links_blank: true,
        }
    }

    /// Whether absolute links are emitted with `target="_blank"`.
    pub fn external_links_blank(mut self, enabled: bool) -> Self {
        self.external_links_blank = enabled;
        self
    }

    /// Render markdown text to an HTML string.
    pub fn render_str(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options);
        let blank = self.external_links_blank;

        let events = parser.map(move |event| match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) if blank && is_absolute(&dest_url) => match open_blank_link(&dest_url, &title) {
                Ok(tag) => Event::InlineHtml(tag),
                Err(_) => Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }),
            },
            other => other,
        });

        let mut html_output = String::new();
        html::push_html(&mut html_output, events);

        html_output
    }
}

impl Converter for MarkdownConverter {
    fn render(&self, source: &[u8]) -> Vec<u8> {
        self.render_str(&String::from_utf8_lossy(source)).into_bytes()
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Opening `<a>` tag for a link that should open in a new browsing context,
/// escaped the same way the HTML writer escapes a plain link. The matching
/// `</a>` is still emitted by the HTML writer.
fn open_blank_link(dest: &str, title: &str) -> Result<CowStr<'static>, fmt::Error> {
    let mut tag = String::from("<a href=\"");
    escape_href(&mut tag, dest)?;
    if !title.is_empty() {
        tag.push_str("\" title=\"");
        escape_html(&mut tag, title)?;
    }
    tag.push_str("\" target=\"_blank\">");
    Ok(CowStr::from(tag))
}
