//! HTML → Markdown via `html2md`.
//!
//! The conversion keeps link targets as literal URLs, keeps internal
//! `#anchor` links, leaves Unicode unescaped and never hard-wraps lines.
//! `<head>`, `<script>`, `<style>`, `<noscript>` and comments are removed
//! first; `html2md` would otherwise emit their text into the body.

use super::{read_lossy, ParseOutput, Parser};
use crate::error::ConvertError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

static RE_NON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<head\b[^>]*>.*?</head\s*>|<title\b[^>]*>.*?</title\s*>|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>",
    )
    .unwrap()
});

/// Drop elements whose text is never document content.
fn strip_non_content(html: &str) -> String {
    RE_NON_CONTENT.replace_all(html, "").into_owned()
}

/// Placeholder for markup with no extractable text.
pub const EMPTY_HTML: &str = "*No content extracted from HTML.*";

pub struct HtmlParser;

impl Parser for HtmlParser {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let raw = read_lossy(path)?;
        let markdown = html2md::parse_html(&strip_non_content(&raw));
        let markdown = markdown.trim();
        if markdown.is_empty() {
            debug!("No text extracted from {}", path.display());
            return Ok(ParseOutput::new(EMPTY_HTML));
        }
        Ok(ParseOutput::new(markdown))
    }

    fn file_type_label(&self) -> &'static str {
        "HTML"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_support::write_file;

    #[test]
    fn simple_page() {
        let html = "<html><body><h1>Hello</h1><p>World</p></body></html>";
        let (_dir, path) = write_file("page.html", html);
        let out = HtmlParser.parse(&path).unwrap();
        assert!(out.markdown.contains("Hello"));
        assert!(out.markdown.contains("World"));
    }

    #[test]
    fn links_keep_their_urls() {
        let html = r##"<p><a href="https://example.org/docs">Docs</a> and <a href="#usage">usage</a></p>"##;
        let (_dir, path) = write_file("links.html", html);
        let out = HtmlParser.parse(&path).unwrap();
        assert!(out.markdown.contains("https://example.org/docs"));
        assert!(out.markdown.contains("#usage"));
    }

    #[test]
    fn unicode_is_not_escaped() {
        let (_dir, path) = write_file("u.htm", "<p>Café — naïve</p>");
        let out = HtmlParser.parse(&path).unwrap();
        assert!(out.markdown.contains("Café — naïve"));
    }

    #[test]
    fn long_paragraph_is_not_wrapped() {
        let words = vec!["word"; 60].join(" ");
        let (_dir, path) = write_file("long.html", format!("<p>{words}</p>"));
        let out = HtmlParser.parse(&path).unwrap();
        assert_eq!(out.markdown.lines().count(), 1);
    }

    #[test]
    fn empty_body_is_placeholder() {
        let (_dir, path) = write_file("empty.html", "<html><body></body></html>");
        let out = HtmlParser.parse(&path).unwrap();
        assert_eq!(out.markdown, EMPTY_HTML);
    }

    #[test]
    fn empty_file_is_placeholder() {
        let (_dir, path) = write_file("zero.html", "");
        let out = HtmlParser.parse(&path).unwrap();
        assert_eq!(out.markdown, EMPTY_HTML);
    }

    #[test]
    fn head_script_and_style_are_dropped() {
        let html = "<html><head><title>T</title><style>body{color:red}</style></head>\
                    <body><script type=\"text/javascript\">var secret=1;</script>\
                    <p>Hi there</p><STYLE>.x{}</STYLE><!-- note --></body></html>";
        let (_dir, path) = write_file("page.html", html);
        let out = HtmlParser.parse(&path).unwrap();
        assert!(!out.markdown.contains("color:red"), "{}", out.markdown);
        assert!(!out.markdown.contains("secret"), "{}", out.markdown);
        assert!(!out.markdown.contains(".x{}"), "{}", out.markdown);
        assert!(!out.markdown.contains("note"), "{}", out.markdown);
        assert!(out.markdown.starts_with("Hi there"), "{}", out.markdown);
    }

    #[test]
    fn header_element_is_not_head() {
        assert_eq!(
            strip_non_content("<header><p>Top</p></header><head>x</head>"),
            "<header><p>Top</p></header>"
        );
    }
}
