//! Markdown files pass through verbatim; only the header is added.

use super::{read_lossy, ParseOutput, Parser, EMPTY_FILE};
use crate::error::ConvertError;
use std::path::Path;

pub struct MarkdownPassthrough;

impl Parser for MarkdownPassthrough {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let text = read_lossy(path)?;
        let text = text.trim_end();
        if text.is_empty() {
            Ok(ParseOutput::new(EMPTY_FILE))
        } else {
            Ok(ParseOutput::new(text))
        }
    }

    fn file_type_label(&self) -> &'static str {
        "Markdown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::test_support::write_file;

    #[test]
    fn content_is_preserved() {
        let original = "# Title\n\nSome content\n\n    indented code\n";
        let (_dir, path) = write_file("doc.md", original);
        let out = MarkdownPassthrough.parse(&path).unwrap();
        assert_eq!(out.markdown, "# Title\n\nSome content\n\n    indented code");
        assert!(out.extras.is_empty());
    }

    #[test]
    fn whitespace_only_is_placeholder() {
        let (_dir, path) = write_file("blank.markdown", "  \n\n\t\n");
        let out = MarkdownPassthrough.parse(&path).unwrap();
        assert_eq!(out.markdown, EMPTY_FILE);
    }
}
