//! Format parsers and the registry that dispatches to them.
//!
//! Each variant implements [`Parser`]: read one file, return a Markdown body
//! (no header) plus any format-specific metadata fields. Header assembly is
//! the shared default [`Parser::add_metadata`]; variants only supply their
//! label and extras.
//!
//! | Key | Parser | Label |
//! |-----|--------|-------|
//! | `pdf` | [`PdfParser`] | PDF |
//! | `docx` | [`DocxParser`] | DOCX |
//! | `html` | [`HtmlParser`] | HTML |
//! | `csv` | [`CsvParser`] | CSV |
//! | `json` | [`JsonParser`] | JSON |
//! | `code` | [`CodeParser`] | Code |
//! | `text` | [`TextParser`] | Plain Text |
//! | `markdown` | [`MarkdownPassthrough`] | Markdown |

mod code;
mod delimited;
mod docx;
mod html;
mod json;
mod passthrough;
mod pdf;
mod text;

pub use code::CodeParser;
pub use delimited::CsvParser;
pub use docx::DocxParser;
pub use html::HtmlParser;
pub use json::JsonParser;
pub use passthrough::MarkdownPassthrough;
pub use pdf::PdfParser;
pub use text::TextParser;

use crate::config::ConverterConfig;
use crate::detect::ParserKey;
use crate::error::ConvertError;
use crate::metadata;
use std::collections::HashMap;
use std::path::Path;

/// Placeholder returned for an input with no content.
pub const EMPTY_FILE: &str = "*Empty file.*";

/// Body produced by [`Parser::parse`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    /// Markdown body without the metadata header.
    pub markdown: String,
    /// Format-specific header fields (e.g. `Pages`, `Language`), in order.
    pub extras: Vec<(String, String)>,
}

impl ParseOutput {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            extras: Vec::new(),
        }
    }

    /// Append a header field.
    pub fn with_extra(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.extras.push((label.into(), value.to_string()));
        self
    }
}

impl From<String> for ParseOutput {
    fn from(markdown: String) -> Self {
        Self::new(markdown)
    }
}

/// Core trait that all format parsers implement.
pub trait Parser: Send + Sync {
    /// Read `path` and return its Markdown body.
    ///
    /// Empty or content-less input must yield a placeholder sentinel, never
    /// an error.
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError>;

    /// Fixed human-readable format label, e.g. `"CSV"`.
    fn file_type_label(&self) -> &'static str;

    /// Prepend the metadata header to `body`.
    fn add_metadata(&self, body: &str, path: &Path, extras: &[(String, String)]) -> String {
        metadata::add_metadata(body, path, self.file_type_label(), extras)
    }
}

/// Read-only mapping from [`ParserKey`] to its parser.
///
/// Built once per [`crate::convert::Converter`]; parsers hold no mutable
/// state, so one registry is shared by every conversion.
pub struct ParserRegistry {
    map: HashMap<ParserKey, Box<dyn Parser>>,
}

impl ParserRegistry {
    /// Registry with every built-in parser, configured from `config`.
    pub fn new(config: &ConverterConfig) -> Self {
        let mut registry = Self {
            map: HashMap::with_capacity(ParserKey::ALL.len()),
        };
        registry.register(ParserKey::Pdf, PdfParser);
        registry.register(ParserKey::Docx, DocxParser);
        registry.register(ParserKey::Html, HtmlParser);
        registry.register(ParserKey::Csv, CsvParser::new(config));
        registry.register(ParserKey::Json, JsonParser::new(config));
        registry.register(ParserKey::Code, CodeParser);
        registry.register(ParserKey::Text, TextParser::new(config));
        registry.register(ParserKey::Markdown, MarkdownPassthrough);
        registry
    }

    /// Register (or replace) the parser for `key`.
    pub fn register(&mut self, key: ParserKey, parser: impl Parser + 'static) {
        self.map.insert(key, Box::new(parser));
    }

    /// The parser registered for `key`.
    pub fn get(&self, key: ParserKey) -> Option<&dyn Parser> {
        self.map.get(&key).map(|p| &**p)
    }

    /// Number of registered parsers.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(&ConverterConfig::default())
    }
}

// ── Shared read helpers ──────────────────────────────────────────────────────

/// Read the whole file, mapping I/O errors to [`ConvertError::ParseFailure`].
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, ConvertError> {
    std::fs::read(path).map_err(|e| ConvertError::parse_failure(path, e))
}

/// Read the file as UTF-8, replacing invalid sequences with U+FFFD.
///
/// A leading UTF-8 byte-order mark is dropped.
pub(crate) fn read_lossy(path: &Path) -> Result<String, ConvertError> {
    let bytes = read_bytes(path)?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
