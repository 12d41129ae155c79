//! Word (`.docx`) → Markdown.
//!
//! Walks `word/document.xml` in document order. Paragraph styles are
//! resolved to their display names through `word/styles.xml` when present,
//! then mapped to headings or list markers. Top-level tables become pipe
//! tables with the first row as header; tables nested inside a cell are
//! flattened into that cell's text. Text-box paragraphs follow the
//! paragraph that anchors them, and `mc:Fallback` copies are skipped.

use super::{ParseOutput, Parser};
use crate::error::ConvertError;
use crate::markdown::{heading, make_table};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

pub const EMPTY_DOCUMENT: &str = "*Empty document.*";

pub struct DocxParser;

impl Parser for DocxParser {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let file = File::open(path).map_err(|e| ConvertError::parse_failure(path, e))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| ConvertError::parse_failure(path, e))?;

        let document = read_entry(&mut archive, "word/document.xml")
            .map_err(|e| ConvertError::parse_failure(path, e))?
            .ok_or_else(|| ConvertError::parse_failure(path, "missing word/document.xml"))?;

        let styles = match read_entry(&mut archive, "word/styles.xml") {
            Ok(Some(xml)) => parse_style_names(&xml).unwrap_or_else(|e| {
                debug!("Ignoring unreadable styles.xml in {}: {e}", path.display());
                HashMap::new()
            }),
            Ok(None) => HashMap::new(),
            Err(e) => return Err(ConvertError::parse_failure(path, e)),
        };

        let blocks = parse_document(&document, &styles)
            .map_err(|e| ConvertError::parse_failure(path, e))?;
        if blocks.is_empty() {
            return Ok(ParseOutput::new(EMPTY_DOCUMENT));
        }
        Ok(ParseOutput::new(blocks.join("\n\n")))
    }

    fn file_type_label(&self) -> &'static str {
        "DOCX"
    }
}

/// Contents of `name`, or `None` when the archive has no such entry.
fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>, ZipError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

// ── XML helpers ──────────────────────────────────────────────────────────────

fn attr_value(reader: &Reader<&[u8]>, element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.decode_and_unescape_value(reader).ok())
        .map(|v| v.into_owned())
}

/// Style id → display name, from `word/styles.xml`.
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut names = HashMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"style" => current = attr_value(&reader, e, b"styleId"),
                b"name" => {
                    if let (Some(id), Some(name)) = (&current, attr_value(&reader, e, b"val")) {
                        names.insert(id.clone(), name);
                    }
                }
                _ => {}
            },
            Event::End(ref e) if e.local_name().as_ref() == b"style" => current = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

// ── Style mapping ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphKind {
    Heading(usize),
    Bullet,
    Numbered,
    Plain,
}

/// Map a style name (or id) to its Markdown rendering.
///
/// Matching ignores case and whitespace, so `Heading 2` and `heading2` agree.
fn classify_style(style: &str) -> ParagraphKind {
    let key: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    if key == "title" {
        return ParagraphKind::Heading(1);
    }
    if let Some(level) = key
        .strip_prefix("heading")
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| (1..=6).contains(n))
    {
        return ParagraphKind::Heading(level);
    }
    if key.starts_with("listbullet") {
        ParagraphKind::Bullet
    } else if key.starts_with("listnumber") {
        ParagraphKind::Numbered
    } else {
        ParagraphKind::Plain
    }
}

fn render_paragraph(text: &str, style: Option<&str>, styles: &HashMap<String, String>) -> String {
    let kind = style
        .map(|id| classify_style(styles.get(id).map(String::as_str).unwrap_or(id)))
        .unwrap_or(ParagraphKind::Plain);
    match kind {
        ParagraphKind::Heading(level) => heading(text, level),
        ParagraphKind::Bullet => format!("- {text}"),
        ParagraphKind::Numbered => format!("1. {text}"),
        ParagraphKind::Plain => text.to_string(),
    }
}

// ── Body walk ────────────────────────────────────────────────────────────────

/// An open `w:p`. Text-box paragraphs open inside their anchor paragraph.
#[derive(Default)]
struct OpenParagraph {
    text: String,
    style: Option<String>,
}

#[derive(Default)]
struct BodyWalker {
    blocks: Vec<String>,
    /// `w:tbl` nesting depth.
    table_depth: usize,
    paragraphs: Vec<OpenParagraph>,
    /// Text-box paragraphs, emitted after their anchor paragraph closes.
    deferred: Vec<String>,
    /// `w:r` nesting depth (a text box inside a run holds its own runs).
    run_depth: usize,
    in_text: bool,
    /// Depth inside an `mc:Fallback` subtree, which repeats `mc:Choice`.
    skip_depth: usize,
    cell_paras: Vec<String>,
    row: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BodyWalker {
    fn push_text(&mut self, text: &str) {
        if let Some(p) = self.paragraphs.last_mut() {
            p.text.push_str(text);
        }
    }

    fn push_char(&mut self, c: char) {
        if self.run_depth > 0 {
            if let Some(p) = self.paragraphs.last_mut() {
                p.text.push(c);
            }
        }
    }

    fn set_style(&mut self, style: Option<String>) {
        if let Some(p) = self.paragraphs.last_mut() {
            p.style = style;
        }
    }

    fn end_paragraph(&mut self, styles: &HashMap<String, String>) {
        let Some(para) = self.paragraphs.pop() else {
            return;
        };
        let text = para.text.trim();

        if !self.paragraphs.is_empty() {
            if !text.is_empty() {
                let block = render_paragraph(text, para.style.as_deref(), styles);
                self.deferred.push(block);
            }
            return;
        }

        if self.table_depth > 0 {
            self.cell_paras.push(text.to_string());
            self.cell_paras.append(&mut self.deferred);
        } else {
            if !text.is_empty() {
                let block = render_paragraph(text, para.style.as_deref(), styles);
                self.blocks.push(block);
            }
            self.blocks.append(&mut self.deferred);
        }
    }

    fn end_table(&mut self) {
        self.table_depth = self.table_depth.saturating_sub(1);
        if self.table_depth > 0 {
            return;
        }
        let rows = std::mem::take(&mut self.rows);
        if let Some((headers, body)) = rows.split_first() {
            let table = make_table(headers.as_slice(), body);
            if !table.is_empty() {
                self.blocks.push(table);
            }
        }
    }
}

/// Markdown blocks of `document.xml`, in document order.
fn parse_document(
    xml: &str,
    styles: &HashMap<String, String>,
) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut w = BodyWalker::default();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        if w.skip_depth > 0 {
            match event {
                Event::Start(_) => w.skip_depth += 1,
                Event::End(_) => w.skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"Fallback" => w.skip_depth = 1,
                b"p" => w.paragraphs.push(OpenParagraph::default()),
                b"r" => w.run_depth += 1,
                b"t" => w.in_text = true,
                b"tbl" => w.table_depth += 1,
                b"tr" if w.table_depth == 1 => w.row.clear(),
                b"tc" if w.table_depth == 1 => w.cell_paras.clear(),
                b"pStyle" => w.set_style(attr_value(&reader, e, b"val")),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tab" => w.push_char('\t'),
                b"br" | b"cr" => w.push_char('\n'),
                b"pStyle" => w.set_style(attr_value(&reader, e, b"val")),
                _ => {}
            },
            Event::Text(ref e) if w.in_text => {
                let text = e.unescape()?;
                w.push_text(&text);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"p" => w.end_paragraph(styles),
                b"r" => w.run_depth = w.run_depth.saturating_sub(1),
                b"t" => w.in_text = false,
                b"tc" if w.table_depth == 1 => {
                    let cell = w.cell_paras.join("\n");
                    w.row.push(cell.trim().to_string());
                    w.cell_paras.clear();
                }
                b"tr" if w.table_depth == 1 => {
                    let row = std::mem::take(&mut w.row);
                    w.rows.push(row);
                }
                b"tbl" => w.end_table(),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(w.blocks)
}
