//! PDF → per-page Markdown sections.
//!
//! Text comes from pdfium's per-page text layer. Each page is cleaned of
//! known ligature and mojibake artifacts, then scanned for column-aligned
//! runs of lines that are rendered as tables. Every non-empty page becomes a
//! `## Page N` section.
//!
//! ## Locating pdfium
//!
//! `PDFIUM_LIB_PATH` may point at the library file or at the directory
//! holding it; otherwise the system library search path is used.

use super::{ParseOutput, Parser};
use crate::error::ConvertError;
use crate::markdown::{heading, make_table};
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const EMPTY_PDF: &str = "*No extractable text found in PDF.*";

/// Glyphs that some PDF producers emit in place of letter pairs.
const LIGATURES: &[(&str, &str)] = &[
    ("Ɵ", "ti"),
    ("Ʃ", "tt"),
    ("ƒ", "fi"),
    ("Ɛ", "ff"),
    ("ﬁ", "fi"),
    ("ﬂ", "fl"),
    ("ﬀ", "ff"),
    ("ﬃ", "ffi"),
    ("ﬄ", "ffl"),
    ("ﬅ", "ft"),
    ("ﬆ", "st"),
];

/// UTF-8 read back as Windows-1252. Applied in order; `â€` must stay after
/// the three-character sequences that start with it.
const MOJIBAKE: &[(&str, &str)] = &[
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã ", "à"),
    ("Ã\u{a0}", "à"),
    ("Ã´", "ô"),
    ("Ã®", "î"),
    ("Ã¹", "ù"),
    ("Ã§", "ç"),
    ("Ã‰", "É"),
    ("Ã€", "À"),
    ("Ãª", "ê"),
    ("Ã«", "ë"),
    ("Ã¯", "ï"),
    ("Ã»", "û"),
    ("â€™", "'"),
    ("â€\"", "—"),
    ("â€\u{201d}", "—"),
    ("â€œ", "\""),
    ("â€", "\""),
    ("Â«", "«"),
    ("Â»", "»"),
    ("Â ", " "),
    ("Â\u{a0}", " "),
];

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+| {2,}").unwrap());

pub struct PdfParser;

impl Parser for PdfParser {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let pdfium = bind_pdfium()
            .map_err(|e| ConvertError::parse_failure(path, format!("pdfium unavailable: {e}")))?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ConvertError::parse_failure(path, format!("{:?}", e)))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        debug!("PDF loaded: {} pages", total);

        let mut texts = Vec::with_capacity(total);
        for (index, page) in pages.iter().enumerate() {
            let text = match page.text() {
                Ok(text) => text.all(),
                Err(e) => {
                    warn!("No text layer on page {} of {}: {e}", index + 1, path.display());
                    String::new()
                }
            };
            texts.push(clean_pdf_text(&text));
        }

        Ok(ParseOutput::new(render_pages(&texts)).with_extra("Pages", total))
    }

    fn file_type_label(&self) -> &'static str {
        "PDF"
    }
}

fn bind_pdfium() -> Result<Pdfium, PdfiumError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(p) => {
            let p = PathBuf::from(p);
            if p.is_dir() {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&p))?
            } else {
                Pdfium::bind_to_library(&p)?
            }
        }
        None => Pdfium::bind_to_system_library()?,
    };
    Ok(Pdfium::new(bindings))
}

/// Repair ligature glyphs, then mojibake sequences, by plain substitution.
pub fn clean_pdf_text(text: &str) -> String {
    let mut out = text.to_string();
    for (bad, good) in LIGATURES.iter().chain(MOJIBAKE) {
        if out.contains(bad) {
            out = out.replace(bad, good);
        }
    }
    out
}

/// A run of page text or a detected table.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Table(Vec<Vec<String>>),
}

fn split_columns(line: &str) -> Vec<String> {
    RE_COLUMN_GAP
        .split(line.trim())
        .map(str::to_string)
        .collect()
}

/// Split page text into prose and tables.
///
/// A table is two or more consecutive lines that each split into the same
/// number (at least two) of columns on tabs or runs of two or more spaces.
pub fn detect_tables(text: &str) -> Vec<Segment> {
    let lines: Vec<&str> = text.lines().collect();
    let mut segments = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let width = split_columns(lines[i]).len();
        let mut end = i + 1;
        if width >= 2 {
            while end < lines.len() && split_columns(lines[end]).len() == width {
                end += 1;
            }
        }

        if width >= 2 && end - i >= 2 {
            flush_prose(&mut prose, &mut segments);
            let rows = lines[i..end].iter().map(|l| split_columns(l)).collect();
            segments.push(Segment::Table(rows));
            i = end;
        } else {
            prose.push(lines[i]);
            i += 1;
        }
    }
    flush_prose(&mut prose, &mut segments);
    segments
}

fn flush_prose(prose: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    let text = prose.join("\n");
    prose.clear();
    let text = text.trim();
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

/// Markdown for one page, or `None` when it has no content.
pub fn render_page(page_number: usize, text: &str) -> Option<String> {
    let segments = detect_tables(text);
    if segments.is_empty() {
        return None;
    }
    let table_count = segments
        .iter()
        .filter(|s| matches!(s, Segment::Table(_)))
        .count();

    let mut parts = Vec::with_capacity(segments.len());
    let mut table_number = 0;
    for segment in segments {
        match segment {
            Segment::Text(text) => parts.push(text),
            Segment::Table(rows) => {
                table_number += 1;
                let Some((headers, body)) = rows.split_first() else {
                    continue;
                };
                let table = make_table(headers.as_slice(), body);
                if table_count > 1 {
                    parts.push(format!("{}\n\n{table}", heading(&format!("Table {table_number}"), 3)));
                } else {
                    parts.push(table);
                }
            }
        }
    }

    Some(format!(
        "{}\n\n{}\n",
        heading(&format!("Page {page_number}"), 2),
        parts.join("\n\n")
    ))
}

/// Join the non-empty pages; pages are numbered from 1 in input order.
pub fn render_pages(pages: &[String]) -> String {
    let sections: Vec<String> = pages
        .iter()
        .enumerate()
        .filter_map(|(i, text)| render_page(i + 1, text))
        .collect();
    if sections.is_empty() {
        EMPTY_PDF.to_string()
    } else {
        sections.join("\n")
    }
}
