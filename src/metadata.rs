//! Metadata header prepended to every converted document.
//!
//! ```text
//! # <Title>
//!
//! *Source: <original filename>*
//! *Type: <format label>*
//! *Converted: <YYYY-MM-DD HH:MM UTC>*
//! *<ExtraKey>: <ExtraValue>*
//!
//! ---
//!
//! <body>
//! ```
//!
//! Trailing double spaces are Markdown hard line breaks. The title comes from
//! the first level-1 heading of the body (outside fenced code), else from the
//! file name.

use chrono::{DateTime, Utc};
use std::path::Path;

/// Title used when neither the body nor the file name yields one.
const FALLBACK_TITLE: &str = "Untitled";

/// Ordered header fields for one converted document.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataHeader {
    /// Never empty.
    pub title: String,
    /// File name of the source, without directories.
    pub source: String,
    /// The parser's fixed format label.
    pub file_type: String,
    pub converted: DateTime<Utc>,
    /// Format-specific fields, rendered in insertion order.
    pub extras: Vec<(String, String)>,
}

impl MetadataHeader {
    /// Assemble the header for `body` converted from `path`, stamped now.
    pub fn new(body: &str, path: &Path, file_type: &str, extras: &[(String, String)]) -> Self {
        Self {
            title: derive_title(body, path),
            source: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_type: file_type.to_string(),
            converted: Utc::now(),
            extras: extras.to_vec(),
        }
    }

    /// Every (label, value) pair after the title, in rendering order.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("Source".to_string(), self.source.clone()),
            ("Type".to_string(), self.file_type.clone()),
            (
                "Converted".to_string(),
                self.converted.format("%Y-%m-%d %H:%M UTC").to_string(),
            ),
        ];
        fields.extend(self.extras.iter().cloned());
        fields
    }

    /// Render the header block, ending with the `---` rule and a blank line.
    pub fn render(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);
        for (label, value) in self.fields() {
            out.push_str(&format!("*{label}: {value}*  \n"));
        }
        out.push_str("\n---\n\n");
        out
    }

    /// Header followed by `body`, unchanged.
    pub fn wrap(&self, body: &str) -> String {
        let mut out = self.render();
        out.push_str(body);
        out
    }
}

/// Build the header for `body` and prepend it.
pub fn add_metadata(
    body: &str,
    path: &Path,
    file_type: &str,
    extras: &[(String, String)],
) -> String {
    MetadataHeader::new(body, path, file_type, extras).wrap(body)
}

/// First `# ` heading of `body` outside fenced code, else a title from the file stem.
pub fn derive_title(body: &str, path: &Path) -> String {
    title_from_body(body)
        .or_else(|| {
            path.file_stem()
                .map(|s| title_from_stem(&s.to_string_lossy()))
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

fn title_from_body(body: &str) -> Option<String> {
    let mut fence: Option<String> = None;
    for line in body.lines() {
        let stripped = line.trim();
        let ticks = stripped.chars().take_while(|&c| c == '`').count();
        if ticks >= 3 {
            match &fence {
                Some(open) if ticks >= open.len() && stripped.len() == ticks => fence = None,
                Some(_) => {}
                None => fence = Some("`".repeat(ticks)),
            }
            continue;
        }
        if fence.is_some() {
            continue;
        }
        if let Some(rest) = stripped.strip_prefix("# ") {
            let title = rest.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

/// `quarterly_sales-report` → `Quarterly Sales Report`.
///
/// Each alphabetic run starts upper-case and continues lower-case.
fn title_from_stem(stem: &str) -> String {
    let spaced = stem.replace(['_', '-'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut prev_alpha = false;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out.trim().to_string()
}
