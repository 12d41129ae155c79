//! JSON and JSON Lines → table or pretty-printed code block.
//!
//! A non-empty array of objects that all share the same key set becomes a
//! pipe table (column order from the first object). Anything else is
//! pretty-printed with two-space indentation inside a `json` fence.

use super::{read_lossy, ParseOutput, Parser};
use crate::config::ConverterConfig;
use crate::detect::extension_of;
use crate::error::ConvertError;
use crate::markdown::{table_with_note, truncate_table, wrap_code_block};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

pub const EMPTY_JSON: &str = "*Empty JSON file.*";

pub struct JsonParser {
    max_rows: usize,
}

impl JsonParser {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            max_rows: config.json_max_rows,
        }
    }

    fn render(&self, value: &Value) -> String {
        match records_of(value) {
            Some(records) => {
                let headers: Vec<&str> = records[0].keys().map(String::as_str).collect();
                let rows: Vec<Vec<String>> = records
                    .iter()
                    .map(|obj| headers.iter().map(|h| cell_text(&obj[*h])).collect())
                    .collect();
                let (table, note) = truncate_table(headers.as_slice(), &rows, self.max_rows);
                table_with_note(table, note)
            }
            None => pretty_block(value),
        }
    }
}

impl Parser for JsonParser {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let text = read_lossy(path)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(ParseOutput::new(EMPTY_JSON));
        }

        if is_json_lines(path, text) {
            debug!("Parsing {} as JSON Lines", path.display());
            return Ok(ParseOutput::new(match parse_lines(text) {
                Some(values) => self.render(&Value::Array(values)),
                None => wrap_code_block(text, "json"),
            }));
        }

        let markdown = match serde_json::from_str::<Value>(text) {
            Ok(value) => self.render(&value),
            Err(e) => {
                debug!("Malformed JSON in {}: {e}", path.display());
                format!("*Failed to parse JSON: {e}*")
            }
        };
        Ok(ParseOutput::new(markdown))
    }

    fn file_type_label(&self) -> &'static str {
        "JSON"
    }
}

/// `.jsonl` always; otherwise multi-line content not opening a JSON
/// array or object.
fn is_json_lines(path: &Path, text: &str) -> bool {
    if extension_of(path).as_deref() == Some(".jsonl") {
        return true;
    }
    text.contains('\n') && !text.starts_with('[') && !text.starts_with('{')
}

/// Every non-blank line as a JSON value; `None` if any line fails.
fn parse_lines(text: &str) -> Option<Vec<Value>> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_str(l).ok())
        .collect()
}

/// The objects of `value` when it is a non-empty array of objects with
/// identical key sets.
fn records_of(value: &Value) -> Option<Vec<&Map<String, Value>>> {
    let items = value.as_array().filter(|a| !a.is_empty())?;
    let records: Vec<&Map<String, Value>> =
        items.iter().map(Value::as_object).collect::<Option<_>>()?;
    let keys: BTreeSet<&String> = records[0].keys().collect();
    if records[1..]
        .iter()
        .all(|r| r.len() == keys.len() && r.keys().all(|k| keys.contains(k)))
    {
        Some(records)
    } else {
        None
    }
}

/// Strings render bare; everything else as compact JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pretty_block(value: &Value) -> String {
    // Serialising a `Value` cannot fail; fall back to compact form regardless.
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    wrap_code_block(&pretty, "json")
}
