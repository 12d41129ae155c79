//! Source code → fenced code block tagged with the detector's language hint.

use super::{read_lossy, ParseOutput, Parser, EMPTY_FILE};
use crate::detect::language_hint;
use crate::error::ConvertError;
use crate::markdown::wrap_code_block;
use std::path::Path;

/// Wraps source files in a fenced block; adds a `Language` header field.
pub struct CodeParser;

impl Parser for CodeParser {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let code = read_lossy(path)?;
        let code = code.trim_end().trim_start_matches(['\n', '\r']);
        if code.is_empty() {
            return Ok(ParseOutput::new(EMPTY_FILE));
        }

        let language = language_hint(path);
        let output = ParseOutput::new(wrap_code_block(code, language));
        if language.is_empty() {
            Ok(output)
        } else {
            Ok(output.with_extra("Language", capitalize(language)))
        }
    }

    fn file_type_label(&self) -> &'static str {
        "Code"
    }
}

/// `typescript` → `Typescript`.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
