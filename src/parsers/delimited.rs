//! Delimited text (CSV and friends) → pipe table.
//!
//! The delimiter is sniffed from the head of the file; when no candidate is
//! consistent across the sampled lines the standard comma dialect is used.

use super::{read_lossy, ParseOutput, Parser};
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::markdown::{table_with_note, truncate_table};
use std::path::Path;
use tracing::debug;

pub const EMPTY_CSV: &str = "*Empty CSV file.*";

/// Delimiters tried by the sniffer, in tie-break order.
const CANDIDATE_DELIMITERS: [u8; 5] = [b',', b'\t', b';', b'|', b':'];

pub struct CsvParser {
    max_rows: usize,
    sniff_bytes: usize,
}

impl CsvParser {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            max_rows: config.csv_max_rows,
            sniff_bytes: config.csv_sniff_bytes,
        }
    }

    fn read_rows(&self, path: &Path, text: &str) -> Result<Vec<Vec<String>>, ConvertError> {
        let delimiter = match sniff_delimiter(head(text, self.sniff_bytes)) {
            Some(d) => {
                debug!("Sniffed delimiter {:?} for {}", d as char, path.display());
                d
            }
            None => {
                debug!("Delimiter sniff failed for {}, using ','", path.display());
                b','
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ConvertError::parse_failure(path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

impl Parser for CsvParser {
    fn parse(&self, path: &Path) -> Result<ParseOutput, ConvertError> {
        let text = read_lossy(path)?;
        if text.trim().is_empty() {
            return Ok(ParseOutput::new(EMPTY_CSV));
        }

        let rows = self.read_rows(path, &text)?;
        let Some((headers, body)) = rows.split_first() else {
            return Ok(ParseOutput::new(EMPTY_CSV));
        };

        let (table, note) = truncate_table(headers.as_slice(), body, self.max_rows);
        Ok(ParseOutput::new(table_with_note(table, note)))
    }

    fn file_type_label(&self) -> &'static str {
        "CSV"
    }
}

/// At most `limit` bytes from the start of `text`, cut back to whole lines
/// when the text is longer than the limit.
fn head(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &text[..end];
    match sample.rfind('\n') {
        Some(i) => &sample[..i],
        None => sample,
    }
}

/// Pick the candidate delimiter that occurs the same non-zero number of
/// times (outside double quotes) on every non-blank sampled line.
///
/// Among consistent candidates the one with the most occurrences per line
/// wins. `None` when no candidate is consistent.
pub(crate) fn sniff_delimiter(sample: &str) -> Option<u8> {
    let lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, usize)> = None;
    for &candidate in &CANDIDATE_DELIMITERS {
        let first = count_unquoted(lines[0], candidate);
        if first == 0 {
            continue;
        }
        if lines[1..].iter().any(|l| count_unquoted(l, candidate) != first) {
            continue;
        }
        if best.map_or(true, |(_, n)| first > n) {
            best = Some((candidate, first));
        }
    }
    best.map(|(d, _)| d)
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &b in line.as_bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}
