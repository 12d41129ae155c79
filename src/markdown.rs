//! Markdown formatting helpers shared by every parser.
//!
//! All functions are pure (`&str → String`). [`strip_excessive_newlines`]
//! is the final pass applied to every converted document; the rest are
//! building blocks for parser bodies.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Tables ───────────────────────────────────────────────────────────────────

/// Trim a cell, escape literal pipes and fold line breaks into `<br>`.
fn escape_cell(cell: &str) -> String {
    cell.trim()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&escape_cell(cell));
        out.push_str(" |");
    }
}

/// Build a GitHub-flavoured pipe table.
///
/// Every emitted row has exactly `headers.len()` cells: short rows are
/// padded with empty cells and long rows are cut. Empty `headers` yields an
/// empty string.
pub fn make_table<H, C>(headers: &[H], rows: &[Vec<C>]) -> String
where
    H: AsRef<str>,
    C: AsRef<str>,
{
    if headers.is_empty() {
        return String::new();
    }
    let width = headers.len();
    let mut out = String::new();

    push_row(&mut out, headers.iter().map(|h| h.as_ref()));
    out.push('\n');
    out.push('|');
    for _ in 0..width {
        out.push_str(" --- |");
    }

    for row in rows {
        out.push('\n');
        let cells = row
            .iter()
            .map(|c| c.as_ref())
            .chain(std::iter::repeat(""))
            .take(width);
        push_row(&mut out, cells);
    }
    out
}

/// Build a table from at most `max_rows` body rows.
///
/// Returns the table and, when rows were dropped, a note of the form
/// `*Table truncated: showing M of N rows.*`.
pub fn truncate_table<H, C>(
    headers: &[H],
    rows: &[Vec<C>],
    max_rows: usize,
) -> (String, Option<String>)
where
    H: AsRef<str>,
    C: AsRef<str>,
{
    if rows.len() > max_rows {
        let note = format!(
            "*Table truncated: showing {} of {} rows.*",
            max_rows,
            rows.len()
        );
        (make_table(headers, &rows[..max_rows]), Some(note))
    } else {
        (make_table(headers, rows), None)
    }
}

/// Table followed by its truncation note (if any), separated by a blank line.
pub fn table_with_note(table: String, note: Option<String>) -> String {
    match note {
        Some(note) => format!("{table}\n\n{note}"),
        None => table,
    }
}

// ── Code blocks and headings ─────────────────────────────────────────────────

/// Wrap `code` in a fenced block tagged with `language`.
///
/// The fence starts at three backticks and grows until it no longer occurs
/// inside `code`, so it is always longer than any backtick run in the body.
pub fn wrap_code_block(code: &str, language: &str) -> String {
    let mut fence = String::from("```");
    while code.contains(fence.as_str()) {
        fence.push('`');
    }
    format!("{fence}{language}\n{code}\n{fence}")
}

/// A Markdown heading; `level` is clamped to 1–6.
pub fn heading(text: &str, level: usize) -> String {
    let level = level.clamp(1, 6);
    format!("{} {}", "#".repeat(level), text)
}

// ── Whitespace ───────────────────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapse every run of three or more newlines to exactly two.
pub fn normalize_whitespace(text: &str) -> String {
    RE_BLANK_LINES.replace_all(text, "\n\n").into_owned()
}

/// Final cleanup pass applied to every converted document.
///
/// 1. Trim trailing whitespace per line (also normalises CRLF)
/// 2. Collapse blank-line runs via [`normalize_whitespace`]
/// 3. Trim the whole document
/// 4. End with exactly one newline
///
/// Idempotent: applying it twice gives the same result as once.
pub fn strip_excessive_newlines(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let collapsed = normalize_whitespace(&trimmed_lines);
    format!("{}\n", collapsed.trim())
}

/// Same cleanup as [`strip_excessive_newlines`], for a body that will sit
/// under a metadata header.
///
/// Only leading blank lines are dropped, so an indented first line (a
/// Markdown indented code block) keeps its indentation.
pub fn clean_body(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let collapsed = normalize_whitespace(&trimmed_lines);
    format!("{}\n", collapsed.trim_start_matches('\n').trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_count(line: &str) -> usize {
        // Count unescaped pipes; a row with n cells has n + 1 of them.
        let mut count = 0;
        let mut prev = ' ';
        for c in line.chars() {
            if c == '|' && prev != '\\' {
                count += 1;
            }
            prev = c;
        }
        count - 1
    }

    #[test]
    fn make_table_basic() {
        let table = make_table(&["Name", "Age"], &[vec!["Alice", "30"], vec!["Bob", "25"]]);
        assert_eq!(
            table,
            "| Name | Age |\n| --- | --- |\n| Alice | 30 |\n| Bob | 25 |"
        );
    }

    #[test]
    fn make_table_empty_headers() {
        let rows: Vec<Vec<String>> = vec![vec!["x".into()]];
        assert_eq!(make_table::<String, String>(&[], &rows), "");
    }

    #[test]
    fn make_table_pads_and_truncates_rows() {
        let table = make_table(
            &["a", "b", "c"],
            &[vec!["1"], vec!["1", "2", "3", "4", "5"]],
        );
        for line in table.lines() {
            assert_eq!(cell_count(line), 3, "line: {line}");
        }
        assert!(table.contains("| 1 |  |  |"));
        assert!(!table.contains('4'));
    }

    #[test]
    fn make_table_escapes_pipes_and_trims() {
        let table = make_table(&["col"], &[vec!["  a|b  "]]);
        assert!(table.contains("| a\\|b |"));
        for line in table.lines() {
            assert_eq!(cell_count(line), 1);
        }
    }

    #[test]
    fn make_table_folds_line_breaks() {
        let table = make_table(&["note"], &[vec!["line one\nline two"]]);
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("line one<br>line two"));
    }

    #[test]
    fn truncate_table_over_cap() {
        let rows: Vec<Vec<String>> = (0..10).map(|i| vec![i.to_string()]).collect();
        let (table, note) = truncate_table(&["X"], &rows, 5);
        let note = note.expect("note expected");
        assert!(note.contains("5 of 10"), "note: {note}");
        assert_eq!(table.lines().count(), 7); // header + separator + 5 rows
        assert!(table.ends_with("| 4 |"));
    }

    #[test]
    fn truncate_table_within_cap() {
        let rows: Vec<Vec<String>> = (0..5).map(|i| vec![i.to_string()]).collect();
        let (table, note) = truncate_table(&["X"], &rows, 5);
        assert!(note.is_none());
        assert_eq!(table.lines().count(), 7);
    }

    #[test]
    fn table_with_note_joins_with_blank_line() {
        assert_eq!(table_with_note("T".into(), Some("*n*".into())), "T\n\n*n*");
        assert_eq!(table_with_note("T".into(), None), "T");
    }

    #[test]
    fn wrap_code_block_plain() {
        let block = wrap_code_block("print('hi')", "python");
        assert_eq!(block, "```python\nprint('hi')\n```");
    }

    #[test]
    fn wrap_code_block_grows_fence() {
        let block = wrap_code_block("some ``` code", "");
        assert!(block.starts_with("````\n"));
        assert!(block.ends_with("\n````"));
    }

    #[test]
    fn wrap_code_block_fence_longer_than_any_run() {
        let code = "a ` b `` c ````` d";
        let block = wrap_code_block(code, "txt");
        let open: String = block.chars().take_while(|&c| c == '`').collect();
        let close: String = block.chars().rev().take_while(|&c| c == '`').collect();
        assert_eq!(open, close);
        assert_eq!(open.len(), 6);
    }

    #[test]
    fn heading_clamps_level() {
        assert_eq!(heading("Title", 1), "# Title");
        assert_eq!(heading("Sub", 3), "### Sub");
        assert_eq!(heading("Low", 0), "# Low");
        assert_eq!(heading("Deep", 9), "###### Deep");
    }

    #[test]
    fn normalize_whitespace_collapses() {
        assert_eq!(normalize_whitespace("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_whitespace("a\n\nb"), "a\n\nb");
        assert_eq!(normalize_whitespace("a\nb"), "a\nb");
    }

    #[test]
    fn strip_excessive_newlines_cleans() {
        let input = "\n\n  # Title   \r\n\r\n\r\n\r\nbody  \n\n\n";
        assert_eq!(strip_excessive_newlines(input), "# Title\n\nbody\n");
    }

    #[test]
    fn strip_excessive_newlines_empty() {
        assert_eq!(strip_excessive_newlines(""), "\n");
        assert_eq!(strip_excessive_newlines("   \n\n"), "\n");
    }

    #[test]
    fn strip_excessive_newlines_idempotent() {
        let samples = [
            "a  \n\n\n\nb\t\n",
            "\n\n\n",
            "| a |\n| --- |\n\n\n\n\n```\ncode   \n```",
            "x\r\ny\r\n\r\n\r\n\r\nz",
        ];
        for s in samples {
            let once = strip_excessive_newlines(s);
            assert_eq!(strip_excessive_newlines(&once), once, "input: {s:?}");
        }
    }

    #[test]
    fn clean_body_keeps_first_line_indentation() {
        let input = "\n   \n    fn indented() {}  \n\n\n\nAfter.\n\n";
        assert_eq!(clean_body(input), "    fn indented() {}\n\nAfter.\n");
    }

    #[test]
    fn clean_body_idempotent_and_blank() {
        assert_eq!(clean_body(" \n\n"), "\n");
        let once = clean_body("\n  indented\r\n\r\n\r\n\r\nnext  ");
        assert_eq!(clean_body(&once), once);
    }
}
