//! Format detection: file extension → parser key and code-fence language.
//!
//! Two questions are answered separately: *which parser applies* and *which
//! syntax-highlight tag to show*. Every source-code extension shares the one
//! [`ParserKey::Code`] parser and differs only in its language hint.
//!
//! The table is a process-wide constant; lookups are case-insensitive on the
//! extension (the substring after the final `.`).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Identifier used to select a parser from the [`crate::parsers::ParserRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKey {
    Pdf,
    Docx,
    Html,
    Csv,
    Json,
    Code,
    Text,
    Markdown,
}

impl ParserKey {
    /// Every key, in registry order.
    pub const ALL: [ParserKey; 8] = [
        ParserKey::Pdf,
        ParserKey::Docx,
        ParserKey::Html,
        ParserKey::Csv,
        ParserKey::Json,
        ParserKey::Code,
        ParserKey::Text,
        ParserKey::Markdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParserKey::Pdf => "pdf",
            ParserKey::Docx => "docx",
            ParserKey::Html => "html",
            ParserKey::Csv => "csv",
            ParserKey::Json => "json",
            ParserKey::Code => "code",
            ParserKey::Text => "text",
            ParserKey::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ParserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionRule {
    /// Lower-case extension including the leading dot, e.g. `".py"`.
    pub extension: &'static str,
    pub key: ParserKey,
    /// Code-fence language tag, when the extension has one.
    pub language: Option<&'static str>,
}

const fn rule(extension: &'static str, key: ParserKey) -> ExtensionRule {
    ExtensionRule {
        extension,
        key,
        language: None,
    }
}

const fn code(extension: &'static str, language: &'static str) -> ExtensionRule {
    ExtensionRule {
        extension,
        key: ParserKey::Code,
        language: Some(language),
    }
}

/// The extension table. Each extension appears exactly once.
pub const EXTENSION_RULES: &[ExtensionRule] = &[
    // Documents
    rule(".pdf", ParserKey::Pdf),
    rule(".docx", ParserKey::Docx),
    // Web
    rule(".html", ParserKey::Html),
    rule(".htm", ParserKey::Html),
    // Data
    rule(".csv", ParserKey::Csv),
    rule(".json", ParserKey::Json),
    rule(".jsonl", ParserKey::Json),
    // Text / Markdown
    rule(".txt", ParserKey::Text),
    rule(".rst", ParserKey::Text),
    rule(".md", ParserKey::Markdown),
    rule(".markdown", ParserKey::Markdown),
    // Source code
    code(".py", "python"),
    code(".java", "java"),
    code(".js", "javascript"),
    code(".ts", "typescript"),
    code(".tsx", "tsx"),
    code(".jsx", "jsx"),
    code(".cpp", "cpp"),
    code(".c", "c"),
    code(".h", "c"),
    code(".hpp", "cpp"),
    code(".cs", "csharp"),
    code(".go", "go"),
    code(".rs", "rust"),
    code(".rb", "ruby"),
    code(".php", "php"),
    code(".swift", "swift"),
    code(".kt", "kotlin"),
    code(".scala", "scala"),
    code(".r", "r"),
    code(".sql", "sql"),
    code(".sh", "bash"),
    code(".bash", "bash"),
    code(".zsh", "zsh"),
    code(".ps1", "powershell"),
    code(".yaml", "yaml"),
    code(".yml", "yaml"),
    code(".toml", "toml"),
    code(".ini", "ini"),
    code(".cfg", "ini"),
    code(".xml", "xml"),
    code(".css", "css"),
    code(".scss", "scss"),
    code(".less", "less"),
    code(".lua", "lua"),
    code(".pl", "perl"),
    code(".ex", "elixir"),
    code(".exs", "elixir"),
    code(".erl", "erlang"),
    code(".hs", "haskell"),
    code(".dart", "dart"),
    code(".vue", "vue"),
    code(".svelte", "svelte"),
];

static RULES_BY_EXTENSION: Lazy<HashMap<&'static str, &'static ExtensionRule>> =
    Lazy::new(|| EXTENSION_RULES.iter().map(|r| (r.extension, r)).collect());

/// Lower-cased extension of `path` with its leading dot, e.g. `".csv"`.
///
/// Returns `None` for paths without an extension (`Makefile`, `.bashrc`).
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}

fn rule_for(path: &Path) -> Option<&'static ExtensionRule> {
    let ext = extension_of(path)?;
    RULES_BY_EXTENSION.get(ext.as_str()).copied()
}

/// Parser key for `path`, or `None` when the extension is not supported.
pub fn detect(path: &Path) -> Option<ParserKey> {
    rule_for(path).map(|r| r.key)
}

/// Code-fence language for `path`; empty when there is none.
pub fn language_hint(path: &Path) -> &'static str {
    rule_for(path).and_then(|r| r.language).unwrap_or("")
}

/// Every supported extension, sorted and duplicate-free.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut exts: Vec<&'static str> = RULES_BY_EXTENSION.keys().copied().collect();
    exts.sort_unstable();
    exts
}
