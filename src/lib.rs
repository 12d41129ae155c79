//! # rag-md-converter
//!
//! Convert heterogeneous documents (PDF, DOCX, HTML, CSV, JSON, source code,
//! plain text, Markdown) into one normalised Markdown shape for RAG
//! pipelines: chunk and embed a single format instead of eight.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Detect   extension → parser key (+ code-fence language)
//!  ├─ 2. Parse    format-specific extraction → Markdown body + extras
//!  ├─ 3. Cleanup  trailing whitespace, blank-line runs, one final newline
//!  └─ 4. Header   title, source, type, timestamp, extras, `---`
//! ```
//!
//! Every output document looks like:
//!
//! ```text
//! # Quarterly Report
//!
//! *Source: quarterly_report.pdf*
//! *Type: PDF*
//! *Converted: 2024-03-05 14:07 UTC*
//! *Pages: 12*
//!
//! ---
//!
//! ## Page 1
//! ...
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_md_converter::Converter;
//! use std::path::Path;
//!
//! let converter = Converter::default();
//! let markdown = converter.convert("data/people.csv", Some(Path::new("out/people.md")))?;
//! println!("{markdown}");
//!
//! let report = converter.batch_convert_sync("docs/", "markdown/", true)?;
//! eprintln!("{} converted, {} failed", report.succeeded(), report.failed());
//! # Ok::<(), rag_md_converter::ConvertError>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `rag-md-converter` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! PDF extraction binds the pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH` when it is not on the system library path; other
//! formats work without it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod detect;
pub mod error;
pub mod markdown;
pub mod metadata;
pub mod output;
pub mod parsers;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use convert::Converter;
pub use detect::{detect, language_hint, supported_extensions, ExtensionRule, ParserKey};
pub use error::{ConvertError, ErrorKind};
pub use metadata::MetadataHeader;
pub use output::{BatchReport, BatchSummary, ConversionResult, FileOutcome};
pub use parsers::{ParseOutput, Parser, ParserRegistry};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
