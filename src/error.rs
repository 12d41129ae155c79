//! Error types for the rag-md-converter library.
//!
//! A single error enum, [`ConvertError`], covers every way a conversion can
//! fail. Two of its variants are **caller errors** that `convert` always
//! propagates:
//!
//! * [`ConvertError::NotFound`]: the input path does not exist.
//! * [`ConvertError::Unsupported`]: the extension has no registered parser.
//!
//! Everything else is an **extraction error**. Parsers degrade to a
//! placeholder or partial result wherever a fallback exists (malformed JSON,
//! empty documents, undecodable bytes) and only return an error when none
//! does. Batch conversion never propagates a single file's error; it is
//! stored in [`crate::output::BatchReport`] next to the successes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the rag-md-converter library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// No parser is registered for the file's extension.
    #[error("Unsupported file type: '{extension}'. Supported: {supported}")]
    Unsupported {
        path: PathBuf,
        extension: String,
        supported: String,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// A format-specific extraction step failed (corrupt archive, bad XML,
    /// unreadable PDF, I/O error mid-read).
    #[error("Failed to parse '{path}': {detail}")]
    ParseFailure { path: PathBuf, detail: String },

    /// Bytes could not be decoded as text.
    ///
    /// The built-in text parser never returns this: its chain ends in lossy
    /// UTF-8. Parsers plugged in through [`Converter::with_registry`] use it
    /// when they have no such fallback.
    ///
    /// [`Converter::with_registry`]: crate::Converter::with_registry
    #[error("Could not decode '{path}' as text: {detail}")]
    DecodeFailure { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Flat classification of a [`ConvertError`], cheap to copy and serialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unsupported,
    ParseFailure,
    DecodeFailure,
    Io,
    Config,
    Internal,
}

impl ConvertError {
    /// The kind of this error, for callers that branch on failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::NotFound { .. } => ErrorKind::NotFound,
            ConvertError::Unsupported { .. } => ErrorKind::Unsupported,
            ConvertError::ParseFailure { .. } => ErrorKind::ParseFailure,
            ConvertError::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            ConvertError::OutputWriteFailed { .. } => ErrorKind::Io,
            ConvertError::InvalidConfig(_) => ErrorKind::Config,
            ConvertError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a [`ConvertError::ParseFailure`] built from any displayable cause.
    pub(crate) fn parse_failure(path: impl Into<PathBuf>, detail: impl std::fmt::Display) -> Self {
        ConvertError::ParseFailure {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}
