//! Batch conversion results.

use crate::error::{ConvertError, ErrorKind};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Outcome of converting one file: its destination, or why it failed.
pub type ConversionResult = Result<PathBuf, ConvertError>;

/// Per-file outcomes of a batch run, keyed and ordered by source path.
///
/// Serialises as `{ "summary": {...}, "files": [...] }`.
#[derive(Debug, Default)]
pub struct BatchReport {
    entries: BTreeMap<PathBuf, ConversionResult>,
}

/// Aggregate counts of a [`BatchReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// One serialisable row of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `source`, replacing any earlier one.
    pub fn insert(&mut self, source: PathBuf, result: ConversionResult) {
        self.entries.insert(source, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, source: &Path) -> Option<&ConversionResult> {
        self.entries.get(source)
    }

    /// Entries in source-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ConversionResult)> {
        self.entries.iter()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.values().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Failed sources with their errors, in source-path order.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ConvertError)> {
        self.entries
            .iter()
            .filter_map(|(src, r)| r.as_ref().err().map(|e| (src.as_path(), e)))
    }

    pub fn summary(&self) -> BatchSummary {
        let succeeded = self.succeeded();
        BatchSummary {
            total: self.len(),
            succeeded,
            failed: self.len() - succeeded,
        }
    }

    pub fn outcomes(&self) -> Vec<FileOutcome> {
        self.entries
            .iter()
            .map(|(source, result)| match result {
                Ok(dest) => FileOutcome {
                    source: source.clone(),
                    destination: Some(dest.clone()),
                    error: None,
                },
                Err(e) => FileOutcome {
                    source: source.clone(),
                    destination: None,
                    error: Some(FileError {
                        kind: e.kind(),
                        message: e.to_string(),
                    }),
                },
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a BatchReport {
    type Item = (&'a PathBuf, &'a ConversionResult);
    type IntoIter = std::collections::btree_map::Iter<'a, PathBuf, ConversionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(PathBuf, ConversionResult)> for BatchReport {
    fn from_iter<I: IntoIterator<Item = (PathBuf, ConversionResult)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for BatchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BatchReport", 2)?;
        s.serialize_field("summary", &self.summary())?;
        s.serialize_field("files", &self.outcomes())?;
        s.end()
    }
}
