//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to receive
//! events as [`crate::convert::Converter::batch_convert`] works through a
//! directory. The CLI forwards them to an `indicatif` progress bar; library
//! callers can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use rag_md_converter::{BatchProgressCallback, ConverterConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, source: &Path, _destination: &Path) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{n}: {}", source.display());
//!     }
//! }
//!
//! let config = ConverterConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it converts each file.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the
/// per-file methods are called from several blocking-pool threads at once.
/// All methods have default no-op implementations.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once, after the directory scan, before any file is converted.
    ///
    /// # Arguments
    /// * `total_files`: number of supported files that will be converted
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is handed to its parser.
    fn on_file_start(&self, source: &Path) {
        let _ = source;
    }

    /// Called when a file was converted and written.
    fn on_file_complete(&self, source: &Path, destination: &Path) {
        let _ = (source, destination);
    }

    /// Called when a file failed to convert. The batch continues.
    fn on_file_error(&self, source: &Path, error: &str) {
        let _ = (source, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, succeeded: usize) {
        let _ = (total_files, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
