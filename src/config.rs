//! Configuration for file-to-Markdown conversion.
//!
//! Every tunable lives in [`ConverterConfig`], built through
//! [`ConverterConfigBuilder`]. The table row caps are configuration rather
//! than constants: 500 rows for CSV and 200 for JSON-derived tables are only
//! defaults.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for a [`crate::convert::Converter`].
///
/// # Example
/// ```rust
/// use rag_md_converter::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .csv_max_rows(1000)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.json_max_rows, 200);
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Maximum CSV body rows rendered before the table is truncated. Default: 500.
    pub csv_max_rows: usize,

    /// Maximum rows of a JSON array-of-objects table. Default: 200.
    pub json_max_rows: usize,

    /// Bytes sampled from the start of a CSV file for delimiter sniffing. Default: 8192.
    pub csv_sniff_bytes: usize,

    /// Bytes sampled from the start of a text file for charset detection. Default: 10 000.
    pub encoding_sniff_bytes: usize,

    /// Minimum detector confidence for a sniffed charset to be used. Default: 0.5.
    ///
    /// The detected charset is accepted only when its confidence is strictly
    /// greater than this value; otherwise UTF-8 is assumed.
    pub encoding_confidence_threshold: f32,

    /// Number of files converted at once by `batch_convert`. Default: 1.
    pub concurrency: usize,

    /// Receives per-file batch events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            csv_max_rows: 500,
            json_max_rows: 200,
            csv_sniff_bytes: 8192,
            encoding_sniff_bytes: 10_000,
            encoding_confidence_threshold: 0.5,
            concurrency: 1,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("csv_max_rows", &self.csv_max_rows)
            .field("json_max_rows", &self.json_max_rows)
            .field("csv_sniff_bytes", &self.csv_sniff_bytes)
            .field("encoding_sniff_bytes", &self.encoding_sniff_bytes)
            .field(
                "encoding_confidence_threshold",
                &self.encoding_confidence_threshold,
            )
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn csv_max_rows(mut self, n: usize) -> Self {
        self.config.csv_max_rows = n;
        self
    }

    pub fn json_max_rows(mut self, n: usize) -> Self {
        self.config.json_max_rows = n;
        self
    }

    pub fn csv_sniff_bytes(mut self, n: usize) -> Self {
        self.config.csv_sniff_bytes = n.max(64);
        self
    }

    pub fn encoding_sniff_bytes(mut self, n: usize) -> Self {
        self.config.encoding_sniff_bytes = n.max(64);
        self
    }

    pub fn encoding_confidence_threshold(mut self, t: f32) -> Self {
        self.config.encoding_confidence_threshold = t;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        if c.csv_max_rows == 0 {
            return Err(ConvertError::InvalidConfig(
                "CSV row cap must be ≥ 1".into(),
            ));
        }
        if c.json_max_rows == 0 {
            return Err(ConvertError::InvalidConfig(
                "JSON row cap must be ≥ 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.encoding_confidence_threshold) {
            return Err(ConvertError::InvalidConfig(format!(
                "Encoding confidence threshold must be 0.0–1.0, got {}",
                c.encoding_confidence_threshold
            )));
        }
        Ok(self.config)
    }
}
