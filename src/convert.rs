//! Conversion entry points.
//!
//! A single file goes through detect → parse → cleanup → header:
//!
//! ```text
//! path ─ detect() ─ ParserKey ─ Parser::parse ─ body + extras
//!                                   │
//!                     clean_body ─ Parser::add_metadata ─ String
//! ```
//!
//! [`Converter::convert`] is blocking. [`Converter::batch_convert`] is async:
//! each file runs on the blocking thread pool and up to
//! [`ConverterConfig::concurrency`] files are in flight at once. With the
//! default concurrency of 1 the batch is a strictly sequential fold.

use crate::config::ConverterConfig;
use crate::detect::{detect, extension_of, supported_extensions};
use crate::error::ConvertError;
use crate::markdown::clean_body;
use crate::output::{BatchReport, ConversionResult};
use crate::parsers::{ParserRegistry, EMPTY_FILE};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Converts files to Markdown using a shared, read-only parser registry.
///
/// Cheap to clone: the registry is reference-counted.
#[derive(Clone)]
pub struct Converter {
    registry: Arc<ParserRegistry>,
    config: ConverterConfig,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            registry: Arc::new(ParserRegistry::new(&config)),
            config,
        }
    }

    /// Use a caller-built registry, e.g. one with a custom [`Parser`] for a key.
    ///
    /// [`Parser`]: crate::parsers::Parser
    pub fn with_registry(config: ConverterConfig, registry: ParserRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Every extension this converter accepts, sorted.
    pub fn supported_formats(&self) -> Vec<&'static str> {
        supported_extensions()
    }

    /// Convert one file and return its Markdown.
    ///
    /// When `output` is given the document is also written there, creating
    /// parent directories and replacing any existing file.
    ///
    /// # Errors
    /// - [`ConvertError::NotFound`] if `input` does not exist
    /// - [`ConvertError::Unsupported`] if its extension has no parser
    /// - [`ConvertError::ParseFailure`] when extraction fails with no fallback
    /// - [`ConvertError::OutputWriteFailed`] if `output` cannot be written
    pub fn convert(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> Result<String, ConvertError> {
        let input = input.as_ref();
        if !input.exists() {
            return Err(ConvertError::NotFound {
                path: input.to_path_buf(),
            });
        }

        let key = detect(input).ok_or_else(|| self.unsupported(input))?;
        let parser = self
            .registry
            .get(key)
            .ok_or_else(|| ConvertError::Internal(format!("No parser registered for '{key}'")))?;

        let start = Instant::now();
        info!("Converting {} ({})", input.display(), parser.file_type_label());
        let parsed = parser.parse(input)?;
        // Cleanup runs on the body only; it would strip the header's hard breaks.
        let mut body = clean_body(&parsed.markdown);
        if body.trim().is_empty() {
            body = format!("{EMPTY_FILE}\n");
        }
        let markdown = parser.add_metadata(&body, input, &parsed.extras);
        debug!(
            "Converted {} in {}ms ({} bytes)",
            input.display(),
            start.elapsed().as_millis(),
            markdown.len()
        );

        if let Some(path) = output {
            write_output(path, &markdown)?;
            info!("Wrote {}", path.display());
        }
        Ok(markdown)
    }

    fn unsupported(&self, input: &Path) -> ConvertError {
        ConvertError::Unsupported {
            path: input.to_path_buf(),
            extension: extension_of(input).unwrap_or_else(|| "(none)".to_string()),
            supported: supported_extensions().join(", "),
        }
    }

    /// Convert every supported file under `input_dir` into `output_dir`.
    ///
    /// The relative directory layout is mirrored and each extension becomes
    /// `.md`. Unsupported files are skipped without an entry. A file that
    /// fails is recorded in the report and the batch carries on.
    ///
    /// # Errors
    /// Only [`ConvertError::NotFound`] when `input_dir` does not exist.
    pub async fn batch_convert(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        recursive: bool,
    ) -> Result<BatchReport, ConvertError> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();
        if !input_dir.exists() {
            return Err(ConvertError::NotFound {
                path: input_dir.to_path_buf(),
            });
        }

        let jobs = collect_jobs(input_dir, output_dir, recursive);
        let total = jobs.len();
        info!(
            "Batch: {} files from {} → {}",
            total,
            input_dir.display(),
            output_dir.display()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let report: BatchReport = stream::iter(jobs.into_iter().map(|(source, destination)| {
            let converter = self.clone();
            async move {
                let result = converter.convert_job(&source, destination).await;
                (source, result)
            }
        }))
        .buffer_unordered(self.config.concurrency)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect();

        let succeeded = report.succeeded();
        info!("Batch complete: {}/{} succeeded", succeeded, total);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, succeeded);
        }
        Ok(report)
    }

    /// Convert one batch entry on the blocking pool, firing progress events.
    async fn convert_job(&self, source: &Path, destination: PathBuf) -> ConversionResult {
        let cb = self.config.progress_callback.clone();
        if let Some(ref cb) = cb {
            cb.on_file_start(source);
        }

        let converter = self.clone();
        let src = source.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            converter
                .convert(&src, Some(destination.as_path()))
                .map(|_| destination)
        })
        .await
        .unwrap_or_else(|e| Err(ConvertError::Internal(format!("Conversion task panicked: {}", e))));

        match &result {
            Ok(dest) => {
                if let Some(ref cb) = cb {
                    cb.on_file_complete(source, dest);
                }
            }
            Err(e) => {
                warn!("Failed to convert {}: {}", source.display(), e);
                if let Some(ref cb) = cb {
                    cb.on_file_error(source, &e.to_string());
                }
            }
        }
        result
    }

    /// Synchronous wrapper around [`Converter::batch_convert`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn batch_convert_sync(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        recursive: bool,
    ) -> Result<BatchReport, ConvertError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.batch_convert(input_dir, output_dir, recursive))
    }
}

/// Supported files under `input_dir` paired with their destinations,
/// in lexicographic path order.
fn collect_jobs(input_dir: &Path, output_dir: &Path, recursive: bool) -> Vec<(PathBuf, PathBuf)> {
    let mut walker = WalkDir::new(input_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut jobs = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let source = entry.path();
        if detect(source).is_none() {
            debug!("Skipping unsupported file {}", source.display());
            continue;
        }
        let relative = source.strip_prefix(input_dir).unwrap_or(source);
        let destination = output_dir.join(relative).with_extension("md");
        jobs.push((source.to_path_buf(), destination));
    }
    jobs
}

/// Write `markdown` to `path` atomically.
///
/// The temp file is uniquely named in the destination directory, so two
/// jobs writing the same destination never share it; the last rename wins.
fn write_output(path: &Path, markdown: &str) -> Result<(), ConvertError> {
    let write_err = |e| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(markdown.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::progress::BatchProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn convert_returns_document_with_header() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "people.csv", "Name,Age\nAlice,30\n");
        let md = Converter::default().convert(&input, None).unwrap();
        assert!(md.starts_with("# People\n\n*Source: people.csv*  \n*Type: CSV*  \n"));
        assert!(md.contains("\n---\n\n| Name | Age |"));
        assert!(md.ends_with("| Alice | 30 |\n"));
    }

    #[test]
    fn convert_writes_output_and_creates_parents() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "a.txt", "hello");
        let out = dir.path().join("nested/deeper/a.md");
        let md = Converter::default().convert(&input, Some(out.as_path())).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), md);
        let names: Vec<_> = std::fs::read_dir(out.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.md")]);
    }

    #[test]
    fn convert_overwrites_existing_output() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "a.txt", "fresh");
        let out = write(dir.path(), "out/a.md", "stale");
        Converter::default().convert(&input, Some(out.as_path())).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.contains("fresh"));
        assert!(!written.contains("stale"));
    }

    #[test]
    fn missing_input_is_not_found() {
        let err = Converter::default()
            .convert("/no/such/file.csv", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "data.xyz", "x");
        let err = Converter::default().convert(&input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        let msg = err.to_string();
        assert!(msg.contains(".xyz"), "{msg}");
        assert!(msg.contains(".csv"), "{msg}");
    }

    #[test]
    fn extensionless_file_reports_none() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "Makefile", "all:");
        let err = Converter::default().convert(&input, None).unwrap_err();
        assert!(err.to_string().contains("'(none)'"));
    }

    #[test]
    fn collect_jobs_mirrors_layout_and_skips_unsupported() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        write(&input, "b.txt", "b");
        write(&input, "a.csv", "x,y\n1,2");
        write(&input, "skip.xyz", "?");
        write(&input, "sub/c.py", "print(1)");
        let out = dir.path().join("out");

        let jobs = collect_jobs(&input, &out, true);
        let dests: Vec<PathBuf> = jobs.iter().map(|(_, d)| d.clone()).collect();
        assert_eq!(
            dests,
            vec![out.join("a.md"), out.join("b.md"), out.join("sub/c.md")]
        );

        let top_only = collect_jobs(&input, &out, false);
        assert_eq!(top_only.len(), 2);
    }

    #[derive(Default)]
    struct Recorder {
        started: AtomicUsize,
        completed: AtomicUsize,
        errors: Mutex<Vec<PathBuf>>,
        batch: Mutex<Option<(usize, usize)>>,
    }

    impl BatchProgressCallback for Recorder {
        fn on_file_start(&self, _source: &Path) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_complete(&self, _source: &Path, _destination: &Path) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_error(&self, source: &Path, _error: &str) {
            self.errors.lock().unwrap().push(source.to_path_buf());
        }
        fn on_batch_complete(&self, total_files: usize, succeeded: usize) {
            *self.batch.lock().unwrap() = Some((total_files, succeeded));
        }
    }

    #[tokio::test]
    async fn batch_records_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        write(&input, "good.txt", "fine");
        let bad = write(&input, "bad.docx", "not a zip archive");
        write(&input, "more.json", "[1, 2]");

        let recorder = Arc::new(Recorder::default());
        let config = ConverterConfig::builder()
            .concurrency(2)
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let report = Converter::new(config)
            .batch_convert(&input, dir.path().join("out"), true)
            .await
            .unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        let failures: Vec<_> = report.failures().map(|(p, _)| p.to_path_buf()).collect();
        assert_eq!(failures, vec![bad.clone()]);

        assert_eq!(recorder.started.load(Ordering::SeqCst), 3);
        assert_eq!(recorder.completed.load(Ordering::SeqCst), 2);
        assert_eq!(*recorder.errors.lock().unwrap(), vec![bad]);
        assert_eq!(*recorder.batch.lock().unwrap(), Some((3, 2)));
    }

    #[tokio::test]
    async fn batch_same_stem_collisions_both_succeed() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        for i in 0..8 {
            write(&input, &format!("d{i}/a.csv"), "k,v\n1,2\n");
            write(&input, &format!("d{i}/a.json"), r#"{"k": 1}"#);
        }

        let config = ConverterConfig::builder().concurrency(8).build().unwrap();
        let report = Converter::new(config)
            .batch_convert(&input, dir.path().join("out"), true)
            .await
            .unwrap();

        assert_eq!(report.len(), 16);
        assert_eq!(report.failed(), 0, "{:?}", report.failures().collect::<Vec<_>>());
        for i in 0..8 {
            let out = dir.path().join(format!("out/d{i}"));
            let names: Vec<_> = std::fs::read_dir(&out)
                .unwrap()
                .map(|e| e.unwrap().file_name())
                .collect();
            assert_eq!(names, vec![std::ffi::OsString::from("a.md")]);
        }
    }

    struct StrictText;

    impl crate::parsers::Parser for StrictText {
        fn parse(&self, path: &Path) -> Result<crate::parsers::ParseOutput, ConvertError> {
            let bytes = std::fs::read(path).map_err(|e| ConvertError::parse_failure(path, e))?;
            String::from_utf8(bytes)
                .map(crate::parsers::ParseOutput::new)
                .map_err(|e| ConvertError::DecodeFailure {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })
        }

        fn file_type_label(&self) -> &'static str {
            "Plain Text"
        }
    }

    #[tokio::test]
    async fn custom_parser_decode_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        let bad = write(&input, "latin.txt", "");
        std::fs::write(&bad, [0x63, 0x61, 0x66, 0xe9]).unwrap();
        write(&input, "ok.txt", "fine");

        let config = ConverterConfig::default();
        let mut registry = ParserRegistry::new(&config);
        registry.register(crate::detect::ParserKey::Text, StrictText);
        let converter = Converter::with_registry(config, registry);

        let err = converter.convert(&bad, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);

        let report = converter
            .batch_convert(&input, dir.path().join("out"), true)
            .await
            .unwrap();
        assert_eq!(report.succeeded(), 1);
        let failures: Vec<_> = report.failures().map(|(_, e)| e.kind()).collect();
        assert_eq!(failures, vec![ErrorKind::DecodeFailure]);
    }

    #[tokio::test]
    async fn batch_on_missing_dir_is_not_found() {
        let err = Converter::default()
            .batch_convert("/no/such/dir", "/tmp/out", true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn batch_convert_sync_runs_without_runtime() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        write(&input, "x.md", "# X");
        let report = Converter::default()
            .batch_convert_sync(&input, dir.path().join("out"), false)
            .unwrap();
        assert_eq!(report.succeeded(), 1);
        assert!(dir.path().join("out/x.md").exists());
    }
}
