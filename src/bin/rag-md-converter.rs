//! CLI binary for rag-md-converter.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConverterConfig`, prints results and maps failures to exit codes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rag_md_converter::{
    BatchProgressCallback, BatchReport, Converter, ConverterConfig, ProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar for `batch-convert`. Failures are printed above the bar
/// as they happen; files may finish out of order when `--concurrency` > 1.
/// The closing count comes from [`print_summary`].
struct CliBatchProgress {
    bar: ProgressBar,
}

impl CliBatchProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");

        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliBatchProgress {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_file_start(&self, source: &Path) {
        if let Some(name) = source.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }

    fn on_file_complete(&self, _source: &Path, _destination: &Path) {
        self.bar.inc(1);
    }

    fn on_file_error(&self, source: &Path, error: &str) {
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            source.display(),
            dim(error)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_files: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print Markdown to stdout
  rag-md-converter convert report.pdf

  # Convert to a file
  rag-md-converter convert data.csv -o out/data.md

  # Convert a whole tree, mirroring its layout
  rag-md-converter batch-convert docs/ -o markdown/

  # Top level only, four files at a time, JSON report
  rag-md-converter batch-convert docs/ -o markdown/ --no-recursive -c 4 --json

  # Show every supported extension
  rag-md-converter list-formats

ENVIRONMENT VARIABLES:
  RUST_LOG              Override log filter (e.g. rag_md_converter=debug)
  RAGMD_CSV_MAX_ROWS    CSV table row cap (default 500)
  RAGMD_JSON_MAX_ROWS   JSON table row cap (default 200)
  RAGMD_CONCURRENCY     Files converted at once by batch-convert (default 1)
  PDFIUM_LIB_PATH       Path to libpdfium (file or directory) for PDF input
"#;

/// Convert documents to RAG-ready Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "rag-md-converter",
    version,
    about = "Convert PDF, DOCX, HTML, CSV, JSON, code and text files to Markdown for RAG",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RAGMD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RAGMD_QUIET")]
    quiet: bool,

    /// Maximum CSV rows rendered before the table is truncated.
    #[arg(long, global = true, env = "RAGMD_CSV_MAX_ROWS", default_value_t = 500,
          value_parser = clap::value_parser!(u64).range(1..))]
    csv_max_rows: u64,

    /// Maximum rows of a JSON array-of-objects table.
    #[arg(long, global = true, env = "RAGMD_JSON_MAX_ROWS", default_value_t = 200,
          value_parser = clap::value_parser!(u64).range(1..))]
    json_max_rows: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a single file.
    Convert {
        /// File to convert.
        input: PathBuf,

        /// Write Markdown to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert every supported file in a directory.
    BatchConvert {
        /// Directory to read from.
        input_dir: PathBuf,

        /// Directory to write `.md` files into.
        #[arg(short, long)]
        output: PathBuf,

        /// Only convert files directly inside INPUT_DIR.
        #[arg(long)]
        no_recursive: bool,

        /// Number of files converted at once.
        #[arg(short, long, env = "RAGMD_CONCURRENCY", default_value_t = 1)]
        concurrency: usize,

        /// Print the batch report as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Disable progress bar.
        #[arg(long, env = "RAGMD_NO_PROGRESS")]
        no_progress: bool,
    },

    /// List supported file extensions.
    ListFormats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces per-file log lines, so only errors are shown
    // while it is active.
    let show_progress = matches!(
        cli.command,
        Command::BatchConvert { json: false, no_progress: false, .. }
    ) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli, show_progress).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, show_progress: bool) -> Result<ExitCode> {
    match cli.command {
        Command::Convert { ref input, ref output } => {
            let converter = Converter::new(build_config(&cli, 1, None)?);
            let markdown = converter.convert(input, output.as_deref())?;

            match output {
                Some(path) => {
                    if !cli.quiet {
                        println!("Converted → {}", path.display());
                    }
                }
                None => {
                    io::stdout()
                        .lock()
                        .write_all(markdown.as_bytes())
                        .context("Failed to write to stdout")?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::BatchConvert {
            ref input_dir,
            ref output,
            no_recursive,
            concurrency,
            json,
            ..
        } => {
            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliBatchProgress::new() as Arc<dyn BatchProgressCallback>)
            } else {
                None
            };
            let converter = Converter::new(build_config(&cli, concurrency, progress)?);
            let report = converter
                .batch_convert(input_dir, output, !no_recursive)
                .await?;

            if json {
                let out =
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
                println!("{out}");
            } else {
                // The bar already listed each failure as it happened.
                print_summary(&report, cli.quiet, show_progress);
            }

            Ok(if report.failed() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::ListFormats => {
            println!("Supported file extensions:");
            for ext in rag_md_converter::supported_extensions() {
                println!("  {ext}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_summary(report: &BatchReport, quiet: bool, failures_shown: bool) {
    if !failures_shown {
        for line in failure_lines(report) {
            eprintln!("{line}");
        }
    }
    if !quiet || report.failed() > 0 {
        println!("{}", summary_line(report));
    }
}

fn failure_lines(report: &BatchReport) -> Vec<String> {
    report
        .failures()
        .map(|(source, error)| format!("  FAIL {}: {}", source.display(), error))
        .collect()
}

fn summary_line(report: &BatchReport) -> String {
    format!(
        "Done: {} converted, {} failed",
        report.succeeded(),
        report.failed()
    )
}

/// Map CLI args to `ConverterConfig`.
fn build_config(
    cli: &Cli,
    concurrency: usize,
    progress: Option<ProgressCallback>,
) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder()
        .csv_max_rows(cli.csv_max_rows as usize)
        .json_max_rows(cli.json_max_rows as usize)
        .concurrency(concurrency);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_md_converter::ConvertError;

    fn report() -> BatchReport {
        let mut report = BatchReport::new();
        report.insert(PathBuf::from("in/a.txt"), Ok(PathBuf::from("out/a.md")));
        report.insert(
            PathBuf::from("in/b.docx"),
            Err(ConvertError::ParseFailure {
                path: PathBuf::from("in/b.docx"),
                detail: "not a zip".into(),
            }),
        );
        report
    }

    #[test]
    fn summary_counts_once() {
        assert_eq!(summary_line(&report()), "Done: 1 converted, 1 failed");
    }

    #[test]
    fn failure_lines_name_each_source() {
        let lines = failure_lines(&report());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("  FAIL in/b.docx: "), "{}", lines[0]);
    }

    #[test]
    fn cli_parses_batch_flags() {
        let cli = Cli::try_parse_from([
            "rag-md-converter",
            "batch-convert",
            "docs",
            "-o",
            "md",
            "--no-recursive",
            "-c",
            "4",
        ])
        .unwrap();
        match cli.command {
            Command::BatchConvert { no_recursive, concurrency, .. } => {
                assert!(no_recursive);
                assert_eq!(concurrency, 4);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
