//! CLI binary for pdf2chunks.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, runs the analysis, and writes the requested artifacts.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2chunks::export::{markdown_report, sections_to_yaml, write_json, write_text, JsonReport};
use pdf2chunks::{
    analyze_file, AnalysisConfig, AnalysisProgress, AzureAnalyzer, ChunkStrategy,
    ProgressCallback,
};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar tick per analyzed sub-document.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Bar length is set by `on_split` once the sub-document count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Splitting PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgress for CliProgress {
    fn on_split(&self, subdocuments: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} parts  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(subdocuments as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Analyzing");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Split into {subdocuments} sub-documents"))
        ));
    }

    fn on_subdocument_start(&self, index: usize, total: usize) {
        self.bar.set_message(format!("part {index}/{total}"));
    }

    fn on_subdocument_complete(&self, index: usize, total: usize, sections: usize) {
        self.bar.println(format!(
            "  {} Part {:>2}/{:<2}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{sections:>4} sections")),
        ));
        self.bar.inc(1);
    }

    fn on_analysis_complete(&self, pages: usize, sections: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages analyzed, {} sections extracted",
            green("✔"),
            bold(&pages.to_string()),
            bold(&sections.to_string()),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze and print the markdown report to stdout
  pdf2chunks document.pdf

  # Write markdown, JSON, and YAML artifacts next to each other
  pdf2chunks document.pdf -o out/ --format all

  # Size-based chunking tuned for an embedding model
  pdf2chunks --strategy size-based --max-chunk-size 2000 --overlap 150 act.pdf

  # Polish-language legal document, 3 pages per sub-document
  pdf2chunks --locale pl-PL --pages-per-chunk 3 ustawa.pdf -o out/

ENVIRONMENT VARIABLES:
  AZURE_DI_ENDPOINT   Azure Document Intelligence endpoint URL
  AZURE_DI_KEY        API key for the endpoint

SETUP:
  1. Create a Document Intelligence resource in the Azure portal.
  2. export AZURE_DI_ENDPOINT=https://<name>.cognitiveservices.azure.com
     export AZURE_DI_KEY=<key>
  3. pdf2chunks document.pdf -o out/
"#;

/// Split, analyze, and chunk PDF documents into retrieval-ready content.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2chunks",
    version,
    about = "Split, analyze, and chunk PDF documents into retrieval-ready content",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write artifacts into this directory instead of printing to stdout.
    #[arg(short, long, env = "PDF2CHUNKS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Artifact format: md, json, yaml, or all.
    #[arg(long, env = "PDF2CHUNKS_FORMAT", value_enum, default_value = "md")]
    format: FormatArg,

    /// Chunking strategy: page-based or size-based.
    #[arg(long, env = "PDF2CHUNKS_STRATEGY", default_value = "page-based")]
    strategy: ChunkStrategy,

    /// Pages per split sub-document / page-based chunk window.
    #[arg(long, env = "PDF2CHUNKS_PAGES_PER_CHUNK", default_value_t = 5)]
    pages_per_chunk: u32,

    /// Character budget per size-based chunk.
    #[arg(long, env = "PDF2CHUNKS_MAX_CHUNK_SIZE", default_value_t = 4000)]
    max_chunk_size: usize,

    /// Overlap characters carried between size-based chunks.
    #[arg(long, env = "PDF2CHUNKS_OVERLAP", default_value_t = 200)]
    overlap: usize,

    /// OCR locale hint, e.g. pl-PL.
    #[arg(long, env = "PDF2CHUNKS_LOCALE")]
    locale: Option<String>,

    /// Analysis model identifier.
    #[arg(long, env = "PDF2CHUNKS_MODEL", default_value = "prebuilt-layout")]
    model: String,

    /// Per-analysis-call timeout in seconds.
    #[arg(long, env = "PDF2CHUNKS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Retries on transient analysis failures.
    #[arg(long, env = "PDF2CHUNKS_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2CHUNKS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2CHUNKS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2CHUNKS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Md,
    Json,
    Yaml,
    All,
}

impl FormatArg {
    fn wants(self, other: FormatArg) -> bool {
        self == other || self == FormatArg::All
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs as user feedback.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = AnalysisConfig::builder()
        .model_id(&cli.model)
        .strategy(cli.strategy)
        .pages_per_chunk(cli.pages_per_chunk)
        .max_chunk_size(cli.max_chunk_size)
        .overlap(cli.overlap)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);
    if let Some(locale) = &cli.locale {
        builder = builder.locale(locale);
    }
    if show_progress {
        let cb = CliProgress::new_dynamic();
        builder = builder.progress(cb as ProgressCallback);
    }
    let config = builder.build();

    let analyzer = AzureAnalyzer::from_env(&config)?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let output = analyze_file(&cli.input, &analyzer, &config)
        .await
        .context("Analysis failed")?;

    // ── Emit artifacts ───────────────────────────────────────────────────
    if let Some(dir) = &cli.output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let stem = artifact_stem(&cli.input);
        let mut written: Vec<PathBuf> = Vec::new();

        if cli.format.wants(FormatArg::Md) {
            let path = dir.join(format!("{stem}_analysis.md"));
            write_text(&path, &markdown_report(&output)).await?;
            written.push(path);
        }
        if cli.format.wants(FormatArg::Json) {
            let path = dir.join(format!("{stem}_analysis.json"));
            let report = JsonReport {
                result: &output.result,
                chunks: &output.chunks,
            };
            write_json(&path, &report).await?;
            written.push(path);
        }
        if cli.format.wants(FormatArg::Yaml) {
            let path = dir.join(format!("{stem}_analysis.yaml"));
            write_text(&path, &sections_to_yaml(&output.result.sections)?).await?;
            written.push(path);
        }

        if !cli.quiet {
            eprintln!(
                "{}  {} pages, {} sections, {} chunks",
                green("✔"),
                output.result.page_count,
                output.result.sections.len(),
                output.chunks.len(),
            );
            for path in written {
                eprintln!("   → {}", bold(&path.display().to_string()));
            }
        }
    } else {
        // Stdout mode: one artifact only; `all` falls back to markdown.
        let text = match cli.format {
            FormatArg::Json => {
                let report = JsonReport {
                    result: &output.result,
                    chunks: &output.chunks,
                };
                serde_json::to_string_pretty(&report).context("Failed to serialize output")?
            }
            FormatArg::Yaml => sections_to_yaml(&output.result.sections)?,
            FormatArg::Md | FormatArg::All => markdown_report(&output),
        };
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if !cli.quiet && !show_progress {
            eprintln!(
                "Analyzed {} pages into {} chunks ({})",
                output.result.page_count,
                output.chunks.len(),
                config.chunking.strategy,
            );
        }
    }

    Ok(())
}

/// File stem for artifact names, `document.pdf` → `document`.
fn artifact_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}
