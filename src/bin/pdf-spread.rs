//! CLI binary for pdf-spread.
//!
//! A terminal presentation layer over the library: maps CLI flags to
//! `ReaderConfig`, shows load progress, then exports spreads or lets the
//! user page through the document from stdin.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_spread::{
    export_spreads, inspect, CanvasSize, LoadStats, PageError, ProgressCallback, Reader,
    ReaderCallback, ReaderConfig, ReaderError, ResampleFilter, Spread,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Terminal progress callback: a percentage bar for the load plus one log
/// line per dropped page.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}%  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_style(progress_style);
        self.bar.set_prefix("Loading");
        self.bar.set_message("");
        self.bar.reset_eta();
    }
}

impl ReaderCallback for CliProgressCallback {
    fn on_load_start(&self, total_pages: usize) {
        self.activate_bar();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_pages} pages…"))
        ));
    }

    fn on_progress(&self, percent: f64) {
        let phase = if percent <= 50.0 { "rasterising" } else { "normalising" };
        self.bar.set_message(phase);
        self.bar.set_position(percent.round() as u64);
    }

    fn on_page_error(&self, error: &PageError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = error.to_string();
        let msg = if msg.chars().count() > 80 {
            let cut: String = msg.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            msg
        };
        self.bar.println(format!("  {} {}", red("✗"), red(&msg)));
    }

    fn on_load_complete(&self, stats: &LoadStats) {
        self.bar.finish_and_clear();
        if stats.failed_pages == 0 {
            eprintln!(
                "{} {} pages loaded at {}x{}",
                green("✔"),
                bold(&stats.loaded_pages.to_string()),
                stats.page_width,
                stats.page_height
            );
        } else {
            eprintln!(
                "{} {}/{} pages loaded  ({} failed)",
                if stats.loaded_pages == 0 {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&stats.loaded_pages.to_string()),
                stats.total_pages,
                red(&stats.failed_pages.to_string()),
            );
        }
    }

    fn on_load_failed(&self, _error: &ReaderError) {
        self.bar.abandon();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Page through a document interactively
  pdf-spread book.pdf

  # Export every spread as a PNG
  pdf-spread book.pdf --export spreads/

  # Large canvas, smaller batches, four workers
  pdf-spread --size large --batch-size 10 --workers 4 book.pdf --export out/

  # Load statistics as JSON
  pdf-spread --json book.pdf

  # Page count only
  pdf-spread --inspect-only book.pdf

INTERACTIVE COMMANDS:
  n, next        next two pages
  p, previous    previous two pages
  s, swap        swap left and right page
  t, shift       shift/unshift the pairing by one page
  q, quit        exit

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Directory (or file) holding libpdfium; system library otherwise
  RUST_LOG          Log filter, e.g. pdf_spread=debug
"#;

/// Render a PDF to uniform page images and browse it two pages at a time.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-spread",
    version,
    about = "Render a PDF to uniform page images and browse it two pages at a time",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write every spread as a PNG into this directory instead of browsing.
    #[arg(short, long, env = "PDF_SPREAD_EXPORT")]
    export: Option<PathBuf>,

    /// Canvas preset: small (800x600), medium (1200x850), large (1280x800).
    #[arg(long, env = "PDF_SPREAD_SIZE", value_enum, default_value = "medium")]
    size: SizeArg,

    /// Custom canvas as WIDTHxHEIGHT; overrides --size.
    #[arg(long, env = "PDF_SPREAD_CANVAS")]
    canvas: Option<String>,

    /// Pages rasterised per batch.
    #[arg(long, env = "PDF_SPREAD_BATCH_SIZE", default_value_t = 40)]
    batch_size: usize,

    /// Pages resized per batch.
    #[arg(long, env = "PDF_SPREAD_RESIZE_BATCH_SIZE", default_value_t = 50)]
    resize_batch_size: usize,

    /// Worker count (default: available parallelism).
    #[arg(short, long, env = "PDF_SPREAD_WORKERS")]
    workers: Option<usize>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF_SPREAD_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Resampling filter used to normalise page sizes.
    #[arg(long, env = "PDF_SPREAD_FILTER", value_enum, default_value = "lanczos3")]
    filter: FilterArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_SPREAD_PASSWORD")]
    password: Option<String>,

    /// Directory (or file) holding libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print load statistics as JSON.
    #[arg(long, env = "PDF_SPREAD_JSON")]
    json: bool,

    /// Print the page count only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_SPREAD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_SPREAD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_SPREAD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SizeArg {
    Small,
    Medium,
    Large,
}

impl From<SizeArg> for CanvasSize {
    fn from(v: SizeArg) -> Self {
        match v {
            SizeArg::Small => CanvasSize::Small,
            SizeArg::Medium => CanvasSize::Medium,
            SizeArg::Large => CanvasSize::Large,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FilterArg {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<FilterArg> for ResampleFilter {
    fn from(v: FilterArg) -> Self {
        match v {
            FilterArg::Nearest => ResampleFilter::Nearest,
            FilterArg::Triangle => ResampleFilter::Triangle,
            FilterArg::CatmullRom => ResampleFilter::CatmullRom,
            FilterArg::Gaussian => ResampleFilter::Gaussian,
            FilterArg::Lanczos3 => ResampleFilter::Lanczos3,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the feedback while loading, so library INFO
    // logs are suppressed unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReaderCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let pages = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;
        if cli.json {
            println!("{}", serde_json::json!({ "pages": pages }));
        } else {
            println!("File:   {}", cli.input.display());
            println!("Pages:  {}", pages);
        }
        return Ok(());
    }

    // ── Load ─────────────────────────────────────────────────────────────
    let reader = Reader::new(config.clone());
    let stats = reader
        .open_document(&cli.input)?
        .await
        .context("Load task failed")?
        .context("Failed to load PDF")?;

    if cli.json {
        let report = serde_json::json!({
            "stats": stats,
            "errors": reader.page_errors(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise stats")?
        );
    } else if !cli.quiet && !show_progress {
        eprintln!(
            "Loaded {}/{} pages in {}ms",
            stats.loaded_pages, stats.total_pages, stats.total_duration_ms
        );
    }

    // ── Export or browse ─────────────────────────────────────────────────
    if let Some(ref dir) = cli.export {
        let document = reader
            .document()
            .context("No document loaded")?;
        let written = export_spreads(&document, dir, config.canvas)
            .await
            .context("Export failed")?;
        if !cli.quiet {
            eprintln!(
                "{} {} spreads  →  {}",
                green("✔"),
                written.len(),
                bold(&dir.display().to_string())
            );
        }
    } else if !cli.json {
        browse(&reader).await?;
    }

    reader.close();
    Ok(())
}

/// Read navigation commands from stdin until `q` or end of input.
async fn browse(reader: &Reader) -> Result<()> {
    print_spread(&reader.current_spread());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let moved = match line.trim().to_lowercase().as_str() {
            "" => continue,
            "n" | "next" => reader.next(),
            "p" | "prev" | "previous" => reader.previous(),
            "s" | "swap" => reader.swap(),
            "t" | "shift" => reader.toggle_shift(),
            "q" | "quit" | "exit" => break,
            other => {
                eprintln!("{} unknown command '{}' (n, p, s, t, q)", red("?"), other);
                continue;
            }
        };
        match moved {
            Some(spread) => print_spread(&spread),
            None => println!("{}", dim("(no change)")),
        }
    }
    Ok(())
}

fn print_spread(spread: &Spread) {
    let side = |page: &Option<Arc<pdf_spread::Page>>| match page {
        Some(p) => format!("source p.{} {}x{}", p.number, p.width(), p.height()),
        None => dim("empty"),
    };
    println!(
        "{}  {}  [{} | {}]",
        bold(&spread.label()),
        if spread.shifted { cyan("shifted") } else { String::new() },
        side(&spread.left),
        side(&spread.right),
    );
}

/// Map CLI args to `ReaderConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReaderConfig> {
    let canvas = match cli.canvas {
        Some(ref spec) => parse_canvas(spec)?,
        None => cli.size.clone().into(),
    };

    let mut builder = ReaderConfig::builder()
        .conversion_batch_size(cli.batch_size)
        .resize_batch_size(cli.resize_batch_size)
        .dpi(cli.dpi)
        .filter(cli.filter.clone().into())
        .canvas(canvas);

    if let Some(n) = cli.workers {
        builder = builder.workers(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--canvas` string (`1600x900`) into `CanvasSize`.
fn parse_canvas(s: &str) -> Result<CanvasSize> {
    let (w, h) = s
        .trim()
        .to_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
        .with_context(|| format!("Canvas must look like WIDTHxHEIGHT, got '{}'", s))?;
    let w: u32 = w.parse().context("Invalid canvas width")?;
    let h: u32 = h.parse().context("Invalid canvas height")?;
    Ok(CanvasSize::Custom(w, h))
}
