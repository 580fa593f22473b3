//! Document load entry points.
//!
//! A load runs two sequential phases on one coordinating task:
//! rasterise every page ([`crate::pipeline::batch`]), then bring them to a
//! common size ([`crate::pipeline::normalize`]). Only an unreadable file or
//! page count aborts the load; individual page failures are collected in
//! [`Document::errors`].

use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::output::{Document, LoadStats};
use crate::pipeline::batch::{convert_pages, report};
use crate::pipeline::input;
use crate::pipeline::normalize::normalize_pages;
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::progress::LoadProgress;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Load a PDF file into uniform page images using pdfium.
///
/// # Returns
/// `Ok(Document)` on success, even if some pages failed (see
/// `document.errors`) or none survived (see [`Document::into_result`]).
///
/// # Errors
/// Returns `Err(ReaderError)` only for fatal errors:
/// - File not found / permission denied / not a PDF
/// - Page count unreadable (corrupt file, missing password)
/// - pdfium could not be bound
pub async fn load_document(
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<Document, ReaderError> {
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(PdfiumRasterizer::new(config));
    load_with(rasterizer, path, config, &LoadProgress::new()).await
}

/// Load a document with a caller-supplied [`Rasterizer`].
///
/// `progress` is raised as batches complete and ends at 100 on success.
pub async fn load_with(
    rasterizer: Arc<dyn Rasterizer>,
    path: impl AsRef<Path>,
    config: &ReaderConfig,
    progress: &LoadProgress,
) -> Result<Document, ReaderError> {
    let result = run_load(rasterizer, path.as_ref(), config, progress).await;
    if let Some(ref cb) = config.callback {
        match &result {
            Ok(doc) => cb.on_load_complete(&doc.stats),
            Err(e) => cb.on_load_failed(e),
        }
    }
    result
}

/// Synchronous wrapper around [`load_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn load_document_sync(
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<Document, ReaderError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReaderError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(load_document(path, config))
}

/// Load PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when the
/// load returns; the returned pages are fully in memory by then.
pub async fn load_document_from_bytes(
    bytes: &[u8],
    config: &ReaderConfig,
) -> Result<Document, ReaderError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ReaderError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ReaderError::Internal(format!("tempfile write: {e}")))?;
    load_document(tmp.path(), config).await
}

/// Read the page count without rendering anything.
pub async fn inspect(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<usize, ReaderError> {
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(PdfiumRasterizer::new(config));
    let path = input::resolve_local(path)?;
    count_pages(rasterizer, &path).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The load itself, without the completion callbacks.
pub(crate) async fn run_load(
    rasterizer: Arc<dyn Rasterizer>,
    path: &Path,
    config: &ReaderConfig,
    progress: &LoadProgress,
) -> Result<Document, ReaderError> {
    let total_start = Instant::now();
    info!("Starting load: {}", path.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    let path = input::resolve_local(path)?;

    // ── Step 2: Page count ───────────────────────────────────────────────
    let total_pages = count_pages(Arc::clone(&rasterizer), &path).await?;
    info!("PDF has {} pages", total_pages);
    if let Some(ref cb) = config.callback {
        cb.on_load_start(total_pages);
    }

    // ── Step 3: Rasterise ────────────────────────────────────────────────
    let convert_start = Instant::now();
    let converted = convert_pages(rasterizer, &path, total_pages, config, progress).await;
    let convert_duration_ms = convert_start.elapsed().as_millis() as u64;
    info!(
        "Converted {}/{} pages in {}ms",
        converted.pages.len(),
        total_pages,
        convert_duration_ms
    );

    // ── Step 4: Normalise ────────────────────────────────────────────────
    let normalize_start = Instant::now();
    let pages = normalize_pages(converted.pages, config, progress).await?;
    let normalize_duration_ms = normalize_start.elapsed().as_millis() as u64;

    report(&config.callback, progress.finish());

    if pages.is_empty() {
        warn!("'{}' produced no usable pages", path.display());
    }

    let (page_width, page_height) = pages
        .first()
        .map(|p| (p.width(), p.height()))
        .unwrap_or((0, 0));

    let stats = LoadStats {
        total_pages,
        loaded_pages: pages.len(),
        failed_pages: converted.errors.len(),
        page_width,
        page_height,
        convert_duration_ms,
        normalize_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Load complete: {}/{} pages at {}x{}, {}ms total",
        stats.loaded_pages, total_pages, page_width, page_height, stats.total_duration_ms
    );

    Ok(Document {
        path,
        pages,
        errors: converted.errors,
        stats,
    })
}

async fn count_pages(rasterizer: Arc<dyn Rasterizer>, path: &Path) -> Result<usize, ReaderError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || rasterizer.page_count(&path))
        .await
        .map_err(|e| ReaderError::Internal(format!("Page count task panicked: {}", e)))?
}
