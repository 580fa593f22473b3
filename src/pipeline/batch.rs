//! Batched, bounded-parallel conversion of every page of a document.
//!
//! ## Scheduling
//!
//! Page numbers `1..=total` are cut into batches of
//! [`ReaderConfig::conversion_batch_size`]. Each batch is fanned out to
//! Tokio's blocking pool with at most [`ReaderConfig::workers`] tasks in
//! flight, and the coordinator waits for the whole batch before starting the
//! next one. Peak memory is therefore bounded by one batch of bitmaps.
//!
//! `buffered` (not `buffer_unordered`) yields results in submission order,
//! so every result lands in its page's slot regardless of which task
//! finishes first.
//!
//! ## Failures
//!
//! A page that fails (error or panic) becomes a [`PageError`] and is left out
//! of the output; the batch and the pipeline carry on.

use crate::config::ReaderConfig;
use crate::error::PageError;
use crate::output::Page;
use crate::pipeline::render::Rasterizer;
use crate::progress::{LoadProgress, Phase, PhaseCounter, ProgressCallback};
use futures::stream::{self, StreamExt};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pages that converted, in source order, plus the ones that did not.
#[derive(Debug, Default)]
pub struct ConvertedPages {
    pub pages: Vec<Page>,
    pub errors: Vec<PageError>,
}

/// Split `1..=total` into consecutive inclusive ranges of at most `size` pages.
pub fn page_batches(total: usize, size: usize) -> Vec<RangeInclusive<usize>> {
    let size = size.max(1);
    (1..=total)
        .step_by(size)
        .map(|start| start..=start.saturating_add(size - 1).min(total))
        .collect()
}

/// Rasterise every page of `path`, batch by batch.
pub async fn convert_pages(
    rasterizer: Arc<dyn Rasterizer>,
    path: &Path,
    total_pages: usize,
    config: &ReaderConfig,
    progress: &LoadProgress,
) -> ConvertedPages {
    let counter = PhaseCounter::new(Phase::Convert, total_pages);
    let mut out = ConvertedPages {
        pages: Vec::with_capacity(total_pages),
        errors: Vec::new(),
    };

    for batch in page_batches(total_pages, config.conversion_batch_size) {
        let batch_len = batch.clone().count();
        let results = run_batch(&rasterizer, path, batch.clone(), config.workers).await;

        for (page_number, result) in batch.zip(results) {
            match result {
                Ok(image) => out.pages.push(Page::new(page_number, image)),
                Err(e) => {
                    warn!("Dropping page {}: {}", page_number, e);
                    if let Some(ref cb) = config.callback {
                        cb.on_page_error(&e);
                    }
                    out.errors.push(e);
                }
            }
        }

        let percent = progress.raise_to(counter.advance(batch_len));
        debug!(
            "Converted {}/{} pages ({:.1}%)",
            counter.completed(),
            total_pages,
            percent
        );
        report(&config.callback, percent);
    }

    // An empty document has no batches but the phase is still complete.
    if total_pages == 0 {
        report(&config.callback, progress.raise_to(Phase::Convert.percent(0, 0)));
    }

    out
}

/// Convert one batch; results come back in page order.
async fn run_batch(
    rasterizer: &Arc<dyn Rasterizer>,
    path: &Path,
    batch: RangeInclusive<usize>,
    workers: usize,
) -> Vec<Result<image::DynamicImage, PageError>> {
    stream::iter(batch.map(|page_number| {
        let rasterizer = Arc::clone(rasterizer);
        let path: PathBuf = path.to_path_buf();
        async move {
            tokio::task::spawn_blocking(move || rasterizer.rasterize(&path, page_number))
                .await
                .unwrap_or_else(|e| {
                    Err(PageError::ConversionFailed {
                        page: page_number,
                        cause: format!("worker panicked: {}", e),
                    })
                })
        }
    }))
    .buffered(workers.max(1))
    .collect()
    .await
}

pub(crate) fn report(callback: &Option<ProgressCallback>, percent: f64) {
    if let Some(ref cb) = callback {
        cb.on_progress(percent);
    }
}
