//! Page normalisation: resize every page to the smallest common size.
//!
//! The target is `(min width, min height)` over the whole set, computed in a
//! single pass before any resizing. Pages are stretched to exactly that size;
//! aspect ratio is not preserved, because the goal is a uniform canvas.
//!
//! Resizing follows the same batch/pool shape as conversion and reports into
//! the upper half of the progress range.

use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::output::Page;
use crate::pipeline::batch::report;
use crate::progress::{LoadProgress, Phase, PhaseCounter};
use futures::stream::{self, StreamExt};
use image::imageops::FilterType;
use std::sync::Arc;
use tracing::{debug, info};

/// Smallest width and smallest height across `pages`, or `None` when empty.
///
/// The two minima may come from different pages.
pub fn target_size(pages: &[Page]) -> Option<(u32, u32)> {
    let width = pages.iter().map(Page::width).min()?;
    let height = pages.iter().map(Page::height).min()?;
    Some((width, height))
}

/// Resize every page to [`target_size`], preserving order.
pub async fn normalize_pages(
    pages: Vec<Page>,
    config: &ReaderConfig,
    progress: &LoadProgress,
) -> Result<Vec<Arc<Page>>, ReaderError> {
    let Some((width, height)) = target_size(&pages) else {
        report(&config.callback, progress.raise_to(Phase::Normalize.percent(0, 0)));
        return Ok(Vec::new());
    };
    info!(
        "Normalising {} pages to {}x{} px",
        pages.len(),
        width,
        height
    );

    let filter: FilterType = config.filter.into();
    let counter = PhaseCounter::new(Phase::Normalize, pages.len());
    let batch_size = config.resize_batch_size.max(1);
    let mut out = Vec::with_capacity(pages.len());
    let mut remaining = pages.into_iter().peekable();

    while remaining.peek().is_some() {
        let batch: Vec<Page> = remaining.by_ref().take(batch_size).collect();
        let batch_len = batch.len();

        let resized: Vec<Result<Page, ReaderError>> = stream::iter(batch.into_iter().map(|page| {
            let number = page.number;
            async move {
                tokio::task::spawn_blocking(move || resize_page(page, width, height, filter))
                    .await
                    .map_err(|e| {
                        ReaderError::Internal(format!("Resize of page {} panicked: {}", number, e))
                    })
            }
        }))
        .buffered(config.workers.max(1))
        .collect()
        .await;

        for page in resized {
            out.push(Arc::new(page?));
        }

        let percent = progress.raise_to(counter.advance(batch_len));
        debug!(
            "Normalised {}/{} pages ({:.1}%)",
            counter.completed(),
            counter.total(),
            percent
        );
        report(&config.callback, percent);
    }

    Ok(out)
}

fn resize_page(page: Page, width: u32, height: u32, filter: FilterType) -> Page {
    if page.width() == width && page.height() == height {
        return page;
    }
    let image = page.image.resize_exact(width, height, filter);
    Page::new(page.number, image)
}
