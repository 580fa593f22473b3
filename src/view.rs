//! Display helpers: fit pages into a canvas and export spreads as images.
//!
//! The canvas is split into two equal halves. Each page is scaled into its
//! half with its aspect ratio preserved and anchored at the top-left corner
//! of that half, on a white background.

use crate::config::CanvasSize;
use crate::error::ReaderError;
use crate::output::{Document, Page, Spread};
use crate::pagination::Pagination;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Size an `(width, height)` image takes when fitted into `(max_w, max_h)`.
///
/// Uses `min(max_w / width, max_h / height)` as the scale; never returns a
/// zero dimension.
pub fn fit_dimensions(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let ratio = f64::min(max_w as f64 / width as f64, max_h as f64 / height as f64);
    let w = ((width as f64 * ratio) as u32).max(1);
    let h = ((height as f64 * ratio) as u32).max(1);
    (w, h)
}

/// Scale a page to fit inside `(max_w, max_h)`.
pub fn fit_page(page: &Page, max_w: u32, max_h: u32) -> DynamicImage {
    let (w, h) = fit_dimensions(page.width(), page.height(), max_w, max_h);
    page.image.resize_exact(w, h, FilterType::Lanczos3)
}

/// Draw both sides of `spread` onto one canvas.
///
/// A missing side leaves its half blank.
pub fn compose_spread(spread: &Spread, canvas: CanvasSize) -> RgbaImage {
    let (width, height) = canvas.dimensions();
    let half = width / 2;
    let mut out = RgbaImage::from_pixel(width, height, BACKGROUND);

    for (side, x) in [(&spread.left, 0i64), (&spread.right, half as i64)] {
        if let Some(page) = side {
            let fitted = fit_page(page, half, height).to_rgba8();
            imageops::overlay(&mut out, &fitted, x, 0);
        }
    }
    out
}

/// File name of the `n`-th exported spread (1-indexed).
pub fn spread_file_name(n: usize) -> String {
    format!("spread-{:03}.png", n)
}

/// Write every spread of `document`, from the first pair onwards, as a PNG in
/// `dir`. Returns the written paths in order.
///
/// Spreads are visited the way a reader would: start at `(0, 1)` and call
/// `next` until it refuses. Each file is written to a temporary name and then
/// renamed so a partial image is never left behind.
pub async fn export_spreads(
    document: &Document,
    dir: impl AsRef<Path>,
    canvas: CanvasSize,
) -> Result<Vec<PathBuf>, ReaderError> {
    let dir = dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ReaderError::OutputWriteFailed {
            path: dir.clone(),
            source: e,
        })?;

    let mut pagination = Pagination::new();
    let mut spreads = vec![document.spread(&pagination)];
    while pagination.next(document.len()) {
        spreads.push(document.spread(&pagination));
    }
    if document.is_empty() {
        spreads.clear();
    }

    let mut written = Vec::with_capacity(spreads.len());
    for (i, spread) in spreads.into_iter().enumerate() {
        let path = dir.join(spread_file_name(i + 1));
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_spread(&spread, canvas, &target))
            .await
            .map_err(|e| ReaderError::Internal(format!("Export task panicked: {}", e)))??;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    info!("Exported {} spreads to {}", written.len(), dir.display());
    Ok(written)
}

fn write_spread(spread: &Spread, canvas: CanvasSize, path: &Path) -> Result<(), ReaderError> {
    let image = compose_spread(spread, canvas);
    let tmp_path = path.with_extension("png.tmp");

    image
        .save_with_format(&tmp_path, ImageFormat::Png)
        .map_err(|e| ReaderError::ImageEncodeFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    std::fs::rename(&tmp_path, path).map_err(|e| ReaderError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
