//! Configuration types for loading and viewing a document.
//!
//! All load behaviour is controlled through [`ReaderConfig`], built via its
//! [`ReaderConfigBuilder`]. Batch sizes and pool width used to be implicit
//! constants; they live here with documented defaults so callers and tests
//! can tune them.

use crate::error::ReaderError;
use crate::progress::ProgressCallback;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default number of pages rasterised per batch.
pub const DEFAULT_CONVERSION_BATCH_SIZE: usize = 40;

/// Default number of pages resized per batch.
pub const DEFAULT_RESIZE_BATCH_SIZE: usize = 50;

/// Configuration for loading a document.
///
/// Built via [`ReaderConfig::builder()`] or using [`ReaderConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_spread::ReaderConfig;
///
/// let config = ReaderConfig::builder()
///     .conversion_batch_size(20)
///     .workers(4)
///     .dpi(150)
///     .build()
///     .unwrap();
/// assert_eq!(config.workers, 4);
/// ```
#[derive(Clone)]
pub struct ReaderConfig {
    /// Pages rasterised per batch. Default: 40.
    ///
    /// The coordinator waits for a whole batch before dispatching the next,
    /// so at most one batch of bitmaps is in flight at a time.
    pub conversion_batch_size: usize,

    /// Pages resized per batch during normalisation. Default: 50.
    pub resize_batch_size: usize,

    /// Maximum number of tasks running at once. Default: available parallelism.
    pub workers: usize,

    /// Rendering DPI used when rasterising each page. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// Caps either dimension regardless of DPI so an oversized page cannot
    /// exhaust memory.
    pub max_rendered_pixels: u32,

    /// Directory containing libpdfium, or the library file itself.
    /// If None, the system library is used.
    pub pdfium_library_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Resampling filter used by normalisation. Default: Lanczos3.
    pub filter: ResampleFilter,

    /// Canvas the spread is fitted into for display and export. Default: Medium.
    pub canvas: CanvasSize,

    /// Receiver for load and render events.
    pub callback: Option<ProgressCallback>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            conversion_batch_size: DEFAULT_CONVERSION_BATCH_SIZE,
            resize_batch_size: DEFAULT_RESIZE_BATCH_SIZE,
            workers: default_workers(),
            dpi: 200,
            max_rendered_pixels: 4000,
            pdfium_library_path: None,
            password: None,
            filter: ResampleFilter::default(),
            canvas: CanvasSize::default(),
            callback: None,
        }
    }
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("conversion_batch_size", &self.conversion_batch_size)
            .field("resize_batch_size", &self.resize_batch_size)
            .field("workers", &self.workers)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("filter", &self.filter)
            .field("canvas", &self.canvas)
            .field("callback", &self.callback.as_ref().map(|_| "<dyn ReaderCallback>"))
            .finish()
    }
}

impl ReaderConfig {
    /// Create a new builder for `ReaderConfig`.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Number of worker slots when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Builder for [`ReaderConfig`].
#[derive(Debug)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn conversion_batch_size(mut self, n: usize) -> Self {
        self.config.conversion_batch_size = n;
        self
    }

    pub fn resize_batch_size(mut self, n: usize) -> Self {
        self.config.resize_batch_size = n;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n.max(1);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    /// Longest rendered side in pixels, clamped to `100..=i32::MAX`.
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(100, i32::MAX as u32);
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn filter(mut self, filter: ResampleFilter) -> Self {
        self.config.filter = filter;
        self
    }

    pub fn canvas(mut self, canvas: CanvasSize) -> Self {
        self.config.canvas = canvas;
        self
    }

    pub fn callback(mut self, cb: ProgressCallback) -> Self {
        self.config.callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReaderConfig, ReaderError> {
        let c = &self.config;
        if c.conversion_batch_size == 0 {
            return Err(ReaderError::InvalidConfig(
                "Conversion batch size must be ≥ 1".into(),
            ));
        }
        if c.resize_batch_size == 0 {
            return Err(ReaderError::InvalidConfig(
                "Resize batch size must be ≥ 1".into(),
            ));
        }
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ReaderError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        let (w, h) = c.canvas.dimensions();
        if w < 2 || h == 0 {
            return Err(ReaderError::InvalidConfig(format!(
                "Canvas must be at least 2x1 pixels, got {}x{}",
                w, h
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Resampling filter applied when normalising pages to a common size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    /// Highest quality; the default.
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(f: ResampleFilter) -> Self {
        match f {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Size of the two-page canvas a spread is displayed or exported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CanvasSize {
    /// 800 × 600
    Small,
    /// 1200 × 850 (default)
    #[default]
    Medium,
    /// 1280 × 800
    Large,
    /// Arbitrary width × height.
    Custom(u32, u32),
}

impl CanvasSize {
    /// Full canvas `(width, height)` in pixels; each page gets half the width.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            CanvasSize::Small => (800, 600),
            CanvasSize::Medium => (1200, 850),
            CanvasSize::Large => (1280, 800),
            CanvasSize::Custom(w, h) => (*w, *h),
        }
    }
}
