//! # pdf-spread
//!
//! Render a PDF as a sequence of equally sized page images and browse them
//! two pages at a time.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      validate the path and the %PDF header
//!  ├─ 2. Count      read the page count (fatal if unreadable)
//!  ├─ 3. Convert    rasterise pages via pdfium in bounded batches  (0–50 %)
//!  ├─ 4. Normalise  resize every page to the smallest common size  (50–100 %)
//!  └─ 5. Paginate   pick the left/right pair for display
//! ```
//!
//! Pages that fail to rasterise are logged and dropped; the rest of the
//! document still loads.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_spread::{Reader, ReaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = Reader::new(ReaderConfig::default());
//!     let stats = reader.open_document("book.pdf")?.await??;
//!     eprintln!("{} pages at {}x{}", stats.loaded_pages, stats.page_width, stats.page_height);
//!
//!     println!("{}", reader.current_spread().label());
//!     while let Some(spread) = reader.next() {
//!         println!("{}", spread.label());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-spread` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! pdfium itself is loaded at runtime: either from
//! [`ReaderConfig::pdfium_library_path`] or from the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod load;
pub mod output;
pub mod pagination;
pub mod pipeline;
pub mod progress;
pub mod reader;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CanvasSize, ReaderConfig, ReaderConfigBuilder, ResampleFilter};
pub use error::{PageError, ReaderError};
pub use load::{inspect, load_document, load_document_from_bytes, load_document_sync, load_with};
pub use output::{Document, LoadStats, Page, Spread};
pub use pagination::Pagination;
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use progress::{LoadProgress, NoopCallback, ProgressCallback, ReaderCallback};
pub use reader::Reader;
pub use view::{compose_spread, export_spreads};
