//! Pipeline stages for loading a document.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ batch ──▶ normalize
//! (path)    (pdfium)   (pool)    (min size)
//! ```
//!
//! 1. [`input`]    : validate the user-supplied path before pdfium sees it
//! 2. [`render`]   : the [`render::Rasterizer`] seam and its pdfium backend
//! 3. [`batch`]    : rasterise every page in bounded, ordered batches;
//!    progress 0–50 %
//! 4. [`normalize`]: resize all pages to the smallest common size;
//!    progress 50–100 %

pub mod batch;
pub mod input;
pub mod normalize;
pub mod render;
