//! Error types for the pdf-spread library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReaderError`]: **Fatal**: the document cannot be loaded at all
//!   (missing file, unreadable page count, pdfium not available). Returned as
//!   `Err(ReaderError)` from the `load_*` functions and reported through
//!   [`crate::progress::ReaderCallback::on_load_failed`].
//!
//! * [`PageError`]: **Non-fatal**: a single page failed to rasterise but the
//!   rest of the document is fine. Collected in
//!   [`crate::output::Document::errors`]; the page is dropped from the
//!   sequence and the load continues.
//!
//! An empty document is not a failure of the load itself. Callers that want
//! to treat it as one use [`crate::output::Document::into_result`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-spread library.
#[derive(Debug, Error)]
pub enum ReaderError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The page count could not be read; nothing can be loaded.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The load finished but produced no usable pages.
    ///
    /// Only returned by [`crate::output::Document::into_result`].
    #[error("'{path}' produced no pages ({failed} of {total} failed to render)")]
    EmptyDocument {
        path: PathBuf,
        total: usize,
        failed: usize,
    },

    // ── Session errors ────────────────────────────────────────────────────
    /// `open_document` was called while a previous load is still running.
    #[error("A document is already loading; wait for it to finish before opening another")]
    LoadInProgress,

    /// The reader was closed, or a newer load started, before this load
    /// could install its document.
    #[error("Load cancelled: the reader was closed before the document was installed")]
    LoadCancelled,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an exported spread image.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode an exported spread image.
    #[error("Failed to encode image '{path}': {source}")]
    ImageEncodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, or set PDFIUM_LIB_PATH to the\n\
directory (or file) holding an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Rasterisation of the page failed or its worker panicked.
    #[error("Page {page}: conversion failed: {cause}")]
    ConversionFailed { page: usize, cause: String },
}

impl PageError {
    /// 1-indexed source page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ConversionFailed { page, .. } => *page,
        }
    }
}
