//! Page rasterisation: the [`Rasterizer`] seam and its pdfium implementation.
//!
//! Every call is a self-contained task: it binds pdfium, opens the document,
//! renders one page and closes everything again. The file is reopened for
//! each page.

use crate::config::ReaderConfig;
use crate::error::{PageError, ReaderError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts pages of a source document into bitmaps.
///
/// Implementations are shared across worker threads, so they must be
/// `Send + Sync`, and a call must not depend on any earlier call.
pub trait Rasterizer: Send + Sync {
    /// Number of pages in the document. Failure aborts the whole load.
    fn page_count(&self, path: &Path) -> Result<usize, ReaderError>;

    /// Render the 1-indexed `page_number`. Failure only drops that page.
    fn rasterize(&self, path: &Path, page_number: usize) -> Result<DynamicImage, PageError>;
}

/// [`Rasterizer`] backed by the pdfium library.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
    password: Option<String>,
    dpi: u32,
    max_rendered_pixels: u32,
}

impl PdfiumRasterizer {
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            library_path: config.pdfium_library_path.clone(),
            password: config.password.clone(),
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
        }
    }

    /// The pixel cap as pdfium expects it; saturates at `i32::MAX`.
    fn pixel_cap(&self) -> i32 {
        i32::try_from(self.max_rendered_pixels).unwrap_or(i32::MAX)
    }

    fn render_config(&self) -> PdfRenderConfig {
        PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .set_maximum_width(self.pixel_cap())
            .set_maximum_height(self.pixel_cap())
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn page_count(&self, path: &Path) -> Result<usize, ReaderError> {
        let pdfium = bind_pdfium(self.library_path.as_deref())?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| classify_open_error(path, password, e))?;

        let total = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total);
        Ok(total)
    }

    fn rasterize(&self, path: &Path, page_number: usize) -> Result<DynamicImage, PageError> {
        let fail = |detail: String| PageError::ConversionFailed {
            page: page_number,
            cause: detail,
        };

        let index = page_number
            .checked_sub(1)
            .ok_or_else(|| fail("page numbers start at 1".into()))?;

        let pdfium = bind_pdfium(self.library_path.as_deref()).map_err(|e| fail(e.to_string()))?;
        let document = pdfium
            .load_pdf_from_file(path, self.password.as_deref())
            .map_err(|e| fail(format!("{:?}", e)))?;

        let pages = document.pages();
        let page = pages
            .get(index as u16)
            .map_err(|e| fail(format!("{:?}", e)))?;

        let bitmap = page
            .render_with_config(&self.render_config())
            .map_err(|e| fail(format!("{:?}", e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_number,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Bind pdfium from `library_path` (a directory or the library file), or
/// from the system library when no path is given.
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, ReaderError> {
    let bindings = match library_path {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
        }
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ReaderError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn classify_open_error(path: &Path, password: Option<&str>, e: PdfiumError) -> ReaderError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            ReaderError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ReaderError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ReaderError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}
