//! Input validation: make sure the path names a readable PDF.
//!
//! Checking the `%PDF` magic bytes up front gives callers a meaningful error
//! instead of a pdfium failure for every page.

use crate::error::ReaderError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local file path and return it as an owned path.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, ReaderError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(ReaderError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ReaderError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReaderError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ReaderError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
