//! Output types: loaded pages, the document, load statistics and spreads.

use crate::error::{PageError, ReaderError};
use crate::pagination::Pagination;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One rasterised page.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-indexed page number in the source document.
    pub number: usize,
    /// The bitmap.
    pub image: DynamicImage,
}

impl Page {
    pub fn new(number: usize, image: DynamicImage) -> Self {
        Self { number, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Statistics about a completed load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages that made it into the document.
    pub loaded_pages: usize,
    /// Pages dropped because conversion failed.
    pub failed_pages: usize,
    /// Common page width after normalisation (0 when empty).
    pub page_width: u32,
    /// Common page height after normalisation (0 when empty).
    pub page_height: u32,
    pub convert_duration_ms: u64,
    pub normalize_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// A loaded document: uniform pages in source order.
///
/// Failed pages are absent from `pages`, so an index into `pages` is not a
/// source page number; use [`Page::number`] for that.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub pages: Vec<Arc<Page>>,
    pub errors: Vec<PageError>,
    pub stats: LoadStats,
}

impl Document {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, index: usize) -> Option<&Arc<Page>> {
        self.pages.get(index)
    }

    /// Select the pair of pages for the given pagination state.
    pub fn spread(&self, pagination: &Pagination) -> Spread {
        Spread::select(&self.pages, pagination)
    }

    /// Treat an empty document as an error.
    pub fn into_result(self) -> Result<Self, ReaderError> {
        if self.pages.is_empty() {
            return Err(ReaderError::EmptyDocument {
                path: self.path,
                total: self.stats.total_pages,
                failed: self.errors.len(),
            });
        }
        Ok(self)
    }
}

/// The pair of pages to display side by side.
///
/// Holds its own references to the bitmaps so the presentation layer can keep
/// them alive for as long as they are on screen.
#[derive(Debug, Clone)]
pub struct Spread {
    pub left_index: usize,
    pub right_index: usize,
    pub shifted: bool,
    /// `None` when `left_index` is outside the loaded range.
    pub left: Option<Arc<Page>>,
    /// `None` when `right_index` is outside the loaded range.
    pub right: Option<Arc<Page>>,
}

impl Spread {
    /// Read both sides defensively: an out-of-range index yields an empty side.
    pub fn select(pages: &[Arc<Page>], pagination: &Pagination) -> Self {
        let (left_index, right_index) = pagination.indices();
        Self {
            left_index,
            right_index,
            shifted: pagination.is_shifted(),
            left: pages.get(left_index).cloned(),
            right: pages.get(right_index).cloned(),
        }
    }

    /// 1-indexed display numbers of the two slots.
    pub fn page_numbers(&self) -> (usize, usize) {
        (self.left_index + 1, self.right_index + 1)
    }

    /// Page counter text, e.g. `"Page 3 and 4"`.
    pub fn label(&self) -> String {
        let (l, r) = self.page_numbers();
        format!("Page {} and {}", l, r)
    }

    pub fn is_blank(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn pages(n: usize) -> Vec<Arc<Page>> {
        (1..=n)
            .map(|i| {
                Arc::new(Page::new(
                    i,
                    DynamicImage::ImageRgba8(RgbaImage::new(4, 6)),
                ))
            })
            .collect()
    }

    #[test]
    fn spread_reads_both_sides() {
        let pages = pages(4);
        let s = Spread::select(&pages, &Pagination::new());
        assert_eq!(s.left.as_ref().map(|p| p.number), Some(1));
        assert_eq!(s.right.as_ref().map(|p| p.number), Some(2));
        assert_eq!(s.label(), "Page 1 and 2");
    }

    #[test]
    fn spread_skips_out_of_range_side() {
        let pages = pages(1);
        let s = Spread::select(&pages, &Pagination::new());
        assert!(s.left.is_some());
        assert!(s.right.is_none());
        assert!(!s.is_blank());
    }

    #[test]
    fn empty_document_spread_is_blank() {
        let s = Spread::select(&[], &Pagination::new());
        assert!(s.is_blank());
        assert_eq!(s.label(), "Page 1 and 2");
    }

    #[test]
    fn into_result_rejects_empty() {
        let doc = Document {
            path: PathBuf::from("a.pdf"),
            pages: Vec::new(),
            errors: vec![PageError::ConversionFailed {
                page: 1,
                cause: "x".into(),
            }],
            stats: LoadStats {
                total_pages: 1,
                failed_pages: 1,
                ..LoadStats::default()
            },
        };
        match doc.into_result() {
            Err(ReaderError::EmptyDocument { total, failed, .. }) => {
                assert_eq!(total, 1);
                assert_eq!(failed, 1);
            }
            other => panic!("expected EmptyDocument, got {other:?}"),
        }
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = LoadStats {
            total_pages: 3,
            loaded_pages: 3,
            page_width: 100,
            page_height: 140,
            ..LoadStats::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"page_width\":100"));
    }
}
