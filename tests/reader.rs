//! Integration tests for the load pipeline and the reader session.
//!
//! A fake [`Rasterizer`] stands in for pdfium: it produces solid bitmaps of
//! varying sizes, can fail selected pages, and can hold a load open until the
//! test releases it. Documents are temp files with a `%PDF` header so input
//! validation passes.

use pdf_spread::{
    load_with, LoadProgress, LoadStats, PageError, Rasterizer, Reader, ReaderCallback,
    ReaderConfig, ReaderError, Spread,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tempfile::NamedTempFile;

// ── Test helpers ─────────────────────────────────────────────────────────────

struct FakeRasterizer {
    pages: usize,
    failing: Vec<usize>,
    unreadable: bool,
    gate: Option<Arc<AtomicBool>>,
    calls: AtomicUsize,
}

impl FakeRasterizer {
    fn new(pages: usize) -> Self {
        Self {
            pages,
            failing: Vec::new(),
            unreadable: false,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(mut self, pages: &[usize]) -> Self {
        self.failing = pages.to_vec();
        self
    }

    /// Page `n` is `(100 + 7n) x (200 - 3n)` so minima come from different pages.
    fn size_of(n: usize) -> (u32, u32) {
        (100 + 7 * ((n % 5) as u32), 200 - 3 * ((n % 7) as u32))
    }
}

impl Rasterizer for FakeRasterizer {
    fn page_count(&self, path: &Path) -> Result<usize, ReaderError> {
        if self.unreadable {
            return Err(ReaderError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "xref table missing".into(),
            });
        }
        Ok(self.pages)
    }

    fn rasterize(&self, _path: &Path, n: usize) -> Result<DynamicImage, PageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref gate) = self.gate {
            while !gate.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(2));
            }
        }
        if self.failing.contains(&n) {
            return Err(PageError::ConversionFailed {
                page: n,
                cause: "broken content stream".into(),
            });
        }
        let (w, h) = Self::size_of(n);
        let shade = (n % 256) as u8;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            Rgba([shade, shade, shade, 255]),
        )))
    }
}

fn pdf_file() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp file");
    tmp.write_all(b"%PDF-1.7\n%fake\n").expect("write header");
    tmp
}

fn config(batch: usize) -> ReaderConfig {
    ReaderConfig::builder()
        .conversion_batch_size(batch)
        .resize_batch_size(batch)
        .workers(3)
        .build()
        .expect("valid config")
}

#[derive(Default)]
struct Recorder {
    progress: Mutex<Vec<f64>>,
    page_errors: Mutex<Vec<usize>>,
    started: Mutex<Option<usize>>,
    completed: Mutex<Option<LoadStats>>,
    failed: AtomicUsize,
    spreads: Mutex<Vec<String>>,
}

impl ReaderCallback for Recorder {
    fn on_load_start(&self, total_pages: usize) {
        *self.started.lock().unwrap() = Some(total_pages);
    }
    fn on_progress(&self, percent: f64) {
        self.progress.lock().unwrap().push(percent);
    }
    fn on_page_error(&self, error: &PageError) {
        self.page_errors.lock().unwrap().push(error.page());
    }
    fn on_load_complete(&self, stats: &LoadStats) {
        *self.completed.lock().unwrap() = Some(stats.clone());
    }
    fn on_load_failed(&self, _error: &ReaderError) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_spread(&self, spread: &Spread) {
        self.spreads.lock().unwrap().push(spread.label());
    }
}

fn recorded_config(batch: usize) -> (ReaderConfig, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let config = ReaderConfig::builder()
        .conversion_batch_size(batch)
        .resize_batch_size(batch)
        .workers(3)
        .callback(recorder.clone() as Arc<dyn ReaderCallback>)
        .build()
        .expect("valid config");
    (config, recorder)
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn all_pages_load_in_order_with_min_dimensions() {
    let file = pdf_file();
    let fake = Arc::new(FakeRasterizer::new(12));
    let progress = LoadProgress::new();
    let doc = load_with(fake, file.path(), &config(5), &progress)
        .await
        .expect("load succeeds");

    let expected_w = (1..=12).map(|n| FakeRasterizer::size_of(n).0).min().unwrap();
    let expected_h = (1..=12).map(|n| FakeRasterizer::size_of(n).1).min().unwrap();

    assert_eq!(doc.len(), 12);
    let numbers: Vec<usize> = doc.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    for page in &doc.pages {
        assert_eq!((page.width(), page.height()), (expected_w, expected_h));
    }
    assert_eq!(doc.stats.page_width, expected_w);
    assert_eq!(doc.stats.page_height, expected_h);
    assert!(doc.errors.is_empty());
    assert_eq!(progress.percent(), 100.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_failing_page_is_skipped() {
    let file = pdf_file();
    let fake = Arc::new(FakeRasterizer::new(6).failing(&[4]));
    let (config, recorder) = recorded_config(4);
    let doc = load_with(fake, file.path(), &config, &LoadProgress::new())
        .await
        .expect("load succeeds");

    let numbers: Vec<usize> = doc.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 5, 6]);
    assert_eq!(doc.stats.total_pages, 6);
    assert_eq!(doc.stats.loaded_pages, 5);
    assert_eq!(doc.stats.failed_pages, 1);
    assert_eq!(*recorder.page_errors.lock().unwrap(), vec![4]);
    assert_eq!(*recorder.started.lock().unwrap(), Some(6));
    assert!(recorder.completed.lock().unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn progress_is_monotonic_and_ends_at_100() {
    let file = pdf_file();
    let fake = Arc::new(FakeRasterizer::new(23).failing(&[7, 8]));
    let (config, recorder) = recorded_config(4);
    load_with(fake, file.path(), &config, &LoadProgress::new())
        .await
        .expect("load succeeds");

    let seen = recorder.progress.lock().unwrap().clone();
    assert!(!seen.is_empty());
    assert!(
        seen.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {seen:?}"
    );
    assert!(seen.iter().any(|&p| p == 50.0), "conversion should end at 50: {seen:?}");
    assert_eq!(*seen.last().unwrap(), 100.0);
}

#[tokio::test]
async fn all_pages_failing_gives_empty_document() {
    let file = pdf_file();
    let fake = Arc::new(FakeRasterizer::new(3).failing(&[1, 2, 3]));
    let progress = LoadProgress::new();
    let doc = load_with(fake, file.path(), &config(40), &progress)
        .await
        .expect("an empty load is still a load");

    assert!(doc.is_empty());
    assert_eq!(doc.errors.len(), 3);
    assert_eq!(progress.percent(), 100.0);
    assert!(matches!(
        doc.into_result(),
        Err(ReaderError::EmptyDocument { total: 3, failed: 3, .. })
    ));
}

#[tokio::test]
async fn zero_page_document_loads_empty() {
    let file = pdf_file();
    let fake = Arc::new(FakeRasterizer::new(0));
    let progress = LoadProgress::new();
    let doc = load_with(fake.clone(), file.path(), &config(40), &progress)
        .await
        .expect("load succeeds");
    assert!(doc.is_empty());
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    assert_eq!(progress.percent(), 100.0);
}

#[tokio::test]
async fn unreadable_page_count_aborts_load() {
    let file = pdf_file();
    let mut fake = FakeRasterizer::new(5);
    fake.unreadable = true;
    let (config, recorder) = recorded_config(40);
    let err = load_with(Arc::new(fake), file.path(), &config, &LoadProgress::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::CorruptPdf { .. }));
    assert_eq!(recorder.failed.load(Ordering::SeqCst), 1);
    assert!(recorder.completed.lock().unwrap().is_none());
}

#[tokio::test]
async fn non_pdf_input_rejected_before_rasterising() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"PK\x03\x04zip").unwrap();
    let fake = Arc::new(FakeRasterizer::new(3));
    let err = load_with(fake.clone(), file.path(), &config(40), &LoadProgress::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::NotAPdf { .. }));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}

// ── Reader session ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reader_navigates_ten_pages() {
    let file = pdf_file();
    let (config, recorder) = recorded_config(4);
    let reader = Reader::with_rasterizer(Arc::new(FakeRasterizer::new(10)), config);

    let stats = reader
        .open_document(file.path())
        .expect("load starts")
        .await
        .expect("task joins")
        .expect("load succeeds");
    assert_eq!(stats.loaded_pages, 10);
    assert!(!reader.is_loading());
    assert_eq!(reader.progress_percent(), 100.0);
    assert_eq!(reader.pagination().indices(), (0, 1));

    for _ in 0..4 {
        assert!(reader.next().is_some());
    }
    assert_eq!(reader.pagination().indices(), (8, 9));
    assert!(reader.next().is_none());

    let spread = reader.current_spread();
    assert_eq!(spread.left.as_ref().map(|p| p.number), Some(9));
    assert_eq!(spread.right.as_ref().map(|p| p.number), Some(10));
    assert_eq!(spread.label(), "Page 9 and 10");

    let labels = recorder.spreads.lock().unwrap().clone();
    assert_eq!(labels.first().map(String::as_str), Some("Page 1 and 2"));
    assert_eq!(labels.last().map(String::as_str), Some("Page 9 and 10"));
    assert_eq!(labels.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reader_swap_and_shift() {
    let file = pdf_file();
    let reader = Reader::with_rasterizer(Arc::new(FakeRasterizer::new(6)), config(40));
    reader
        .open_document(file.path())
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    let swapped = reader.swap().expect("swap applies");
    assert_eq!(swapped.left.as_ref().map(|p| p.number), Some(2));
    assert_eq!(swapped.right.as_ref().map(|p| p.number), Some(1));
    reader.swap();
    assert_eq!(reader.pagination().indices(), (0, 1));

    let shifted = reader.toggle_shift().expect("shift applies");
    assert!(shifted.shifted);
    assert_eq!(shifted.label(), "Page 2 and 3");
    reader.toggle_shift().expect("unshift applies");
    assert_eq!(reader.pagination().indices(), (0, 1));
    assert!(!reader.pagination().is_shifted());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reader_refuses_second_load_while_loading() {
    let file = pdf_file();
    let gate = Arc::new(AtomicBool::new(false));
    let mut fake = FakeRasterizer::new(4);
    fake.gate = Some(gate.clone());
    let reader = Reader::with_rasterizer(Arc::new(fake), config(40));

    let handle = reader.open_document(file.path()).expect("first load starts");
    assert!(reader.is_loading());
    assert!(matches!(
        reader.open_document(file.path()),
        Err(ReaderError::LoadInProgress)
    ));
    assert!(reader.next().is_none(), "nothing to navigate mid-load");
    assert!(reader.current_spread().is_blank());

    gate.store(true, Ordering::SeqCst);
    handle.await.unwrap().unwrap();
    assert!(!reader.is_loading());
    assert_eq!(reader.page_count(), 4);

    // A second load is accepted now and starts from a clean slate.
    reader.next();
    let second = reader.open_document(file.path()).expect("second load starts");
    assert_eq!(reader.pagination().indices(), (0, 1));
    second.await.unwrap().unwrap();
    assert_eq!(reader.page_count(), 4);
}

#[tokio::test]
async fn reader_failed_load_reports_and_unlocks() {
    let file = pdf_file();
    let mut fake = FakeRasterizer::new(3);
    fake.unreadable = true;
    let (config, recorder) = recorded_config(40);
    let reader = Reader::with_rasterizer(Arc::new(fake), config);

    let result = reader.open_document(file.path()).unwrap().await.unwrap();
    assert!(matches!(result, Err(ReaderError::CorruptPdf { .. })));
    assert!(!reader.is_loading());
    assert_eq!(recorder.failed.load(Ordering::SeqCst), 1);
    assert_eq!(reader.page_count(), 0);
}

#[tokio::test]
async fn reader_with_empty_document_is_inert() {
    let file = pdf_file();
    let reader = Reader::with_rasterizer(Arc::new(FakeRasterizer::new(0)), config(40));
    reader
        .open_document(file.path())
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    assert!(reader.next().is_none());
    assert!(reader.previous().is_none());
    assert!(reader.swap().is_none());
    assert!(reader.toggle_shift().is_none());
    let spread = reader.current_spread();
    assert!(spread.is_blank());
    assert_eq!(spread.label(), "Page 1 and 2");
}

#[test]
fn open_document_outside_runtime_is_an_error() {
    let file = pdf_file();
    let reader = Reader::with_rasterizer(Arc::new(FakeRasterizer::new(2)), config(40));
    assert!(matches!(
        reader.open_document(file.path()),
        Err(ReaderError::Internal(_))
    ));
    assert!(!reader.is_loading());
}

#[tokio::test]
async fn close_drops_document() {
    let file = pdf_file();
    let reader = Reader::with_rasterizer(Arc::new(FakeRasterizer::new(4)), config(40));
    reader
        .open_document(file.path())
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    reader.next();
    reader.close();
    assert_eq!(reader.page_count(), 0);
    assert_eq!(reader.pagination().indices(), (0, 1));
    assert!(reader.document_path().is_none());
}

/// Closes the reader from inside the load, once all pages are done.
#[derive(Default)]
struct CloseAtFinish {
    reader: OnceLock<Arc<Reader>>,
    failures: Mutex<Vec<String>>,
}

impl ReaderCallback for CloseAtFinish {
    fn on_progress(&self, percent: f64) {
        if percent >= 100.0 {
            if let Some(reader) = self.reader.get() {
                reader.close();
            }
        }
    }
    fn on_load_failed(&self, error: &ReaderError) {
        self.failures.lock().unwrap().push(error.to_string());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_after_last_await_keeps_document_out() {
    let file = pdf_file();
    let closer = Arc::new(CloseAtFinish::default());
    let config = ReaderConfig::builder()
        .workers(2)
        .callback(closer.clone() as Arc<dyn ReaderCallback>)
        .build()
        .unwrap();
    let reader = Arc::new(Reader::with_rasterizer(
        Arc::new(FakeRasterizer::new(4)),
        config,
    ));
    assert!(closer.reader.set(Arc::clone(&reader)).is_ok());

    let outcome = reader.open_document(file.path()).unwrap().await;
    if let Ok(result) = outcome {
        assert!(matches!(result, Err(ReaderError::LoadCancelled)));
        assert_eq!(closer.failures.lock().unwrap().len(), 1);
    }
    assert_eq!(reader.page_count(), 0);
    assert!(reader.document_path().is_none());
    assert!(reader.current_spread().is_blank());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn newer_load_wins_over_closed_one() {
    let file = pdf_file();
    let reader = Reader::with_rasterizer(Arc::new(FakeRasterizer::new(4)), config(40));
    reader
        .open_document(file.path())
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    reader.close();

    let stats = reader
        .open_document(file.path())
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.loaded_pages, 4);
    assert_eq!(reader.page_count(), 4);
}
