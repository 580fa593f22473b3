//! Load progress bookkeeping and the event-callback trait.
//!
//! Progress is split into two phases that each own half of the 0–100 range:
//! conversion maps to `[0, 50]` and normalisation to `[50, 100]`. Each phase
//! counts completed units in a [`PhaseCounter`]; the coordinator advances it
//! once per finished batch and publishes the resulting percentage into the
//! shared [`LoadProgress`].
//!
//! Inject an [`Arc<dyn ReaderCallback>`] via
//! [`crate::config::ReaderConfigBuilder::callback`] to receive events.
//!
//! # Example
//!
//! ```rust
//! use pdf_spread::{ReaderCallback, ReaderConfig};
//! use std::sync::{Arc, Mutex};
//!
//! struct Recorder {
//!     seen: Mutex<Vec<f64>>,
//! }
//!
//! impl ReaderCallback for Recorder {
//!     fn on_progress(&self, percent: f64) {
//!         self.seen.lock().unwrap().push(percent);
//!     }
//! }
//!
//! let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
//! let config = ReaderConfig::builder()
//!     .callback(recorder as Arc<dyn ReaderCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::{PageError, ReaderError};
use crate::output::{LoadStats, Spread};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Events emitted by a load and by navigation.
///
/// Implementations must be `Send + Sync`: load events fire from the
/// coordinating task, render events from whichever thread navigates. All
/// methods default to no-ops.
pub trait ReaderCallback: Send + Sync {
    /// Called once the page count is known, before any page is rasterised.
    fn on_load_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after every batch with the overall percentage (0–100).
    fn on_progress(&self, percent: f64) {
        let _ = percent;
    }

    /// Called for every page dropped from the document.
    fn on_page_error(&self, error: &PageError) {
        let _ = error;
    }

    /// Called once the document is installed and navigation may resume.
    fn on_load_complete(&self, stats: &LoadStats) {
        let _ = stats;
    }

    /// Called when the load aborted before producing a document.
    fn on_load_failed(&self, error: &ReaderError) {
        let _ = error;
    }

    /// Called whenever the displayed pair should be (re)drawn.
    fn on_spread(&self, spread: &Spread) {
        let _ = spread;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopCallback;

impl ReaderCallback for NoopCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReaderConfig`].
pub type ProgressCallback = Arc<dyn ReaderCallback>;

/// A load phase and the slice of the percentage range it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Convert,
    Normalize,
}

impl Phase {
    /// Lower bound of this phase's range.
    pub fn start(self) -> f64 {
        match self {
            Phase::Convert => 0.0,
            Phase::Normalize => 50.0,
        }
    }

    /// Map `completed / total` into this phase's range.
    ///
    /// A phase with no work is complete by definition.
    pub fn percent(self, completed: usize, total: usize) -> f64 {
        let fraction = if total == 0 {
            1.0
        } else {
            (completed.min(total) as f64) / (total as f64)
        };
        self.start() + fraction * 50.0
    }
}

/// Completed units of work for one phase.
#[derive(Debug)]
pub struct PhaseCounter {
    phase: Phase,
    completed: AtomicUsize,
    total: usize,
}

impl PhaseCounter {
    pub fn new(phase: Phase, total: usize) -> Self {
        Self {
            phase,
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Record `n` more completed units; returns the phase percentage.
    pub fn advance(&self, n: usize) -> f64 {
        let done = self.completed.fetch_add(n, Ordering::SeqCst) + n;
        self.phase.percent(done, self.total)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst).min(self.total)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Overall percentage for the current load.
///
/// Stored as `f64` bits. For non-negative floats the bit pattern orders the
/// same way as the value, so `fetch_max` keeps the percentage monotonic.
#[derive(Debug, Default)]
pub struct LoadProgress {
    bits: AtomicU64,
}

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current percentage, 0–100.
    pub fn percent(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }

    /// Raise the percentage to `percent`; lower values are ignored.
    /// Returns the value now stored.
    pub fn raise_to(&self, percent: f64) -> f64 {
        let clamped = percent.clamp(0.0, 100.0);
        let prev = self.bits.fetch_max(clamped.to_bits(), Ordering::SeqCst);
        f64::from_bits(prev).max(clamped)
    }

    /// Start over for a new load.
    pub fn reset(&self) {
        self.bits.store(0f64.to_bits(), Ordering::SeqCst);
    }

    pub fn finish(&self) -> f64 {
        self.raise_to(100.0)
    }
}
