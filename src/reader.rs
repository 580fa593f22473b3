//! Reader session: the surface a presentation layer drives.
//!
//! A [`Reader`] owns the currently loaded [`Document`] and its [`Pagination`].
//! [`Reader::open_document`] starts a load on the Tokio runtime and returns
//! immediately; the previous document is discarded at that moment and the new
//! one is installed when the load finishes. While a load runs,
//! [`Reader::is_loading`] is true, [`Reader::progress_percent`] climbs from 0
//! to 100, and further `open_document` calls are refused.
//!
//! Navigation methods return `Some(Spread)` when the displayed pair changed
//! and `None` when the guard refused the move. Each change is also sent to
//! [`crate::progress::ReaderCallback::on_spread`].

use crate::config::ReaderConfig;
use crate::error::{PageError, ReaderError};
use crate::load::run_load;
use crate::output::{Document, LoadStats, Spread};
use crate::pagination::Pagination;
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::progress::LoadProgress;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Session {
    document: Option<Document>,
    pagination: Pagination,
    /// Bumped by every `open_document` and `close`. A load installs its
    /// document only if the generation is still the one it started with.
    generation: u64,
}

impl Session {
    fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, Document::len)
    }

    fn spread(&self) -> Spread {
        match self.document {
            Some(ref doc) => doc.spread(&self.pagination),
            None => Spread::select(&[], &self.pagination),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    session: RwLock<Session>,
    progress: LoadProgress,
    loading: AtomicBool,
    task: Mutex<Option<AbortHandle>>,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the loading flag however the load task ends, including abort.
struct LoadingFlag(Arc<Shared>);

impl Drop for LoadingFlag {
    fn drop(&mut self) {
        self.0.loading.store(false, Ordering::SeqCst);
    }
}

/// A two-up document viewer session.
pub struct Reader {
    rasterizer: Arc<dyn Rasterizer>,
    config: ReaderConfig,
    shared: Arc<Shared>,
}

impl Reader {
    /// A reader that rasterises with pdfium.
    pub fn new(config: ReaderConfig) -> Self {
        let rasterizer = Arc::new(PdfiumRasterizer::new(&config));
        Self::with_rasterizer(rasterizer, config)
    }

    /// A reader that rasterises with `rasterizer`.
    pub fn with_rasterizer(rasterizer: Arc<dyn Rasterizer>, config: ReaderConfig) -> Self {
        Self {
            rasterizer,
            config,
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Start loading `path` in the background.
    ///
    /// Must be called from within a Tokio runtime. The returned handle
    /// resolves to the load statistics once the document is installed.
    ///
    /// # Errors
    /// [`ReaderError::LoadInProgress`] if a load is already running.
    pub fn open_document(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<JoinHandle<Result<LoadStats, ReaderError>>, ReaderError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ReaderError::Internal(format!("open_document needs a Tokio runtime: {e}")))?;

        if self
            .shared
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ReaderError::LoadInProgress);
        }

        let generation = {
            let mut session = self.shared.write();
            session.document = None;
            session.pagination.reset();
            session.generation += 1;
            session.generation
        };
        self.shared.progress.reset();

        let path = path.as_ref().to_path_buf();
        info!("Opening {}", path.display());

        let flag = LoadingFlag(Arc::clone(&self.shared));
        let rasterizer = Arc::clone(&self.rasterizer);
        let config = self.config.clone();

        let join = runtime.spawn(async move {
            let shared = Arc::clone(&flag.0);
            let result = run_load(rasterizer, &path, &config, &shared.progress)
                .await
                .and_then(|doc| {
                    let stats = doc.stats.clone();
                    let mut session = shared.write();
                    if session.generation != generation {
                        debug!("Discarding stale load of {}", path.display());
                        return Err(ReaderError::LoadCancelled);
                    }
                    session.pagination.reset();
                    session.document = Some(doc);
                    Ok((stats, session.spread()))
                });

            match result {
                Ok((stats, spread)) => {
                    drop(flag);
                    if let Some(ref cb) = config.callback {
                        cb.on_load_complete(&stats);
                        cb.on_spread(&spread);
                    }
                    Ok(stats)
                }
                Err(e) => {
                    drop(flag);
                    if let Some(ref cb) = config.callback {
                        cb.on_load_failed(&e);
                    }
                    Err(e)
                }
            }
        });

        *self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(join.abort_handle());
        Ok(join)
    }

    /// Whether a load is running. Navigation should be disabled meanwhile.
    pub fn is_loading(&self) -> bool {
        self.shared.loading.load(Ordering::SeqCst)
    }

    /// Progress of the current (or last) load, 0–100.
    pub fn progress_percent(&self) -> f64 {
        self.shared.progress.percent()
    }

    /// Number of loaded pages; 0 while loading or when nothing is open.
    pub fn page_count(&self) -> usize {
        self.shared.read().page_count()
    }

    pub fn pagination(&self) -> Pagination {
        self.shared.read().pagination
    }

    pub fn document_path(&self) -> Option<PathBuf> {
        self.shared.read().document.as_ref().map(|d| d.path.clone())
    }

    /// Pages dropped from the loaded document.
    pub fn page_errors(&self) -> Vec<PageError> {
        self.shared
            .read()
            .document
            .as_ref()
            .map(|d| d.errors.clone())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> Option<LoadStats> {
        self.shared.read().document.as_ref().map(|d| d.stats.clone())
    }

    /// A snapshot of the loaded document, if any.
    pub fn document(&self) -> Option<Document> {
        self.shared.read().document.clone()
    }

    /// The pair that should currently be on screen.
    pub fn current_spread(&self) -> Spread {
        self.shared.read().spread()
    }

    pub fn next(&self) -> Option<Spread> {
        self.navigate("next", Pagination::next)
    }

    pub fn previous(&self) -> Option<Spread> {
        self.navigate("previous", Pagination::previous)
    }

    pub fn swap(&self) -> Option<Spread> {
        self.navigate("swap", Pagination::swap)
    }

    pub fn shift(&self) -> Option<Spread> {
        self.navigate("shift", Pagination::shift)
    }

    pub fn unshift(&self) -> Option<Spread> {
        self.navigate("unshift", Pagination::unshift)
    }

    pub fn toggle_shift(&self) -> Option<Spread> {
        self.navigate("toggle_shift", Pagination::toggle_shift)
    }

    /// Abort any running load and drop the document.
    ///
    /// Rasterisation calls already running on the blocking pool are
    /// abandoned; their results are discarded. A load that has already
    /// finished its work fails with [`ReaderError::LoadCancelled`] instead
    /// of installing its document.
    pub fn close(&self) {
        if let Some(task) = self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        let mut session = self.shared.write();
        session.document = None;
        session.pagination.reset();
        session.generation += 1;
    }

    fn navigate(
        &self,
        name: &str,
        step: impl FnOnce(&mut Pagination, usize) -> bool,
    ) -> Option<Spread> {
        let spread = {
            let mut session = self.shared.write();
            let count = session.page_count();
            if !step(&mut session.pagination, count) {
                debug!("{} refused at {:?}", name, session.pagination);
                return None;
            }
            session.spread()
        };
        debug!("{} → {}", name, spread.label());
        if let Some(ref cb) = self.config.callback {
            cb.on_spread(&spread);
        }
        Some(spread)
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        if let Some(task) = self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}
