//! Pipeline context: shared data passed into the walk thread and the search workers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use crate::utils::config::PackagePaths;
use crate::{Match, Opts, WorkItem};

use super::channel::{BoundedChannel, CancelToken};

/// Callback receiving every match. Called concurrently from many workers.
pub type MatchSink = Arc<dyn Fn(&Match) + Send + Sync>;

/// Paths the walk or a worker could not read, with the reason. Shared by all threads of a run.
#[derive(Clone, Debug, Default)]
pub struct ErrorLedger {
    skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl ErrorLedger {
    /// Append in arrival order; the first entry is the run's first error.
    pub fn record(&self, path: PathBuf, msg: String) {
        self.skipped_paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path, msg));
    }

    pub fn skipped_paths(&self) -> Vec<(PathBuf, String)> {
        self.skipped_paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.skipped_paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run counters bumped by the workers. Reporting only; never used for coordination.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub files_scanned: AtomicUsize,
    pub matches: AtomicUsize,
    pub scan_errors: AtomicUsize,
    pub sentinel_observations: AtomicUsize,
}

impl PipelineStats {
    pub fn bump(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

/// Walk settings. Moved into the walk thread.
#[derive(Clone, Debug)]
pub struct WalkContext {
    pub root: PathBuf,
    pub exclude: Vec<String>,
    pub follow_links: bool,
    pub strict: bool,
    pub errors: ErrorLedger,
}

/// What every worker shares: the keyword, where matches go, counters, and the error ledger.
#[derive(Clone)]
pub struct WorkerContext {
    pub keyword: Arc<str>,
    pub on_match: MatchSink,
    pub stats: Arc<PipelineStats>,
    pub errors: ErrorLedger,
}

/// Channel and shared state for one run. The walk thread gets `channel` + `walk`; each worker
/// gets a clone of `channel` + `worker`.
pub struct PipelineChannels {
    pub channel: BoundedChannel<WorkItem>,
    pub walk: WalkContext,
    pub worker: WorkerContext,
    pub stats: Arc<PipelineStats>,
    pub errors: ErrorLedger,
}

pub fn create_pipeline_channels(
    root: &Path,
    keyword: &str,
    opts: &Opts,
    on_match: MatchSink,
    cancel: CancelToken,
) -> anyhow::Result<PipelineChannels> {
    let channel = BoundedChannel::new(opts.capacity, cancel)?;
    let stats = Arc::new(PipelineStats::default());
    let errors = ErrorLedger::default();

    let mut exclude = PackagePaths::get().default_exclude_patterns();
    exclude.extend(opts.exclude.iter().cloned());

    let walk = WalkContext {
        root: root.to_path_buf(),
        exclude,
        follow_links: opts.follow_links,
        strict: opts.strict,
        errors: errors.clone(),
    };
    let worker = WorkerContext {
        keyword: Arc::from(keyword),
        on_match,
        stats: Arc::clone(&stats),
        errors: errors.clone(),
    };

    Ok(PipelineChannels {
        channel,
        walk,
        worker,
        stats,
        errors,
    })
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): join them with
/// [`shutdown_pipeline_handles`](super::shutdown_pipeline_handles) when done.
pub struct PipelineHandles {
    pub walk_handle: JoinHandle<usize>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub channel: BoundedChannel<WorkItem>,
    pub cancel: CancelToken,
    pub stats: Arc<PipelineStats>,
    pub errors: ErrorLedger,
}
