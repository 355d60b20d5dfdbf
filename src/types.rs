//! Public and internal types for the needlescan API and pipeline.

use std::fmt;
use std::path::PathBuf;

use crate::utils::config::PipelineDefaults;

/// One unit of work travelling through the bounded channel.
///
/// `Sentinel` is the end-of-stream token. It is told apart from files by variant, so no path
/// (not even an empty one) can be mistaken for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkItem {
    File(PathBuf),
    Sentinel,
}

impl WorkItem {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, WorkItem::Sentinel)
    }
}

/// A line containing the keyword. `line_number` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub path: PathBuf,
    pub line_number: usize,
    pub line: String,
}

impl fmt::Display for Match {
    /// `path:lineNumber:line`, the format printed for every hit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line_number, self.line)
    }
}

/// Lib-only options for [`search_dir`](crate::search_dir).
#[derive(Clone, Debug)]
pub struct SearchOpts {
    /// Bounded channel capacity. Must be at least 1.
    pub capacity: usize,
    /// Number of search workers. Must be at least 1.
    pub workers: usize,
    /// Exclude patterns (glob syntax, e.g. `target`, `*.log`).
    pub exclude: Vec<String>,
    /// Descend into symlinked directories. Symlinked files are scanned either way.
    pub follow_links: bool,
    /// Strict mode: stop the walk at the first traversal error and fail the run.
    pub strict: bool,
}

impl Default for SearchOpts {
    fn default() -> Self {
        Self {
            capacity: PipelineDefaults::CHANNEL_CAPACITY,
            workers: PipelineDefaults::WORKERS,
            exclude: Vec::new(),
            follow_links: PipelineDefaults::FOLLOW_LINKS,
            strict: false,
        }
    }
}

impl From<&SearchOpts> for Opts {
    fn from(o: &SearchOpts) -> Self {
        Opts {
            capacity: o.capacity,
            workers: o.workers,
            exclude: o.exclude.clone(),
            follow_links: o.follow_links,
            strict: o.strict,
            verbose: false,
        }
    }
}

/// Full options (CLI and lib). Use [`SearchOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    pub capacity: usize,
    pub workers: usize,
    pub exclude: Vec<String>,
    pub follow_links: bool,
    pub strict: bool,
    /// List every skipped path after the run.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Opts::from(&SearchOpts::default())
    }
}

/// What a finished (or cancelled) run did.
#[derive(Clone, Debug, Default)]
pub struct SearchSummary {
    /// Files the walk put into the channel.
    pub files_enqueued: usize,
    /// Files a worker took and attempted to scan (including ones that failed to open).
    pub files_scanned: usize,
    pub matches: usize,
    pub scan_errors: usize,
    /// Times any worker took the sentinel. Equals the worker count on a completed run.
    pub sentinel_observations: usize,
    /// Paths the walk or a worker could not read, with the reason.
    pub skipped_paths: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}
