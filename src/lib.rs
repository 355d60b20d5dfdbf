//! Needlescan: concurrent keyword search over a directory tree.
//!
//! One walk thread puts every file into a bounded channel; a fixed pool of search workers takes
//! files out and scans them line by line. When the walk is done it puts a single sentinel, which
//! each worker passes back into the channel before exiting, so the whole pool shuts down without
//! polling or a separate "done" flag.

pub mod bank;
pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;
use std::path::Path;
use std::sync::Arc;

use pipeline::CancelToken;

/// Result alias used by public needlescan API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: search every file under `root` for `keyword` with `opts`.
///
/// `on_match` is called for every matching line, concurrently from the worker threads, so keep it
/// fast or send to a channel. Returns the run summary once every worker has exited.
///
/// ```ignore
/// let opts = needlescan::SearchOpts { workers: 4, ..Default::default() };
/// let summary = needlescan::search_dir(path, "volatile", &opts, |m| println!("{m}"))?;
/// ```
pub fn search_dir<F>(
    root: &Path,
    keyword: &str,
    opts: &SearchOpts,
    on_match: F,
) -> Result<SearchSummary>
where
    F: Fn(&Match) + Send + Sync + 'static,
{
    let opts = Opts::from(opts);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    pipeline::search_files(root, keyword, &opts, Arc::new(on_match), CancelToken::new())
}
