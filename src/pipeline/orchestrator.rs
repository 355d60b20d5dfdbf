use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use crate::pipeline::{self, CancelToken, MatchSink};
use crate::{Opts, SearchSummary};

fn check_pool_size(opts: &Opts) -> Result<()> {
    if opts.workers == 0 {
        anyhow::bail!("Worker count must be at least 1");
    }
    if opts.capacity == 0 {
        anyhow::bail!("Channel capacity must be at least 1");
    }
    Ok(())
}

/// Start the walk thread and the worker pool. Returns the handles; the caller must pass them to
/// [`shutdown_pipeline_handles`] (or [`join_pipeline`]) when done.
pub fn run_pipeline(
    root: &Path,
    keyword: &str,
    opts: &Opts,
    on_match: MatchSink,
    cancel: CancelToken,
) -> Result<pipeline::PipelineHandles> {
    check_pool_size(opts)?;

    let channels =
        pipeline::create_pipeline_channels(root, keyword, opts, on_match, cancel.clone())?;
    debug!(
        "pipeline: capacity {}, {} workers, root {}",
        channels.channel.capacity(),
        opts.workers,
        root.display()
    );

    let worker_handles =
        pipeline::spawn_search_workers(&channels.channel, &channels.worker, opts.workers)
            .context("spawn search workers")?;

    let walk_handle = match pipeline::spawn_walk_thread(channels.channel.clone(), channels.walk) {
        Ok(h) => h,
        Err(e) => {
            // Without a producer no sentinel will ever arrive.
            cancel.cancel();
            let _ = shutdown_pipeline_handles_inner(None, worker_handles);
            return Err(e).context("spawn walk thread");
        }
    };

    Ok(pipeline::PipelineHandles {
        walk_handle,
        worker_handles,
        channel: channels.channel,
        cancel,
        stats: channels.stats,
        errors: channels.errors,
    })
}

fn shutdown_pipeline_handles_inner(
    walk_handle: Option<std::thread::JoinHandle<usize>>,
    worker_handles: Vec<std::thread::JoinHandle<()>>,
) -> Result<usize> {
    let mut panicked = 0_usize;
    let files_enqueued = match walk_handle {
        Some(h) => h.join().map_err(|_| anyhow::anyhow!("walk thread panicked"))?,
        None => 0,
    };
    for h in worker_handles {
        if h.join().is_err() {
            panicked += 1;
        }
    }
    if panicked > 0 {
        anyhow::bail!("{} search worker(s) panicked", panicked);
    }
    Ok(files_enqueued)
}

/// Join the walk thread and every worker. Returns the number of files the walk enqueued.
pub fn shutdown_pipeline_handles(
    walk_handle: std::thread::JoinHandle<usize>,
    worker_handles: Vec<std::thread::JoinHandle<()>>,
) -> Result<usize> {
    shutdown_pipeline_handles_inner(Some(walk_handle), worker_handles)
}

/// Wait for a started pipeline to finish and turn its shared state into a [`SearchSummary`].
pub fn join_pipeline(handles: pipeline::PipelineHandles) -> Result<SearchSummary> {
    let pipeline::PipelineHandles {
        walk_handle,
        worker_handles,
        channel,
        cancel,
        stats,
        errors,
    } = handles;

    let files_enqueued = shutdown_pipeline_handles(walk_handle, worker_handles)?;
    debug!(
        "pipeline: all workers exited, {} item(s) left in channel",
        channel.len()
    );

    use crate::pipeline::PipelineStats as S;
    Ok(SearchSummary {
        files_enqueued,
        files_scanned: S::get(&stats.files_scanned),
        matches: S::get(&stats.matches),
        scan_errors: S::get(&stats.scan_errors),
        sentinel_observations: S::get(&stats.sentinel_observations),
        skipped_paths: errors.skipped_paths(),
        cancelled: cancel.is_cancelled(),
    })
}

/// Main orchestrator: search every file under `root` for `keyword`.
/// Walk → bounded channel → workers → `on_match`. Blocks until every worker has exited.
pub fn search_files(
    root: &Path,
    keyword: &str,
    opts: &Opts,
    on_match: MatchSink,
    cancel: CancelToken,
) -> Result<SearchSummary> {
    let handles = run_pipeline(root, keyword, opts, on_match, cancel)?;
    let summary = join_pipeline(handles)?;
    pipeline::check_for_initial_error_or_skipped_paths(opts, &summary)?;
    Ok(summary)
}
