//! Search workers: take from the channel, scan files, pass the sentinel on.

use log::{debug, trace, warn};
use std::io;
use std::thread::{self, JoinHandle};

use crate::WorkItem;
use crate::engine::scan::scan_file;
use crate::utils::config::PackagePaths;

use super::channel::BoundedChannel;
use super::context::{PipelineStats, WorkerContext};

/// Single search worker. Runs until it has taken the sentinel (and put it back for the next
/// worker) or until a channel operation is interrupted.
///
/// Because every worker republishes the sentinel before exiting, it reaches each live worker
/// exactly once; the walk puts it last, so no worker leaves while files are still queued ahead.
pub fn search_worker_loop(id: usize, channel: &BoundedChannel<WorkItem>, ctx: &WorkerContext) {
    loop {
        let item = match channel.take() {
            Ok(item) => item,
            Err(e) => {
                debug!("worker {}: {} while waiting for work", id, e);
                return;
            }
        };
        match item {
            WorkItem::Sentinel => {
                PipelineStats::bump(&ctx.stats.sentinel_observations, 1);
                if let Err(e) = channel.put(WorkItem::Sentinel) {
                    debug!("worker {}: sentinel not republished: {}", id, e);
                }
                trace!("worker {}: saw sentinel, exiting", id);
                return;
            }
            WorkItem::File(path) => {
                PipelineStats::bump(&ctx.stats.files_scanned, 1);
                let on_match = &ctx.on_match;
                match scan_file(&path, &ctx.keyword, |m| on_match(&m)) {
                    Ok(n) => PipelineStats::bump(&ctx.stats.matches, n),
                    Err(e) => {
                        warn!("worker {}: {:#}", id, e);
                        PipelineStats::bump(&ctx.stats.scan_errors, 1);
                        ctx.errors.record(path, format!("{:#}", e));
                    }
                }
            }
        }
    }
}

/// Spawn `num_workers` named search workers sharing one channel. The pool size is fixed for the
/// run; if spawning fails part way, the token is cancelled so already started workers exit.
pub fn spawn_search_workers(
    channel: &BoundedChannel<WorkItem>,
    ctx: &WorkerContext,
    num_workers: usize,
) -> io::Result<Vec<JoinHandle<()>>> {
    let paths = PackagePaths::get();
    let mut handles = Vec::with_capacity(num_workers);
    for id in 0..num_workers {
        let worker_channel = channel.clone();
        let worker_ctx = ctx.clone();
        let spawned = thread::Builder::new()
            .name(paths.worker_thread_name(id))
            .spawn(move || search_worker_loop(id, &worker_channel, &worker_ctx));
        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => {
                channel.cancel_token().cancel();
                for h in handles {
                    let _ = h.join();
                }
                return Err(e);
            }
        }
    }
    Ok(handles)
}
