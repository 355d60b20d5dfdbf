//! Walk loop: depth-first traversal that feeds files into the bounded channel, then the sentinel.

use log::{debug, warn};
use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::WorkItem;
use crate::engine::tools::should_include_in_walk;
use crate::utils::config::PackagePaths;

use super::channel::BoundedChannel;
use super::context::WalkContext;

/// One result from a directory walk: an entry to consider or an error with optional path.
pub enum WalkOutcome {
    /// A regular file, or a symlink to one.
    File(PathBuf),
    Dir(PathBuf),
    /// Neither scanned nor descended into: FIFOs, sockets, devices, unfollowed directory links.
    Skip { path: PathBuf, reason: &'static str },
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert a walkdir result into [`WalkOutcome`].
///
/// With `follow_links` walkdir already reports the target's type. Without it a symlink is
/// resolved here, so a link to a file is still scanned and a link to a directory is skipped
/// rather than opened as a file.
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> WalkOutcome {
    let entry = match r {
        Ok(entry) => entry,
        Err(err) => {
            return WalkOutcome::Err {
                msg: format!("{}", err),
                path: err.path().map(PathBuf::from),
            };
        }
    };
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return WalkOutcome::Dir(entry.into_path());
    }
    if file_type.is_file() {
        return WalkOutcome::File(entry.into_path());
    }
    let path = entry.into_path();
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => WalkOutcome::File(path),
        Ok(meta) if meta.is_dir() => WalkOutcome::Skip {
            path,
            reason: "symlinked directory, links not followed",
        },
        Ok(_) => WalkOutcome::Skip {
            path,
            reason: "not a regular file",
        },
        Err(e) => WalkOutcome::Err {
            msg: format!("{}: {}", path.display(), e),
            path: Some(path),
        },
    }
}

/// Depth-first walkdir iterator over `ctx.root`. Excluded directories are pruned, not descended.
fn walkdir_iter(ctx: &WalkContext) -> Box<dyn Iterator<Item = WalkOutcome>> {
    let root = ctx.root.clone();
    let exclude = ctx.exclude.clone();
    Box::new(
        WalkDir::new(&ctx.root)
            .follow_links(ctx.follow_links)
            .into_iter()
            .filter_entry(move |e| {
                should_include_in_walk(e.path(), &root, e.file_type().is_dir(), &exclude)
            })
            .map(to_outcome_walkdir),
    )
}

/// Spawn the producer thread. Its result is the number of files it put into the channel.
pub fn spawn_walk_thread(
    channel: BoundedChannel<WorkItem>,
    ctx: WalkContext,
) -> io::Result<JoinHandle<usize>> {
    thread::Builder::new()
        .name(PackagePaths::get().walk_thread_name().to_string())
        .spawn(move || {
            let iter = walkdir_iter(&ctx);
            run_walk_loop(&channel, &ctx, iter)
        })
}

/// Run the common walk loop: consume `iter`, put every regular file as [`WorkItem::File`], and
/// finish with exactly one [`WorkItem::Sentinel`].
///
/// Errors are recorded in the ledger and the walk moves on to the next sibling; in strict mode the
/// walk stops at the first error but still puts the sentinel so workers can drain and exit.
/// An interrupted `put` abandons the walk without a sentinel: the run is being torn down and
/// every blocked worker is interrupted by the same token.
pub fn run_walk_loop<I>(channel: &BoundedChannel<WorkItem>, ctx: &WalkContext, iter: I) -> usize
where
    I: Iterator<Item = WalkOutcome>,
{
    let mut count = 0_usize;
    for outcome in iter {
        match outcome {
            WalkOutcome::Dir(path) => debug!("walk: entering {}", path.display()),
            WalkOutcome::Skip { path, reason } => {
                debug!("walk: skipping {} ({})", path.display(), reason)
            }
            WalkOutcome::File(path) => {
                if let Err(e) = channel.put(WorkItem::File(path)) {
                    debug!("walk: {} after {} files, no sentinel sent", e, count);
                    return count;
                }
                count += 1;
            }
            WalkOutcome::Err { msg, path } => {
                warn!("walk: {}", msg);
                let path = path.unwrap_or_else(|| ctx.root.clone());
                ctx.errors.record(path, msg);
                if ctx.strict {
                    break;
                }
            }
        }
    }
    match channel.put(WorkItem::Sentinel) {
        Ok(()) => debug!("walk: done, {} files enqueued, sentinel sent", count),
        Err(e) => debug!("walk: sentinel not sent: {}", e),
    }
    count
}
