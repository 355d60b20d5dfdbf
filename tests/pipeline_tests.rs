//! Pipeline tests: termination protocol, backpressure, error handling, cancellation.

use needlescan::pipeline::{
    BoundedChannel, CancelToken, ErrorLedger, MatchSink, PipelineStats, WalkContext, WalkOutcome,
    WorkerContext, join_pipeline, run_pipeline, run_walk_loop, search_files, search_worker_loop,
    spawn_search_workers,
};
use needlescan::{Match, Opts, SearchOpts, WorkItem, search_dir};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn collecting_sink() -> (MatchSink, Arc<Mutex<Vec<Match>>>) {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let sink_hits = Arc::clone(&hits);
    let sink: MatchSink = Arc::new(move |m: &Match| sink_hits.lock().unwrap().push(m.clone()));
    (sink, hits)
}

fn opts(capacity: usize, workers: usize) -> Opts {
    Opts {
        capacity,
        workers,
        ..Opts::default()
    }
}

/// `n` files spread over nested dirs, each containing the keyword exactly once.
fn tree_with_files(n: usize) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..n {
        let sub = dir.path().join(format!("d{}", i % 3)).join(format!("e{}", i % 2));
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join(format!("f{i}.txt")), format!("head\nneedle {i}\ntail\n")).unwrap();
    }
    dir
}

fn walk_ctx(root: &Path, strict: bool) -> WalkContext {
    WalkContext {
        root: root.to_path_buf(),
        exclude: Vec::new(),
        follow_links: false,
        strict,
        errors: ErrorLedger::default(),
    }
}

fn assert_terminates_with(files: usize, workers: usize) {
    let dir = tree_with_files(files);
    let (sink, hits) = collecting_sink();
    let handles = run_pipeline(
        dir.path(),
        "needle",
        &opts(2, workers),
        sink,
        CancelToken::new(),
    )
    .unwrap();
    let channel = handles.channel.clone();
    let summary = join_pipeline(handles).unwrap();

    assert_eq!(summary.files_enqueued, files);
    assert_eq!(summary.files_scanned, files, "each file scanned exactly once");
    assert_eq!(summary.sentinel_observations, workers, "sentinel seen once per worker");
    assert_eq!(summary.matches, files);
    assert!(!summary.cancelled);

    let mut per_file: BTreeMap<PathBuf, usize> = BTreeMap::new();
    for m in hits.lock().unwrap().iter() {
        *per_file.entry(m.path.clone()).or_default() += 1;
    }
    assert_eq!(per_file.len(), files);
    assert!(per_file.values().all(|&n| n == 1));

    // The last worker's republished sentinel is all that is left; it goes with the channel.
    assert_eq!(channel.len(), 1);
    assert!(channel.take().unwrap().is_sentinel());
}

#[test]
fn test_terminates_with_one_worker() {
    assert_terminates_with(8, 1);
}

#[test]
fn test_terminates_with_as_many_workers_as_files() {
    assert_terminates_with(8, 8);
}

#[test]
fn test_terminates_with_twice_as_many_workers_as_files() {
    assert_terminates_with(8, 16);
}

#[test]
fn test_terminates_on_empty_tree() {
    assert_terminates_with(0, 5);
}

#[test]
fn test_needle_scenario() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one\ntwo\nthe needle is here\nfour\n").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("b.txt"), "nothing to see\n").unwrap();

    let (sink, hits) = collecting_sink();
    let summary =
        search_files(dir.path(), "needle", &opts(2, 3), sink, CancelToken::new()).unwrap();

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].to_string(),
        format!("{}:3:the needle is here", dir.path().join("a.txt").display())
    );
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.sentinel_observations, 3);
}

#[test]
fn test_search_dir_public_entry_point() {
    let dir = tree_with_files(5);
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let summary = search_dir(
        dir.path(),
        "needle",
        &SearchOpts {
            capacity: 1,
            workers: 4,
            ..Default::default()
        },
        move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    )
    .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 5);
    assert_eq!(summary.matches, 5);
}

#[test]
fn test_channel_never_exceeds_capacity() {
    const CAPACITY: usize = 3;
    let channel = BoundedChannel::new(CAPACITY, CancelToken::new()).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let channel = channel.clone();
        thread::spawn(move || {
            for i in 0..200_u32 {
                channel.put(i).unwrap();
            }
        })
    };
    let sampler = {
        let channel = channel.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut max_seen = 0;
            while !done.load(Ordering::SeqCst) {
                max_seen = max_seen.max(channel.len());
            }
            max_seen
        })
    };

    let mut taken = Vec::new();
    for _ in 0..200 {
        if taken.len() % 20 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        taken.push(channel.take().unwrap());
    }
    producer.join().unwrap();
    done.store(true, Ordering::SeqCst);
    let max_seen = sampler.join().unwrap();

    assert!(max_seen <= CAPACITY, "saw {max_seen} items in a {CAPACITY}-slot channel");
    assert_eq!(taken, (0..200).collect::<Vec<_>>(), "FIFO for a single producer");
    assert!(channel.is_empty());
}

#[test]
fn test_walk_loop_puts_sentinel_last_and_records_errors() {
    let channel = BoundedChannel::new(10, CancelToken::new()).unwrap();
    let ctx = walk_ctx(Path::new("/root"), false);
    let outcomes = vec![
        WalkOutcome::Dir(PathBuf::from("/root")),
        WalkOutcome::File(PathBuf::from("/root/a")),
        WalkOutcome::Err {
            msg: "permission denied".to_string(),
            path: Some(PathBuf::from("/root/locked")),
        },
        WalkOutcome::File(PathBuf::from("/root/b")),
    ];
    let count = run_walk_loop(&channel, &ctx, outcomes.into_iter());

    assert_eq!(count, 2);
    assert_eq!(channel.take().unwrap(), WorkItem::File(PathBuf::from("/root/a")));
    assert_eq!(channel.take().unwrap(), WorkItem::File(PathBuf::from("/root/b")));
    assert_eq!(channel.take().unwrap(), WorkItem::Sentinel);
    assert!(channel.is_empty());
    assert_eq!(
        ctx.errors.skipped_paths(),
        vec![(PathBuf::from("/root/locked"), "permission denied".to_string())]
    );
}

#[test]
fn test_walk_loop_strict_stops_but_still_sends_sentinel() {
    let channel = BoundedChannel::new(10, CancelToken::new()).unwrap();
    let ctx = walk_ctx(Path::new("/root"), true);
    let outcomes = vec![
        WalkOutcome::File(PathBuf::from("/root/a")),
        WalkOutcome::Err {
            msg: "boom".to_string(),
            path: None,
        },
        WalkOutcome::File(PathBuf::from("/root/b")),
    ];
    let count = run_walk_loop(&channel, &ctx, outcomes.into_iter());

    assert_eq!(count, 1);
    assert_eq!(channel.take().unwrap(), WorkItem::File(PathBuf::from("/root/a")));
    assert_eq!(channel.take().unwrap(), WorkItem::Sentinel);
    assert_eq!(ctx.errors.len(), 1);
}

#[test]
fn test_walk_blocks_on_full_channel_and_cancel_aborts_it() {
    let cancel = CancelToken::new();
    let channel = BoundedChannel::new(1, cancel.clone()).unwrap();
    let walk = {
        let channel = channel.clone();
        thread::spawn(move || {
            let ctx = walk_ctx(Path::new("/root"), false);
            let files = (0..5).map(|i| WalkOutcome::File(PathBuf::from(format!("/root/{i}"))));
            run_walk_loop(&channel, &ctx, files)
        })
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!walk.is_finished(), "walk must wait for a free slot");
    assert!(channel.is_full());

    cancel.cancel();
    assert_eq!(walk.join().unwrap(), 1);
    // Only the first file made it in; no sentinel on an aborted walk.
    assert_eq!(channel.len(), 1);
}

#[test]
fn test_idle_workers_exit_on_cancel() {
    let cancel = CancelToken::new();
    let channel = BoundedChannel::new(4, cancel.clone()).unwrap();
    let (sink, _) = collecting_sink();
    let ctx = WorkerContext {
        keyword: Arc::from("needle"),
        on_match: sink,
        stats: Arc::new(PipelineStats::default()),
        errors: ErrorLedger::default(),
    };
    let handles = spawn_search_workers(&channel, &ctx, 6).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(handles.iter().all(|h| !h.is_finished()));

    cancel.cancel();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(PipelineStats::get(&ctx.stats.sentinel_observations), 0);
    assert!(channel.is_empty());
}

#[test]
fn test_worker_records_scan_error_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.txt");
    fs::write(&good, "needle\n").unwrap();
    let gone = dir.path().join("vanished.txt");

    let channel = BoundedChannel::new(4, CancelToken::new()).unwrap();
    channel.put(WorkItem::File(gone.clone())).unwrap();
    channel.put(WorkItem::File(good)).unwrap();
    channel.put(WorkItem::Sentinel).unwrap();

    let (sink, hits) = collecting_sink();
    let ctx = WorkerContext {
        keyword: Arc::from("needle"),
        on_match: sink,
        stats: Arc::new(PipelineStats::default()),
        errors: ErrorLedger::default(),
    };
    search_worker_loop(0, &channel, &ctx);

    assert_eq!(PipelineStats::get(&ctx.stats.files_scanned), 2);
    assert_eq!(PipelineStats::get(&ctx.stats.scan_errors), 1);
    assert_eq!(hits.lock().unwrap().len(), 1);
    let skipped = ctx.errors.skipped_paths();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, gone);
    assert_eq!(channel.take().unwrap(), WorkItem::Sentinel);
}

#[test]
fn test_missing_root_is_recorded_and_run_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let (sink, hits) = collecting_sink();
    let summary =
        search_files(&missing, "needle", &opts(2, 3), sink, CancelToken::new()).unwrap();
    assert_eq!(summary.files_scanned, 0);
    assert_eq!(summary.sentinel_observations, 3);
    assert_eq!(summary.skipped_paths.len(), 1);
    assert!(hits.lock().unwrap().is_empty());
}

#[test]
fn test_strict_run_fails_on_walk_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let (sink, _) = collecting_sink();
    let strict = Opts {
        strict: true,
        ..opts(2, 2)
    };
    assert!(search_files(&missing, "needle", &strict, sink, CancelToken::new()).is_err());
}

#[test]
fn test_exclude_prunes_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("skipme")).unwrap();
    fs::write(dir.path().join("skipme").join("x.txt"), "needle\n").unwrap();
    fs::write(dir.path().join("keep.txt"), "needle\n").unwrap();
    fs::write(dir.path().join("noise.log"), "needle\n").unwrap();

    let (sink, hits) = collecting_sink();
    let o = Opts {
        exclude: vec!["skipme".to_string(), "*.log".to_string()],
        ..opts(2, 2)
    };
    let summary = search_files(dir.path(), "needle", &o, sink, CancelToken::new()).unwrap();
    assert_eq!(summary.files_scanned, 1);
    assert_eq!(hits.lock().unwrap()[0].path, dir.path().join("keep.txt"));
}

#[test]
fn test_invalid_configuration_rejected_before_start() {
    let dir = tree_with_files(1);
    let (sink, _) = collecting_sink();
    let run = |keyword: &str, o: Opts| {
        search_files(dir.path(), keyword, &o, sink.clone(), CancelToken::new())
    };
    assert!(run("needle", opts(2, 0)).is_err());
    assert!(run("needle", opts(0, 2)).is_err());
}

#[test]
fn test_empty_keyword_matches_every_line() {
    let dir = tree_with_files(2);
    let (sink, hits) = collecting_sink();
    let summary = search_files(dir.path(), "", &opts(2, 2), sink, CancelToken::new()).unwrap();
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.matches, 6);
    assert_eq!(hits.lock().unwrap().len(), 6);
}

#[test]
fn test_cancelled_run_reports_cancellation() {
    let dir = tree_with_files(3);
    let cancel = CancelToken::new();
    cancel.cancel();
    let (sink, _) = collecting_sink();
    let handles = run_pipeline(dir.path(), "needle", &opts(1, 2), sink, cancel).unwrap();
    let summary = join_pipeline(handles).unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.files_scanned, 0);

    let (sink, _) = collecting_sink();
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(search_files(dir.path(), "needle", &opts(1, 2), sink, cancel).is_err());
}

#[test]
fn test_walk_loop_does_not_enqueue_skipped_entries() {
    let channel = BoundedChannel::new(10, CancelToken::new()).unwrap();
    let ctx = walk_ctx(Path::new("/root"), true);
    let outcomes = vec![
        WalkOutcome::Skip {
            path: PathBuf::from("/root/fifo"),
            reason: "not a regular file",
        },
        WalkOutcome::File(PathBuf::from("/root/a")),
    ];
    let count = run_walk_loop(&channel, &ctx, outcomes.into_iter());

    assert_eq!(count, 1);
    assert_eq!(channel.take().unwrap(), WorkItem::File(PathBuf::from("/root/a")));
    assert_eq!(channel.take().unwrap(), WorkItem::Sentinel);
    assert!(ctx.errors.is_empty(), "a skipped entry is not an error, even in strict mode");
}

#[cfg(unix)]
fn tree_with_linked_dir() -> (tempfile::TempDir, tempfile::TempDir) {
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("inner.txt"), "hay\nneedle in a linked dir\n").unwrap();
    let root = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path(), root.path().join("linked")).unwrap();
    (root, outside)
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_searched_by_default() {
    let (root, _outside) = tree_with_linked_dir();
    let (sink, hits) = collecting_sink();
    let strict = Opts {
        strict: true,
        ..opts(2, 2)
    };
    assert!(strict.follow_links);
    let summary = search_files(root.path(), "needle", &strict, sink, CancelToken::new()).unwrap();

    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.matches, 1);
    assert_eq!(summary.scan_errors, 0);
    assert!(summary.skipped_paths.is_empty());
    let hits = hits.lock().unwrap();
    assert_eq!(hits[0].path, root.path().join("linked").join("inner.txt"));
    assert_eq!(hits[0].line_number, 2);
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_skipped_when_links_not_followed() {
    let (root, outside) = tree_with_linked_dir();
    std::os::unix::fs::symlink(
        outside.path().join("inner.txt"),
        root.path().join("linked_file.txt"),
    )
    .unwrap();
    let (sink, hits) = collecting_sink();
    let o = Opts {
        follow_links: false,
        strict: true,
        ..opts(2, 2)
    };
    let summary = search_files(root.path(), "needle", &o, sink, CancelToken::new()).unwrap();

    // The directory link is not opened as a file; the file link is still scanned.
    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.scan_errors, 0);
    assert!(summary.skipped_paths.is_empty());
    assert_eq!(hits.lock().unwrap()[0].path, root.path().join("linked_file.txt"));
}

#[cfg(unix)]
#[test]
fn test_fifo_is_not_enqueued() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "needle\n").unwrap();
    let fifo = dir.path().join("pipe");
    let made = std::process::Command::new("mkfifo").arg(&fifo).status();
    if !matches!(made, Ok(status) if status.success()) {
        return;
    }
    let (sink, hits) = collecting_sink();
    let summary =
        search_files(dir.path(), "needle", &opts(2, 2), sink, CancelToken::new()).unwrap();

    assert_eq!(summary.files_enqueued, 1);
    assert_eq!(summary.files_scanned, 1);
    assert_eq!(hits.lock().unwrap().len(), 1);
}
