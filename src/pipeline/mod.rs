//! Pipeline components: bounded channel, walk loop, search workers, orchestration.

pub mod channel;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod walk;
pub mod workers;

pub use channel::{BoundedChannel, CancelToken, ChannelError};
pub use context::{
    ErrorLedger, MatchSink, PipelineChannels, PipelineHandles, PipelineStats, WalkContext,
    WorkerContext, create_pipeline_channels,
};
pub use error_handler::{check_for_initial_error_or_skipped_paths, log_summary};
pub use orchestrator::{join_pipeline, run_pipeline, search_files, shutdown_pipeline_handles};
pub use walk::{WalkOutcome, run_walk_loop, spawn_walk_thread, to_outcome_walkdir};
pub use workers::{search_worker_loop, spawn_search_workers};
