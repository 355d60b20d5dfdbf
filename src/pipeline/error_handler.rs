use anyhow::Result;
use log::{debug, info, warn};

use crate::utils::Colors;
use crate::{Opts, SearchSummary};

/// Check pipeline result: a cancelled run is an error; if strict and anything was skipped, the
/// first error fails the run; otherwise log skipped paths. Call after joining walk and workers.
pub fn check_for_initial_error_or_skipped_paths(
    opts: &Opts,
    summary: &SearchSummary,
) -> Result<()> {
    if summary.cancelled {
        anyhow::bail!(
            "Search cancelled after scanning {} of {} files",
            summary.files_scanned,
            summary.files_enqueued
        );
    }
    if opts.strict
        && let Some((path, msg)) = summary.skipped_paths.first()
    {
        anyhow::bail!("{}: {}", path.display(), msg);
    }
    let skipped = summary.skipped_paths.len();
    if skipped > 0 {
        warn!(
            "Skipped {} paths due to permission errors or access issues",
            skipped
        );
        if opts.verbose {
            for (p, msg) in &summary.skipped_paths {
                eprintln!("  skipped: {} ({})", p.display(), msg);
            }
        }
    }
    Ok(())
}

/// Log the one-line run summary.
pub fn log_summary(summary: &SearchSummary) {
    info!(
        "{} | {} | {}",
        Colors::colorize(
            Colors::FILES,
            &format!("Files: {}", summary.files_scanned)
        ),
        Colors::colorize(Colors::MATCHES, &format!("Matches: {}", summary.matches)),
        Colors::colorize(
            Colors::ERRORS,
            &format!("Errors: {}", summary.skipped_paths.len())
        )
    );
    debug!(
        "sentinel observed {} time(s), {} file(s) enqueued",
        summary.sentinel_observations, summary.files_enqueued
    );
}
