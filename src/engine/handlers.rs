//! CLI command handler: resolve inputs and settings, wire Ctrl+C, run the search.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{Match, Opts};
use crate::engine::arg_parser::Cli;
use crate::engine::tools::check_search_root;
use crate::pipeline::{CancelToken, MatchSink, log_summary, search_files};
use crate::utils::prompt_line;
use crate::utils::settings_toml::{SettingsToml, apply_file_to_opts, load_settings_toml};
use crate::utils::setup_logging;

/// Settings file first, then CLI flags on top.
fn setup_opts(cli: &Cli, file: Option<&SettingsToml>) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = file {
        apply_file_to_opts(file, &mut opts);
    }
    if let Some(c) = cli.capacity {
        opts.capacity = c;
    }
    if let Some(w) = cli.workers {
        opts.workers = w;
    }
    if !cli.exclude.is_empty() {
        opts.exclude.extend(cli.exclude.iter().cloned());
    }
    if let Some(f) = cli.follow_links {
        opts.follow_links = f;
    }
    if let Some(s) = cli.strict {
        opts.strict = s;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    opts
}

/// Directory and keyword from the command line, or asked for on the console.
fn resolve_inputs(cli: &Cli) -> Result<(PathBuf, String)> {
    let mut stdin = std::io::stdin().lock();
    let dir = match &cli.dir {
        Some(d) => d.clone(),
        None => PathBuf::from(prompt_line(&mut stdin, "Enter base directory", Some("."))?),
    };
    let keyword = match &cli.keyword {
        Some(k) => k.clone(),
        None => prompt_line(&mut stdin, "Enter keyword", None)?,
    };
    Ok((dir, keyword))
}

/// Every match goes to stdout as `path:line:text`, one whole line per write.
fn stdout_sink() -> MatchSink {
    Arc::new(|m: &Match| {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", m);
    })
}

/// Run a search over the resolved directory.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let (dir, keyword) = resolve_inputs(cli)?;
    check_search_root(&dir)?;
    let settings = load_settings_toml(&dir);
    let opts = setup_opts(cli, settings.as_ref().ok().and_then(Option::as_ref));
    setup_logging(opts.verbose);
    if let Err(e) = &settings {
        warn!("ignoring settings file: {:#}", e);
    }
    debug!("{} CONFIG:{:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);

    let cancel = CancelToken::new();
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || cancel_handler.cancel()).context("set Ctrl+C handler")?;

    let summary = search_files(&dir, &keyword, &opts, stdout_sink(), cancel.clone())
        .map_err(|e| {
            if cancel.is_cancelled() {
                e.context("search cancelled by user")
            } else {
                e
            }
        })?;
    log_summary(&summary);
    Ok(())
}
