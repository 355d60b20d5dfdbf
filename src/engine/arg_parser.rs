use clap::Parser;
use std::path::PathBuf;

/// Concurrent keyword search: one walker, a bounded channel, a fixed pool of search workers.
#[derive(Clone, Debug, Parser)]
#[command(name = "needlescan")]
#[command(about = "Print every line containing KEYWORD in the files under DIR as path:line:text.")]
pub struct Cli {
    /// Base directory to search. Prompted for when omitted.
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Keyword to search for (plain, case-sensitive substring). Prompted for when omitted.
    /// An empty keyword matches every line.
    #[arg(value_name = "KEYWORD")]
    pub keyword: Option<String>,

    /// Bounded channel capacity between the walker and the workers. Default: 10.
    #[arg(long, short = 'c', value_parser = clap::value_parser!(usize))]
    pub capacity: Option<usize>,

    /// Number of search workers. Default: 100.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Descend into symlinked directories. Default: true; `--follow-links false` skips them.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Strict mode: stop at the first unreadable path and fail.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,

    /// Verbose output (debug logging, list skipped paths).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
