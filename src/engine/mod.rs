//! Engine module: CLI surface, per-file scan, path filters

pub mod arg_parser;
pub mod handlers;
pub mod scan;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use handlers::handle_run;
pub use scan::{scan_file, scan_reader};
pub use tools::{glob_match, is_excluded, is_os_hidden_file, should_include_in_walk};
