pub mod config;
pub mod logger;
pub mod prompt;
pub(crate) mod settings_toml;

pub use config::*;
pub use logger::{Colors, setup_logging};
pub use prompt::prompt_line;
