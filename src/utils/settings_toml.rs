//! Load `.needlescan.toml` from the searched directory (CLI only). Lib callers pass `SearchOpts`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SettingsToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    capacity: Option<usize>,
    workers: Option<usize>,
    exclude: Option<Vec<String>>,
    follow_links: Option<bool>,
    strict: Option<bool>,
    verbose: Option<bool>,
}

/// Parse settings text. Split from the loader so malformed input can be reported by the caller.
pub(crate) fn parse_settings_toml(s: &str) -> Result<SettingsToml, toml::de::Error> {
    toml::from_str(s)
}

/// Load the settings file from `dir`. `Ok(None)` if there is none; malformed files are an error
/// for the caller to report once logging is up.
pub(crate) fn load_settings_toml(dir: &Path) -> Result<Option<SettingsToml>> {
    let path = dir.join(PackagePaths::get().config_filename());
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    let file = parse_settings_toml(&s).with_context(|| format!("{}", path.display()))?;
    Ok(Some(file))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($file:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $file.$field.clone() {
            $opts.$field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &SettingsToml, opts: &mut Opts) {
    let s = &file.settings;
    apply_file_opt!(s, opts, capacity);
    apply_file_opt!(s, opts, workers);
    apply_file_opt!(s, opts, exclude);
    apply_file_opt!(s, opts, follow_links);
    apply_file_opt!(s, opts, strict);
    apply_file_opt!(s, opts, verbose);
}
