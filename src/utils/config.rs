//! Application configuration constants.
//! Pipeline sizing and package-derived names in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    walk_thread_name: String,
    worker_thread_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                walk_thread_name: format!("{pkg}-walk"),
                worker_thread_prefix: format!("{pkg}-worker"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory settings file, e.g. `.needlescan.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    pub fn walk_thread_name(&self) -> &str {
        &self.walk_thread_name
    }

    pub fn worker_thread_name(&self, id: usize) -> String {
        format!("{}-{id}", self.worker_thread_prefix)
    }

    /// Names excluded from the walk by default: our own settings file.
    pub fn default_exclude_patterns(&self) -> Vec<String> {
        vec![self.config_filename().to_string()]
    }
}

// ---- Pipeline ----

/// Channel and pool sizing used when neither the CLI nor the settings file overrides them.
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Slots in the bounded channel between the walk and the workers.
    pub const CHANNEL_CAPACITY: usize = 10;
    /// Search workers started for a run.
    pub const WORKERS: usize = 100;
    /// Symlinked directories are descended into and symlinked files scanned.
    pub const FOLLOW_LINKS: bool = true;
}

// ---- Scanning ----

/// Read buffer for the per-file line scan (bytes). 64 KB.
pub const SCAN_BUFFER_SIZE: usize = 64 * 1024;
