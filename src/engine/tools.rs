//! Path and filter utilities

use anyhow::{Context, Result};
use std::path::Path;

/// Check if a file is OS clutter (Finder/Explorer metadata) that is never worth scanning
pub fn is_os_hidden_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name {
            // macOS
            ".DS_Store" | ".AppleDouble" | ".LSOverride" => true,
            // Windows
            "Thumbs.db" | "ehthumbs.db" | "Desktop.ini" => true,
            // Linux
            ".directory" => true,
            // macOS resource fork files start with ._
            _ => name.starts_with("._"),
        }
    } else {
        false
    }
}

/// True if `path` matches one of the exclude patterns, by file name or by full path.
pub fn is_excluded(path: &Path, exclude_patterns: &[String]) -> bool {
    if exclude_patterns.is_empty() {
        return false;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    let path_str = path.to_str().unwrap_or("");
    exclude_patterns
        .iter()
        .any(|pattern| glob_match(pattern, name) || glob_match(pattern, path_str))
}

/// Returns true if a walk entry should be visited. The root itself is always visited so an
/// exclude pattern can never swallow the whole tree.
pub fn should_include_in_walk(
    path: &Path,
    root: &Path,
    is_dir: bool,
    exclude_patterns: &[String],
) -> bool {
    if path == root {
        return true;
    }
    if !is_dir && is_os_hidden_file(path) {
        return false;
    }
    !is_excluded(path, exclude_patterns)
}

/// Simple glob pattern matching (supports * and ?)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_chars(&pattern, &text)
}

fn glob_match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| glob_match_chars(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && glob_match_chars(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match_chars(rest, &text[1..]),
    }
}

/// Fail early when the search root is not a readable directory.
pub fn check_search_root(path: &Path) -> Result<()> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("read search root metadata: {}", path.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("Search root is not a directory: {}", path.display());
    }
    Ok(())
}
