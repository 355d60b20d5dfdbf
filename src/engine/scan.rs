//! Per-file keyword scan: line-oriented substring match.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::Match;
use crate::utils::config::SCAN_BUFFER_SIZE;

/// Scan the file at `path` for `keyword`, calling `on_match` for every matching line in order.
/// Returns the number of matches.
pub fn scan_file<F>(path: &Path, keyword: &str, on_match: F) -> Result<usize>
where
    F: FnMut(Match),
{
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = BufReader::with_capacity(SCAN_BUFFER_SIZE, file);
    scan_reader(reader, path, keyword, on_match)
        .with_context(|| format!("read {}", path.display()))
}

/// Scan any buffered reader. `path` is only used to label the matches.
///
/// Lines end at `\n` (a trailing `\r` is dropped). Invalid UTF-8 is replaced rather than failing
/// the file, so binary files are scanned too.
pub fn scan_reader<R, F>(
    mut reader: R,
    path: &Path,
    keyword: &str,
    mut on_match: F,
) -> Result<usize>
where
    R: BufRead,
    F: FnMut(Match),
{
    let mut buf = Vec::new();
    let mut line_number = 0_usize;
    let mut found = 0_usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;
        let line = trim_line_ending(&buf);
        let text: Cow<'_, str> = String::from_utf8_lossy(line);
        if text.contains(keyword) {
            found += 1;
            on_match(Match {
                path: path.to_path_buf(),
                line_number,
                line: text.into_owned(),
            });
        }
    }
    Ok(found)
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
