//! Console prompts for the search inputs when they were not given on the command line.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

/// Print `question` on stderr and read one trimmed line from `input`.
/// Empty answers fall back to `default` when one is given.
pub fn prompt_line<R: BufRead>(
    input: &mut R,
    question: &str,
    default: Option<&str>,
) -> Result<String> {
    let label = format!("[{}]", env!("CARGO_PKG_NAME")).cyan().bold();
    let hint = default.map(|d| format!(" (e.g. {d})")).unwrap_or_default();
    let mut stderr = std::io::stderr().lock();
    write!(stderr, "{} {}{}: ", label, question, hint).context("write prompt")?;
    stderr.flush().context("flush prompt")?;
    drop(stderr);

    let mut line = String::new();
    let n = input.read_line(&mut line).context("read answer from stdin")?;
    if n == 0 {
        anyhow::bail!("stdin closed before an answer to '{}' was given", question);
    }
    let answer = line.trim();
    match (answer.is_empty(), default) {
        (true, Some(d)) => Ok(d.to_string()),
        _ => Ok(answer.to_string()),
    }
}
