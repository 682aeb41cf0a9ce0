use anyhow::Context;
use std::path::Path;
use url::Url;

use crate::Result;

/// Read the work list from a plain-text file, one URL per line.
///
/// Lines are trimmed and blank lines dropped. Order is preserved and duplicates
/// are allowed. Lines that do not look like http(s) URLs are kept (they will
/// surface as per-item failures) but flagged in the log.
pub fn read_urls(path: &Path) -> Result<Vec<String>> {
    let content = fs_err::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))?;

    let mut urls = Vec::new();
    for (line_number, url) in numbered_lines(&content) {
        if !is_http_url(&url) {
            tracing::warn!(
                "line {} does not look like an http(s) URL: {}",
                line_number,
                url
            );
        }
        urls.push(url);
    }

    Ok(urls)
}

/// Trimmed non-blank lines paired with their 1-based line number in the
/// original file, so warnings point at the right place.
fn numbered_lines(content: &str) -> Vec<(usize, String)> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(number, line)| (number, line.to_string()))
        .collect()
}

fn is_http_url(input: &str) -> bool {
    Url::parse(input)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
