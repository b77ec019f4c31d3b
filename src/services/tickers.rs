use std::path::Path;

use crate::error::{Error, Result};

/// Read a line-delimited ticker list, one symbol per line, order preserved.
///
/// Blank lines and `#` comments are skipped. Symbols keep the case they
/// were written with.
pub fn read_ticker_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read ticker file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
