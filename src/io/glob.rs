//! File globbing for batch conversion.
//!
//! Expands a pattern such as `data/*.csv.gz` into a sorted list of files, so a
//! batch run processes inputs in a deterministic order.
//!
//! # Examples
//!
//! ```no_run
//! use tabstream::io::glob::expand_glob;
//!
//! // Match all compressed JSONL files in a directory
//! let files = expand_glob("logs/*.jsonl.zst")?;
//!
//! // Match files with date-based partitions
//! let partitions = expand_glob("data/events/year=2024/month=*/*.csv")?;
//! # Ok::<(), tabstream::Error>(())
//! ```

use crate::error::{Error, Result};
use glob::glob;
use std::path::PathBuf;

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Supports standard glob patterns:
/// - `*` matches any sequence of characters within a path component
/// - `?` matches any single character
/// - `**` matches zero or more directories
/// - `[abc]` / `[!abc]` match a character in / not in the set
///
/// Directories are skipped. No match is an empty vector, not an error.
///
/// # Errors
/// [`Error::InvalidArgument`] if the pattern is invalid, and [`Error::Io`] if
/// a directory cannot be read while matching.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern)
        .map_err(|e| Error::InvalidArgument(format!("invalid glob pattern {pattern}: {e}")))?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::io(path, e.into_error())
        })?;
        // Only include actual files, not directories
        if path.is_file() {
            result.push(path);
        }
    }

    result.sort();
    tracing::debug!(pattern, matches = result.len(), "expanded glob");
    Ok(result)
}

/// Expand a glob pattern, returning an error if no files are found.
///
/// # Errors
/// As [`expand_glob`], plus [`Error::InvalidArgument`] when nothing matches.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no files found matching pattern: {pattern}"
        )));
    }
    Ok(files)
}
