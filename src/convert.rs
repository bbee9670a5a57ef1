//! Batch conversion of many files.
//!
//! Each input is converted independently with its own read and write handles;
//! with the `parallel-io` feature the files are spread over the rayon pool.
//! One failing file does not stop the others, so results are reported per file.

use crate::error::Result;
use crate::io::compression::strip_compression_suffix;
use crate::io::generic::convert;
use std::path::{Path, PathBuf};

/// Result of converting one file.
#[derive(Debug)]
pub struct ConvertOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Records converted, or why the file failed.
    pub result: Result<usize>,
}

impl ConvertOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Output path for `input` in `out_dir` with extension `out_ext`.
///
/// Both the compression suffix and the format extension of the input are
/// replaced: `in/users.csv.gz` with `jsonl.zst` becomes `out/users.jsonl.zst`.
/// A leading dot on `out_ext` is optional.
#[must_use]
pub fn output_path(input: &Path, out_dir: &Path, out_ext: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let inner = strip_compression_suffix(&name);
    let stem = Path::new(inner)
        .file_stem()
        .map_or_else(|| inner.to_string(), |s| s.to_string_lossy().into_owned());
    out_dir.join(format!("{stem}.{}", out_ext.trim_start_matches('.')))
}

/// Convert every input into `out_dir`, replacing extensions with `out_ext`.
///
/// Outcomes are returned in input order.
pub fn convert_many(inputs: &[PathBuf], out_dir: impl AsRef<Path>, out_ext: &str) -> Vec<ConvertOutcome> {
    let out_dir = out_dir.as_ref();
    let one = |input: &PathBuf| {
        let output = output_path(input, out_dir, out_ext);
        let result = convert(input, &output);
        if let Err(e) = &result {
            tracing::warn!(input = %input.display(), error = %e, "conversion failed");
        }
        ConvertOutcome {
            input: input.clone(),
            output,
            result,
        }
    };

    #[cfg(feature = "parallel-io")]
    let outcomes: Vec<ConvertOutcome> = {
        use rayon::prelude::*;
        inputs.par_iter().map(one).collect()
    };
    #[cfg(not(feature = "parallel-io"))]
    let outcomes: Vec<ConvertOutcome> = inputs.iter().map(one).collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    tracing::info!(files = outcomes.len(), failed, "batch conversion finished");
    outcomes
}
