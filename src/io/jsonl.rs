//! JSON Lines (JSONL) I/O.
//!
//! This module provides:
//! - **Typed vector I/O** with Serde: [`read_jsonl_vec`] and [`write_jsonl_vec`]
//! - **Streaming ingestion** with a callback per document: [`iterate_jsonl`]
//! - **Deterministic parallel writer**: [`write_jsonl_par`] (feature `parallel-io`)
//!
//! # Notes
//! - Files are newline-delimited JSON; empty/whitespace-only lines are skipped on read.
//! - Every path goes through
//!   [`open_for_read`](crate::io::stream::open_for_read)/[`create_for_write`], so
//!   `events.jsonl.gz` or an `http` URL work exactly like a plain file.
//! - Line numbers in errors are 1-based and count skipped blank lines.

use crate::error::{Error, Result};
use crate::io::lines::LineIter;
use crate::io::stream::{create_for_write, StreamWriter};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Read a JSONL file into a typed `Vec<T>`.
///
/// Each non-empty line is parsed as a JSON document and deserialized to `T`.
///
/// # Errors
/// Returns an error if the source cannot be opened or read, or
/// [`Error::Format`] naming the line if any line fails to parse into `T`.
pub fn read_jsonl_vec<T: DeserializeOwned>(path_or_url: impl AsRef<Path>) -> Result<Vec<T>> {
    let mut out = Vec::<T>::new();
    iterate_jsonl(path_or_url, |v: T| {
        out.push(v);
        Ok(())
    })?;
    Ok(out)
}

/// Call `processor` with every document of a JSONL file or URL.
///
/// # Returns
/// The number of documents processed (blank lines are not counted).
///
/// # Errors
/// [`Error::Format`] for a line that fails to parse, [`Error::Processor`]
/// carrying the 1-based line number when `processor` fails, plus open/read
/// errors.
pub fn iterate_jsonl<T, F>(path_or_url: impl AsRef<Path>, mut processor: F) -> Result<u64>
where
    T: DeserializeOwned,
    F: FnMut(T) -> anyhow::Result<()>,
{
    let mut lines = LineIter::open(path_or_url)?;
    let name = lines.name().to_string();
    let mut count = 0u64;
    let mut line_no = 0u64;
    for line in lines.by_ref() {
        let line = line?;
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let v: T = serde_json::from_str(&line)
            .map_err(|e| Error::format(format!("parse JSONL line {line_no} in {name}"), e))?;
        processor(v).map_err(|source| Error::Processor {
            index: line_no,
            source,
        })?;
        count += 1;
    }
    lines.close()?;
    tracing::info!(file = %name, documents = count, "JSONL processed");
    Ok(count)
}

/// Write a typed slice as a JSONL file (one JSON value per line).
///
/// Each element is serialized with Serde to a single line, followed by `\n`.
/// Parent directories are created as needed and the output is compressed
/// according to its suffix.
///
/// # Returns
/// The number of items written (`data.len()`).
///
/// # Errors
/// Returns an error if the file/dirs cannot be created, any item fails to
/// serialize, or the stream fails to close.
pub fn write_jsonl_vec<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let mut w = BufWriter::new(create_for_write(path)?);
    for (i, item) in data.iter().enumerate() {
        serde_json::to_writer(&mut w, item).map_err(|e| {
            Error::format(format!("serialize item #{} to {}", i + 1, path.display()), e)
        })?;
        w.write_all(b"\n")
            .map_err(|e| Error::stream(format!("write {}", path.display()), e))?;
    }
    finish(w, path)?;
    tracing::info!(file = %path.display(), documents = data.len(), "JSONL written");
    Ok(data.len())
}

/// Write JSONL in parallel while keeping **deterministic final order**.
///
/// The input slice is split into contiguous shards; each shard is serialized to
/// an in-memory buffer in parallel, then the buffers are written in shard
/// index order through a single compressed stream.
///
/// * `shards`: if `None`, defaults to `num_cpus::get().max(2)`, clamped to `[1,n]`.
///
/// # Returns
/// The number of items written (`data.len()`).
///
/// # Errors
/// Returns an error if any item fails to serialize or the output cannot be
/// created/written/closed.
///
/// # Feature
/// Requires the `parallel-io` feature.
#[cfg(feature = "parallel-io")]
pub fn write_jsonl_par<T: Serialize + Sync>(
    path: impl AsRef<Path>,
    data: &[T],
    shards: Option<usize>,
) -> Result<usize> {
    use rayon::prelude::*;
    let path = path.as_ref();
    let n = data.len();
    let shards = shards.unwrap_or_else(|| num_cpus::get().max(2)).clamp(1, n.max(1));
    let chunk = n.div_ceil(shards).max(1);

    let buffers = data
        .par_chunks(chunk)
        .enumerate()
        .map(|(idx, part)| -> Result<Vec<u8>> {
            let mut buf = Vec::with_capacity(part.len().saturating_mul(64));
            for (i, item) in part.iter().enumerate() {
                serde_json::to_writer(&mut buf, item).map_err(|e| {
                    Error::format(format!("serialize item #{}", idx * chunk + i + 1), e)
                })?;
                buf.push(b'\n');
            }
            Ok(buf)
        })
        .collect::<Result<Vec<_>>>()?;

    // concat in order
    let mut w = create_for_write(path)?;
    for buf in &buffers {
        w.write_all(buf)
            .map_err(|e| Error::stream(format!("write {}", path.display()), e))?;
    }
    w.close()?;
    tracing::info!(file = %path.display(), documents = n, shards, "JSONL written in parallel");
    Ok(n)
}

fn finish(w: BufWriter<StreamWriter>, path: &Path) -> Result<()> {
    w.into_inner()
        .map_err(|e| Error::stream(format!("flush {}", path.display()), e.into_error()))?
        .close()
}
