//! CSV I/O utilities.
//!
//! This module provides:
//! - **Typed vector I/O** with Serde: [`read_csv_vec`] and [`write_csv_vec`]
//! - **Row iteration**: [`iterate_csv`] (rows as `Vec<String>`) and
//!   [`iterate_csv_map`] (rows keyed by the header)
//! - **Deterministic parallel writer**: [`write_csv_par`] (feature `parallel-io`)
//!
//! # Design notes
//! - All typed I/O is Serde-backed (`DeserializeOwned`/`Serialize`).
//! - Parsing is configured by [`CsvOptions`]; rows may have differing field
//!   counts.
//! - Row numbers in errors are physical, 1-based, and include the header row.

use crate::error::{Error, Result};
use crate::io::stream::{create_for_write, open_for_read, StreamReader, StreamWriter};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// CSV parsing and writing options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Lines starting with this byte are ignored. Disabled when `None`.
    pub comment: Option<u8>,
    /// Treat the first row as a header. [`iterate_csv`] skips it; typed reads
    /// map it to field names; writers emit one.
    pub has_headers: bool,
    /// Trim whitespace around fields.
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            comment: None,
            has_headers: false,
            trim: false,
        }
    }
}

impl CsvOptions {
    /// Default options with a header row.
    #[must_use]
    pub fn with_headers() -> Self {
        Self {
            has_headers: true,
            ..Self::default()
        }
    }

    fn reader<R: std::io::Read>(&self, has_headers: bool, rdr: R) -> csv::Reader<R> {
        ReaderBuilder::new()
            .delimiter(self.delimiter)
            .comment(self.comment)
            .has_headers(has_headers)
            .trim(if self.trim { Trim::Fields } else { Trim::None })
            .flexible(true)
            .from_reader(rdr)
    }

    fn writer<W: Write>(&self, has_headers: bool, w: W) -> csv::Writer<W> {
        WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(has_headers)
            .from_writer(w)
    }
}

/// Read a CSV file or URL into a typed `Vec<T>`.
///
/// Rows are deserialized with Serde using `T: DeserializeOwned`. With
/// `has_headers`, struct fields are matched by header name; otherwise by
/// position.
///
/// # Errors
/// Returns an error if the source cannot be opened, or [`Error::Format`] with
/// the row number if any row fails to deserialize into `T`.
pub fn read_csv_vec<T: DeserializeOwned>(
    path_or_url: impl AsRef<Path>,
    opts: &CsvOptions,
) -> Result<Vec<T>> {
    let src = open_for_read(path_or_url)?;
    let name = src.name().to_string();
    let mut rdr = opts.reader(opts.has_headers, src);
    let first_row = u64::from(opts.has_headers) + 1;
    let mut out = Vec::<T>::new();
    for (i, rec) in rdr.deserialize::<T>().enumerate() {
        let v = rec.map_err(|e| {
            Error::format(format!("parse CSV row {} in {name}", first_row + i as u64), e)
        })?;
        out.push(v);
    }
    close_reader(rdr)?;
    tracing::info!(file = %name, rows = out.len(), "CSV read");
    Ok(out)
}

/// Write a typed slice to a CSV file.
///
/// Rows are serialized with Serde using `T: Serialize`. A header row is emitted
/// when `opts.has_headers` is set and `T` serializes as a struct or map.
/// Parent directories are created and the output is compressed by suffix.
///
/// # Returns
/// The number of rows written (i.e., `data.len()`).
///
/// # Errors
/// Returns an error if the file/dirs cannot be created, any row fails to
/// serialize, or the stream fails to close.
pub fn write_csv_vec<T: Serialize>(
    path: impl AsRef<Path>,
    data: &[T],
    opts: &CsvOptions,
) -> Result<usize> {
    let path = path.as_ref();
    let mut wtr = opts.writer(opts.has_headers, create_for_write(path)?);
    for (i, row) in data.iter().enumerate() {
        wtr.serialize(row)
            .map_err(|e| Error::format(format!("serialize CSV row #{} to {}", i + 1, path.display()), e))?;
    }
    close_writer(wtr, path)?;
    tracing::info!(file = %path.display(), rows = data.len(), "CSV written");
    Ok(data.len())
}

/// Call `processor` with the fields of every row.
///
/// With `opts.has_headers` the first row is skipped.
///
/// # Returns
/// The number of rows processed, header excluded.
///
/// # Errors
/// [`Error::Format`] for malformed CSV, [`Error::Processor`] with the physical
/// row number when `processor` fails, plus open/read errors.
pub fn iterate_csv<F>(path_or_url: impl AsRef<Path>, opts: &CsvOptions, mut processor: F) -> Result<u64>
where
    F: FnMut(Vec<String>) -> anyhow::Result<()>,
{
    let src = open_for_read(path_or_url)?;
    let name = src.name().to_string();
    let mut rdr = opts.reader(false, src);
    let mut records = rdr.records();
    let mut row = 0u64;

    if opts.has_headers {
        match records.next() {
            None => {
                tracing::info!(file = %name, rows = 0, "CSV processed (empty file)");
                return Ok(0);
            }
            Some(header) => {
                header.map_err(|e| Error::format(format!("read CSV header in {name}"), e))?;
                row += 1;
            }
        }
    }

    let mut count = 0u64;
    for rec in records {
        let rec = rec.map_err(|e| Error::format(format!("row {}: CSV parse error in {name}", row + 1), e))?;
        row += 1;
        let fields = rec.iter().map(str::to_string).collect();
        processor(fields).map_err(|source| Error::Processor { index: row, source })?;
        count += 1;
    }
    close_reader(rdr)?;
    tracing::info!(file = %name, rows = count, "CSV processed");
    Ok(count)
}

/// Call `processor` with every data row keyed by the header.
///
/// The first row is always the header, regardless of `opts.has_headers`. Rows
/// shorter than the header are padded with empty strings; extra fields are
/// dropped. Duplicate header names keep the last value.
///
/// # Returns
/// The number of rows processed, header excluded.
///
/// # Errors
/// [`Error::Format`] for an empty file or malformed CSV,
/// [`Error::Processor`] with the physical row number when `processor` fails,
/// plus open/read errors.
pub fn iterate_csv_map<F>(
    path_or_url: impl AsRef<Path>,
    opts: &CsvOptions,
    mut processor: F,
) -> Result<u64>
where
    F: FnMut(BTreeMap<String, String>) -> anyhow::Result<()>,
{
    let src = open_for_read(path_or_url)?;
    let name = src.name().to_string();
    let mut rdr = opts.reader(false, src);
    let mut records = rdr.records();

    let headers: Vec<String> = match records.next() {
        None => return Err(Error::format(format!("read {name}"), "empty CSV file (no header)")),
        Some(h) => h
            .map_err(|e| Error::format(format!("read CSV header in {name}"), e))?
            .iter()
            .map(str::to_string)
            .collect(),
    };

    let mut row = 1u64;
    for rec in records {
        let rec = rec.map_err(|e| Error::format(format!("row {}: CSV parse error in {name}", row + 1), e))?;
        row += 1;
        let map = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), rec.get(i).unwrap_or_default().to_string()))
            .collect();
        processor(map).map_err(|source| Error::Processor { index: row, source })?;
    }
    close_reader(rdr)?;
    tracing::info!(file = %name, rows = row - 1, "CSV processed (excluding header)");
    Ok(row - 1)
}

/// Parallel CSV writer with **deterministic final order**.
///
/// Each shard (a contiguous sub-slice of `data`) is serialized into an
/// in-memory buffer **in parallel**, then all buffers are written in shard
/// index order through one compressed stream. This preserves stable,
/// predictable file ordering regardless of thread scheduling.
///
/// * `shards`: optional shard count. If `None`, defaults to `2 * num_cpus()`,
///   clamped to `[1, data.len()]`.
/// * `opts.has_headers`: if `true`, only shard 0 writes the header (once).
///
/// # Returns
/// The number of rows written (i.e., `data.len()`).
///
/// # Errors
/// Returns an error on serialization or stream failures.
///
/// # Feature
/// Requires the `parallel-io` feature.
#[cfg(feature = "parallel-io")]
pub fn write_csv_par<T: Serialize + Sync>(
    path: impl AsRef<Path>,
    data: &[T],
    shards: Option<usize>,
    opts: &CsvOptions,
) -> Result<usize> {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    let n = data.len();
    let path = path.as_ref();

    let shard_count = shards
        .unwrap_or_else(|| 2 * num_cpus::get().max(2))
        .clamp(1, n.max(1));
    let ranges = split_ranges(n, shard_count);

    // Serialize each range into a buffer in parallel. Only chunk 0 emits headers if requested.
    let mut buffers: Vec<(usize, Vec<u8>)> = ranges
        .into_par_iter()
        .map(|(idx, start, end)| {
            let mut buf: Vec<u8> = Vec::with_capacity((end - start).saturating_mul(64)); // heuristic
            {
                let mut wtr = opts.writer(opts.has_headers && idx == 0, &mut buf);
                for (i, rec) in data[start..end].iter().enumerate() {
                    wtr.serialize(rec)
                        .map_err(|e| Error::format(format!("serialize CSV row #{}", start + i + 1), e))?;
                }
                wtr.flush()
                    .map_err(|e| Error::stream(format!("buffer shard {idx}"), e))?;
            }
            Ok::<_, Error>((idx, buf))
        })
        .collect::<Result<Vec<_>>>()?;

    buffers.sort_by_key(|(idx, _)| *idx);

    let mut w = create_for_write(path)?;
    for (_, buf) in buffers {
        w.write_all(&buf)
            .map_err(|e| Error::stream(format!("write {}", path.display()), e))?;
    }
    w.close()?;
    tracing::info!(file = %path.display(), rows = n, shards = shard_count, "CSV written in parallel");
    Ok(n)
}

/// Split `[0, len)` into `parts` contiguous ranges as `(chunk_idx, start, end)`.
///
/// Ensures `parts` is in `[1, len]` (when `len > 0`) and distributes the
/// remainder fairly. Ranges are non-empty and cover the entire domain.
#[cfg(feature = "parallel-io")]
fn split_ranges(len: usize, parts: usize) -> Vec<(usize, usize, usize)> {
    let parts = parts.max(1).min(len.max(1));
    let base = len / parts;
    let rem = len % parts;

    let mut out = Vec::with_capacity(parts);
    let mut start = 0usize;
    for idx in 0..parts {
        let extra = usize::from(idx < rem);
        let end = start + base + extra;
        if start < end {
            out.push((idx, start, end));
        }
        start = end;
    }
    out
}

fn close_reader(rdr: csv::Reader<StreamReader>) -> Result<()> {
    rdr.into_inner().close()
}

fn close_writer(wtr: csv::Writer<StreamWriter>, path: &Path) -> Result<()> {
    wtr.into_inner()
        .map_err(|e| Error::stream(format!("flush {}", path.display()), e.into_error()))?
        .close()
}
