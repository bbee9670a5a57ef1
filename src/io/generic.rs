//! Format-generic record I/O.
//!
//! The file format is chosen from the inner extension, after any compression
//! suffix has been stripped: `users.csv.zst` is CSV inside zstd,
//! `events.ndjson.gz` is JSONL inside gzip. Extension matching is
//! case-insensitive.
//!
//! | Extension            | Format      |
//! |----------------------|-------------|
//! | `.jsonl`, `.ndjson`  | JSONL       |
//! | `.csv`               | CSV         |
//! | `.msgpack`, `.mp`    | MessagePack |
//! | `.parquet`           | Parquet     |
//!
//! Rows are schema-free [`Record`]s. CSV cells are coerced with
//! [`infer_value`]; JSON and MessagePack keep their own scalar types; Parquet
//! maps each column type onto a [`Value`](crate::value::Value).

use crate::error::{Error, Result};
use crate::io::compression::strip_compression_suffix;
use crate::value::Record;
use std::fmt;
use std::path::Path;

/// Record file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Jsonl,
    Csv,
    MsgPack,
    Parquet,
}

impl Format {
    /// Detect the format of a filename or URL.
    ///
    /// # Errors
    /// [`Error::UnsupportedFormat`] naming the inner extension when it is not
    /// one of the supported formats.
    pub fn detect(name: &str) -> Result<Self> {
        let inner = strip_compression_suffix(name);
        let ext = Path::new(inner)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jsonl" | "ndjson" => Ok(Format::Jsonl),
            "csv" => Ok(Format::Csv),
            "msgpack" | "mp" => Ok(Format::MsgPack),
            "parquet" => Ok(Format::Parquet),
            _ => Err(Error::UnsupportedFormat(format!(
                "{name}: extension {ext:?} (supported: .jsonl, .ndjson, .csv, .msgpack, .mp, .parquet)"
            ))),
        }
    }

    /// Preferred extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Format::Jsonl => "jsonl",
            Format::Csv => "csv",
            Format::MsgPack => "msgpack",
            Format::Parquet => "parquet",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Jsonl => "JSONL",
            Format::Csv => "CSV",
            Format::MsgPack => "MessagePack",
            Format::Parquet => "Parquet",
        })
    }
}

/// Read every record of a JSONL, CSV, MessagePack or Parquet file or URL.
///
/// CSV input must have a header row; columns beyond the header are ignored and
/// missing trailing cells are left out of the record. Parquet records carry
/// every column, with null cells as `Value::Null`.
///
/// # Errors
/// [`Error::UnsupportedFormat`] for unknown extensions or formats whose
/// feature is disabled, plus the errors of the underlying reader.
pub fn read_input(path_or_url: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path_or_url.as_ref();
    let name = path.to_string_lossy();
    match Format::detect(&name)? {
        #[cfg(feature = "io-jsonl")]
        Format::Jsonl => crate::io::jsonl::read_jsonl_vec(path),
        #[cfg(feature = "io-csv")]
        Format::Csv => read_csv_records(path),
        #[cfg(feature = "io-msgpack")]
        Format::MsgPack => crate::io::msgpack::read_msgpack_vec(path),
        #[cfg(feature = "io-parquet")]
        Format::Parquet => crate::io::parquet::read_parquet_records(path),
        #[allow(unreachable_patterns)]
        other => Err(not_compiled_in(other)),
    }
}

/// Write records in the format named by `path`, compressing by suffix.
///
/// For CSV the header is the sorted union of all record keys and missing cells
/// are written empty. Parquet columns are typed from the values, see
/// [`write_parquet_records`](crate::io::parquet::write_parquet_records).
///
/// # Errors
/// [`Error::UnsupportedFormat`] as for [`read_input`],
/// [`Error::InvalidArgument`] when writing zero records to CSV or Parquet
/// (there is no header or schema to write), plus the errors of the underlying writer.
pub fn write_output(path: impl AsRef<Path>, records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    match Format::detect(&path.to_string_lossy())? {
        #[cfg(feature = "io-jsonl")]
        Format::Jsonl => crate::io::jsonl::write_jsonl_vec(path, records).map(drop),
        #[cfg(feature = "io-csv")]
        Format::Csv => write_csv_records(path, records),
        #[cfg(feature = "io-msgpack")]
        Format::MsgPack => crate::io::msgpack::write_msgpack_stream(path, records).map(drop),
        #[cfg(feature = "io-parquet")]
        Format::Parquet => crate::io::parquet::write_parquet_records(path, records).map(drop),
        #[allow(unreachable_patterns)]
        other => Err(not_compiled_in(other)),
    }
}

/// Convert one file to another format and/or compression.
///
/// # Returns
/// The number of records converted.
///
/// # Errors
/// See [`read_input`] and [`write_output`].
pub fn convert(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<usize> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let records = read_input(input)?;
    write_output(output, &records)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        records = records.len(),
        "converted"
    );
    Ok(records.len())
}

#[cfg(feature = "io-csv")]
fn read_csv_records(path: &Path) -> Result<Vec<Record>> {
    use crate::io::csv::{iterate_csv, CsvOptions};
    use crate::value::infer_value;

    let mut header: Option<Vec<String>> = None;
    let mut out = Vec::new();
    iterate_csv(path, &CsvOptions::default(), |row| {
        if let Some(h) = &header {
            out.push(
                h.iter()
                    .zip(&row)
                    .map(|(k, v)| (k.clone(), infer_value(v)))
                    .collect(),
            );
        } else {
            header = Some(row);
        }
        Ok(())
    })?;
    if header.is_none() {
        return Err(Error::format(
            format!("read {}", path.display()),
            "empty CSV file (no header)",
        ));
    }
    Ok(out)
}

#[cfg(feature = "io-csv")]
fn write_csv_records(path: &Path, records: &[Record]) -> Result<()> {
    use crate::io::stream::create_for_write;
    use std::collections::BTreeSet;

    if records.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no records to write to {}",
            path.display()
        )));
    }
    let header: Vec<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let csv_err = |e| Error::format(format!("write CSV {}", path.display()), e);
    let mut wtr = csv::Writer::from_writer(create_for_write(path)?);
    wtr.write_record(&header).map_err(csv_err)?;
    for rec in records {
        let row = header
            .iter()
            .map(|k| rec.get(*k).map(ToString::to_string).unwrap_or_default());
        wtr.write_record(row).map_err(csv_err)?;
    }
    wtr.into_inner()
        .map_err(|e| Error::stream(format!("flush {}", path.display()), e.into_error()))?
        .close()?;
    tracing::info!(file = %path.display(), rows = records.len(), columns = header.len(), "CSV records written");
    Ok(())
}

fn not_compiled_in(format: Format) -> Error {
    Error::UnsupportedFormat(format!("{format} support not compiled in"))
}
