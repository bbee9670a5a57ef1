//! Parquet I/O powered by Serde + Arrow + Parquet.
//!
//! - [`write_parquet_vec`] writes `&[T]` with a schema inferred from `T`
//! - [`read_parquet_vec`] reads a whole file into `Vec<T>`
//! - [`iterate_parquet`] hands rows to a callback one record batch at a time
//! - [`read_parquet_records`] / [`write_parquet_records`] move schema-free
//!   [`Record`]s, taking the schema from the file or from the values
//!
//! Parquet needs random access to its footer, so reads drain the source
//! through [`open_for_read`] into a [`Bytes`] buffer first. This is what makes
//! URLs and outer compression (`data.parquet.zst`) work; the whole file is held
//! in memory while it is read. Writes go through [`create_for_write`], so an
//! outer compression suffix wraps the finished Parquet file.
//!
//! Uses Arrow 58 and `serde_arrow` 0.14 (`SchemaLike::from_type` and
//! `to_record_batch`/`from_record_batch`).

use crate::error::{Error, Result};
use crate::io::stream::{create_for_write, open_for_read};
use crate::value::{Record, Value};
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, FieldRef, Float64Type, Int64Type, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::{de::DeserializeOwned, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use serde_arrow::{from_record_batch, to_record_batch};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

const BATCH_SIZE: usize = 64 * 1024;

/// Write a typed slice to a Parquet file.
///
/// Internally:
/// 1. Infers an Arrow schema from `T` using `SchemaLike::from_type`.
/// 2. Converts `data` into a `RecordBatch` via `to_record_batch`.
/// 3. Writes the batch with `parquet::arrow::ArrowWriter` into a
///    [`create_for_write`] stream, then closes the stream.
///
/// This works even when `data` is empty (a zero-row batch is written).
///
/// # Returns
/// Number of rows written (`data.len()`).
///
/// # Errors
/// [`Error::Format`] if schema inference, conversion or Parquet encoding fails,
/// plus create/close errors of the stream.
pub fn write_parquet_vec<T: Serialize + serde::Deserialize<'static>>(
    path: impl AsRef<Path>,
    data: &[T],
) -> Result<usize> {
    let path = path.as_ref();

    // Infer fields from T (works even if data.is_empty()).
    let fields: Vec<FieldRef> = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())
        .map_err(|e| Error::format("infer Arrow schema from row type", e))?;
    let batch: RecordBatch = to_record_batch(&fields, &data)
        .map_err(|e| Error::format("convert rows to RecordBatch", e))?;

    write_batch(path, &batch)?;
    tracing::info!(file = %path.display(), rows = data.len(), "Parquet written");
    Ok(data.len())
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let sink = create_for_write(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(sink, batch.schema(), Some(props))
        .map_err(|e| Error::format(format!("create Parquet writer for {}", path.display()), e))?;
    writer
        .write(batch)
        .map_err(|e| Error::format(format!("write batch to {}", path.display()), e))?;
    // into_inner writes the footer and hands back the compression stream.
    let sink = writer
        .into_inner()
        .map_err(|e| Error::format(format!("finish Parquet file {}", path.display()), e))?;
    sink.close()
}

/// Read a Parquet file or URL into a typed `Vec<T>`.
///
/// # Errors
/// Open/read errors of the source, or [`Error::Format`] if the file is not
/// valid Parquet or its rows do not deserialize into `T`.
pub fn read_parquet_vec<T: DeserializeOwned>(path_or_url: impl AsRef<Path>) -> Result<Vec<T>> {
    let mut out: Vec<T> = Vec::new();
    iterate_batches(path_or_url, |mut rows: Vec<T>, _| {
        out.append(&mut rows);
        Ok(())
    })?;
    Ok(out)
}

/// Call `processor` with every row of a Parquet file or URL.
///
/// # Returns
/// The number of rows processed.
///
/// # Errors
/// As [`read_parquet_vec`], plus [`Error::Processor`] with the 1-based row
/// index when `processor` fails.
pub fn iterate_parquet<T, F>(path_or_url: impl AsRef<Path>, mut processor: F) -> Result<u64>
where
    T: DeserializeOwned,
    F: FnMut(T) -> anyhow::Result<()>,
{
    iterate_batches(path_or_url, |rows: Vec<T>, first_index| {
        for (i, row) in rows.into_iter().enumerate() {
            let index = first_index + i as u64;
            processor(row).map_err(|source| Error::Processor { index, source })?;
        }
        Ok(())
    })
}

/// Drive `f` with each deserialized batch and the 1-based index of its first row.
fn iterate_batches<T, F>(path_or_url: impl AsRef<Path>, mut f: F) -> Result<u64>
where
    T: DeserializeOwned,
    F: FnMut(Vec<T>, u64) -> Result<()>,
{
    let (name, reader) = open_batches(path_or_url)?;
    let mut count = 0u64;
    for batch in reader {
        let batch = batch.map_err(|e| Error::format(format!("read batch in {name}"), e))?;
        let rows: Vec<T> = from_record_batch(&batch)
            .map_err(|e| Error::format(format!("deserialize rows of {name}"), e))?;
        let n = rows.len() as u64;
        f(rows, count + 1)?;
        count += n;
    }
    tracing::info!(file = %name, rows = count, "Parquet processed");
    Ok(count)
}

/// Read every row of a Parquet file or URL as a schema-free [`Record`].
///
/// The schema comes from the file. Integer columns become [`Value::Int64`]
/// (unsigned 64-bit values beyond `i64::MAX` become null), float columns
/// [`Value::Float64`], booleans [`Value::Bool`], and every other scalar type
/// is rendered as text. Null cells are kept as [`Value::Null`], so every
/// record carries every column.
///
/// # Errors
/// As [`read_parquet_vec`]; nested columns that have no text form are
/// [`Error::Format`].
pub fn read_parquet_records(path_or_url: impl AsRef<Path>) -> Result<Vec<Record>> {
    let (name, reader) = open_batches(path_or_url)?;
    let mut out = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| Error::format(format!("read batch in {name}"), e))?;
        let schema = batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, col)| {
                column_values(col)
                    .map(|vals| (field.name().as_str(), vals))
                    .map_err(|e| Error::format(format!("convert column {} of {name}", field.name()), e))
            })
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            out.push(
                columns
                    .iter()
                    .map(|(k, vals)| ((*k).to_string(), vals[row].clone()))
                    .collect(),
            );
        }
    }
    tracing::info!(file = %name, rows = out.len(), "Parquet records read");
    Ok(out)
}

/// Write schema-free records to a Parquet file, compressing by suffix.
///
/// Columns are the sorted union of record keys, all nullable. A column holding
/// only integers is `Int64`, integers mixed with floats is `Float64`, only
/// booleans is `Boolean`; anything else is `Utf8` using the text form of each
/// value. Missing keys and [`Value::Null`] are written as null.
///
/// # Errors
/// [`Error::InvalidArgument`] for zero records (there is no schema to write),
/// plus the errors of [`write_parquet_vec`].
pub fn write_parquet_records(path: impl AsRef<Path>, records: &[Record]) -> Result<usize> {
    let path = path.as_ref();
    if records.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no records to write to {}",
            path.display()
        )));
    }
    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let mut fields = Vec::with_capacity(keys.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(keys.len());
    for key in keys {
        let cells = || records.iter().map(move |r| r.get(key));
        let array: ArrayRef = match column_kind(cells()) {
            Kind::Bool => Arc::new(BooleanArray::from(
                cells()
                    .map(|v| match v {
                        Some(Value::Bool(b)) => Some(*b),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
            Kind::Int => Arc::new(Int64Array::from(
                cells()
                    .map(|v| match v {
                        Some(Value::Int64(i)) => Some(*i),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
            Kind::Float => Arc::new(Float64Array::from(
                cells()
                    .map(|v| match v {
                        Some(Value::Int64(i)) => Some(*i as f64),
                        Some(Value::Float64(x)) => Some(*x),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
            Kind::Null | Kind::Text => Arc::new(StringArray::from(
                cells()
                    .map(|v| match v {
                        None | Some(Value::Null) => None,
                        Some(v) => Some(v.to_string()),
                    })
                    .collect::<Vec<_>>(),
            )),
        };
        fields.push(Field::new(key, array.data_type().clone(), true));
        arrays.push(array);
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .map_err(|e| Error::format("build RecordBatch from records", e))?;
    write_batch(path, &batch)?;
    tracing::info!(file = %path.display(), rows = records.len(), columns = batch.num_columns(), "Parquet records written");
    Ok(records.len())
}

/// Narrowest Arrow type that holds every non-null cell of a column.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Null,
    Bool,
    Int,
    Float,
    Text,
}

fn column_kind<'a>(cells: impl Iterator<Item = Option<&'a Value>>) -> Kind {
    cells.fold(Kind::Null, |acc, v| {
        let kind = match v {
            None | Some(Value::Null) => return acc,
            Some(Value::Bool(_)) => Kind::Bool,
            Some(Value::Int64(_)) => Kind::Int,
            Some(Value::Float64(_)) => Kind::Float,
            Some(Value::String(_)) => Kind::Text,
        };
        match (acc, kind) {
            (Kind::Null, k) => k,
            (a, k) if a == k => a,
            (Kind::Int, Kind::Float) | (Kind::Float, Kind::Int) => Kind::Float,
            _ => Kind::Text,
        }
    })
}

fn column_values(col: &ArrayRef) -> std::result::Result<Vec<Value>, ArrowError> {
    fn cells(col: &dyn Array, f: impl Fn(usize) -> Value) -> Vec<Value> {
        (0..col.len())
            .map(|i| if col.is_null(i) { Value::Null } else { f(i) })
            .collect()
    }

    Ok(match col.data_type() {
        DataType::Null => vec![Value::Null; col.len()],
        DataType::Boolean => {
            let a = col.as_boolean();
            cells(a, |i| Value::Bool(a.value(i)))
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let c = cast(col, &DataType::Int64)?;
            let a = c.as_primitive::<Int64Type>();
            cells(a, |i| Value::Int64(a.value(i)))
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let c = cast(col, &DataType::Float64)?;
            let a = c.as_primitive::<Float64Type>();
            cells(a, |i| Value::Float64(a.value(i)))
        }
        _ => {
            let c = cast(col, &DataType::Utf8)?;
            let a = c.as_string::<i32>();
            cells(a, |i| Value::String(a.value(i).to_string()))
        }
    })
}

fn open_batches(path_or_url: impl AsRef<Path>) -> Result<(String, ParquetRecordBatchReader)> {
    let mut src = open_for_read(path_or_url)?;
    let name = src.name().to_string();
    let mut buf = Vec::new();
    src.read_to_end(&mut buf)
        .map_err(|e| Error::stream(format!("read {name}"), e))?;
    src.close()?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(buf))
        .and_then(|b| b.with_batch_size(BATCH_SIZE).build())
        .map_err(|e| Error::format(format!("open Parquet file {name}"), e))?;
    Ok((name, reader))
}
