//! MessagePack I/O with Serde (`rmp-serde`).
//!
//! Two layouts are supported:
//! - a single value per file: [`save_msgpack`] / [`load_msgpack`]
//! - a stream of concatenated values: [`write_msgpack_stream`] /
//!   [`iterate_msgpack`] / [`read_msgpack_vec`]
//!
//! Structs are encoded as maps keyed by field name, so files stay readable
//! without the Rust type (and by the schema-free [`Record`](crate::value::Record)
//! reader).

use crate::error::{Error, Result};
use crate::io::stream::{create_for_write, open_for_read, StreamWriter};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

/// Serialize one value to a file, compressing by suffix.
///
/// # Errors
/// [`Error::Format`] if `value` cannot be encoded, plus create/close errors.
pub fn save_msgpack<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let mut w = BufWriter::new(create_for_write(path)?);
    rmp_serde::encode::write_named(&mut w, value)
        .map_err(|e| Error::format(format!("encode MessagePack to {}", path.display()), e))?;
    finish(w, path)?;
    tracing::info!(file = %path.display(), "MessagePack saved");
    Ok(())
}

/// Deserialize one value from a file or URL.
///
/// # Errors
/// [`Error::Format`] if the data is not a valid `T`, plus open errors.
pub fn load_msgpack<T: DeserializeOwned>(path_or_url: impl AsRef<Path>) -> Result<T> {
    let src = open_for_read(path_or_url)?;
    let name = src.name().to_string();
    let mut r = BufReader::new(src);
    let value = rmp_serde::from_read(&mut r)
        .map_err(|e| Error::format(format!("decode MessagePack from {name}"), e))?;
    r.into_inner().close()?;
    tracing::info!(file = %name, "MessagePack loaded");
    Ok(value)
}

/// Write `data` as concatenated MessagePack values.
///
/// # Returns
/// The number of values written.
///
/// # Errors
/// [`Error::Format`] naming the item that failed to encode, plus
/// create/close errors.
pub fn write_msgpack_stream<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let mut w = BufWriter::new(create_for_write(path)?);
    for (i, item) in data.iter().enumerate() {
        rmp_serde::encode::write_named(&mut w, item).map_err(|e| {
            Error::format(format!("encode item #{} to {}", i + 1, path.display()), e)
        })?;
    }
    finish(w, path)?;
    tracing::info!(file = %path.display(), values = data.len(), "MessagePack stream written");
    Ok(data.len())
}

/// Call `processor` with every value of a MessagePack stream.
///
/// Iteration ends at a clean end of stream (between values); a value cut off
/// mid-way is an error.
///
/// # Returns
/// The number of values processed.
///
/// # Errors
/// [`Error::Format`] with the 1-based value index for undecodable or truncated
/// data, [`Error::Processor`] when `processor` fails, plus open/read errors.
pub fn iterate_msgpack<T, F>(path_or_url: impl AsRef<Path>, mut processor: F) -> Result<u64>
where
    T: DeserializeOwned,
    F: FnMut(T) -> anyhow::Result<()>,
{
    let src = open_for_read(path_or_url)?;
    let name = src.name().to_string();
    let mut r = BufReader::new(src);
    let mut count = 0u64;
    loop {
        let at_end = r
            .fill_buf()
            .map_err(|e| Error::stream(format!("read {name}"), e))?
            .is_empty();
        if at_end {
            break;
        }
        let index = count + 1;
        let v: T = rmp_serde::from_read(&mut r)
            .map_err(|e| Error::format(format!("decode MessagePack value {index} from {name}"), e))?;
        processor(v).map_err(|source| Error::Processor { index, source })?;
        count = index;
    }
    r.into_inner().close()?;
    tracing::info!(file = %name, values = count, "MessagePack stream processed");
    Ok(count)
}

/// Read every value of a MessagePack stream into memory.
///
/// # Errors
/// See [`iterate_msgpack`].
pub fn read_msgpack_vec<T: DeserializeOwned>(path_or_url: impl AsRef<Path>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    iterate_msgpack(path_or_url, |v: T| {
        out.push(v);
        Ok(())
    })?;
    Ok(out)
}

fn finish(w: BufWriter<StreamWriter>, path: &Path) -> Result<()> {
    w.into_inner()
        .map_err(|e| Error::stream(format!("flush {}", path.display()), e.into_error()))?
        .close()
}
