//! Binary record streams.
//!
//! Two framings are supported, both read through
//! [`open_for_read`](crate::io::stream::open_for_read) and therefore
//! compression-agnostic:
//!
//! - **Fixed-size records**: the stream is a plain concatenation of records of
//!   `record_size` bytes. A stream that ends exactly on a record boundary ends
//!   iteration cleanly; one that ends inside a record is
//!   [`Error::ShortRead`].
//! - **Length-prefixed record lists**: each record is a little-endian `u32`
//!   length followed by that many payload bytes. This is the container used for
//!   lists of FlatBuffer tables, but nothing here looks inside the payload.

use crate::error::{Error, Result};
use crate::io::stream::{create_for_write, open_for_read, StreamReader};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

const BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Outcome of one exact-length read.
enum Fill {
    Full,
    Eof,
    Partial(usize),
}

/// Read exactly `buf.len()` bytes, telling a clean EOF apart from a truncated
/// read.
fn fill<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<Fill> {
    let mut got = 0;
    while got < buf.len() {
        match r.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(match got {
        0 if !buf.is_empty() => Fill::Eof,
        n if n == buf.len() => Fill::Full,
        n => Fill::Partial(n),
    })
}

/// Pull-based reader of fixed-size binary records.
pub struct RecordIter<R: Read = crate::io::source::BaseReader> {
    inner: BufReader<StreamReader<R>>,
    buf: Vec<u8>,
    index: u64,
    done: bool,
}

impl RecordIter {
    /// Open a file or URL of `record_size`-byte records.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for a zero `record_size`, otherwise see
    /// [`open_for_read`].
    pub fn open(path_or_url: impl AsRef<Path>, record_size: usize) -> Result<Self> {
        if record_size == 0 {
            return Err(Error::InvalidArgument("record size must be positive".into()));
        }
        Self::new(open_for_read(path_or_url)?, record_size)
    }
}

impl<R: Read> RecordIter<R> {
    /// Iterate fixed-size records of an already-open stream.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for a zero `record_size`.
    pub fn new(reader: StreamReader<R>, record_size: usize) -> Result<Self> {
        if record_size == 0 {
            return Err(Error::InvalidArgument("record size must be positive".into()));
        }
        Ok(Self {
            inner: BufReader::new(reader),
            buf: vec![0; record_size],
            index: 0,
            done: false,
        })
    }

    /// Read the next record into the internal buffer.
    ///
    /// Returns `Ok(None)` at a clean end of stream. The returned slice is only
    /// valid until the next call.
    ///
    /// # Errors
    /// [`Error::ShortRead`] if the stream ends inside a record, or
    /// [`Error::Stream`] if reading/decoding fails.
    pub fn next_record(&mut self) -> Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }
        let filled = fill(&mut self.inner, &mut self.buf).map_err(|e| {
            Error::stream(
                format!("read record {} in {}", self.index + 1, self.inner.get_ref().name()),
                e,
            )
        });
        match filled {
            Ok(Fill::Full) => {
                self.index += 1;
                Ok(Some(&self.buf))
            }
            Ok(Fill::Eof) => {
                self.done = true;
                Ok(None)
            }
            Ok(Fill::Partial(got)) => {
                self.done = true;
                Err(Error::ShortRead {
                    index: self.index + 1,
                    expected: self.buf.len(),
                    got,
                })
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Number of complete records returned so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.index
    }

    /// Close the underlying stream.
    ///
    /// # Errors
    /// See [`StreamReader::close`].
    pub fn close(self) -> Result<()> {
        self.inner.into_inner().close()
    }
}

/// Call `processor` on every `record_size`-byte record of a file or URL.
///
/// # Returns
/// The number of records processed.
///
/// # Errors
/// [`Error::ShortRead`] when the final record is truncated (a zero-byte tail is
/// a clean end), [`Error::Processor`] with the 1-based record index when
/// `processor` fails, plus the open/read errors of [`open_for_read`].
pub fn iterate_binary_records<F>(
    path_or_url: impl AsRef<Path>,
    record_size: usize,
    mut processor: F,
) -> Result<u64>
where
    F: FnMut(&[u8]) -> anyhow::Result<()>,
{
    let mut it = RecordIter::open(path_or_url, record_size)?;
    let mut count = 0u64;
    while let Some(rec) = it.next_record()? {
        count += 1;
        processor(rec).map_err(|source| Error::Processor {
            index: count,
            source,
        })?;
    }
    tracing::info!(file = %it.inner.get_ref().name(), records = count, "binary records processed");
    it.close()?;
    Ok(count)
}

/// Call `processor` on every payload of a length-prefixed record list.
///
/// # Returns
/// The number of records processed.
///
/// # Errors
/// [`Error::ShortRead`] for a truncated length prefix or payload,
/// [`Error::Processor`] when `processor` fails, plus open/read errors.
pub fn iterate_record_list<F>(path_or_url: impl AsRef<Path>, mut processor: F) -> Result<u64>
where
    F: FnMut(&[u8]) -> anyhow::Result<()>,
{
    let reader = open_for_read(path_or_url)?;
    let name = reader.name().to_string();
    let mut r = BufReader::with_capacity(BUFFER_SIZE, reader);
    let read_err = |index: u64, e| Error::stream(format!("read record {index} in {name}"), e);

    let mut len_buf = [0u8; 4];
    let mut payload = Vec::new();
    let mut count = 0u64;
    loop {
        let index = count + 1;
        match fill(&mut r, &mut len_buf).map_err(|e| read_err(index, e))? {
            Fill::Eof => break,
            Fill::Partial(got) => {
                return Err(Error::ShortRead {
                    index,
                    expected: 4,
                    got,
                });
            }
            Fill::Full => {}
        }
        // The prefix is untrusted; grow the buffer only as far as the data goes.
        let len = LittleEndian::read_u32(&len_buf);
        payload.clear();
        (&mut r)
            .take(u64::from(len))
            .read_to_end(&mut payload)
            .map_err(|e| read_err(index, e))?;
        if payload.len() as u64 != u64::from(len) {
            return Err(Error::ShortRead {
                index,
                expected: len as usize,
                got: payload.len(),
            });
        }
        count = index;
        processor(&payload).map_err(|source| Error::Processor { index, source })?;
    }
    r.into_inner().close()?;
    tracing::info!(file = %name, records = count, "record list processed");
    Ok(count)
}

/// Read a whole length-prefixed record list into memory.
///
/// # Errors
/// See [`iterate_record_list`].
pub fn read_record_list(path_or_url: impl AsRef<Path>) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::new();
    iterate_record_list(path_or_url, |rec| {
        out.push(rec.to_vec());
        Ok(())
    })?;
    Ok(out)
}

/// Write records as a length-prefixed list, compressing by suffix.
///
/// # Returns
/// Total bytes written before compression (prefixes included).
///
/// # Errors
/// [`Error::InvalidArgument`] if a record exceeds `u32::MAX` bytes, plus the
/// create/write/close errors of the stream.
pub fn save_record_list<T: AsRef<[u8]>>(path: impl AsRef<Path>, records: &[T]) -> Result<u64> {
    let path = path.as_ref();
    let mut w = BufWriter::with_capacity(BUFFER_SIZE, create_for_write(path)?);
    let write_err = |i: usize, e| Error::stream(format!("write record {} to {}", i + 1, path.display()), e);

    let mut total = 0u64;
    for (i, rec) in records.iter().enumerate() {
        let rec = rec.as_ref();
        let len = u32::try_from(rec.len()).map_err(|_| {
            Error::InvalidArgument(format!("record {} is {} bytes, over the u32 limit", i + 1, rec.len()))
        })?;
        w.write_u32::<LittleEndian>(len).map_err(|e| write_err(i, e))?;
        w.write_all(rec).map_err(|e| write_err(i, e))?;
        total += 4 + u64::from(len);
    }
    let stream = w
        .into_inner()
        .map_err(|e| Error::stream(format!("flush {}", path.display()), e.into_error()))?;
    stream.close()?;
    tracing::info!(file = %path.display(), records = records.len(), bytes = total, "record list saved");
    Ok(total)
}
