//! Line iteration and whole-file loading over transparent streams.

use crate::error::{Error, Result};
use crate::io::stream::{open_for_read, StreamReader};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Call `processor` on every line of a file or URL.
///
/// Line terminators (`\n` or `\r\n`) are stripped. Compression is detected
/// from the suffix.
///
/// # Returns
/// The number of lines processed.
///
/// # Errors
/// Open failures, decode/read failures ([`Error::Stream`], e.g. a truncated
/// compressed stream), invalid UTF-8, or [`Error::Processor`] carrying the
/// 1-based line number when `processor` fails.
pub fn iterate_lines<F>(path_or_url: impl AsRef<Path>, mut processor: F) -> Result<u64>
where
    F: FnMut(&str) -> anyhow::Result<()>,
{
    let mut lines = LineIter::open(path_or_url)?;
    let name = lines.name().to_string();
    let mut count = 0u64;
    for line in lines.by_ref() {
        let line = line?;
        count += 1;
        processor(&line).map_err(|source| Error::Processor {
            index: count,
            source,
        })?;
    }
    lines.close()?;
    tracing::info!(file = %name, lines = count, "lines processed");
    Ok(count)
}

/// Read a whole file or URL into memory, decompressing by suffix.
///
/// # Errors
/// Open failures or [`Error::Stream`] if the stream cannot be drained.
pub fn load_bin_file(path_or_url: impl AsRef<Path>) -> Result<Vec<u8>> {
    let mut r = open_for_read(path_or_url)?;
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)
        .map_err(|e| Error::stream(format!("read {}", r.name()), e))?;
    tracing::info!(file = %r.name(), bytes = buf.len(), "file loaded");
    r.close()?;
    Ok(buf)
}

/// Pull-based line reader over a [`StreamReader`].
pub struct LineIter<R: Read = crate::io::source::BaseReader> {
    inner: BufReader<StreamReader<R>>,
    line_no: u64,
    buf: String,
}

impl LineIter {
    /// Open a file or URL for line iteration.
    ///
    /// # Errors
    /// See [`open_for_read`].
    pub fn open(path_or_url: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(open_for_read(path_or_url)?))
    }
}

impl<R: Read> LineIter<R> {
    /// Iterate the lines of an already-open stream.
    pub fn new(reader: StreamReader<R>) -> Self {
        Self {
            inner: BufReader::new(reader),
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Name of the underlying stream.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.get_ref().name()
    }

    /// Number of lines returned so far.
    #[must_use]
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Close the underlying stream.
    ///
    /// # Errors
    /// See [`StreamReader::close`].
    pub fn close(self) -> Result<()> {
        self.inner.into_inner().close()
    }
}

impl<R: Read> Iterator for LineIter<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.inner.read_line(&mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                let trimmed = self.buf.strip_suffix('\n').unwrap_or(&self.buf);
                let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
                Some(Ok(trimmed.to_string()))
            }
            Err(e) => Some(Err(Error::stream(
                format!("read line {} in {}", self.line_no + 1, self.name()),
                e,
            ))),
        }
    }
}
