//! Transparent compression streams.
//!
//! [`open_for_read`] and [`create_for_write`] are the only two ways the rest of
//! the crate touches files. Both resolve the base stream, ask the
//! [codec registry](crate::io::compression) which codec the trailing suffix
//! names, and wrap the base stream accordingly:
//!
//! ```no_run
//! use std::io::{Read, Write};
//! use tabstream::io::stream::{create_for_write, open_for_read};
//! # fn main() -> anyhow::Result<()> {
//! let mut w = create_for_write("out/events.jsonl.zst1")?;
//! w.write_all(b"{\"id\":1}\n")?;
//! w.close()?; // finishes the zstd frame, then syncs and closes the file
//!
//! let mut r = open_for_read("out/events.jsonl.zst1")?;
//! let mut text = String::new();
//! r.read_to_string(&mut text)?;
//! r.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Closing
//!
//! Handles are closed with a consuming `close()`, so a closed handle cannot be
//! used again. Closing a writer first runs the encoder's own finish routine
//! (writing its trailer) and then closes the base [`Sink`]. The base sink is
//! closed even if finishing failed, and if both steps fail both errors are
//! reported in [`Error::Close`].
//!
//! A writer dropped without `close()` still finishes on a best-effort basis,
//! but any error is lost; a warning is logged.
//!
//! ## Passthrough
//!
//! For [`Codec::None`] the base stream sits directly in an enum variant: no
//! boxing and no extra buffer layer.

use crate::error::{Error, Result};
use crate::io::compression::{detect, Codec, CompressionLevel};
use crate::io::source::{BaseReader, Source};
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// A byte sink with an explicit, fallible close.
///
/// Rust's `File` reports nothing when dropped, so the base layer of a
/// [`StreamWriter`] is closed through this trait instead.
pub trait Sink: Write {
    /// Flush and release the sink, reporting any failure.
    ///
    /// # Errors
    /// Any I/O error raised while flushing or syncing.
    fn close(&mut self) -> io::Result<()>;
}

impl Sink for File {
    fn close(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl Sink for Vec<u8> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Sink> Sink for BufWriter<W> {
    fn close(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_mut().close()
    }
}

// ============================================================================
// Read path
// ============================================================================

enum Decoder<R: Read> {
    Plain(R),
    #[cfg(feature = "compression-gzip")]
    Gzip(flate2::read::MultiGzDecoder<R>),
    #[cfg(feature = "compression-zstd")]
    Zstd(zstd::stream::read::Decoder<'static, io::BufReader<R>>),
    #[cfg(feature = "compression-zlib")]
    Zlib(flate2::read::ZlibDecoder<R>),
    #[cfg(feature = "compression-lz4")]
    Lz4(lz4_flex::frame::FrameDecoder<R>),
    #[cfg(feature = "compression-brotli")]
    Brotli(Box<brotli::Decompressor<R>>),
    #[cfg(feature = "compression-xz")]
    Xz(xz2::read::XzDecoder<R>),
}

/// Readable handle over a possibly-compressed source.
pub struct StreamReader<R: Read = BaseReader> {
    inner: Decoder<R>,
    codec: Codec,
    name: String,
}

/// Open a local file or `http` URL for reading, decompressing by suffix.
///
/// # Errors
/// - [`Error::Io`] if the local file cannot be opened.
/// - [`Error::Http`] / [`Error::Request`] for failed URL fetches.
/// - [`Error::CodecInit`] if the decoder cannot be constructed (for gzip, an
///   invalid header is detected here). The base stream is closed first.
pub fn open_for_read(path_or_url: impl AsRef<Path>) -> Result<StreamReader> {
    let path = path_or_url.as_ref();
    let name = path.to_string_lossy().into_owned();
    let source = Source::from_path(path);
    let base = source.open()?;
    let (codec, _) = detect(&name);
    let reader = StreamReader::build(base, codec, name)?;
    tracing::debug!(source = %source, codec = %codec, "opened stream for read");
    Ok(reader)
}

impl<R: Read> StreamReader<R> {
    /// Wrap any reader with the decoder for `codec`.
    ///
    /// # Errors
    /// [`Error::CodecInit`] when the decoder cannot be constructed or the codec
    /// was not compiled in.
    pub fn wrap(reader: R, codec: Codec) -> Result<Self> {
        Self::build(reader, codec, format!("<{codec} stream>"))
    }

    fn build(reader: R, codec: Codec, name: String) -> Result<Self> {
        let init_err = |source: io::Error| Error::CodecInit {
            codec: codec.name(),
            source,
        };
        #[allow(unreachable_patterns)]
        let inner = match codec {
            Codec::None => Decoder::Plain(reader),
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => {
                let dec = flate2::read::MultiGzDecoder::new(reader);
                if dec.header().is_none() {
                    return Err(init_err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "invalid gzip header",
                    )));
                }
                Decoder::Gzip(dec)
            }
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => Decoder::Zstd(zstd::stream::read::Decoder::new(reader).map_err(init_err)?),
            #[cfg(feature = "compression-zlib")]
            Codec::Zlib => Decoder::Zlib(flate2::read::ZlibDecoder::new(reader)),
            #[cfg(feature = "compression-lz4")]
            Codec::Lz4 => Decoder::Lz4(lz4_flex::frame::FrameDecoder::new(reader)),
            #[cfg(feature = "compression-brotli")]
            Codec::Brotli => Decoder::Brotli(Box::new(brotli::Decompressor::new(reader, 4096))),
            #[cfg(feature = "compression-xz")]
            Codec::Xz => Decoder::Xz(xz2::read::XzDecoder::new_multi_decoder(reader)),
            _ => return Err(init_err(not_compiled_in(codec))),
        };
        Ok(Self { inner, codec, name })
    }

    /// Codec chosen at open time.
    #[must_use]
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// The path, URL or label this stream was opened from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the decoder, then the base stream.
    ///
    /// Decoders and read-side base streams release their resources on drop and
    /// cannot fail to close; the `Result` keeps the contract symmetrical with
    /// [`StreamWriter::close`].
    ///
    /// # Errors
    /// Currently never fails.
    pub fn close(self) -> Result<()> {
        tracing::debug!(name = %self.name, codec = %self.codec, "closed read stream");
        drop(self.inner);
        Ok(())
    }
}

impl<R: Read> Read for StreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Decoder::Plain(r) => r.read(buf),
            #[cfg(feature = "compression-gzip")]
            Decoder::Gzip(r) => r.read(buf),
            #[cfg(feature = "compression-zstd")]
            Decoder::Zstd(r) => r.read(buf),
            #[cfg(feature = "compression-zlib")]
            Decoder::Zlib(r) => r.read(buf),
            #[cfg(feature = "compression-lz4")]
            Decoder::Lz4(r) => r.read(buf),
            #[cfg(feature = "compression-brotli")]
            Decoder::Brotli(r) => r.read(buf),
            #[cfg(feature = "compression-xz")]
            Decoder::Xz(r) => r.read(buf),
        }
    }
}

impl<R: Read> fmt::Debug for StreamReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamReader")
            .field("name", &self.name)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Write path
// ============================================================================

enum Encoder<W: Sink> {
    Plain(W),
    #[cfg(feature = "compression-gzip")]
    Gzip(flate2::write::GzEncoder<W>),
    #[cfg(feature = "compression-zstd")]
    Zstd(zstd::stream::write::Encoder<'static, W>),
    #[cfg(feature = "compression-zlib")]
    Zlib(flate2::write::ZlibEncoder<W>),
    #[cfg(feature = "compression-lz4")]
    Lz4(lz4_flex::frame::FrameEncoder<Tracked<W>>),
    #[cfg(feature = "compression-brotli")]
    Brotli(Box<brotli::CompressorWriter<Tracked<W>>>),
    #[cfg(feature = "compression-xz")]
    Xz(xz2::write::XzEncoder<W>),
}

impl<W: Sink> Encoder<W> {
    /// Finish the encoder, then close the base sink.
    ///
    /// Returns both outcomes; the sink is closed regardless of the first.
    fn close_layers(self) -> (io::Result<()>, io::Result<()>) {
        match self {
            Encoder::Plain(mut w) => (Ok(()), w.close()),
            #[cfg(feature = "compression-gzip")]
            Encoder::Gzip(mut e) => {
                let finished = e.try_finish();
                (finished, e.get_mut().close())
            }
            #[cfg(feature = "compression-zstd")]
            Encoder::Zstd(mut e) => {
                let finished = e.do_finish();
                (finished, e.get_mut().close())
            }
            #[cfg(feature = "compression-zlib")]
            Encoder::Zlib(mut e) => {
                let finished = e.try_finish();
                (finished, e.get_mut().close())
            }
            #[cfg(feature = "compression-lz4")]
            Encoder::Lz4(mut e) => {
                let res = e.try_finish();
                let tracked = e.get_mut();
                let finished = match res {
                    Ok(()) => tracked.take_error(),
                    Err(err) => tracked.take_error().and(Err(io::Error::other(err))),
                };
                (finished, tracked.inner.close())
            }
            #[cfg(feature = "compression-brotli")]
            Encoder::Brotli(e) => {
                // `into_inner` writes the final block but swallows write errors,
                // which `Tracked` recorded on the way through.
                let mut tracked = (*e).into_inner();
                let finished = tracked.take_error();
                (finished, tracked.inner.close())
            }
            #[cfg(feature = "compression-xz")]
            Encoder::Xz(mut e) => {
                let finished = e.try_finish();
                (finished, e.get_mut().close())
            }
        }
    }
}

/// Writable handle that compresses into a [`Sink`].
pub struct StreamWriter<W: Sink = File> {
    inner: Option<Encoder<W>>,
    codec: Codec,
    level: CompressionLevel,
    name: String,
}

/// Create (or truncate) a local file for writing, compressing by suffix.
///
/// Parent directories are created as needed. URLs are not valid targets.
///
/// # Errors
/// [`Error::Io`] if the directories or file cannot be created, and
/// [`Error::CodecInit`] if the encoder cannot be constructed.
pub fn create_for_write(path: impl AsRef<Path>) -> Result<StreamWriter> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let name = path.to_string_lossy().into_owned();
    let (codec, level) = detect(&name);
    let writer = StreamWriter::build(file, codec, level, name)?;
    tracing::debug!(path = %path.display(), codec = %codec, ?level, "created stream for write");
    Ok(writer)
}

impl<W: Sink> StreamWriter<W> {
    /// Wrap any sink with the encoder for `codec` at `level`.
    ///
    /// # Errors
    /// [`Error::CodecInit`] when the encoder cannot be constructed or the codec
    /// was not compiled in.
    pub fn wrap(sink: W, codec: Codec, level: CompressionLevel) -> Result<Self> {
        Self::build(sink, codec, level, format!("<{codec} stream>"))
    }

    fn build(sink: W, codec: Codec, level: CompressionLevel, name: String) -> Result<Self> {
        let init_err = |source: io::Error| Error::CodecInit {
            codec: codec.name(),
            source,
        };
        #[allow(unreachable_patterns)]
        let inner = match codec {
            Codec::None => Encoder::Plain(sink),
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Encoder::Gzip(flate2::write::GzEncoder::new(
                sink,
                flate2::Compression::default(),
            )),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => Encoder::Zstd(
                zstd::stream::write::Encoder::new(sink, level.zstd_level()).map_err(init_err)?,
            ),
            #[cfg(feature = "compression-zlib")]
            Codec::Zlib => Encoder::Zlib(flate2::write::ZlibEncoder::new(
                sink,
                flate2::Compression::default(),
            )),
            #[cfg(feature = "compression-lz4")]
            Codec::Lz4 => Encoder::Lz4(lz4_flex::frame::FrameEncoder::new(Tracked::new(sink))),
            #[cfg(feature = "compression-brotli")]
            Codec::Brotli => Encoder::Brotli(Box::new(brotli::CompressorWriter::new(
                Tracked::new(sink),
                4096,
                6,
                22,
            ))),
            #[cfg(feature = "compression-xz")]
            Codec::Xz => Encoder::Xz(xz2::write::XzEncoder::new(sink, 6)),
            _ => return Err(init_err(not_compiled_in(codec))),
        };
        Ok(Self {
            inner: Some(inner),
            codec,
            level,
            name,
        })
    }

    /// Codec chosen at creation time.
    #[must_use]
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Encoder level chosen at creation time.
    #[must_use]
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// The path or label this stream writes to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finish the encoder, then close the base sink.
    ///
    /// Both steps always run. The encoder's trailer is written before the sink
    /// is closed.
    ///
    /// # Errors
    /// [`Error::Stream`] when one step fails, [`Error::Close`] with both
    /// messages when both fail.
    pub fn close(mut self) -> Result<()> {
        let Some(inner) = self.inner.take() else {
            return Ok(());
        };
        let (finished, closed) = inner.close_layers();
        let finished = finished
            .map_err(|e| Error::stream(format!("finish {} stream {}", self.codec, self.name), e));
        let closed = closed.map_err(|e| Error::stream(format!("close {}", self.name), e));
        let res = Error::aggregate(finished, closed);
        match &res {
            Ok(()) => tracing::debug!(name = %self.name, codec = %self.codec, "closed write stream"),
            Err(e) => tracing::debug!(name = %self.name, error = %e, "closing write stream failed"),
        }
        res
    }

    fn encoder(&mut self) -> io::Result<&mut Encoder<W>> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other("write to a closed stream"))
    }
}

impl<W: Sink> Write for StreamWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.encoder()? {
            Encoder::Plain(w) => w.write(buf),
            #[cfg(feature = "compression-gzip")]
            Encoder::Gzip(w) => w.write(buf),
            #[cfg(feature = "compression-zstd")]
            Encoder::Zstd(w) => w.write(buf),
            #[cfg(feature = "compression-zlib")]
            Encoder::Zlib(w) => w.write(buf),
            #[cfg(feature = "compression-lz4")]
            Encoder::Lz4(w) => {
                let res = w.write(buf);
                w.get_mut().restore(res)
            }
            #[cfg(feature = "compression-brotli")]
            Encoder::Brotli(w) => {
                let res = w.write(buf);
                w.get_mut().restore(res)
            }
            #[cfg(feature = "compression-xz")]
            Encoder::Xz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoder()? {
            Encoder::Plain(w) => w.flush(),
            #[cfg(feature = "compression-gzip")]
            Encoder::Gzip(w) => w.flush(),
            #[cfg(feature = "compression-zstd")]
            Encoder::Zstd(w) => w.flush(),
            #[cfg(feature = "compression-zlib")]
            Encoder::Zlib(w) => w.flush(),
            #[cfg(feature = "compression-lz4")]
            Encoder::Lz4(w) => {
                let res = w.flush();
                w.get_mut().restore(res)
            }
            #[cfg(feature = "compression-brotli")]
            Encoder::Brotli(w) => {
                let res = w.flush();
                w.get_mut().restore(res)
            }
            #[cfg(feature = "compression-xz")]
            Encoder::Xz(w) => w.flush(),
        }
    }
}

impl<W: Sink> Drop for StreamWriter<W> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            tracing::warn!(name = %self.name, "write stream dropped without close()");
            let _ = inner.close_layers();
        }
    }
}

impl<W: Sink> fmt::Debug for StreamWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamWriter")
            .field("name", &self.name)
            .field("codec", &self.codec)
            .field("level", &self.level)
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

/// Sink adapter that remembers the first write error it passed through.
///
/// The encoder above only ever sees a bare `io::Error` of the same kind; the
/// original error stays here until [`Tracked::restore`] or
/// [`Tracked::take_error`] hands it back. lz4_flex panics on errors that carry
/// a custom payload, and brotli drops errors while finishing.
#[cfg(any(feature = "compression-brotli", feature = "compression-lz4"))]
struct Tracked<W> {
    inner: W,
    error: Option<io::Error>,
}

#[cfg(any(feature = "compression-brotli", feature = "compression-lz4"))]
impl<W> Tracked<W> {
    fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    fn take_error(&mut self) -> io::Result<()> {
        self.error.take().map_or(Ok(()), Err)
    }

    fn record<T>(&mut self, res: io::Result<T>) -> io::Result<T> {
        res.map_err(|e| {
            let bare = io::Error::from(e.kind());
            if e.kind() != io::ErrorKind::Interrupted {
                self.error.get_or_insert(e);
            }
            bare
        })
    }

    /// Swap a failure reported by the encoder for the recorded original.
    fn restore<T>(&mut self, res: io::Result<T>) -> io::Result<T> {
        res.map_err(|e| self.error.take().unwrap_or(e))
    }
}

#[cfg(any(feature = "compression-brotli", feature = "compression-lz4"))]
impl<W: Write> Write for Tracked<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res = self.inner.write(buf);
        self.record(res)
    }

    fn flush(&mut self) -> io::Result<()> {
        let res = self.inner.flush();
        self.record(res)
    }
}

fn not_compiled_in(codec: Codec) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{codec} support not compiled in (feature `compression-{codec}`)"),
    )
}
