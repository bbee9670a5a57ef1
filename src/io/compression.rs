//! Codec registry: filename suffix → compression algorithm.
//!
//! Detection looks only at the trailing suffix of a filename or URL, never at
//! file contents. The recognized suffixes are checked in a fixed order and the
//! first literal (case-sensitive) match wins:
//!
//! | Suffix          | Codec    | Write level |
//! |-----------------|----------|-------------|
//! | `.gz`           | gzip     |             |
//! | `.zst`          | zstd     | default     |
//! | `.zst1`         | zstd     | fastest     |
//! | `.zst2`         | zstd     | balanced    |
//! | `.zlib`, `.zz`  | zlib     |             |
//! | `.lz4`          | lz4      | frame       |
//! | `.br`           | brotli   |             |
//! | `.xz`           | xz       |             |
//!
//! Anything else is [`Codec::None`] (passthrough). Inner extensions such as the
//! `.jsonl` in `data.jsonl.gz` are left to the format readers.
//!
//! ```
//! use tabstream::io::compression::{detect, Codec, CompressionLevel};
//!
//! assert_eq!(detect("report.jsonl.gz"), (Codec::Gzip, CompressionLevel::Default));
//! assert_eq!(detect("events.msgpack.zst1"), (Codec::Zstd, CompressionLevel::Fastest));
//! assert_eq!(detect("http://host/data.parquet").0, Codec::None);
//! ```
//!
//! The registry is a `const` table, so detection is safe from any thread and
//! cannot be mutated at runtime. Codecs whose `compression-*` feature is off are
//! still detected; opening them fails with
//! [`Error::CodecInit`](crate::Error::CodecInit).

use std::fmt;

/// Compression algorithm applied to a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Uncompressed passthrough.
    #[default]
    None,
    /// Gzip (RFC 1952), `.gz`.
    Gzip,
    /// Zstandard, `.zst`, `.zst1`, `.zst2`.
    Zstd,
    /// Zlib (RFC 1950), `.zlib`, `.zz`.
    Zlib,
    /// LZ4 frame format, `.lz4`.
    Lz4,
    /// Brotli, `.br`.
    Brotli,
    /// XZ / LZMA2, `.xz`.
    Xz,
}

/// Encoder effort, selected by the zstd suffix variants.
///
/// Decoders ignore it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompressionLevel {
    /// `.zst1`
    Fastest,
    /// `.zst2`
    Balanced,
    /// `.zst` and every non-zstd codec.
    #[default]
    Default,
}

/// Suffix table in priority order.
const SUFFIXES: &[(&str, Codec, CompressionLevel)] = &[
    (".gz", Codec::Gzip, CompressionLevel::Default),
    (".zst", Codec::Zstd, CompressionLevel::Default),
    (".zst1", Codec::Zstd, CompressionLevel::Fastest),
    (".zst2", Codec::Zstd, CompressionLevel::Balanced),
    (".zlib", Codec::Zlib, CompressionLevel::Default),
    (".zz", Codec::Zlib, CompressionLevel::Default),
    (".lz4", Codec::Lz4, CompressionLevel::Default),
    (".br", Codec::Brotli, CompressionLevel::Default),
    (".xz", Codec::Xz, CompressionLevel::Default),
];

/// Detect the codec and write level for a filename or URL.
///
/// Pure and total: every input yields a codec, [`Codec::None`] when no
/// recognized suffix matches.
#[must_use]
pub fn detect(name: &str) -> (Codec, CompressionLevel) {
    SUFFIXES
        .iter()
        .find(|(suffix, _, _)| name.ends_with(suffix))
        .map_or((Codec::None, CompressionLevel::Default), |&(_, codec, level)| {
            (codec, level)
        })
}

/// Strip a recognized compression suffix, leaving the inner name.
///
/// `"data.jsonl.zst2"` becomes `"data.jsonl"`; names without a recognized
/// suffix are returned unchanged.
#[must_use]
pub fn strip_compression_suffix(name: &str) -> &str {
    SUFFIXES
        .iter()
        .find_map(|(suffix, _, _)| name.strip_suffix(suffix))
        .unwrap_or(name)
}

impl Codec {
    /// Codec for `name`, ignoring the level refinement.
    #[must_use]
    pub fn detect(name: &str) -> Self {
        detect(name).0
    }

    /// Human-readable codec name (e.g. `"gzip"`, `"zstd"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Codec::None => "none",
            Codec::Gzip => "gzip",
            Codec::Zstd => "zstd",
            Codec::Zlib => "zlib",
            Codec::Lz4 => "lz4",
            Codec::Brotli => "brotli",
            Codec::Xz => "xz",
        }
    }

    /// Canonical suffix used when building output names; empty for `None`.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Codec::None => "",
            Codec::Gzip => ".gz",
            Codec::Zstd => ".zst",
            Codec::Zlib => ".zlib",
            Codec::Lz4 => ".lz4",
            Codec::Brotli => ".br",
            Codec::Xz => ".xz",
        }
    }

    /// Whether support for this codec was compiled in.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        match self {
            Codec::None => true,
            Codec::Gzip => cfg!(feature = "compression-gzip"),
            Codec::Zstd => cfg!(feature = "compression-zstd"),
            Codec::Zlib => cfg!(feature = "compression-zlib"),
            Codec::Lz4 => cfg!(feature = "compression-lz4"),
            Codec::Brotli => cfg!(feature = "compression-brotli"),
            Codec::Xz => cfg!(feature = "compression-xz"),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl CompressionLevel {
    /// Native zstd level for this tier.
    #[must_use]
    pub const fn zstd_level(self) -> i32 {
        match self {
            CompressionLevel::Fastest => 1,
            CompressionLevel::Balanced => 3,
            CompressionLevel::Default => 7,
        }
    }
}
