//! Streams and the consumers built on them.
//!
//! [`compression`] maps suffixes to codecs, [`source`] resolves files and URLs,
//! and [`stream`] combines the two into the read/write factory. Everything
//! else in this module reads or writes through that factory.

pub mod compression;
pub mod generic;
pub mod glob;
pub mod lines;
pub mod records;
pub mod source;
pub mod stream;

#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub mod jsonl;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;

#[cfg_attr(docsrs, doc(cfg(feature = "io-msgpack")))]
#[cfg(feature = "io-msgpack")]
pub mod msgpack;

#[cfg_attr(docsrs, doc(cfg(feature = "io-parquet")))]
#[cfg(feature = "io-parquet")]
pub mod parquet;
