//! # Tabstream
//!
//! **Transparent-compression streams** and the tabular readers and writers
//! built on them. Every file is opened through one factory that looks at the
//! filename suffix, picks a codec, and hands back a plain `Read`/`Write`
//! handle; the consumers (lines, binary records, JSONL, CSV, MessagePack,
//! Parquet) never care whether the bytes were gzip, zstd, or came over HTTP.
//!
//! ## Key Features
//!
//! - **Suffix-driven codecs** - `.gz`, `.zst`/`.zst1`/`.zst2`, `.zlib`/`.zz`,
//!   `.lz4`, `.br`, `.xz`, anything else is passthrough
//! - **Local files and URLs** - inputs starting with `http` are fetched with a
//!   blocking GET
//! - **Checked close** - closing a writer finishes the encoder and then the
//!   file, and reports every failure
//! - **Typed I/O** - Serde-backed readers and writers for JSONL, CSV,
//!   MessagePack and Parquet
//! - **Schema-free conversion** - [`Record`]/[`Value`] rows and a `tabconv`
//!   binary for format/compression conversion
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::io::{Read, Write};
//! use tabstream::{create_for_write, open_for_read};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut w = create_for_write("test.txt.zst1")?;
//! w.write_all(b"Hello, World!")?;
//! w.close()?;
//!
//! let mut r = open_for_read("test.txt.zst1")?;
//! let mut s = String::new();
//! r.read_to_string(&mut s)?;
//! r.close()?;
//! assert_eq!(s, "Hello, World!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Consumers
//!
//! ### Lines and binary records
//! ```no_run
//! use tabstream::io::lines::iterate_lines;
//! use tabstream::io::records::iterate_binary_records;
//!
//! # fn main() -> anyhow::Result<()> {
//! let n = iterate_lines("https://example.com/words.txt.gz", |line| {
//!     println!("{line}");
//!     Ok(())
//! })?;
//! iterate_binary_records("ticks.bin.zst", 16, |rec| {
//!     anyhow::ensure!(rec[0] != 0xff, "corrupt tick");
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! ### JSON Lines (feature: `io-jsonl`)
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use tabstream::io::jsonl::{read_jsonl_vec, write_jsonl_vec};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Row { id: u32, name: String }
//!
//! # fn main() -> anyhow::Result<()> {
//! let rows: Vec<Row> = read_jsonl_vec("data.jsonl.gz")?;
//! write_jsonl_vec("out/data.jsonl.zst", &rows)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### CSV (feature: `io-csv`)
//! ```no_run
//! use tabstream::io::csv::{iterate_csv_map, CsvOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! iterate_csv_map("users.csv.br", &CsvOptions::default(), |row| {
//!     println!("{}", row["email"]);
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `io-jsonl`, `io-csv`, `io-msgpack`, `io-parquet` - format support
//! - `io-http` - URL sources (reqwest, blocking)
//! - `compression-gzip`, `compression-zlib`, `compression-zstd`,
//!   `compression-lz4`, `compression-brotli`, `compression-xz` - one per codec;
//!   a disabled codec is still detected but fails to open
//! - `parallel-io` - rayon-backed `write_*_par` writers and batch conversion
//!
//! All features are on by default.
//!
//! ## Logging
//!
//! The library never prints. It emits `tracing` events: `debug` when streams
//! open and close, `info` with row/line counts when a consumer finishes, and
//! `warn` when a writer is dropped without `close()`.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod convert;
pub mod error;
pub mod io;
pub mod testing;
pub mod value;

pub use error::{Error, Result};
pub use io::compression::{detect, Codec, CompressionLevel};
pub use io::stream::{create_for_write, open_for_read, Sink, StreamReader, StreamWriter};
pub use value::{infer_value, Record, Value};
