//! Testing utilities for code built on tabstream.
//!
//! This module ships with the library so downstream crates can test their own
//! readers and writers the same way this crate does. It includes:
//!
//! - **Mock I/O**: temporary directories, an in-memory [`MockSink`] with
//!   injectable write/close failures, and a one-shot HTTP server for URL
//!   sources
//! - **Fixtures**: sample rows, schema-free records, and deterministic binary
//!   payloads
//!
//! # Quick Start
//!
//! ```
//! use std::io::Write;
//! use tabstream::io::compression::{Codec, CompressionLevel};
//! use tabstream::io::stream::StreamWriter;
//! use tabstream::testing::MockSink;
//!
//! let sink = MockSink::new().fail_close("disk full");
//! let mut w = StreamWriter::wrap(sink.clone(), Codec::Gzip, CompressionLevel::Default).unwrap();
//! w.write_all(b"hello").unwrap();
//!
//! // The gzip trailer is written before the sink's close fails.
//! assert!(w.close().is_err());
//! assert!(sink.is_closed());
//! assert!(!sink.contents().is_empty());
//! ```

pub mod fixtures;
pub mod mock_io;

pub use fixtures::*;
pub use mock_io::*;
