use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Library-wide error type.
///
/// Every failure in the stream factory and its consumers is reported as one of
/// these variants; nothing in the crate panics or prints on I/O failure.
#[derive(Debug, Error)]
pub enum Error {
    // ── Sources / sinks ───────────────────────────────────────────────────────
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Url: {url} - Unexpected HTTP Code {status}")]
    Http { status: u16, url: String },

    #[error("request {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Codecs ────────────────────────────────────────────────────────────────
    #[error("cannot initialize {codec} codec: {source}")]
    CodecInit {
        codec: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Stream {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("close failed: {}", .errors.join("; "))]
    Close { errors: Vec<String> },

    // ── Records ───────────────────────────────────────────────────────────────
    #[error("record {index}: short read, got {got} of {expected} bytes")]
    ShortRead {
        index: u64,
        expected: usize,
        got: usize,
    },

    #[error("record {index}: processor error: {source}")]
    Processor {
        index: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("{context}: {source}")]
    Format {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn stream(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Stream {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn format(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Format {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Merge the outcomes of closing two layers.
    ///
    /// Both results are always inspected; when both failed the messages of both
    /// are kept in an [`Error::Close`].
    pub(crate) fn aggregate(first: Result<()>, second: Result<()>) -> Result<()> {
        match (first, second) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(a), Err(b)) => Err(Error::Close {
                errors: vec![a.to_string(), b.to_string()],
            }),
        }
    }

    /// True when this error means the data ended before a record was complete.
    #[must_use]
    pub fn is_short_read(&self) -> bool {
        matches!(self, Error::ShortRead { .. })
    }
}
