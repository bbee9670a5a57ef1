//! Base byte sources: local files and HTTP response bodies.
//!
//! Any input beginning with `http` is treated as a URL and fetched with a
//! blocking GET; everything else is a local path. This is a plain prefix test,
//! so a local file whose name starts with `http` is also fetched as a URL.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Where the bytes of a stream come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// A path on the local filesystem.
    Local(PathBuf),
    /// An `http://` or `https://` URL.
    Http(String),
}

impl Source {
    /// Resolve an input string.
    #[must_use]
    pub fn parse(path_or_url: &str) -> Self {
        if path_or_url.starts_with("http") {
            Source::Http(path_or_url.to_string())
        } else {
            Source::Local(PathBuf::from(path_or_url))
        }
    }

    /// Resolve a path-like input, keeping non-UTF-8 local paths intact.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let text = path.to_string_lossy();
        if text.starts_with("http") {
            Source::Http(text.into_owned())
        } else {
            Source::Local(path.to_path_buf())
        }
    }

    /// Whether this source is fetched over HTTP.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Source::Http(_))
    }

    /// Open the base stream.
    ///
    /// # Errors
    /// [`Error::Io`] when a local file cannot be opened, [`Error::Request`] when
    /// the HTTP request fails, and [`Error::Http`] for any status other than 200.
    pub fn open(&self) -> Result<BaseReader> {
        match self {
            Source::Local(path) => File::open(path)
                .map(BaseReader::File)
                .map_err(|e| Error::io(path, e)),
            Source::Http(url) => fetch(url),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Local(path) => write!(f, "{}", path.display()),
            Source::Http(url) => f.write_str(url),
        }
    }
}

#[cfg(feature = "io-http")]
fn fetch(url: &str) -> Result<BaseReader> {
    let resp = reqwest::blocking::get(url).map_err(|e| Error::Request {
        url: url.to_string(),
        source: Box::new(e),
    })?;
    let status = resp.status().as_u16();
    if status != 200 {
        return Err(Error::Http {
            status,
            url: url.to_string(),
        });
    }
    tracing::debug!(url, "fetched HTTP source");
    Ok(BaseReader::Http(Box::new(resp)))
}

#[cfg(not(feature = "io-http"))]
fn fetch(url: &str) -> Result<BaseReader> {
    Err(Error::Request {
        url: url.to_string(),
        source: "HTTP support not compiled in (feature `io-http`)".into(),
    })
}

/// An opened base stream.
pub enum BaseReader {
    File(File),
    #[cfg(feature = "io-http")]
    Http(Box<reqwest::blocking::Response>),
}

impl Read for BaseReader {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BaseReader::File(f) => f.read(buf),
            #[cfg(feature = "io-http")]
            BaseReader::Http(r) => r.read(buf),
        }
    }
}

impl fmt::Debug for BaseReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseReader::File(file) => f.debug_tuple("File").field(file).finish(),
            #[cfg(feature = "io-http")]
            BaseReader::Http(r) => f.debug_tuple("Http").field(&r.url().as_str()).finish(),
        }
    }
}
