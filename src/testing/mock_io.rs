//! Mock I/O helpers for tests.
//!
//! [`TempDirPath`] gives each test its own directory, [`MockSink`] stands in
//! for a file under a [`StreamWriter`](crate::io::stream::StreamWriter), and
//! [`serve_once`] answers a single HTTP request so URL sources can be tested
//! without a network.

use crate::io::stream::Sink;
use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    temp_dir: TempDir,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file path within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path().join(filename)
    }
}

/// In-memory [`Sink`] whose buffer stays inspectable after the writer that
/// owned it is gone.
///
/// Clones share the same buffer and state, so keep one clone in the test and
/// hand the other to the writer.
#[derive(Clone, Debug, Default)]
pub struct MockSink {
    buf: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
    fail_writes: bool,
    fail_close: Option<String>,
}

impl MockSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail.
    #[must_use]
    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Make `close` fail with `msg` (after marking the sink closed).
    #[must_use]
    pub fn fail_close(mut self, msg: &str) -> Self {
        self.fail_close = Some(msg.to_string());
        self
    }

    /// Bytes written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Write for MockSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::other("injected write failure"));
        }
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for MockSink {
    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        match &self.fail_close {
            Some(msg) => Err(io::Error::other(msg.clone())),
            None => Ok(()),
        }
    }
}

/// A single-request HTTP server running on a background thread.
pub struct HttpFixture {
    /// URL of the served resource.
    pub url: String,
    handle: JoinHandle<io::Result<()>>,
}

impl HttpFixture {
    /// Wait for the request to be answered.
    ///
    /// # Errors
    /// Any I/O error the server hit, or an error if its thread panicked.
    pub fn join(self) -> io::Result<()> {
        self.handle
            .join()
            .map_err(|_| io::Error::other("HTTP fixture thread panicked"))?
    }
}

/// Serve `body` with `status` to the first request on a loopback port.
///
/// `path` becomes the URL path (e.g. `"data.jsonl.gz"`), so suffix detection
/// sees the same name a real server would.
///
/// # Errors
/// Returns an error if no loopback port can be bound.
pub fn serve_once(path: &str, status: u16, body: Vec<u8>) -> io::Result<HttpFixture> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/{}", listener.local_addr()?, path.trim_start_matches('/'));
    let handle = thread::spawn(move || -> io::Result<()> {
        let (mut stream, _) = listener.accept()?;
        let mut req = Vec::new();
        let mut chunk = [0u8; 1024];
        while !req.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            req.extend_from_slice(&chunk[..n]);
        }
        let reason = if status == 200 { "OK" } else { "Error" };
        write!(
            stream,
            "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )?;
        stream.write_all(&body)?;
        stream.flush()
    });
    Ok(HttpFixture { url, handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let handle = MockSink::new();
        let mut sink = handle.clone();
        sink.write_all(b"abc").unwrap();
        sink.close().unwrap();
        assert_eq!(handle.contents(), b"abc");
        assert!(handle.is_closed());
    }

    #[test]
    fn injected_failures() {
        let mut sink = MockSink::new().fail_writes().fail_close("boom");
        assert!(sink.write(b"x").is_err());
        assert_eq!(sink.close().unwrap_err().to_string(), "boom");
    }

    #[test]
    fn temp_dir_paths() {
        let dir = TempDirPath::new().unwrap();
        assert!(dir.path().is_dir());
        assert!(dir.file_path("a.csv").starts_with(dir.path()));
    }
}
