//! Pre-built test datasets.

use crate::value::{Record, Value};
use serde::{Deserialize, Serialize};

/// Sample web server log entry.
///
/// All fields are scalars, so it maps onto every supported format including
/// CSV and Parquet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleLogEntry {
    pub timestamp: u64,
    pub ip: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub bytes: u64,
    pub latency_ms: f64,
}

/// Generate `n` deterministic log entries.
///
/// # Example
///
/// ```
/// use tabstream::testing::sample_log_entries;
///
/// let logs = sample_log_entries(10);
/// assert_eq!(logs.len(), 10);
/// assert_eq!(logs[0].method, "GET");
/// ```
#[must_use]
pub fn sample_log_entries(n: usize) -> Vec<SampleLogEntry> {
    const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];
    const PATHS: [&str; 3] = ["/api/users", "/api/posts", "/health"];
    const STATUSES: [u16; 5] = [200, 201, 404, 200, 500];
    (0..n)
        .map(|i| SampleLogEntry {
            timestamp: 1_000_000 + i as u64 * 100,
            ip: format!("192.168.1.{}", 100 + i % 50),
            method: METHODS[i % METHODS.len()].to_string(),
            path: PATHS[i % PATHS.len()].to_string(),
            status: STATUSES[i % STATUSES.len()],
            bytes: 128 * (1 + i as u64 % 16),
            latency_ms: (i % 7) as f64 + 0.25,
        })
        .collect()
}

/// Schema-free records with every scalar [`Value`] kind.
///
/// Keys differ between records so that writers have to merge headers.
#[must_use]
pub fn sample_records() -> Vec<Record> {
    let rec = |pairs: &[(&str, Value)]| -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    };
    vec![
        rec(&[
            ("id", Value::Int64(1)),
            ("name", Value::from("alice")),
            ("score", Value::Float64(9.5)),
            ("active", Value::Bool(true)),
        ]),
        rec(&[
            ("id", Value::Int64(2)),
            ("name", Value::from("bob")),
            ("score", Value::Float64(7.25)),
            ("active", Value::Bool(false)),
        ]),
        rec(&[
            ("id", Value::Int64(3)),
            ("name", Value::from("carol, jr.")),
            ("active", Value::Bool(true)),
            ("team", Value::from("red")),
        ]),
    ]
}

/// `len` bytes of deterministic, mildly compressible data.
///
/// Text-like runs mixed with xorshift noise, so every codec does real work
/// without the output being trivially small.
#[must_use]
pub fn sample_payload(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        if state % 4 == 0 {
            out.extend_from_slice(&state.to_le_bytes());
        } else {
            out.extend_from_slice(b"timestamp,ip,status\n");
        }
    }
    out.truncate(len);
    out
}

/// `count` fixed-size records of `size` bytes, record `i` filled with `i as u8`.
#[must_use]
pub fn sample_fixed_records(count: usize, size: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| std::iter::repeat_n(i as u8, size))
        .collect()
}
