//! `tabconv`: convert record files between JSONL, CSV, MessagePack and Parquet.
//!
//! ```text
//! tabconv <input> <output>
//! tabconv --batch <glob> <out-dir> <out-ext>
//! ```
//!
//! Inputs may be local paths or `http` URLs; either side may carry any
//! compression suffix (`.gz`, `.zst`, `.zst1`, `.zst2`, `.zlib`, `.zz`, `.lz4`,
//! `.br`, `.xz`). Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `warn`).

use anyhow::{Context, Result};
use std::env::args;
use std::path::Path;
use std::process::ExitCode;
use tabstream::convert::convert_many;
use tabstream::io::generic::convert;
use tabstream::io::glob::expand_glob_required;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  tabconv <input> <output>
  tabconv --batch <glob> <out-dir> <out-ext>";

fn main() -> ExitCode {
    init_logging();

    let argv: Vec<String> = args().skip(1).collect();
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    let res = match argv.as_slice() {
        ["-h" | "--help"] => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        ["--batch", pattern, out_dir, out_ext] => run_batch(pattern, out_dir, out_ext),
        [input, output] if !input.starts_with("--") => run_single(input, output),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_single(input: &str, output: &str) -> Result<()> {
    let n = convert(input, output).with_context(|| format!("convert {input} -> {output}"))?;
    eprintln!("{input} -> {output}: {n} records");
    Ok(())
}

fn run_batch(pattern: &str, out_dir: &str, out_ext: &str) -> Result<()> {
    let inputs = expand_glob_required(pattern)?;
    let outcomes = convert_many(&inputs, Path::new(out_dir), out_ext);

    let mut failed = 0usize;
    for o in &outcomes {
        match &o.result {
            Ok(n) => eprintln!("{} -> {}: {n} records", o.input.display(), o.output.display()),
            Err(e) => {
                failed += 1;
                eprintln!("{}: error: {e}", o.input.display());
            }
        }
    }
    anyhow::ensure!(failed == 0, "{failed} of {} files failed", outcomes.len());
    Ok(())
}
