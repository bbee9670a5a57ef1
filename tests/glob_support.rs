#![cfg(all(feature = "io-csv", feature = "io-jsonl"))]

use anyhow::Result;
use tabstream::convert::{convert_many, output_path};
use tabstream::io::generic::read_input;
use tabstream::io::glob::{expand_glob, expand_glob_required};
use tabstream::testing::TempDirPath;
use tabstream::{Error, Value};

fn seed(dir: &TempDirPath) -> Result<()> {
    std::fs::write(dir.file_path("b.csv"), "k,v\nx,2\n")?;
    std::fs::write(dir.file_path("a.csv"), "k,v\nw,1\ny,3\n")?;
    std::fs::write(dir.file_path("c.csv"), "")?;
    std::fs::write(dir.file_path("notes.txt"), "ignored")?;
    std::fs::create_dir(dir.file_path("sub.csv"))?;
    Ok(())
}

#[test]
fn glob_matches_files_sorted() -> Result<()> {
    let dir = TempDirPath::new()?;
    seed(&dir)?;
    let pattern = dir.file_path("*.csv");
    let files = expand_glob(&pattern.to_string_lossy())?;
    let names: Vec<_> = files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.csv", "b.csv", "c.csv"]);
    Ok(())
}

#[test]
fn glob_errors() -> Result<()> {
    let dir = TempDirPath::new()?;
    let none = dir.file_path("*.jsonl");
    assert!(expand_glob(&none.to_string_lossy())?.is_empty());
    assert!(matches!(
        expand_glob_required(&none.to_string_lossy()),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(expand_glob("[unclosed"), Err(Error::InvalidArgument(_))));
    Ok(())
}

#[test]
fn batch_conversion_reports_each_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    seed(&dir)?;
    let inputs = expand_glob_required(&dir.file_path("*.csv").to_string_lossy())?;
    let out_dir = dir.file_path("out");

    let outcomes = convert_many(&inputs, &out_dir, "jsonl.gz");
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].result.as_ref().ok(), Some(&2));
    assert_eq!(outcomes[1].result.as_ref().ok(), Some(&1));
    // The empty CSV has no header and fails on its own.
    assert!(!outcomes[2].is_ok());
    assert_eq!(outcomes[0].output, output_path(&inputs[0], &out_dir, "jsonl.gz"));

    let a = read_input(out_dir.join("a.jsonl.gz"))?;
    assert_eq!(a[1]["v"], Value::Int64(3));
    assert!(!out_dir.join("c.jsonl.gz").exists());
    Ok(())
}
