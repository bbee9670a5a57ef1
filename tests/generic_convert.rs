#![cfg(all(feature = "io-csv", feature = "io-jsonl", feature = "io-msgpack"))]

use anyhow::Result;
use tabstream::io::generic::{convert, read_input, write_output, Format};
use tabstream::testing::{sample_records, TempDirPath};
use tabstream::{Error, Value};

#[test]
fn csv_to_jsonl_to_msgpack_keeps_values() -> Result<()> {
    let dir = TempDirPath::new()?;
    let csv = dir.file_path("people.csv");
    std::fs::write(&csv, "id,name,score,active,note\n1,alice,9.5,true,\n2,\"carol, jr.\",-3,FALSE,hi\n")?;

    let jsonl = dir.file_path("people.jsonl.zst");
    assert_eq!(convert(&csv, &jsonl)?, 2);
    let mp = dir.file_path("people.msgpack.br");
    assert_eq!(convert(&jsonl, &mp)?, 2);

    let records = read_input(&mp)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], Value::Int64(1));
    assert_eq!(records[0]["score"], Value::Float64(9.5));
    assert_eq!(records[0]["active"], Value::Bool(true));
    assert_eq!(records[0]["note"], Value::String(String::new()));
    assert_eq!(records[1]["name"], Value::String("carol, jr.".into()));
    assert_eq!(records[1]["score"], Value::Int64(-3));
    // Only the exact lowercase literals are booleans.
    assert_eq!(records[1]["active"], Value::String("FALSE".into()));
    Ok(())
}

#[test]
fn csv_output_merges_headers() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("merged.csv.gz");
    write_output(&path, &sample_records())?;

    let text = String::from_utf8(tabstream::io::lines::load_bin_file(&path)?)?;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("active,id,name,score,team"));
    assert_eq!(lines.next(), Some("true,1,alice,9.5,"));
    assert_eq!(lines.next(), Some("false,2,bob,7.25,"));
    assert_eq!(lines.next(), Some("true,3,\"carol, jr.\",,red"));
    assert_eq!(lines.next(), None);
    Ok(())
}

#[test]
fn jsonl_and_msgpack_keep_missing_keys_missing() -> Result<()> {
    let dir = TempDirPath::new()?;
    let records = sample_records();
    for name in ["r.jsonl", "r.ndjson.gz", "r.mp", "r.msgpack.xz"] {
        let path = dir.file_path(name);
        write_output(&path, &records)?;
        let back = read_input(&path)?;
        assert_eq!(back, records, "{name}");
        assert!(!back[2].contains_key("score"), "{name}");
    }
    Ok(())
}

#[test]
fn null_values_roundtrip_through_jsonl() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("nulls.jsonl");
    std::fs::write(&path, "{\"a\":null,\"b\":1}\n")?;
    let recs = read_input(&path)?;
    assert!(recs[0]["a"].is_null());
    let csv = dir.file_path("nulls.csv");
    convert(&path, &csv)?;
    assert_eq!(std::fs::read_to_string(&csv)?, "a,b\n,1\n");
    Ok(())
}

#[test]
fn empty_csv_output_is_rejected() -> Result<()> {
    let dir = TempDirPath::new()?;
    let err = write_output(dir.file_path("none.csv"), &[]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "{err:?}");

    // JSONL has no header, so an empty file is fine.
    write_output(dir.file_path("none.jsonl"), &[])?;
    Ok(())
}

#[test]
fn unsupported_extensions() -> Result<()> {
    let dir = TempDirPath::new()?;
    let input = dir.file_path("data.txt.gz");
    std::fs::write(&input, b"")?;
    assert!(matches!(read_input(&input), Err(Error::UnsupportedFormat(_))));
    assert!(matches!(
        write_output(dir.file_path("out.avro"), &sample_records()),
        Err(Error::UnsupportedFormat(_))
    ));
    assert_eq!(Format::detect("X.CSV.zst")?, Format::Csv);
    Ok(())
}

#[test]
fn nested_json_is_rejected() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("nested.jsonl");
    std::fs::write(&path, "{\"a\":{\"b\":1}}\n")?;
    assert!(matches!(read_input(&path), Err(Error::Format { .. })));
    Ok(())
}

#[test]
fn whole_floats_stay_floats_through_csv() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("floats.csv");
    let rec: tabstream::Record = [("x".to_string(), Value::Float64(2.0)), ("n".to_string(), Value::Int64(2))]
        .into_iter()
        .collect();
    write_output(&path, std::slice::from_ref(&rec))?;
    assert_eq!(std::fs::read_to_string(&path)?, "n,x\n2,2.0\n");
    assert_eq!(read_input(&path)?, [rec]);
    Ok(())
}

#[cfg(feature = "io-parquet")]
#[test]
fn parquet_to_jsonl() -> Result<()> {
    use tabstream::io::parquet::write_parquet_vec;
    use tabstream::testing::{sample_log_entries, SampleLogEntry};

    let dir = TempDirPath::new()?;
    let input = dir.file_path("logs.parquet.zst");
    let logs = sample_log_entries(40);
    write_parquet_vec(&input, &logs)?;

    let output = dir.file_path("logs.jsonl");
    assert_eq!(convert(&input, &output)?, 40);
    let back: Vec<SampleLogEntry> = tabstream::io::jsonl::read_jsonl_vec(&output)?;
    assert_eq!(back, logs);

    let records = read_input(&output)?;
    assert_eq!(records[3]["status"], Value::Int64(200));
    assert_eq!(records[3]["method"], Value::from("DELETE"));
    Ok(())
}

#[cfg(feature = "io-parquet")]
#[test]
fn records_roundtrip_through_parquet() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("records.parquet.gz");
    write_output(&path, &sample_records())?;

    let back = read_input(&path)?;
    assert_eq!(back.len(), 3);
    assert_eq!(back[0]["score"], Value::Float64(9.5));
    assert_eq!(back[0]["id"], Value::Int64(1));
    assert_eq!(back[1]["active"], Value::Bool(false));
    assert_eq!(back[2]["name"], Value::from("carol, jr."));
    // Every record carries every column; absent cells come back null.
    assert!(back[2]["score"].is_null());
    assert!(back[0]["team"].is_null());

    assert!(matches!(
        write_output(dir.file_path("none.parquet"), &[]),
        Err(Error::InvalidArgument(_))
    ));
    Ok(())
}
