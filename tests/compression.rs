use anyhow::Result;
use std::io::{Read, Write};
use std::path::Path;
use tabstream::io::compression::{detect, Codec, CompressionLevel};
use tabstream::io::lines::load_bin_file;
use tabstream::testing::{sample_payload, TempDirPath};
use tabstream::{create_for_write, open_for_read, Error};

const SUFFIXES: [&str; 10] = ["", ".gz", ".zst", ".zst1", ".zst2", ".zlib", ".zz", ".lz4", ".br", ".xz"];

fn enabled(suffix: &str) -> bool {
    detect(suffix).0.is_enabled()
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut w = create_for_write(path)?;
    w.write_all(data)?;
    w.close()?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut r = open_for_read(path)?;
    let mut out = Vec::new();
    r.read_to_end(&mut out)?;
    r.close()?;
    Ok(out)
}

#[test]
fn roundtrip_every_codec_and_size() -> Result<()> {
    let dir = TempDirPath::new()?;
    let small = b"id,name\n1,alice\n2,bob\n".to_vec();
    let large = sample_payload(3 * 1024 * 1024);
    for suffix in SUFFIXES.iter().filter(|s| enabled(s)) {
        for (label, payload) in [("empty", Vec::new()), ("small", small.clone()), ("large", large.clone())] {
            let path = dir.file_path(&format!("{label}.bin{suffix}"));
            write_file(&path, &payload)?;
            assert_eq!(read_file(&path)?, payload, "{label} via {suffix:?}");
        }
    }
    Ok(())
}

#[test]
fn compressed_files_differ_from_plain() -> Result<()> {
    let dir = TempDirPath::new()?;
    let payload = b"repeat me ".repeat(10_000);
    for suffix in SUFFIXES.iter().filter(|s| !s.is_empty() && enabled(s)) {
        let path = dir.file_path(&format!("data{suffix}"));
        write_file(&path, &payload)?;
        let raw = std::fs::read(&path)?;
        assert!(raw.len() < payload.len() / 10, "{suffix} output is {} bytes", raw.len());
    }
    Ok(())
}

#[test]
fn unrecognized_extension_is_byte_identical() -> Result<()> {
    let dir = TempDirPath::new()?;
    let payload = sample_payload(70_000);
    for name in ["data.bin", "data.GZ", "data.gz.txt", "noext"] {
        let path = dir.file_path(name);
        write_file(&path, &payload)?;
        assert_eq!(std::fs::read(&path)?, payload, "{name}");
        assert_eq!(read_file(&path)?, payload, "{name}");
    }
    Ok(())
}

#[cfg(feature = "compression-zstd")]
#[test]
fn hello_world_zst1() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("test.txt.zst1");

    let mut w = create_for_write(&path)?;
    assert_eq!(w.codec(), Codec::Zstd);
    assert_eq!(w.level(), CompressionLevel::Fastest);
    w.write_all(b"Hello, World!")?;
    w.close()?;

    // A zstd frame starts with the magic number 0xFD2FB528 (little-endian).
    assert_eq!(&std::fs::read(&path)?[..4], &[0x28, 0xB5, 0x2F, 0xFD]);
    assert_eq!(load_bin_file(&path)?, b"Hello, World!");
    Ok(())
}

#[cfg(feature = "compression-zstd")]
#[test]
fn zstd_levels_all_decode() -> Result<()> {
    let dir = TempDirPath::new()?;
    let payload = sample_payload(512 * 1024);
    for suffix in [".zst1", ".zst2", ".zst"] {
        let path = dir.file_path(&format!("levels{suffix}"));
        write_file(&path, &payload)?;
        // Every level is readable under any zstd suffix.
        let copy = dir.file_path(&format!("copy{suffix}.zst"));
        std::fs::copy(&path, &copy)?;
        assert_eq!(read_file(&copy)?, payload, "{suffix}");
    }
    Ok(())
}

#[test]
fn suffix_precedence() {
    assert_eq!(detect("a.zst1"), (Codec::Zstd, CompressionLevel::Fastest));
    assert_eq!(detect("a.zst2"), (Codec::Zstd, CompressionLevel::Balanced));
    assert_eq!(detect("a.zst"), (Codec::Zstd, CompressionLevel::Default));
    assert_eq!(detect("a.zz"), detect("a.zlib"));
    assert_eq!(detect("report.jsonl.gz").0, Codec::Gzip);
    assert_eq!(detect("http://host/data.parquet").0, Codec::None);
}

fn assert_truncation_detected(suffix: &str) -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path(&format!("cut.bin{suffix}"));
    write_file(&path, &sample_payload(400_000))?;
    let full = std::fs::read(&path)?;
    std::fs::write(&path, &full[..full.len() / 2])?;

    let mut r = open_for_read(&path)?;
    let mut out = Vec::new();
    assert!(r.read_to_end(&mut out).is_err(), "{suffix}: truncated stream drained cleanly");

    let err = load_bin_file(&path).unwrap_err();
    assert!(matches!(err, Error::Stream { .. }), "{err:?}");
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn truncated_gzip_fails_when_drained() -> Result<()> {
    assert_truncation_detected(".gz")
}

#[cfg(feature = "compression-zstd")]
#[test]
fn truncated_zstd_fails_when_drained() -> Result<()> {
    assert_truncation_detected(".zst")
}

#[cfg(feature = "compression-gzip")]
#[test]
fn concatenated_gzip_members_are_read() -> Result<()> {
    let dir = TempDirPath::new()?;
    let a = dir.file_path("a.gz");
    let b = dir.file_path("b.gz");
    write_file(&a, b"first\n")?;
    write_file(&b, b"second\n")?;
    let mut joined = std::fs::read(&a)?;
    joined.extend(std::fs::read(&b)?);
    let both = dir.file_path("both.gz");
    std::fs::write(&both, joined)?;
    assert_eq!(read_file(&both)?, b"first\nsecond\n");
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn invalid_gzip_header_fails_at_open() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("fake.gz");
    std::fs::write(&path, b"plain text pretending")?;
    let err = open_for_read(&path).unwrap_err();
    assert!(matches!(err, Error::CodecInit { codec: "gzip", .. }), "{err:?}");
    Ok(())
}

#[test]
fn missing_input_is_io_error() {
    let err = open_for_read("/no/such/dir/file.csv.gz").unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err:?}");
}

#[test]
fn writer_creates_parent_directories() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("a/b/c/out.txt.gz");
    write_file(&path, b"nested")?;
    assert_eq!(read_file(&path)?, b"nested");
    Ok(())
}
