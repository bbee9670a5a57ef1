use anyhow::Result;
use std::io::Write;
use tabstream::io::lines::{iterate_lines, load_bin_file, LineIter};
use tabstream::io::records::{
    iterate_binary_records, iterate_record_list, read_record_list, save_record_list, RecordIter,
};
use tabstream::testing::{sample_fixed_records, TempDirPath};
use tabstream::{create_for_write, Error};

fn write_file(path: &std::path::Path, data: &[u8]) -> Result<()> {
    let mut w = create_for_write(path)?;
    w.write_all(data)?;
    w.close()?;
    Ok(())
}

#[test]
fn lines_across_codecs() -> Result<()> {
    let dir = TempDirPath::new()?;
    for name in ["words.txt", "words.txt.gz", "words.txt.xz", "words.txt.zst2"] {
        let path = dir.file_path(name);
        write_file(&path, b"alpha\r\nbeta\ngamma")?;
        let mut seen = Vec::new();
        let n = iterate_lines(&path, |l| {
            seen.push(l.to_string());
            Ok(())
        })?;
        assert_eq!(n, 3, "{name}");
        assert_eq!(seen, ["alpha", "beta", "gamma"], "{name}");
    }
    Ok(())
}

#[test]
fn line_processor_error_carries_line_number() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("nums.txt.gz");
    write_file(&path, b"1\n2\nx\n4\n")?;
    let err = iterate_lines(&path, |l| {
        l.parse::<u32>()?;
        Ok(())
    })
    .unwrap_err();
    match err {
        Error::Processor { index, source } => {
            assert_eq!(index, 3);
            assert!(source.to_string().contains("invalid digit"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn line_iter_is_pull_based() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("pull.txt.lz4");
    write_file(&path, b"a\nb\nc\n")?;
    let mut it = LineIter::open(&path)?;
    assert_eq!(it.next().transpose()?.as_deref(), Some("a"));
    assert_eq!(it.line_no(), 1);
    let rest: Vec<String> = it.by_ref().collect::<tabstream::Result<_>>()?;
    assert_eq!(rest, ["b", "c"]);
    it.close()?;
    Ok(())
}

#[test]
fn load_bin_file_decompresses() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("blob.bin.br");
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    write_file(&path, &payload)?;
    assert_eq!(load_bin_file(&path)?, payload);
    Ok(())
}

#[test]
fn fixed_records_clean_eof() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("ticks.bin.zst");
    write_file(&path, &sample_fixed_records(1000, 16))?;

    let mut next = 0u8;
    let n = iterate_binary_records(&path, 16, |rec| {
        assert_eq!(rec.len(), 16);
        assert!(rec.iter().all(|b| *b == next));
        next = next.wrapping_add(1);
        Ok(())
    })?;
    assert_eq!(n, 1000);
    Ok(())
}

#[test]
fn fixed_records_short_read() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("ticks.bin.gz");
    let mut data = sample_fixed_records(3, 8);
    data.extend_from_slice(&[9, 9, 9]);
    write_file(&path, &data)?;

    let mut seen = 0;
    let err = iterate_binary_records(&path, 8, |_| {
        seen += 1;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(seen, 3);
    assert!(err.is_short_read());
    assert!(matches!(
        err,
        Error::ShortRead {
            index: 4,
            expected: 8,
            got: 3
        }
    ));
    Ok(())
}

#[test]
fn record_iter_pulls_and_counts() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("recs.bin");
    write_file(&path, &sample_fixed_records(5, 4))?;
    let mut it = RecordIter::open(&path, 4)?;
    let mut firsts = Vec::new();
    while let Some(rec) = it.next_record()? {
        firsts.push(rec[0]);
    }
    assert_eq!(firsts, [0, 1, 2, 3, 4]);
    assert_eq!(it.count(), 5);
    it.close()?;
    Ok(())
}

#[test]
fn zero_record_size_is_rejected() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("any.bin");
    write_file(&path, b"abc")?;
    let err = iterate_binary_records(&path, 0, |_| Ok(())).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    Ok(())
}

#[test]
fn record_list_roundtrip() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("tables.fb.zst");
    let records: Vec<Vec<u8>> = vec![b"first".to_vec(), Vec::new(), vec![7; 70_000]];
    let bytes = save_record_list(&path, &records)?;
    assert_eq!(bytes, 3 * 4 + 5 + 70_000);
    assert_eq!(read_record_list(&path)?, records);
    Ok(())
}

#[test]
fn record_list_layout_is_le_u32_prefixed() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("list.bin");
    save_record_list(&path, &[b"ab".as_slice(), b"c".as_slice()])?;
    assert_eq!(std::fs::read(&path)?, [2, 0, 0, 0, b'a', b'b', 1, 0, 0, 0, b'c']);
    Ok(())
}

#[test]
fn record_list_truncation() -> Result<()> {
    let dir = TempDirPath::new()?;

    let cut_payload = dir.file_path("payload.bin");
    std::fs::write(&cut_payload, [3, 0, 0, 0, b'x', b'y', b'z', 5, 0, 0, 0, b'h', b'i'])?;
    let mut seen = Vec::new();
    let err = iterate_record_list(&cut_payload, |r| {
        seen.push(r.to_vec());
        Ok(())
    })
    .unwrap_err();
    assert_eq!(seen, [b"xyz".to_vec()]);
    assert!(matches!(err, Error::ShortRead { index: 2, expected: 5, got: 2 }));

    let cut_prefix = dir.file_path("prefix.bin");
    std::fs::write(&cut_prefix, [1, 0, 0, 0, b'q', 9, 0])?;
    let err = read_record_list(&cut_prefix).unwrap_err();
    assert!(matches!(err, Error::ShortRead { index: 2, expected: 4, got: 2 }));
    Ok(())
}

#[test]
fn record_list_processor_error() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("list.bin.xz");
    save_record_list(&path, &[b"ok".as_slice(), b"bad".as_slice()])?;
    let err = iterate_record_list(&path, |r| {
        anyhow::ensure!(r != b"bad", "rejected");
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, Error::Processor { index: 2, .. }));
    Ok(())
}

#[test]
fn record_list_oversized_prefix_is_a_short_read() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("garbage.bin");
    // Claims a 3 GiB payload but carries three bytes.
    std::fs::write(&path, [0x00, 0x00, 0x00, 0xC0, 1, 2, 3])?;
    let err = read_record_list(&path).unwrap_err();
    assert!(err.is_short_read(), "{err:?}");
    assert!(matches!(
        err,
        Error::ShortRead {
            index: 1,
            expected: 0xC000_0000,
            got: 3
        }
    ));

    let zst = dir.file_path("garbage.bin.zst");
    write_file(&zst, &[0xff, 0xff, 0xff, 0xff])?;
    let err = read_record_list(&zst).unwrap_err();
    assert!(err.is_short_read(), "{err:?}");
    Ok(())
}
