use anyhow::Result;
use std::io::{Cursor, Read, Write};
use tabstream::io::compression::{Codec, CompressionLevel};
use tabstream::io::stream::{StreamReader, StreamWriter};
use tabstream::testing::{sample_payload, MockSink};
use tabstream::Error;

const CODECS: [Codec; 7] = [
    Codec::None,
    Codec::Gzip,
    Codec::Zstd,
    Codec::Zlib,
    Codec::Lz4,
    Codec::Brotli,
    Codec::Xz,
];

fn enabled() -> impl Iterator<Item = Codec> {
    CODECS.into_iter().filter(|c| c.is_enabled())
}

fn decode(codec: Codec, data: Vec<u8>) -> Result<Vec<u8>> {
    let mut r = StreamReader::wrap(Cursor::new(data), codec)?;
    let mut out = Vec::new();
    r.read_to_end(&mut out)?;
    r.close()?;
    Ok(out)
}

#[test]
fn successful_close_closes_the_sink() -> Result<()> {
    let payload = sample_payload(200_000);
    for codec in enabled() {
        let sink = MockSink::new();
        let mut w = StreamWriter::wrap(sink.clone(), codec, CompressionLevel::Default)?;
        w.write_all(&payload)?;
        w.close()?;
        assert!(sink.is_closed(), "{codec}");
        assert_eq!(decode(codec, sink.contents())?, payload, "{codec}");
    }
    Ok(())
}

#[test]
fn sink_close_failure_is_reported_after_trailer() -> Result<()> {
    let payload = b"the trailer must land before the sink closes".repeat(50);
    for codec in enabled() {
        let sink = MockSink::new().fail_close("device gone");
        let mut w = StreamWriter::wrap(sink.clone(), codec, CompressionLevel::Default)?;
        w.write_all(&payload)?;

        match w.close().unwrap_err() {
            Error::Stream { context, source } => {
                assert!(context.starts_with("close"), "{codec}: {context}");
                assert_eq!(source.to_string(), "device gone");
            }
            other => panic!("{codec}: unexpected error {other:?}"),
        }
        assert!(sink.is_closed(), "{codec}");
        // The encoder finished first, so the stream is complete.
        assert_eq!(decode(codec, sink.contents())?, payload, "{codec}");
    }
    Ok(())
}

#[test]
fn both_failures_are_aggregated() -> Result<()> {
    for codec in enabled().filter(|c| *c != Codec::None) {
        let sink = MockSink::new().fail_writes().fail_close("close refused");
        let mut w = StreamWriter::wrap(sink.clone(), codec, CompressionLevel::Default)?;
        // Depending on the codec the first sink write happens here or at finish.
        let _ = w.write_all(b"pending");

        match w.close().unwrap_err() {
            Error::Close { errors } => {
                assert_eq!(errors.len(), 2, "{codec}: {errors:?}");
                assert!(errors[0].contains("finish"), "{codec}: {}", errors[0]);
                assert!(errors[0].contains("injected write failure"), "{codec}: {}", errors[0]);
                assert!(errors[1].contains("close refused"), "{codec}: {}", errors[1]);
            }
            other => panic!("{codec}: unexpected error {other:?}"),
        }
        // The sink is closed even though finishing failed.
        assert!(sink.is_closed(), "{codec}");
    }
    Ok(())
}

#[test]
fn finish_failure_alone_is_a_stream_error() -> Result<()> {
    for codec in enabled().filter(|c| *c != Codec::None) {
        let sink = MockSink::new().fail_writes();
        let mut w = StreamWriter::wrap(sink.clone(), codec, CompressionLevel::Default)?;
        let _ = w.write_all(b"pending");
        let err = w.close().unwrap_err();
        assert!(
            matches!(&err, Error::Stream { context, .. } if context.starts_with("finish")),
            "{codec}: {err:?}"
        );
        assert!(sink.is_closed(), "{codec}");
    }
    Ok(())
}

#[test]
fn dropped_writer_still_finishes() -> Result<()> {
    for codec in enabled() {
        let sink = MockSink::new();
        {
            let mut w = StreamWriter::wrap(sink.clone(), codec, CompressionLevel::Default)?;
            w.write_all(b"dropped, not closed")?;
        }
        assert!(sink.is_closed(), "{codec}");
        assert_eq!(decode(codec, sink.contents())?, b"dropped, not closed", "{codec}");
    }
    Ok(())
}

#[test]
fn dropping_over_a_failing_sink_does_not_panic() -> Result<()> {
    for codec in enabled() {
        let sink = MockSink::new().fail_writes().fail_close("close refused");
        {
            let mut w = StreamWriter::wrap(sink.clone(), codec, CompressionLevel::Default)?;
            let _ = w.write_all(&sample_payload(300_000));
        }
        assert!(sink.is_closed(), "{codec}");
    }
    Ok(())
}

#[cfg(feature = "compression-lz4")]
#[test]
fn lz4_close_reports_sink_errors() -> Result<()> {
    let sink = MockSink::new().fail_writes().fail_close("close refused");
    let mut w = StreamWriter::wrap(sink.clone(), Codec::Lz4, CompressionLevel::Default)?;
    let write_err = w.write_all(b"frame header goes out first").unwrap_err();
    assert_eq!(write_err.to_string(), "injected write failure");

    match w.close().unwrap_err() {
        Error::Close { errors } => {
            assert_eq!(errors.len(), 2, "{errors:?}");
            assert!(errors[0].starts_with("finish lz4"), "{}", errors[0]);
            assert!(errors[0].contains("injected write failure"), "{}", errors[0]);
            assert!(errors[1].contains("close refused"), "{}", errors[1]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(sink.is_closed());
    Ok(())
}
