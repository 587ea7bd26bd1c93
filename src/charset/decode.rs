//! Streaming transcoding to UTF-8.

use super::config::MalformedPolicy;
use super::error::CharsetReaderError;
use super::label::Charset;
use encoding::types::{CodecError, RawDecoder};
use std::io::{self, Read};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Decodes `R` from a legacy encoding to UTF-8 as it is read.
///
/// Multi-byte sequences split between two reads of the source are carried by
/// the decoder. Malformed input is reported as `io::ErrorKind::InvalidData`
/// after the text decoded before it has been handed out.
pub struct DecodeReader<R> {
    inner: R,
    decoder: Box<dyn RawDecoder>,
    encoding: &'static str,
    policy: MalformedPolicy,
    input: Vec<u8>,
    output: String,
    consumed: usize,
    failed: Option<CharsetReaderError>,
    finished: bool,
}

impl<R: Read> DecodeReader<R> {
    pub fn new(inner: R, encoding: encoding::EncodingRef, policy: MalformedPolicy) -> Self {
        DecodeReader {
            inner,
            decoder: encoding.raw_decoder(),
            encoding: Charset::Transcode(encoding).name(),
            policy,
            input: vec![0; READ_CHUNK_SIZE],
            output: String::new(),
            consumed: 0,
            failed: None,
            finished: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Decode the next chunk of the source into `output`.
    fn fill(&mut self) -> io::Result<()> {
        let n = loop {
            match self.inner.read(&mut self.input) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let (policy, encoding) = (self.policy, self.encoding);
        let on_error = |err: CodecError, output: &mut String| match policy {
            MalformedPolicy::Strict => Some(CharsetReaderError::decode(encoding, err.cause)),
            MalformedPolicy::Replace => {
                output.push('\u{FFFD}');
                None
            }
        };

        if n == 0 {
            self.finished = true;
            if let Some(err) = self.decoder.raw_finish(&mut self.output) {
                self.failed = on_error(err, &mut self.output);
            }
            return Ok(());
        }

        let mut chunk = &self.input[..n];
        loop {
            let (_, err) = self.decoder.raw_feed(chunk, &mut self.output);
            let Some(err) = err else {
                break;
            };
            let resume = (err.upto.max(0) as usize).min(chunk.len());
            if let Some(failure) = on_error(err, &mut self.output) {
                self.failed = Some(failure);
                break;
            }
            chunk = &chunk[resume..];
        }
        Ok(())
    }
}

impl<R: Read> Read for DecodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let pending = &self.output.as_bytes()[self.consumed..];
            if !pending.is_empty() {
                let n = pending.len().min(buf.len());
                buf[..n].copy_from_slice(&pending[..n]);
                self.consumed += n;
                return Ok(n);
            }
            if let Some(failure) = self.failed.take() {
                self.finished = true;
                return Err(failure.into_io_error());
            }
            if self.finished {
                return Ok(0);
            }
            self.output.clear();
            self.consumed = 0;
            self.fill()?;
        }
    }
}

/// The decoding stage of the pipeline: identity for content that is already
/// UTF-8, a [`DecodeReader`] otherwise.
pub enum Transform<R> {
    Identity(R),
    Decode(DecodeReader<R>),
}

impl<R: Read> Transform<R> {
    pub fn new(inner: R, charset: Charset, policy: MalformedPolicy) -> Self {
        match charset {
            Charset::Utf8 => Transform::Identity(inner),
            Charset::Transcode(encoding) => {
                Transform::Decode(DecodeReader::new(inner, encoding, policy))
            }
        }
    }

    pub fn into_inner(self) -> R {
        match self {
            Transform::Identity(r) => r,
            Transform::Decode(r) => r.into_inner(),
        }
    }

    pub fn get_ref(&self) -> &R {
        match self {
            Transform::Identity(r) => r,
            Transform::Decode(r) => r.get_ref(),
        }
    }
}

impl<R: Read> Read for Transform<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transform::Identity(r) => r.read(buf),
            Transform::Decode(r) => r.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding::all::{EUC_JP, ISO_8859_1, UTF_16BE, UTF_16LE, WINDOWS_1252};

    /// Hands out one byte per read to split every multi-byte sequence.
    struct OneByte<'a>(&'a [u8]);

    impl Read for OneByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let data = self.0;
            match data.split_first() {
                Some((b, rest)) if !buf.is_empty() => {
                    buf[0] = *b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    fn decode_all<R: Read>(mut r: R) -> io::Result<String> {
        let mut out = String::new();
        r.read_to_string(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_decode_latin1() {
        let r = DecodeReader::new(&b"caf\xe9 se\xf1or"[..], ISO_8859_1, MalformedPolicy::Strict);
        assert_eq!(decode_all(r).unwrap(), "café señor");
    }

    #[test]
    fn test_decode_windows_1252() {
        let r = DecodeReader::new(&b"\x93quoted\x94 \x80"[..], WINDOWS_1252, MalformedPolicy::Strict);
        assert_eq!(decode_all(r).unwrap(), "\u{201c}quoted\u{201d} €");
    }

    #[test]
    fn test_decode_split_sequences() {
        let mut utf16 = Vec::new();
        for unit in "ћорсокак 死胡同".encode_utf16() {
            utf16.extend_from_slice(&unit.to_le_bytes());
        }
        let r = DecodeReader::new(OneByte(&utf16), UTF_16LE, MalformedPolicy::Strict);
        assert_eq!(decode_all(r).unwrap(), "ћорсокак 死胡同");

        // "行き止まり" in EUC-JP
        let euc = b"\xb9\xd4\xa4\xad\xbb\xdf\xa4\xde\xa4\xea";
        let r = DecodeReader::new(OneByte(euc), EUC_JP, MalformedPolicy::Strict);
        assert_eq!(decode_all(r).unwrap(), "行き止まり");
    }

    #[test]
    fn test_decoder_keeps_bom_character() {
        let r = DecodeReader::new(&b"\xfe\xff\x00a"[..], UTF_16BE, MalformedPolicy::Strict);
        assert_eq!(decode_all(r).unwrap(), "\u{feff}a");
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        // odd byte count for UTF-16
        let mut r = DecodeReader::new(&b"a\x00b"[..], UTF_16LE, MalformedPolicy::Strict);
        let mut out = Vec::new();
        let err = r.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        // text before the error is delivered
        assert_eq!(out, b"a");
    }

    #[test]
    fn test_malformed_input_strict() {
        // 0xA1 0x20 is not valid EUC-JP
        let mut r = DecodeReader::new(&b"ok \xa1 ok"[..], EUC_JP, MalformedPolicy::Strict);
        let mut out = Vec::new();
        let err = r.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("euc-jp"));
        assert_eq!(out, b"ok ");
    }

    #[test]
    fn test_malformed_input_replace() {
        let r = DecodeReader::new(&b"a\x00b"[..], UTF_16LE, MalformedPolicy::Replace);
        assert_eq!(decode_all(r).unwrap(), "a\u{fffd}");
    }

    #[test]
    fn test_source_error_is_propagated() {
        let r = DecodeReader::new(Failing, ISO_8859_1, MalformedPolicy::Strict);
        let err = decode_all(r).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_transform_identity() {
        let input = &b"\xff\xfe not touched"[..];
        let mut t = Transform::new(input, Charset::Utf8, MalformedPolicy::Strict);
        assert!(matches!(t, Transform::Identity(_)));
        let mut out = Vec::new();
        t.read_to_end(&mut out).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_transform_decode() {
        let t = Transform::new(&b"\xe9"[..], Charset::latin1(), MalformedPolicy::Strict);
        assert!(matches!(t, Transform::Decode(_)));
        assert_eq!(decode_all(t).unwrap(), "é");
    }
}
