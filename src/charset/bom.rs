//! Byte order mark table and the BOM-stripping normalizer.

use std::io::{self, Read};

/// Byte signature of a BOM and the encoding it announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BomSignature {
    pub bytes: &'static [u8],
    pub encoding: &'static str,
}

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
pub const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
pub const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Checked in this order: the UTF-16 marks first, then UTF-8.
pub const BOMS: [BomSignature; 3] = [
    BomSignature {
        bytes: &UTF16_BE_BOM,
        encoding: "utf-16be",
    },
    BomSignature {
        bytes: &UTF16_LE_BOM,
        encoding: "utf-16le",
    },
    BomSignature {
        bytes: &UTF8_BOM,
        encoding: "utf-8",
    },
];

/// First BOM that prefixes `content`.
pub fn sniff_bom(content: &[u8]) -> Option<&'static BomSignature> {
    BOMS.iter().find(|b| content.starts_with(b.bytes))
}

/// Read until `buf` is full or the source ends. Returns the number of bytes read.
pub(crate) fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// A stream whose leading UTF-8 BOM (if any) has been removed.
///
/// The BOM probe happens on the first read and takes at most three bytes.
/// Probed bytes that are not a BOM are replayed ahead of the rest of the
/// stream. A short stream is returned as is; end of stream is never an error.
#[derive(Debug)]
pub struct BomStripped<R> {
    inner: R,
    probe: Vec<u8>,
    replayed: usize,
    probed: bool,
}

impl<R: Read> BomStripped<R> {
    /// Bytes already taken by the probe are not part of the returned reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    fn finish_probe(&mut self) -> io::Result<()> {
        let mut buf = [0u8; UTF8_BOM.len()];
        while self.probe.len() < UTF8_BOM.len() {
            let want = UTF8_BOM.len() - self.probe.len();
            match self.inner.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => self.probe.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // keep what was probed so far for the next call
                Err(e) => return Err(e),
            }
        }
        self.probed = true;
        if self.probe == UTF8_BOM {
            tracing::trace!("stripped utf-8 bom");
            self.probe.clear();
        }
        Ok(())
    }
}

impl<R: Read> Read for BomStripped<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.probed {
            self.finish_probe()?;
        }
        let head = &self.probe[self.replayed..];
        if !head.is_empty() {
            let n = head.len().min(buf.len());
            buf[..n].copy_from_slice(&head[..n]);
            self.replayed += n;
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

/// Drop a leading UTF-8 BOM from `reader`.
pub fn strip_utf8_bom<R: Read>(reader: R) -> BomStripped<R> {
    BomStripped {
        inner: reader,
        probe: Vec::with_capacity(UTF8_BOM.len()),
        replayed: 0,
        probed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        strip_utf8_bom(input).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_sniff_bom_order() {
        assert_eq!(sniff_bom(&[0xFE, 0xFF, 0x00, 0x61]).unwrap().encoding, "utf-16be");
        assert_eq!(sniff_bom(&[0xFF, 0xFE, 0x61, 0x00]).unwrap().encoding, "utf-16le");
        assert_eq!(sniff_bom(&[0xEF, 0xBB, 0xBF, 0x61]).unwrap().encoding, "utf-8");
        assert_eq!(sniff_bom(&[0xEF, 0xBB]), None);
        assert_eq!(sniff_bom(b"abc"), None);
        assert_eq!(sniff_bom(b""), None);
    }

    #[test]
    fn test_strip_utf8_bom() {
        assert_eq!(strip(&[0xEF, 0xBB, 0xBF]), b"");
        assert_eq!(strip(&[0xEF, 0xBB, 0xBF, b'h', b'i']), b"hi");
        // only the first mark goes
        assert_eq!(
            strip(&[0xEF, 0xBB, 0xBF, 0xEF, 0xBB, 0xBF]),
            vec![0xEF, 0xBB, 0xBF]
        );
        assert_eq!(strip("pingüino".as_bytes()), "pingüino".as_bytes());
    }

    #[test]
    fn test_short_input_is_returned_unmodified() {
        assert_eq!(strip(b""), b"");
        assert_eq!(strip(&[0xEF]), vec![0xEF]);
        assert_eq!(strip(&[0xEF, 0xBB]), vec![0xEF, 0xBB]);
        assert_eq!(strip(b"ab"), b"ab");
    }

    #[test]
    fn test_read_full_stops_at_eof() {
        let mut buf = [0u8; 8];
        let mut src: &[u8] = b"abc";
        assert_eq!(read_full(&mut src, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn test_into_inner_keeps_unread_tail() {
        let src: &[u8] = &[0xEF, 0xBB, 0xBF, b'x', b'y'];
        let mut stripped = strip_utf8_bom(src);
        let mut first = [0u8; 1];
        assert_eq!(stripped.read(&mut first).unwrap(), 1);
        assert_eq!(&first, b"x");
        assert_eq!(*stripped.get_ref(), &b"y"[..]);
        assert_eq!(stripped.into_inner(), &b"y"[..]);
    }

    /// Fails once after the first byte.
    struct Hiccup {
        data: Vec<u8>,
        pos: usize,
        failed: bool,
    }

    impl Read for Hiccup {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos == 1 && !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "not yet"));
            }
            let rest = &self.data[self.pos..];
            let n = rest.len().min(buf.len()).min(1);
            buf[..n].copy_from_slice(&rest[..n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_probe_survives_read_error() {
        let src = Hiccup {
            data: vec![0xEF, 0xBB, 0xBF, b'a'],
            pos: 0,
            failed: false,
        };
        let mut stripped = strip_utf8_bom(src);
        let mut buf = [0u8; 8];
        let err = stripped.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        let mut out = Vec::new();
        stripped.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"a");
    }
}
