//! Read text of unknown encoding as UTF-8 without a BOM.
//!
//! The encoding is resolved from a bounded lookahead of the input (BOM,
//! declared content type, `<meta>` declarations, UTF-8 validity, then
//! Latin-1), the input is decoded as it is read, and a leading BOM produced by
//! the decoded stream is dropped.

pub mod bom;
pub mod config;
pub mod decode;
pub mod detect;
pub mod error;
pub mod html;
pub mod label;
pub mod meta;
pub mod open;

use std::io::{self, Chain, Cursor, Read};

pub use bom::{BomStripped, strip_utf8_bom};
pub use config::{DEFAULT_LOOKAHEAD_SIZE, MalformedPolicy, ReaderOptions};
pub use decode::{DecodeReader, Transform};
pub use detect::{DetectionSource, Resolution, determine_encoding};
pub use error::{CharsetReaderError, Result};
pub use label::Charset;
pub use open::{TextFile, must_open, open, open_with_options};

type Primed<R> = Chain<Cursor<Vec<u8>>, R>;

/// Fill a lookahead buffer of at most `size` bytes from `r`.
///
/// Fails with [`CharsetReaderError::EmptySource`] when `r` yields nothing.
pub fn prime_lookahead<R: Read>(r: &mut R, size: usize) -> Result<Vec<u8>> {
    let mut preview = vec![0; size];
    let n = bom::read_full(r, &mut preview)?;
    if n == 0 {
        return Err(CharsetReaderError::EmptySource);
    }
    preview.truncate(n);
    Ok(preview)
}

/// UTF-8, BOM-free view of a byte stream of unknown encoding.
pub struct Utf8Reader<R> {
    inner: BomStripped<Transform<Primed<R>>>,
    resolution: Resolution,
}

impl<R: Read> Utf8Reader<R> {
    pub fn new(r: R) -> Result<Self> {
        Self::with_options(r, &ReaderOptions::default())
    }

    /// `content_type` is a declared type such as `text/html; charset=koi8-r`.
    pub fn with_content_type(r: R, content_type: &str) -> Result<Self> {
        Self::with_options(r, &ReaderOptions::with_content_type(content_type))
    }

    /// Prime the lookahead, resolve the encoding and assemble the pipeline.
    ///
    /// An empty source gives an empty reader. Other I/O errors while priming
    /// are returned; decode errors only show up when reading.
    pub fn with_options(mut r: R, options: &ReaderOptions) -> Result<Self> {
        options.validate()?;
        let preview = match prime_lookahead(&mut r, options.lookahead_size) {
            Ok(preview) => preview,
            Err(e) if e.is_end_of_stream() => {
                tracing::trace!("source is empty");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let resolution = detect::resolve(
            &preview,
            options.content_type.as_deref(),
            options.lookahead_size,
        );
        let primed = Cursor::new(preview).chain(r);
        let transformed = Transform::new(primed, resolution.charset, options.malformed);
        Ok(Utf8Reader {
            inner: strip_utf8_bom(transformed),
            resolution,
        })
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The source, positioned after whatever the pipeline has consumed.
    pub fn into_inner(self) -> R {
        self.inner.into_inner().into_inner().into_inner().1
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref().get_ref().get_ref().1
    }
}

impl<R: Read> Read for Utf8Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
