pub mod charset;
pub mod util;

pub use charset::{
    CharsetReaderError, DetectionSource, ReaderOptions, Resolution, TextFile, Utf8Reader,
    determine_encoding, must_open, open,
};
