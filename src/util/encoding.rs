use crate::charset::{ReaderOptions, Utf8Reader};
use anyhow::{Context, Result, anyhow};
use std::io::Read;

/// read to end, detect char-encoding and decode to utf-8
/// (a leading BOM is removed)
pub fn read_to_utf8_string<R>(input: R) -> Result<String>
where
    R: std::io::Read,
{
    read_to_utf8_string_with(input, &ReaderOptions::default())
}

pub fn read_to_utf8_string_with<R>(input: R, options: &ReaderOptions) -> Result<String>
where
    R: std::io::Read,
{
    let mut reader =
        Utf8Reader::with_options(input, options).context("cannot set up charset reader")?;
    let mut decoded: Vec<u8> = Vec::new();

    // read and decode
    reader
        .read_to_end(&mut decoded)
        .map_err(|e| anyhow!("Could not read input as {}: {}", reader.resolution().name(), e))?;

    // the detected charset may be wrong for bytes past the lookahead
    String::from_utf8(decoded).map_err(|e| {
        anyhow!(
            "Decoded input is not utf-8 (detected {:?}): {}",
            reader.resolution(),
            e
        )
    })
}

pub fn decode_to_utf8(input: &[u8]) -> Result<String> {
    read_to_utf8_string(input)
}
