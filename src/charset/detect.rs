//! Encoding resolution over the lookahead buffer.
//!
//! Rules are tried in order and the first match wins:
//! BOM, declared content type, `<meta>` prescan, UTF-8 validity, Latin-1.

use super::bom::{UTF8_BOM, sniff_bom};
use super::config::DEFAULT_LOOKAHEAD_SIZE;
use super::label::{Charset, charset_param};
use super::meta::prescan;

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Bom,
    ContentType,
    MetaTag,
    Utf8Heuristic,
    Fallback,
}

/// Outcome of encoding resolution.
///
/// `certain` is advisory: it is set when the encoding came from a BOM or a
/// declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub charset: Charset,
    pub certain: bool,
    pub source: DetectionSource,
}

impl Resolution {
    fn new(charset: Charset, source: DetectionSource) -> Self {
        let certain = matches!(source, DetectionSource::Bom | DetectionSource::ContentType);
        Resolution {
            charset,
            certain,
            source,
        }
    }

    /// Canonical name of the resolved encoding.
    pub fn name(&self) -> &'static str {
        self.charset.name()
    }
}

/// Determine the encoding of `content` (at most the first 10 KiB are
/// examined) and an optional declared content type.
pub fn determine_encoding(content: &[u8], content_type: Option<&str>) -> Resolution {
    resolve(content, content_type, DEFAULT_LOOKAHEAD_SIZE)
}

pub(crate) fn resolve(content: &[u8], content_type: Option<&str>, limit: usize) -> Resolution {
    let content = &content[..content.len().min(limit)];
    let resolution = resolve_rules(content, content_type);
    tracing::debug!(
        encoding = resolution.name(),
        certain = resolution.certain,
        source = ?resolution.source,
        examined = content.len(),
        "resolved text encoding"
    );
    resolution
}

fn resolve_rules(content: &[u8], content_type: Option<&str>) -> Resolution {
    if let Some(charset) = sniff_bom(content).and_then(|b| Charset::for_label(b.encoding)) {
        return Resolution::new(charset, DetectionSource::Bom);
    }

    if let Some(charset) = content_type
        .and_then(charset_param)
        .and_then(|label| Charset::for_label(&label))
    {
        return Resolution::new(charset, DetectionSource::ContentType);
    }

    if !content.is_empty() {
        if let Some(charset) = prescan(content) {
            return Resolution::new(charset, DetectionSource::MetaTag);
        }
    }

    // a cut-off UTF-8 BOM is returned as is
    let bom_prefix = !content.is_empty() && UTF8_BOM.starts_with(content);
    let trimmed = trim_partial_utf8(content);
    if bom_prefix || (!trimmed.is_ascii() && std::str::from_utf8(trimmed).is_ok()) {
        return Resolution::new(Charset::Utf8, DetectionSource::Utf8Heuristic);
    }

    Resolution::new(Charset::latin1(), DetectionSource::Fallback)
}

/// Cut a multi-byte sequence truncated by the end of the buffer.
///
/// Looks back at most three bytes for the start of a sequence; a sequence
/// that is complete is kept.
fn trim_partial_utf8(content: &[u8]) -> &[u8] {
    for i in (content.len().saturating_sub(3)..content.len()).rev() {
        let b = content[i];
        if b < 0x80 {
            break;
        }
        // not a continuation byte
        if b & 0xC0 != 0x80 {
            let width = match b {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                _ => return content,
            };
            if i + width > content.len() {
                return &content[..i];
            }
            break;
        }
    }
    content
}
