//! Charset registry: label lookup and declared content-type parsing.

use encoding::EncodingRef;
use encoding::all::ISO_8859_1;
use encoding::label::encoding_from_whatwg_label;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

const TOKEN: &str = r"[!#$%&'*+\-.^_`|~0-9A-Za-z]+";

static MEDIA_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^\s*{TOKEN}(?:/{TOKEN})?\s*")).unwrap());
static MEDIA_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^;\s*({TOKEN})\s*=\s*(?:"((?:[^"\\]|\\.)*)"|({TOKEN}))\s*"#
    ))
    .unwrap()
});
static TRAILING_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^;\s*$").unwrap());
static QUOTED_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(.)").unwrap());

/// A resolved character encoding.
///
/// `Utf8` is the no-op encoding for content already checked to be UTF-8; it
/// is passed through untouched. A UTF-8 label resolves to a validating
/// UTF-8 decoder instead.
#[derive(Clone, Copy)]
pub enum Charset {
    Utf8,
    Transcode(EncodingRef),
}

impl Charset {
    /// Latin-1, which accepts every byte value.
    pub fn latin1() -> Self {
        Charset::Transcode(ISO_8859_1)
    }

    /// Look up a charset label (case and surrounding whitespace are ignored).
    pub fn for_label(label: &str) -> Option<Self> {
        encoding_from_whatwg_label(label).map(Charset::Transcode)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Transcode(enc) => canonical_name(*enc),
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Charset::Utf8)
    }
}

fn canonical_name(enc: EncodingRef) -> &'static str {
    enc.whatwg_name().unwrap_or_else(|| enc.name())
}

impl PartialEq for Charset {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Charset {}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Charset::Utf8 => f.write_str("Utf8"),
            Charset::Transcode(_) => f.debug_tuple("Transcode").field(&self.name()).finish(),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extract the `charset` parameter of a declared content type such as
/// `text/html; charset="Shift_JIS"`.
///
/// Returns `None` when the value does not parse as a media type, when a
/// parameter is repeated, or when there is no charset parameter.
pub fn charset_param(content_type: &str) -> Option<String> {
    let head = MEDIA_TYPE.find(content_type)?;
    let mut rest = &content_type[head.end()..];
    let mut params: Vec<(String, String)> = Vec::new();
    while !rest.is_empty() {
        if TRAILING_SEMICOLON.is_match(rest) {
            break;
        }
        let caps = MEDIA_PARAM.captures(rest)?;
        let key = caps[1].to_ascii_lowercase();
        let value = match (caps.get(2), caps.get(3)) {
            (Some(quoted), _) => QUOTED_PAIR.replace_all(quoted.as_str(), "$1").into_owned(),
            (None, Some(token)) => token.as_str().to_string(),
            (None, None) => return None,
        };
        if params.iter().any(|(k, _)| *k == key) {
            return None;
        }
        params.push((key, value));
        rest = &rest[caps[0].len()..];
    }
    params
        .into_iter()
        .find(|(k, _)| k == "charset")
        .map(|(_, v)| v)
}
