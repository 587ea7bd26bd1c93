//! `<meta>` charset prescan over a bounded HTML prefix.

use super::html::{Token, Tokenizer};
use super::label::Charset;
use std::collections::HashSet;

/// Whether a charset found on a `<meta>` tag still needs an
/// `http-equiv="content-type"` attribute on the same tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PragmaState {
    /// no usable charset attribute seen yet
    Unknown,
    /// charset came from `content=`; requires the pragma
    NeedsPragma,
    /// charset came from `charset=`
    Exempt,
}

/// Scan `content` as HTML and return the first charset declared by a
/// `<meta>` tag, or `None` when markup ends or breaks first.
pub fn prescan(content: &[u8]) -> Option<Charset> {
    Tokenizer::new(content).find_map(|token| match token {
        Token::StartTag { name, attrs, .. } if name == "meta" => {
            let mut seen = HashSet::new();
            let mut got_pragma = false;
            let mut state = PragmaState::Unknown;
            let mut charset: Option<Charset> = None;

            for attr in attrs {
                if !seen.insert(attr.key.clone()) {
                    continue;
                }
                let value = String::from_utf8_lossy(&attr.value).to_ascii_lowercase();
                match attr.key.as_str() {
                    "http-equiv" => {
                        if value == "content-type" {
                            got_pragma = true;
                        }
                    }
                    "content" if charset.is_none() => {
                        if let Some(found) =
                            charset_from_meta_content(&value).and_then(|l| Charset::for_label(&l))
                        {
                            charset = Some(found);
                            state = PragmaState::NeedsPragma;
                        }
                    }
                    "charset" => {
                        charset = Charset::for_label(&value);
                        state = PragmaState::Exempt;
                    }
                    _ => {}
                }
            }

            match state {
                PragmaState::Unknown => None,
                PragmaState::NeedsPragma if !got_pragma => None,
                PragmaState::NeedsPragma | PragmaState::Exempt => charset.map(|c| {
                    if c.name().starts_with("utf-16") {
                        Charset::Utf8
                    } else {
                        c
                    }
                }),
            }
        }
        _ => None,
    })
}

/// Pull the charset label out of a `content` attribute value such as
/// `text/html; charset=windows-1252`.
pub fn charset_from_meta_content(s: &str) -> Option<String> {
    const SPACE: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];
    let mut s = s;
    loop {
        let at = s.find("charset")?;
        s = s[at + "charset".len()..].trim_start_matches(SPACE);
        let Some(after_eq) = s.strip_prefix('=') else {
            continue;
        };
        let value = after_eq.trim_start_matches(SPACE);
        let label = match value.chars().next()? {
            q @ ('"' | '\'') => {
                let quoted = &value[1..];
                &quoted[..quoted.find(q)?]
            }
            _ => {
                let end = value.find([';', ' ', '\t', '\n', '\x0c', '\r']).unwrap_or(value.len());
                &value[..end]
            }
        };
        return (!label.is_empty()).then(|| label.to_string());
    }
}
