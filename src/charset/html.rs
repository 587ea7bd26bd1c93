//! Minimal HTML tokenizer, just enough to find `<meta>` tags in a prefix.
//!
//! The tokenizer works on raw bytes and never looks past the slice it was
//! given. Markup cut off by the end of the slice is not emitted: the token
//! stream simply ends there.

use std::borrow::Cow;

/// Elements whose content is raw text; tags inside them are not markup.
const RAW_TEXT_ELEMENTS: [&str; 10] = [
    "iframe",
    "noembed",
    "noframes",
    "noscript",
    "plaintext",
    "script",
    "style",
    "textarea",
    "title",
    "xmp",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// lowercased
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text,
    Comment,
    Doctype,
    StartTag {
        /// lowercased
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
}

pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    /// Set after a raw text start tag; holds the name of the closing tag to skip to.
    raw_text: Option<String>,
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0c' | b'\r')
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            input,
            pos: 0,
            raw_text: None,
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_space(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
    }

    /// Position of `needle` at or after the cursor.
    fn find_bytes(&self, needle: &[u8]) -> Option<usize> {
        self.rest()
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|i| self.pos + i)
    }

    /// Like `find_bytes`, ignoring ASCII case.
    fn find_ignore_case(&self, needle: &[u8]) -> Option<usize> {
        self.rest()
            .windows(needle.len())
            .position(|w| w.eq_ignore_ascii_case(needle))
            .map(|i| self.pos + i)
    }

    fn next_token(&mut self) -> Option<Token> {
        if let Some(name) = self.raw_text.take() {
            return self.raw_text_body(&name);
        }
        if self.pos >= self.input.len() {
            return None;
        }
        if self.input[self.pos] != b'<' {
            let end = self.find_bytes(b"<").unwrap_or(self.input.len());
            self.pos = end;
            return Some(Token::Text);
        }
        match self.input.get(self.pos + 1).copied() {
            Some(b'!') => self.markup_declaration(),
            Some(b'?') => self.bogus_comment(self.pos + 2),
            Some(b'/') => self.end_tag(),
            Some(c) if c.is_ascii_alphabetic() => self.start_tag(),
            Some(_) => {
                // a lone '<' is text
                self.pos += 1;
                let end = self.find_bytes(b"<").unwrap_or(self.input.len());
                self.pos = end;
                Some(Token::Text)
            }
            None => None,
        }
    }

    fn raw_text_body(&mut self, name: &str) -> Option<Token> {
        if name == "plaintext" {
            // never closes
            self.pos = self.input.len();
            return None;
        }
        let close = format!("</{name}");
        let end = self.find_ignore_case(close.as_bytes())?;
        self.pos = end;
        Some(Token::Text)
    }

    fn markup_declaration(&mut self) -> Option<Token> {
        let body = self.pos + 2;
        if self.input[body..].starts_with(b"--") {
            let start = body + 2;
            // "<!-->" and "<!--->" are complete comments
            for short in [&b">"[..], &b"->"[..]] {
                if self.input[start..].starts_with(short) {
                    self.pos = start + short.len();
                    return Some(Token::Comment);
                }
            }
            self.pos = start;
            let end = self.find_bytes(b"-->")?;
            self.pos = end + 3;
            return Some(Token::Comment);
        }
        if self.input[body..]
            .get(..7)
            .is_some_and(|w| w.eq_ignore_ascii_case(b"doctype"))
        {
            self.pos = body;
            let end = self.find_bytes(b">")?;
            self.pos = end + 1;
            return Some(Token::Doctype);
        }
        self.bogus_comment(body)
    }

    fn bogus_comment(&mut self, from: usize) -> Option<Token> {
        self.pos = from;
        let end = self.find_bytes(b">")?;
        self.pos = end + 1;
        Some(Token::Comment)
    }

    fn end_tag(&mut self) -> Option<Token> {
        self.pos += 2;
        match self.peek()? {
            b'>' => {
                // "</>" is ignored
                self.pos += 1;
                Some(Token::Comment)
            }
            c if c.is_ascii_alphabetic() => {
                let name = self.tag_name();
                let end = self.find_bytes(b">")?;
                self.pos = end + 1;
                Some(Token::EndTag { name })
            }
            _ => self.bogus_comment(self.pos),
        }
    }

    fn tag_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !is_space(b) && b != b'/' && b != b'>')
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).to_ascii_lowercase()
    }

    fn start_tag(&mut self) -> Option<Token> {
        self.pos += 1;
        let name = self.tag_name();
        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_space();
            match self.peek()? {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' => {
                    self.pos += 1;
                    if self.peek()? == b'>' {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                _ => attrs.push(self.attribute()?),
            }
        }
        if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text = Some(name.clone());
        }
        Some(Token::StartTag {
            name,
            attrs,
            self_closing,
        })
    }

    fn attribute(&mut self) -> Option<Attribute> {
        let start = self.pos;
        // a leading '=' belongs to the name
        self.pos += 1;
        while self
            .peek()
            .is_some_and(|b| !is_space(b) && b != b'/' && b != b'>' && b != b'=')
        {
            self.pos += 1;
        }
        let key = String::from_utf8_lossy(&self.input[start..self.pos]).to_ascii_lowercase();
        self.skip_space();
        if self.peek()? != b'=' {
            return Some(Attribute {
                key,
                value: Vec::new(),
            });
        }
        self.pos += 1;
        self.skip_space();
        let raw = match self.peek()? {
            q @ (b'"' | b'\'') => {
                self.pos += 1;
                let len = self.rest().iter().position(|&b| b == q)?;
                let raw = &self.input[self.pos..self.pos + len];
                self.pos += len + 1;
                raw
            }
            _ => {
                let begin = self.pos;
                while self.peek().is_some_and(|b| !is_space(b) && b != b'>') {
                    self.pos += 1;
                }
                &self.input[begin..self.pos]
            }
        };
        Some(Attribute {
            key,
            value: unescape(raw).into_owned(),
        })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Replace the character references that matter for attribute values.
fn unescape(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.contains(&b'&') {
        return Cow::Borrowed(raw);
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'&' {
            if let Some((c, used)) = char_ref(&raw[i + 1..]) {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                i += 1 + used;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    Cow::Owned(out)
}

/// Decode a reference following '&'. Returns the char and the bytes consumed.
fn char_ref(s: &[u8]) -> Option<(char, usize)> {
    const NAMED: [(&[u8], char); 5] = [
        (b"amp;", '&'),
        (b"quot;", '"'),
        (b"apos;", '\''),
        (b"lt;", '<'),
        (b"gt;", '>'),
    ];
    if let Some((name, c)) = NAMED.iter().find(|(name, _)| s.starts_with(name)) {
        return Some((*c, name.len()));
    }
    let rest = s.strip_prefix(b"#")?;
    let (radix, digits_at) = match rest.first() {
        Some(b'x' | b'X') => (16, 2),
        _ => (10, 1),
    };
    let digits = s[digits_at..]
        .iter()
        .take_while(|b| b.is_ascii_hexdigit() && (radix == 16 || b.is_ascii_digit()))
        .count();
    if digits == 0 {
        return None;
    }
    let text = std::str::from_utf8(&s[digits_at..digits_at + digits]).ok()?;
    let c = u32::from_str_radix(text, radix)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or('\u{FFFD}');
    let mut used = digits_at + digits;
    if s.get(used) == Some(&b';') {
        used += 1;
    }
    Some((c, used))
}
