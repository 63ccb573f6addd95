//! Recursive-descent parser for single PDF objects.
//!
//! The parser reads one object from a byte slice at a given offset. It is
//! deliberately lenient where real-world PDFs are sloppy: stream lengths
//! given as indirect references fall back to scanning for `endstream`,
//! and extra whitespace is tolerated everywhere the format allows it.

use crate::error::{Error, Result};
use crate::pdf::object::{Dictionary, Object, ObjectRef};

/// Whitespace characters per PDF spec section 7.2.2.
fn is_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Delimiter characters per PDF spec section 7.2.2.
fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Cursor over raw PDF bytes.
pub struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser positioned at `offset`.
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::ParseError {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                // Comment runs to end of line.
                while let Some(b) = self.peek() {
                    self.pos += 1;
                    if b == b'\n' || b == b'\r' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, keyword: &[u8]) -> Result<()> {
        if self.data[self.pos..].starts_with(keyword) {
            self.pos += keyword.len();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", String::from_utf8_lossy(keyword))))
        }
    }

    fn starts_with(&self, keyword: &[u8]) -> bool {
        self.data[self.pos..].starts_with(keyword)
    }

    /// Parse an indirect object definition (`N G obj ... endobj`) at the
    /// current position.
    pub fn parse_indirect(&mut self) -> Result<(ObjectRef, Object)> {
        self.skip_whitespace();
        let id = self.parse_unsigned()? as u32;
        self.skip_whitespace();
        let gen = self.parse_unsigned()? as u16;
        self.skip_whitespace();
        self.expect(b"obj")?;
        let obj = self.parse_object()?;
        self.skip_whitespace();
        // Tolerate a missing endobj; the object itself already parsed.
        if self.starts_with(b"endobj") {
            self.pos += b"endobj".len();
        }
        Ok((ObjectRef::new(id, gen), obj))
    }

    /// Parse one object at the current position.
    pub fn parse_object(&mut self) -> Result<Object> {
        self.skip_whitespace();
        match self.peek().ok_or_else(|| self.error("unexpected end of data"))? {
            b'<' => {
                if self.data[self.pos..].starts_with(b"<<") {
                    self.parse_dictionary_or_stream()
                } else {
                    self.parse_hex_string()
                }
            },
            b'(' => self.parse_literal_string(),
            b'/' => self.parse_name(),
            b'[' => self.parse_array(),
            b't' | b'f' => self.parse_boolean(),
            b'n' => {
                self.expect(b"null")?;
                Ok(Object::Null)
            },
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.parse_number_or_reference(),
            other => Err(self.error(format!("unexpected byte 0x{:02X}", other))),
        }
    }

    fn parse_unsigned(&mut self) -> Result<u64> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected digits"));
        }
        std::str::from_utf8(&self.data[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("integer overflow"))
    }

    fn parse_boolean(&mut self) -> Result<Object> {
        if self.starts_with(b"true") {
            self.pos += 4;
            Ok(Object::Boolean(true))
        } else if self.starts_with(b"false") {
            self.pos += 5;
            Ok(Object::Boolean(false))
        } else {
            Err(self.error("expected 'true' or 'false'"))
        }
    }

    fn parse_number_or_reference(&mut self) -> Result<Object> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut is_real = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !is_real => {
                    is_real = true;
                    self.pos += 1;
                },
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| self.error("non-ASCII number"))?;

        if is_real {
            let value: f64 = text.parse().map_err(|_| self.error("malformed real"))?;
            return Ok(Object::Real(value));
        }
        let value: i64 = text.parse().map_err(|_| self.error("malformed integer"))?;

        // "N G R" is an indirect reference; look ahead without committing.
        let checkpoint = self.pos;
        if value >= 0 {
            self.skip_whitespace();
            if let Ok(gen) = self.parse_unsigned() {
                self.skip_whitespace();
                if self.peek() == Some(b'R')
                    && self
                        .data
                        .get(self.pos + 1)
                        .map(|&b| is_whitespace(b) || is_delimiter(b))
                        .unwrap_or(true)
                    && gen <= u16::MAX as u64
                {
                    self.pos += 1;
                    return Ok(Object::Reference(ObjectRef::new(value as u32, gen as u16)));
                }
            }
        }
        self.pos = checkpoint;
        Ok(Object::Integer(value))
    }

    fn parse_name(&mut self) -> Result<Object> {
        self.expect(b"/")?;
        let mut name = String::new();
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
            if b == b'#' {
                let hex = self
                    .data
                    .get(self.pos..self.pos + 2)
                    .and_then(|pair| std::str::from_utf8(pair).ok())
                    .and_then(|s| u8::from_str_radix(s, 16).ok())
                    .ok_or_else(|| self.error("bad #-escape in name"))?;
                self.pos += 2;
                name.push(hex as char);
            } else {
                name.push(b as char);
            }
        }
        Ok(Object::Name(name))
    }

    fn parse_literal_string(&mut self) -> Result<Object> {
        self.expect(b"(")?;
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let b = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                },
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b);
                },
                b'\\' => {
                    let esc = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'(' | b')' | b'\\' => out.push(esc),
                        b'\r' => {
                            // Line continuation; swallow an LF after CR.
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        },
                        b'\n' => {},
                        b'0'..=b'7' => {
                            let mut value = (esc - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + (d - b'0') as u32;
                                        self.pos += 1;
                                    },
                                    _ => break,
                                }
                            }
                            out.push(value as u8);
                        },
                        other => out.push(other),
                    }
                },
                _ => out.push(b),
            }
        }
        Ok(Object::String(out))
    }

    fn parse_hex_string(&mut self) -> Result<Object> {
        self.expect(b"<")?;
        let mut digits = Vec::new();
        loop {
            let b = self.bump().ok_or_else(|| self.error("unterminated hex string"))?;
            match b {
                b'>' => break,
                _ if is_whitespace(b) => {},
                b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => digits.push(b),
                other => return Err(self.error(format!("bad hex digit 0x{:02X}", other))),
            }
        }
        // Odd digit count: final digit is padded with zero.
        if digits.len() % 2 == 1 {
            digits.push(b'0');
        }
        let bytes = digits
            .chunks(2)
            .map(|pair| {
                let s = std::str::from_utf8(pair).unwrap_or("00");
                u8::from_str_radix(s, 16).unwrap_or(0)
            })
            .collect();
        Ok(Object::String(bytes))
    }

    fn parse_array(&mut self) -> Result<Object> {
        self.expect(b"[")?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b']') {
                self.pos += 1;
                break;
            }
            if self.peek().is_none() {
                return Err(self.error("unterminated array"));
            }
            items.push(self.parse_object()?);
        }
        Ok(Object::Array(items))
    }

    fn parse_dictionary_or_stream(&mut self) -> Result<Object> {
        self.expect(b"<<")?;
        let mut dict = Dictionary::new();
        loop {
            self.skip_whitespace();
            if self.starts_with(b">>") {
                self.pos += 2;
                break;
            }
            let key = match self.parse_name()? {
                Object::Name(n) => n,
                _ => unreachable!(),
            };
            let value = self.parse_object()?;
            dict.insert(key, value);
        }

        self.skip_whitespace();
        if !self.starts_with(b"stream") {
            return Ok(Object::Dictionary(dict));
        }
        self.pos += b"stream".len();
        // A single EOL follows the keyword: CRLF or LF.
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }

        let data_start = self.pos;
        let data_end = match dict.get("Length").and_then(|o| o.as_integer()) {
            Some(len) if len >= 0 && data_start + len as usize <= self.data.len() => {
                data_start + len as usize
            },
            // Length missing, indirect, or out of range: scan for the
            // endstream marker instead.
            _ => find_endstream(self.data, data_start)
                .ok_or_else(|| self.error("stream without endstream"))?,
        };

        self.pos = data_end;
        self.skip_whitespace();
        self.expect(b"endstream")?;

        Ok(Object::Stream {
            dict,
            data: bytes::Bytes::copy_from_slice(&self.data[data_start..data_end]),
        })
    }
}

/// Locate the end of stream data by scanning for `endstream`, trimming
/// the EOL that precedes the keyword.
fn find_endstream(data: &[u8], from: usize) -> Option<usize> {
    let window = &data[from..];
    let found = window
        .windows(b"endstream".len())
        .position(|w| w == b"endstream")?;
    let mut end = from + found;
    if end > from && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > from && data[end - 1] == b'\r' {
        end -= 1;
    }
    Some(end)
}
