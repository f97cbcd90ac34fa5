//! Single-pass JSON parser producing [`Any`] values directly
//!
//! Integers keep the narrowest of int32, uint32, int64 and uint64 that holds
//! them; anything with a fraction or exponent, or too large, becomes a double.

use crate::any::Any;
use crate::error::{GanyError, GanyResult};
use std::collections::BTreeMap;

/// Parse a complete JSON document
pub fn parse(input: &str) -> GanyResult<Any> {
    let mut parser = Parser::new(input);
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < parser.bytes.len() {
        return Err(parser.error(format!(
            "Unexpected trailing content at position {}",
            parser.pos
        )));
    }
    Ok(value)
}

/// JSON parser state
struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, msg: impl Into<String>) -> GanyError {
        GanyError::Runtime(msg.into())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Parse a JSON value (entry point)
    fn parse_value(&mut self) -> GanyResult<Any> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.error("Unexpected end of JSON")),
            Some(b'n') => self.parse_null(),
            Some(b't' | b'f') => self.parse_bool(),
            Some(b'"') => Ok(Any::from(self.parse_string()?)),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(c) => Err(self.error(format!(
                "Unexpected character '{}' at position {}",
                c as char, self.pos
            ))),
        }
    }

    fn parse_null(&mut self) -> GanyResult<Any> {
        if self.consume_literal("null") {
            Ok(Any::null())
        } else {
            Err(self.error(format!("Invalid null literal at position {}", self.pos)))
        }
    }

    fn parse_bool(&mut self) -> GanyResult<Any> {
        if self.consume_literal("true") {
            Ok(Any::from(true))
        } else if self.consume_literal("false") {
            Ok(Any::from(false))
        } else {
            Err(self.error(format!(
                "Invalid boolean literal at position {}",
                self.pos
            )))
        }
    }

    fn parse_string(&mut self) -> GanyResult<String> {
        if self.peek() != Some(b'"') {
            return Err(self.error(format!("Expected '\"' at position {}", self.pos)));
        }
        self.pos += 1;

        let start = self.pos;
        let mut has_escapes = false;

        while let Some(c) = self.peek() {
            match c {
                b'"' => {
                    let end = self.pos;
                    self.pos += 1;
                    let raw = &self.input[start..end];
                    return if has_escapes {
                        self.unescape_string(raw)
                    } else {
                        Ok(raw.to_string())
                    };
                }
                b'\\' => {
                    has_escapes = true;
                    self.pos += 2;
                }
                b'\x00'..=b'\x1F' => {
                    return Err(self.error(format!(
                        "Unescaped control character in string at position {}",
                        self.pos
                    )));
                }
                _ => self.pos += 1,
            }
        }

        Err(self.error("Unterminated string"))
    }

    fn unescape_string(&self, s: &str) -> GanyResult<String> {
        let mut result = String::with_capacity(s.len());
        let mut chars = s.chars();

        while let Some(ch) = chars.next() {
            if ch != '\\' {
                result.push(ch);
                continue;
            }
            match chars.next() {
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                Some('/') => result.push('/'),
                Some('b') => result.push('\x08'),
                Some('f') => result.push('\x0C'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('u') => {
                    let high = self.hex4(&mut chars)?;
                    let code = if (0xD800..0xDC00).contains(&high) {
                        let (Some('\\'), Some('u')) = (chars.next(), chars.next()) else {
                            return Err(self.error("Unpaired surrogate in unicode escape"));
                        };
                        let low = self.hex4(&mut chars)?;
                        if !(0xDC00..0xE000).contains(&low) {
                            return Err(self.error("Invalid low surrogate in unicode escape"));
                        }
                        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                    } else {
                        high
                    };
                    let c = char::from_u32(code)
                        .ok_or_else(|| self.error("Invalid unicode code point"))?;
                    result.push(c);
                }
                Some(c) => {
                    return Err(self.error(format!("Invalid escape sequence: \\{}", c)));
                }
                None => return Err(self.error("Unexpected end of string")),
            }
        }

        Ok(result)
    }

    fn hex4(&self, chars: &mut std::str::Chars<'_>) -> GanyResult<u32> {
        let hex: String = chars.by_ref().take(4).collect();
        if hex.len() != 4 {
            return Err(self.error("Invalid unicode escape"));
        }
        u32::from_str_radix(&hex, 16).map_err(|_| self.error("Invalid unicode hex digits"))
    }

    fn skip_digits(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn parse_number(&mut self) -> GanyResult<Any> {
        let start = self.pos;
        let mut integral = true;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(c) if c.is_ascii_digit() => self.skip_digits(),
            _ => {
                return Err(self.error(format!("Invalid number at position {}", self.pos)));
            }
        }

        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                return Err(self.error("Invalid number: digit expected after '.'"));
            }
            self.skip_digits();
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            integral = false;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                return Err(self.error("Invalid number: digit expected in exponent"));
            }
            self.skip_digits();
        }

        let text = &self.input[start..self.pos];
        if integral {
            if let Ok(v) = text.parse::<i32>() {
                return Ok(Any::from(v));
            }
            if let Ok(v) = text.parse::<u32>() {
                return Ok(Any::from(v));
            }
            if let Ok(v) = text.parse::<i64>() {
                return Ok(Any::from(v));
            }
            if let Ok(v) = text.parse::<u64>() {
                return Ok(Any::from(v));
            }
        }
        text.parse::<f64>()
            .map(Any::from)
            .map_err(|_| self.error(format!("Invalid number: {}", text)))
    }

    fn parse_array(&mut self) -> GanyResult<Any> {
        self.pos += 1;
        self.skip_whitespace();

        let mut elements = Vec::new();

        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Any::array_from(elements));
        }

        loop {
            elements.push(self.parse_value()?);
            self.skip_whitespace();

            match self.peek() {
                None => return Err(self.error("Unterminated array")),
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Any::array_from(elements));
                }
                Some(c) => {
                    return Err(self.error(format!(
                        "Expected ',' or ']' in array, got '{}' at position {}",
                        c as char, self.pos
                    )))
                }
            }
        }
    }

    fn parse_object(&mut self) -> GanyResult<Any> {
        self.pos += 1;
        self.skip_whitespace();

        let mut object = BTreeMap::new();

        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Any::object_from(object));
        }

        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return Err(self.error(format!(
                    "Expected string key at position {}",
                    self.pos
                )));
            }
            let key = self.parse_string()?;

            self.skip_whitespace();
            if self.peek() != Some(b':') {
                return Err(self.error(format!(
                    "Expected ':' after object key at position {}",
                    self.pos
                )));
            }
            self.pos += 1;

            let value = self.parse_value()?;
            object.insert(key, value);

            self.skip_whitespace();

            match self.peek() {
                None => return Err(self.error("Unterminated object")),
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Any::object_from(object));
                }
                Some(c) => {
                    return Err(self.error(format!(
                        "Expected ',' or '}}' in object, got '{}' at position {}",
                        c as char, self.pos
                    )))
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn consume_literal(&mut self, literal: &str) -> bool {
        let literal = literal.as_bytes();
        if self.bytes[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }
}
