//! Dictionary literal reader
//!
//! Reads the literal syntax models use when asked for a composition:
//! `{"Ni": 0.6, 'Cu': 0.4}`, bare keys (`{Ni: 0.6}`), signed and exponent
//! numbers, quoted strings, `True`/`False`/`None`, lists and nested
//! mappings, with an optional trailing comma. Anything else is an error,
//! which the strategies treat as "no candidate here".

use catalyst_core::{RawMapping, RawValue};
use thiserror::Error;

const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralError {
    #[error("LITERAL/EOF: unexpected end of input")]
    UnexpectedEnd,

    #[error("LITERAL/CHAR: unexpected {found:?} at byte {pos}")]
    Unexpected { found: char, pos: usize },

    #[error("LITERAL/KEY: empty key at byte {0}")]
    EmptyKey(usize),

    #[error("LITERAL/NUMBER: malformed number {0:?}")]
    BadNumber(String),

    #[error("LITERAL/TRAILING: input continues at byte {0}")]
    Trailing(usize),

    #[error("LITERAL/DEPTH: nesting deeper than 32 levels")]
    TooDeep,

    #[error("LITERAL/SHAPE: top-level value is not a mapping")]
    NotAMapping,
}

/// Parse `src` as exactly one mapping literal (surrounding whitespace allowed)
pub fn parse_mapping(src: &str) -> Result<RawMapping, LiteralError> {
    match parse_value(src)? {
        RawValue::Map(mapping) => Ok(mapping),
        _ => Err(LiteralError::NotAMapping),
    }
}

/// Parse `src` as exactly one literal of any shape
pub fn parse_value(src: &str) -> Result<RawValue, LiteralError> {
    let mut reader = Reader { src, pos: 0 };
    reader.skip_ws();
    let value = reader.value(0)?;
    reader.skip_ws();
    if reader.pos < src.len() {
        return Err(LiteralError::Trailing(reader.pos));
    }
    Ok(value)
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn unexpected(&self, found: char) -> LiteralError {
        LiteralError::Unexpected {
            found,
            pos: self.pos,
        }
    }

    fn expect(&mut self, want: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == want => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.unexpected(c)),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn value(&mut self, depth: usize) -> Result<RawValue, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(LiteralError::TooDeep);
        }
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('{') => self.mapping(depth).map(RawValue::Map),
            Some('[') => self.list(depth),
            Some('"') | Some('\'') => self.string().map(RawValue::Text),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                match self.ident() {
                    "True" => Ok(RawValue::Bool(true)),
                    "False" => Ok(RawValue::Bool(false)),
                    "None" => Ok(RawValue::Null),
                    _ => Err(LiteralError::Unexpected { found: c, pos: start }),
                }
            }
            Some(c) => Err(self.unexpected(c)),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<RawMapping, LiteralError> {
        self.expect('{')?;
        let mut mapping = RawMapping::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(mapping);
            }

            let key = self.key()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.value(depth + 1)?;
            mapping.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(mapping);
                }
                Some(c) => return Err(self.unexpected(c)),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn list(&mut self, depth: usize) -> Result<RawValue, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(RawValue::List(items));
            }

            items.push(self.value(depth + 1)?);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    return Ok(RawValue::List(items));
                }
                Some(c) => return Err(self.unexpected(c)),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn key(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let key = match self.peek() {
            Some('"') | Some('\'') => self.string()?,
            Some(c) if is_ident_start(c) => self.ident().to_string(),
            Some(c) => return Err(self.unexpected(c)),
            None => return Err(LiteralError::UnexpectedEnd),
        };
        if key.trim().is_empty() {
            return Err(LiteralError::EmptyKey(start));
        }
        Ok(key)
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    /// Quoted string; the opening quote decides the closing one
    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(LiteralError::UnexpectedEnd),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(escaped) => out.push(escaped),
                },
                Some('\n') => {
                    return Err(LiteralError::Unexpected {
                        found: '\n',
                        pos: self.pos - 1,
                    })
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<RawValue, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')) {
                break;
            }
            self.pos += 1;
        }
        let token = &self.src[start..self.pos];
        token
            .parse::<f64>()
            .map(RawValue::Number)
            .map_err(|_| LiteralError::BadNumber(token.to_string()))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
