// Query-option lexer - tokenizes $filter / $orderby strings

use super::error::{TokenizerError, TokenizerErrorKind};
use super::token::{Token, TokenKind};
use crate::edm::EdmValue;
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Literal prefixes that introduce a quoted, typed payload.
const PREFIXED_LITERALS: &[&str] = &["datetime", "datetimeoffset", "time", "guid", "binary", "X"];

/// Forward-only tokenizer over a percent-decoded query-option string.
///
/// One pass, no backtracking: each call to [`Lexer::next_token`] classifies
/// the longest lexical class at the cursor and advances past it. The lexer
/// is also an iterator over `Result<Token, TokenizerError>`.
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, TokenizerError> {
        self.skip_whitespace();

        let start = self.position;
        let current = match self.current() {
            Some(c) => c,
            None => return Ok(None),
        };

        let kind = match current {
            '(' => {
                self.advance();
                TokenKind::OpenParen
            }
            ')' => {
                self.advance();
                TokenKind::CloseParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '/' => {
                self.advance();
                TokenKind::Slash
            }
            '-' => {
                self.advance();
                TokenKind::Minus
            }
            '\'' => {
                let value = self.read_string_literal()?;
                TokenKind::Literal(EdmValue::String(value))
            }
            c if c.is_ascii_digit() => self.read_number(start)?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier_or_literal(start)?,
            other => {
                return Err(TokenizerError::new(
                    start,
                    TokenizerErrorKind::UnknownCharacter(other),
                ))
            }
        };

        let text: String = self.chars[start..self.position].iter().collect();
        Ok(Some(Token::new(kind, text, start)))
    }

    /// Tokenize the remaining input, appending the end-of-input token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizerError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::End, "", self.position));
        Ok(tokens)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a quoted string starting at the opening quote. Doubled quotes
    /// escape a single quote. Returns the unescaped content.
    fn read_string_literal(&mut self) -> Result<String, TokenizerError> {
        let quote_position = self.position;
        self.advance(); // opening quote
        let mut content = String::new();

        loop {
            match self.current() {
                None => {
                    return Err(TokenizerError::new(
                        quote_position,
                        TokenizerErrorKind::UnterminatedString,
                    ))
                }
                Some('\'') => {
                    if self.peek() == Some('\'') {
                        content.push('\'');
                        self.advance();
                        self.advance();
                    } else {
                        self.advance(); // closing quote
                        break;
                    }
                }
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
            }
        }

        Ok(content)
    }

    /// Read a numeric literal. The type suffix (`L`, `f`, `d`, `m`)
    /// disambiguates the subkind; without one, whole numbers are Int32
    /// (widening to Int64 on overflow) and fractional/exponent forms are
    /// Double.
    fn read_number(&mut self, start: usize) -> Result<TokenKind, TokenizerError> {
        let mut has_fraction = false;
        let mut has_exponent = false;

        while self.current().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.current() == Some('.') && self.peek().map_or(false, |c| c.is_ascii_digit()) {
            has_fraction = true;
            self.advance();
            while self.current().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if matches!(self.current(), Some('e') | Some('E')) {
            let mut lookahead = self.position + 1;
            if matches!(self.chars.get(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if self.chars.get(lookahead).map_or(false, |c| c.is_ascii_digit()) {
                has_exponent = true;
                self.position = lookahead;
                while self.current().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let digits_end = self.position;
        let digits: String = self.chars[start..digits_end].iter().collect();
        let malformed = |lexer: &Self| {
            let text: String = lexer.chars[start..lexer.position].iter().collect();
            TokenizerError::new(
                start,
                TokenizerErrorKind::MalformedLiteral {
                    class: "number",
                    text,
                },
            )
        };

        let suffix = match self.current() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.advance();
                Some(c)
            }
            _ => None,
        };
        // A letter glued to the number that is not a lone valid suffix is
        // one malformed token, not two tokens.
        if self.current().map_or(false, |c| c.is_alphanumeric() || c == '_') {
            while self.current().map_or(false, |c| c.is_alphanumeric() || c == '_') {
                self.advance();
            }
            return Err(malformed(self));
        }

        let value = match suffix {
            Some('L') | Some('l') => {
                if has_fraction || has_exponent {
                    return Err(malformed(self));
                }
                EdmValue::Int64(digits.parse::<i64>().map_err(|_| malformed(self))?)
            }
            Some('f') | Some('F') => {
                EdmValue::Single(digits.parse::<f32>().map_err(|_| malformed(self))?)
            }
            Some('d') | Some('D') => {
                EdmValue::Double(digits.parse::<f64>().map_err(|_| malformed(self))?)
            }
            Some('m') | Some('M') => {
                let decimal = Decimal::from_str_exact(&digits)
                    .or_else(|_| Decimal::from_scientific(&digits))
                    .map_err(|_| malformed(self))?;
                EdmValue::Decimal(decimal)
            }
            Some(_) => return Err(malformed(self)),
            None => {
                if has_fraction || has_exponent {
                    EdmValue::Double(digits.parse::<f64>().map_err(|_| malformed(self))?)
                } else if let Ok(v) = digits.parse::<i32>() {
                    EdmValue::Int32(v)
                } else {
                    EdmValue::Int64(digits.parse::<i64>().map_err(|_| malformed(self))?)
                }
            }
        };

        Ok(TokenKind::Literal(value))
    }

    /// Read an identifier, a keyword literal (`true`/`false`/`null`), or a
    /// prefixed typed literal such as `datetime'2009-12-26T21:23:38'`.
    fn read_identifier_or_literal(&mut self, start: usize) -> Result<TokenKind, TokenizerError> {
        while self
            .current()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let ident: String = self.chars[start..self.position].iter().collect();

        if self.current() == Some('\'') && PREFIXED_LITERALS.contains(&ident.as_str()) {
            let payload = self.read_string_literal()?;
            let value = Self::parse_prefixed_literal(&ident, &payload)
                .ok_or_else(|| {
                    TokenizerError::new(
                        start,
                        TokenizerErrorKind::MalformedLiteral {
                            class: Self::prefixed_class(&ident),
                            text: payload.clone(),
                        },
                    )
                })?;
            return Ok(TokenKind::Literal(value));
        }

        Ok(match ident.as_str() {
            "true" => TokenKind::Literal(EdmValue::Boolean(true)),
            "false" => TokenKind::Literal(EdmValue::Boolean(false)),
            "null" => TokenKind::Literal(EdmValue::Null),
            _ => TokenKind::Identifier(ident),
        })
    }

    fn prefixed_class(prefix: &str) -> &'static str {
        match prefix {
            "datetime" => "datetime",
            "datetimeoffset" => "datetimeoffset",
            "time" => "time",
            "guid" => "guid",
            _ => "binary",
        }
    }

    fn parse_prefixed_literal(prefix: &str, payload: &str) -> Option<EdmValue> {
        match prefix {
            "datetime" => NaiveDateTime::parse_from_str(payload, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(payload, "%Y-%m-%dT%H:%M"))
                .ok()
                .map(EdmValue::DateTime),
            "datetimeoffset" => DateTime::parse_from_rfc3339(payload)
                .ok()
                .map(EdmValue::DateTimeOffset),
            "time" => NaiveTime::parse_from_str(payload, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(payload, "%H:%M"))
                .ok()
                .map(EdmValue::Time),
            "guid" => Uuid::parse_str(payload).ok().map(EdmValue::Guid),
            "binary" | "X" => Self::decode_hex(payload).map(EdmValue::Binary),
            _ => None,
        }
    }

    fn decode_hex(payload: &str) -> Option<Vec<u8>> {
        if payload.len() % 2 != 0 {
            return None;
        }
        let digits: Vec<u32> = payload
            .chars()
            .map(|c| c.to_digit(16))
            .collect::<Option<Vec<_>>>()?;
        Some(
            digits
                .chunks(2)
                .map(|pair| (pair[0] * 16 + pair[1]) as u8)
                .collect(),
        )
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
