//! Text parsing primitives shared by the JSON, YAML, XML, TOML and Txt readers.
//!
//! A [`Scanner`] owns the decoded input and a byte cursor. Lookahead is done by
//! saving and restoring the cursor with [`Scanner::pos`] / [`Scanner::set_pos`];
//! line and column numbers are computed only when an error is reported.

use crate::{Error, Kind, Result};

/// A number token as it appeared in the input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberToken {
    Int(i64),
    /// Unsigned literal too large for `i64`.
    Uint(u64),
    Float(f64),
}

impl NumberToken {
    #[must_use]
    pub const fn kind(self) -> Kind {
        match self {
            NumberToken::Int(_) => Kind::Int,
            NumberToken::Uint(_) => Kind::Uint,
            NumberToken::Float(_) => Kind::Float,
        }
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            NumberToken::Int(i) => i as f64,
            NumberToken::Uint(u) => u as f64,
            NumberToken::Float(f) => f,
        }
    }
}

/// `[A-Za-z0-9_]`
#[inline]
#[must_use]
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `[A-Za-z_]`
#[inline]
#[must_use]
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Shortest representation that parses back to the same `f64`, always with a `.`
/// or an exponent so that it reads back as a float. Only for finite values.
#[must_use]
pub fn format_float(v: f64) -> String {
    let s = format!("{:?}", v);
    if s.contains(['.', 'e', 'E']) {
        s
    } else {
        s + ".0"
    }
}

/// Cursor over UTF-8 text input.
#[derive(Debug, Default)]
pub struct Scanner {
    input: String,
    pos: usize,
}

impl Scanner {
    /// Validates `input` as UTF-8 and positions the cursor at its start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] at the first invalid byte.
    pub fn new(input: &[u8]) -> Result<Self> {
        let input = std::str::from_utf8(input)
            .map_err(|e| Error::invalid_data(e.valid_up_to(), "input is not valid UTF-8"))?;
        Ok(Scanner {
            input: input.to_string(),
            pos: 0,
        })
    }

    #[inline]
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor back to a position previously returned by [`Scanner::pos`].
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    #[must_use]
    pub fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Unconsumed input.
    #[inline]
    #[must_use]
    pub fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    #[inline]
    #[must_use]
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// `true` at the start of the input or right after a newline.
    #[must_use]
    pub fn at_line_start(&self) -> bool {
        self.pos == 0 || self.input.as_bytes().get(self.pos - 1) == Some(&b'\n')
    }

    /// Remainder of the current line, without the line break.
    #[must_use]
    pub fn rest_of_line(&self) -> &str {
        let rest = self.rest();
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].trim_end_matches('\r')
    }

    /// Next character, without skipping whitespace.
    #[inline]
    #[must_use]
    pub fn peek_raw(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character `n` positions ahead of the cursor.
    #[must_use]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Consumes and returns the next character.
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek_raw()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Advances over `n` bytes of already-inspected ASCII input.
    pub fn advance(&mut self, n: usize) {
        self.set_pos(self.pos + n);
    }

    /// Skips spaces, tabs, carriage returns and newlines.
    pub fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start_matches([' ', '\t', '\r', '\n']);
        self.pos = self.input.len() - trimmed.len();
    }

    /// Skips spaces and tabs only.
    pub fn skip_inline_whitespace(&mut self) {
        let trimmed = self.rest().trim_start_matches([' ', '\t']);
        self.pos = self.input.len() - trimmed.len();
    }

    /// Skips whitespace and `#` comments running to the end of their line.
    pub fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.skip_whitespace();
            if self.peek_raw() == Some('#') {
                self.skip_line();
            } else {
                break;
            }
        }
    }

    /// Moves past the next newline, or to the end of input.
    pub fn skip_line(&mut self) {
        match self.rest().find('\n') {
            Some(i) => self.pos += i + 1,
            None => self.pos = self.input.len(),
        }
    }

    /// Next non-whitespace character, without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.peek_raw()
    }

    /// Consumes `expected` if it is the next character.
    pub fn eat_raw(&mut self, expected: char) -> bool {
        if self.peek_raw() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skips whitespace, then consumes `expected` if it is the next character.
    pub fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        self.eat_raw(expected)
    }

    /// Skips whitespace, then consumes `expected` if the input continues with it.
    pub fn eat_str(&mut self, expected: &str) -> bool {
        self.skip_whitespace();
        if self.starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    /// Like [`Scanner::eat`], but a missing character is a syntax error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] at the current position.
    pub fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    /// Consumes an identifier made of `[A-Za-z0-9_]` with a non-digit first character.
    pub fn identifier(&mut self) -> Option<String> {
        if !self.peek_raw().map_or(false, is_identifier_start) {
            return None;
        }
        let len = self
            .rest()
            .find(|c: char| !is_identifier_char(c))
            .unwrap_or(self.rest().len());
        let ident = self.rest()[..len].to_string();
        self.pos += len;
        Some(ident)
    }

    /// Consumes a run of characters matching `pred`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &self.input[start..self.pos]
    }

    /// Parses an optionally signed decimal number.
    ///
    /// A literal with a fraction or exponent is a float. Integer literals are `i64`
    /// when they fit and `u64` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if no digits follow, or if an integer literal fits
    /// neither type.
    pub fn number(&mut self) -> Result<NumberToken> {
        let start = self.pos;
        let negative = self.peek_raw() == Some('-');
        if negative || self.peek_raw() == Some('+') {
            self.pos += 1;
        }
        let digits_start = self.pos;
        self.take_while(|c| c.is_ascii_digit());
        if self.pos == digits_start {
            self.pos = start;
            return Err(self.error("expected a number"));
        }

        let mut is_float = false;
        if self.peek_raw() == Some('.') && self.peek_nth(1).map_or(false, |c| c.is_ascii_digit())
        {
            is_float = true;
            self.pos += 1;
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_raw(), Some('e' | 'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.peek_raw(), Some('+' | '-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            self.take_while(|c| c.is_ascii_digit());
            if self.pos == exp_start {
                self.pos = save;
            } else {
                is_float = true;
            }
        }

        let text = self.input[start..self.pos].trim_start_matches('+');
        if is_float {
            return text
                .parse::<f64>()
                .map(NumberToken::Float)
                .map_err(|_| self.error_at(start, "invalid float"));
        }
        if let Ok(i) = text.parse::<i64>() {
            return Ok(NumberToken::Int(i));
        }
        if !negative {
            if let Ok(u) = text.parse::<u64>() {
                return Ok(NumberToken::Uint(u));
            }
        }
        Err(self.error_at(start, "integer out of range"))
    }

    /// Classifies the number at the cursor without consuming it.
    pub fn number_kind_ahead(&mut self) -> Option<Kind> {
        let save = self.pos;
        let kind = self.number().ok().map(NumberToken::kind);
        self.pos = save;
        kind
    }

    /// Parses a double-quoted string starting at the cursor.
    ///
    /// Handles `\" \\ \/ \b \f \n \r \t \0`, `\uXXXX` (with surrogate pairs) and
    /// `\UXXXXXXXX`. Unknown escapes are kept literally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for a missing opening quote, a bad `\u` escape, or an
    /// unterminated string.
    pub fn quoted_string(&mut self) -> Result<String> {
        if !self.eat_raw('"') {
            return Err(self.error("expected '\"'"));
        }
        let mut result = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(self.error("unterminated string"));
            };
            match ch {
                '"' => return Ok(result),
                '\\' => match self.bump() {
                    Some('"') => result.push('"'),
                    Some('\\') => result.push('\\'),
                    Some('/') => result.push('/'),
                    Some('b') => result.push('\u{0008}'),
                    Some('f') => result.push('\u{000C}'),
                    Some('n') => result.push('\n'),
                    Some('r') => result.push('\r'),
                    Some('t') => result.push('\t'),
                    Some('0') => result.push('\0'),
                    Some('u') => result.push(self.unicode_escape()?),
                    Some('U') => {
                        let code = self.hex_digits(8)?;
                        let ch = char::from_u32(code)
                            .ok_or_else(|| self.error("invalid unicode code point"))?;
                        result.push(ch);
                    }
                    Some(other) => {
                        result.push('\\');
                        result.push(other);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                other => result.push(other),
            }
        }
    }

    /// Parses a single-quoted string; `''` stands for one quote, nothing else escapes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for a missing opening quote or an unterminated string.
    pub fn single_quoted_string(&mut self) -> Result<String> {
        if !self.eat_raw('\'') {
            return Err(self.error("expected '''"));
        }
        let mut result = String::new();
        loop {
            match self.bump() {
                Some('\'') => {
                    if self.eat_raw('\'') {
                        result.push('\'');
                    } else {
                        return Ok(result);
                    }
                }
                Some(ch) => result.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32> {
        let start = self.pos;
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error_at(start, "invalid unicode escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// Decodes the hex digits after `\u`, joining a surrogate pair when present.
    fn unicode_escape(&mut self) -> Result<char> {
        let start = self.pos;
        let high = self.hex_digits(4)?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if !self.starts_with("\\u") {
                return Err(self.error_at(start, "unpaired surrogate in unicode escape"));
            }
            self.pos += 2;
            let low = self.hex_digits(4)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error_at(start, "unpaired surrogate in unicode escape"));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| self.error_at(start, "invalid unicode code point"))
    }

    /// Counts the items of a bracketed sequence whose opening bracket was just consumed.
    ///
    /// Items are separated by top-level commas, and a trailing comma does not start
    /// an item; nested brackets and quoted strings are skipped. The cursor does not
    /// move. With `single_quotes`, `'...'` also
    /// delimits a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if the sequence is not closed.
    pub fn count_items(&self, close: char, single_quotes: bool) -> Result<usize> {
        let mut depth = 0usize;
        let mut commas = 0usize;
        let mut has_content = false;
        let mut chars = self.rest().chars();

        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    has_content = true;
                    while let Some(s) = chars.next() {
                        match s {
                            '\\' => {
                                chars.next();
                            }
                            '"' => break,
                            _ => {}
                        }
                    }
                }
                '\'' if single_quotes => {
                    has_content = true;
                    for s in chars.by_ref() {
                        if s == '\'' {
                            break;
                        }
                    }
                }
                '[' | '{' => {
                    has_content = true;
                    depth += 1;
                }
                ']' | '}' if depth > 0 => depth -= 1,
                c if c == close && depth == 0 => {
                    return Ok(commas + usize::from(has_content));
                }
                ',' if depth == 0 => {
                    commas += 1;
                    has_content = false;
                }
                c if c.is_whitespace() => {}
                _ => has_content = true,
            }
        }
        Err(self.error("unterminated sequence"))
    }

    /// 1-based line and column of byte offset `pos`.
    #[must_use]
    pub fn line_col_at(&self, pos: usize) -> (usize, usize) {
        let before = &self.input[..pos.min(self.input.len())];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, before[line_start..].chars().count() + 1)
    }

    /// 1-based line and column of the cursor.
    #[must_use]
    pub fn line_col(&self) -> (usize, usize) {
        self.line_col_at(self.pos)
    }

    /// 0-based column of the cursor within its line, in characters.
    #[must_use]
    pub fn column(&self) -> usize {
        self.line_col().1 - 1
    }

    /// A syntax error at the cursor.
    #[must_use]
    pub fn error(&self, msg: &str) -> Error {
        self.error_at(self.pos, msg)
    }

    /// A syntax error at byte offset `pos`.
    #[must_use]
    pub fn error_at(&self, pos: usize, msg: &str) -> Error {
        let (line, col) = self.line_col_at(pos);
        Error::syntax(line, col, msg)
    }
}
