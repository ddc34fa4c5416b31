//! TOML documents.
//!
//! A struct at the root becomes the document's top-level table, one `key = value`
//! per line. Structs below the root are inline tables and lists are arrays:
//!
//! ```text
//! name = "Alice"
//! scores = [90, 85]
//! address = { city = "Paris", zip = 75001 }
//! ```
//!
//! Any other root value is written bare. TOML has no null, so every value round-trips
//! except that unsigned integers small enough for `i64` read back as `Int`.
//!
//! The reader also accepts `[section]` headers, which open a nested table that runs
//! to the next header, and `'literal'` strings.

use crate::scan::{format_float, NumberToken, Scanner};
use crate::{Codec, CodecOptions, Error, Kind, Matrix, Result};

use super::json::MATRIX_MARKER;

fn is_bare_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// First character of a table header name.
fn starts_key(c: char) -> bool {
    c == '"' || c == '\'' || c == '_' || c.is_ascii_alphabetic()
}

fn write_basic_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_key(out: &mut String, key: &str) {
    if !key.is_empty() && key.chars().all(is_bare_key_char) {
        out.push_str(key);
    } else {
        write_basic_string(out, key);
    }
}

fn toml_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format_float(v)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Root { first: bool },
    Table { first: bool },
    List { first: bool },
}

#[derive(Debug, PartialEq, Eq)]
enum ReadFrame {
    Root,
    Section,
    Inline { first: bool },
    List,
}

/// TOML codec.
#[derive(Debug)]
pub struct TomlCodec {
    out: String,
    frames: Vec<Frame>,
    after_key: bool,
    input: Scanner,
    stack: Vec<ReadFrame>,
    /// A `[section]` header was returned as a key; its table is the next value.
    section_pending: bool,
}

impl TomlCodec {
    #[must_use]
    pub fn new() -> Self {
        TomlCodec {
            out: String::new(),
            frames: Vec::new(),
            after_key: false,
            input: Scanner::default(),
            stack: Vec::new(),
            section_pending: false,
        }
    }

    fn value_prefix(&mut self) {
        if self.after_key {
            self.after_key = false;
            return;
        }
        if let Some(Frame::List { first }) = self.frames.last_mut() {
            if !*first {
                self.out.push_str(", ");
            }
            *first = false;
        }
    }

    // Reading.

    /// Skips blanks, crossing newlines and comments only inside arrays and inline
    /// tables.
    fn skip_blank(&mut self) {
        match self.stack.last() {
            Some(ReadFrame::List | ReadFrame::Inline { .. }) => {
                self.input.skip_whitespace_and_comments();
            }
            _ => self.input.skip_inline_whitespace(),
        }
    }

    fn key(&mut self) -> Result<String> {
        let key = match self.input.peek_raw() {
            Some('"') => self.input.quoted_string()?,
            Some('\'') => self.literal_string()?,
            _ => {
                let key = self.input.take_while(is_bare_key_char).to_string();
                if key.is_empty() {
                    return Err(self.input.error("expected a key"));
                }
                key
            }
        };
        self.input.skip_inline_whitespace();
        if self.input.peek_raw() == Some('.') {
            return Err(self.input.error("dotted keys are not supported"));
        }
        Ok(key)
    }

    /// Reads `key =`, leaving the cursor at the value.
    fn key_value(&mut self) -> Result<String> {
        let key = self.key()?;
        if !self.input.eat_raw('=') {
            return Err(self.input.error("expected '=' after key"));
        }
        self.input.skip_inline_whitespace();
        Ok(key)
    }

    fn key_value_ahead(&mut self) -> bool {
        let save = self.input.pos();
        let found = self.key_value().is_ok();
        self.input.set_pos(save);
        found
    }

    /// A `[name]` table header at the cursor, consumed when present.
    fn section_header(&mut self) -> Result<Option<String>> {
        let save = self.input.pos();
        if !self.input.eat_raw('[') {
            return Ok(None);
        }
        self.input.skip_inline_whitespace();
        let header_start = self.input.peek_raw().map_or(false, starts_key);
        if !header_start || self.keyword_ahead() {
            self.input.set_pos(save);
            return Ok(None);
        }
        let name = self.key()?;
        if !self.input.eat_raw(']') {
            self.input.set_pos(save);
            return Ok(None);
        }
        Ok(Some(name))
    }

    fn keyword_ahead(&self) -> bool {
        ["true", "false", "inf", "nan"].iter().any(|word| self.word_at(word))
    }

    fn word_at(&self, word: &str) -> bool {
        let rest = self.input.rest();
        rest.starts_with(word) && !rest[word.len()..].starts_with(is_bare_key_char)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.word_at(word) {
            self.input.advance(word.len());
            true
        } else {
            false
        }
    }

    /// Requires the rest of a top-level line to be blank or a comment.
    fn end_of_line(&mut self) -> Result<()> {
        self.input.skip_inline_whitespace();
        match self.input.peek_raw() {
            None | Some('\n' | '\r' | '#') => Ok(()),
            Some(c) => {
                let msg = format!("expected a newline, found '{}'", c);
                Err(self.input.error(&msg))
            }
        }
    }

    fn literal_string(&mut self) -> Result<String> {
        let start = self.input.pos();
        self.input.expect('\'')?;
        let text = self
            .input
            .take_while(|c| c != '\'' && c != '\n')
            .to_string();
        if !self.input.eat_raw('\'') {
            return Err(self.input.error_at(start, "unterminated literal string"));
        }
        Ok(text)
    }

    fn special_float(&mut self) -> Option<f64> {
        let negative = self.input.starts_with("-");
        let signed = negative || self.input.starts_with("+");
        let save = self.input.pos();
        if signed {
            self.input.advance(1);
        }
        let value = if self.eat_word("inf") {
            let inf = f64::INFINITY;
            Some(if negative { -inf } else { inf })
        } else if self.eat_word("nan") {
            Some(f64::NAN)
        } else {
            None
        };
        if value.is_none() {
            self.input.set_pos(save);
        }
        value
    }

    fn number_list(&mut self) -> Result<Vec<f64>> {
        self.input.expect('[')?;
        let count = self.input.count_items(']', true)?;
        let mut items = Vec::with_capacity(count.min(4096));
        for i in 0..count {
            if i > 0 {
                self.input.expect(',')?;
            }
            self.input.skip_whitespace_and_comments();
            match self.special_float() {
                Some(v) => items.push(v),
                None => items.push(self.input.number()?.as_f64()),
            }
        }
        self.input.skip_whitespace_and_comments();
        self.input.eat_raw(',');
        self.input.expect(']')?;
        Ok(items)
    }
}

impl Default for TomlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for TomlCodec {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn is_text(&self) -> bool {
        true
    }

    fn init_write(&mut self) -> Result<()> {
        self.out.clear();
        self.frames.clear();
        self.after_key = false;
        Ok(())
    }

    fn finish_write(&mut self) -> Result<Vec<u8>> {
        if !self.frames.is_empty() {
            return Err(Error::custom("unclosed container at end of document"));
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        Ok(std::mem::take(&mut self.out).into_bytes())
    }

    fn init_read(&mut self, input: &[u8]) -> Result<()> {
        self.input = Scanner::new(input)?;
        self.stack.clear();
        self.section_pending = false;
        Ok(())
    }

    fn finish_read(&mut self) -> Result<()> {
        self.input.skip_whitespace_and_comments();
        if !self.input.eof() {
            return Err(self.input.error("trailing content after document"));
        }
        Ok(())
    }

    fn write_int(&mut self, v: i64) -> Result<()> {
        self.value_prefix();
        self.out.push_str(&v.to_string());
        Ok(())
    }

    fn write_uint(&mut self, v: u64) -> Result<()> {
        self.value_prefix();
        self.out.push_str(&v.to_string());
        Ok(())
    }

    fn write_float(&mut self, v: f64) -> Result<()> {
        self.value_prefix();
        self.out.push_str(&toml_float(v));
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.value_prefix();
        write_basic_string(&mut self.out, v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.value_prefix();
        self.out.push_str(if v { "true" } else { "false" });
        Ok(())
    }

    fn write_array_begin(&mut self, _size: usize) -> Result<()> {
        self.value_prefix();
        self.out.push('[');
        self.frames.push(Frame::List { first: true });
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame::List { .. }) => {
                self.out.push(']');
                Ok(())
            }
            _ => Err(Error::custom("unbalanced container end")),
        }
    }

    fn write_struct_begin(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            self.frames.push(Frame::Root { first: true });
        } else {
            self.value_prefix();
            self.out.push('{');
            self.frames.push(Frame::Table { first: true });
        }
        Ok(())
    }

    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        match self.frames.last_mut() {
            Some(Frame::Root { first }) => {
                if !*first {
                    self.out.push('\n');
                }
                *first = false;
            }
            Some(Frame::Table { first }) => {
                self.out.push_str(if *first { " " } else { ", " });
                *first = false;
            }
            _ => return Err(Error::custom("struct key outside a struct")),
        }
        write_key(&mut self.out, key);
        self.out.push_str(" = ");
        self.after_key = true;
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame::Root { .. }) => {}
            Some(Frame::Table { first: true }) => self.out.push('}'),
            Some(Frame::Table { first: false }) => self.out.push_str(" }"),
            _ => return Err(Error::custom("unbalanced container end")),
        }
        Ok(())
    }

    fn write_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        self.value_prefix();
        let dims: Vec<String> = matrix.dims().iter().map(ToString::to_string).collect();
        let data: Vec<String> = matrix.data().iter().map(|&x| toml_float(x)).collect();
        self.out.push_str(&format!(
            "{{ {} = true, dims = [{}], data = [{}] }}",
            MATRIX_MARKER,
            dims.join(", "),
            data.join(", ")
        ));
        Ok(())
    }

    fn read_peek(&mut self) -> Result<Kind> {
        if self.section_pending {
            return Ok(Kind::Struct);
        }
        if self.stack.is_empty() {
            self.input.skip_whitespace_and_comments();
            if self.input.eof() || self.key_value_ahead() {
                return Ok(Kind::Struct);
            }
            // `["name"]` alone at the end of the input is a one-string array.
            let save = self.input.pos();
            let quoted = self.input.rest().get(1..).map_or(false, |r| {
                r.trim_start_matches([' ', '\t']).starts_with(['"', '\''])
            });
            let header = self.section_header()?;
            self.input.skip_whitespace_and_comments();
            let lone_string_array = quoted && self.input.eof();
            self.input.set_pos(save);
            if header.is_some() && !lone_string_array {
                return Ok(Kind::Struct);
            }
        } else {
            self.skip_blank();
            if self.stack.last() == Some(&ReadFrame::List) && self.input.eat_raw(',') {
                self.skip_blank();
            }
        }
        let Some(ch) = self.input.peek_raw() else {
            return Err(self.input.error("unexpected end of input"));
        };
        match ch {
            '"' | '\'' => Ok(Kind::String),
            '[' => Ok(Kind::List),
            '{' => {
                let save = self.input.pos();
                self.input.advance(1);
                self.input.skip_inline_whitespace();
                let is_matrix = self.input.starts_with(MATRIX_MARKER);
                self.input.set_pos(save);
                Ok(if is_matrix {
                    Kind::Matrix
                } else {
                    Kind::Struct
                })
            }
            't' | 'f' if self.word_at("true") || self.word_at("false") => Ok(Kind::Bool),
            _ => {
                let save = self.input.pos();
                if self.special_float().is_some() {
                    self.input.set_pos(save);
                    return Ok(Kind::Float);
                }
                match self.input.number_kind_ahead() {
                    Some(kind) => Ok(kind),
                    None => {
                        let msg = format!("unexpected character '{}'", ch);
                        Err(self.input.error(&msg))
                    }
                }
            }
        }
    }

    fn read_int(&mut self) -> Result<i64> {
        self.skip_blank();
        let start = self.input.pos();
        match self.input.number()? {
            NumberToken::Int(i) => Ok(i),
            _ => Err(self.input.error_at(start, "expected an integer")),
        }
    }

    fn read_uint(&mut self) -> Result<u64> {
        self.skip_blank();
        let start = self.input.pos();
        match self.input.number()? {
            NumberToken::Uint(u) => Ok(u),
            NumberToken::Int(i) if i >= 0 => Ok(i as u64),
            _ => Err(self.input.error_at(start, "expected an unsigned integer")),
        }
    }

    fn read_float(&mut self) -> Result<f64> {
        self.skip_blank();
        match self.special_float() {
            Some(v) => Ok(v),
            None => Ok(self.input.number()?.as_f64()),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        self.skip_blank();
        if self.input.peek_raw() == Some('\'') {
            self.literal_string()
        } else {
            self.input.quoted_string()
        }
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.skip_blank();
        if self.eat_word("true") {
            Ok(true)
        } else if self.eat_word("false") {
            Ok(false)
        } else {
            Err(self.input.error("expected 'true' or 'false'"))
        }
    }

    fn read_array_begin(&mut self) -> Result<usize> {
        self.skip_blank();
        self.input.expect('[')?;
        let count = self.input.count_items(']', true)?;
        self.stack.push(ReadFrame::List);
        Ok(count)
    }

    fn read_array_end(&mut self) -> Result<()> {
        self.skip_blank();
        self.input.eat_raw(',');
        self.skip_blank();
        self.stack.pop();
        self.input.expect(']')
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        if std::mem::take(&mut self.section_pending) {
            self.stack.push(ReadFrame::Section);
            return Ok(());
        }
        self.skip_blank();
        if self.input.eat_raw('{') {
            self.stack.push(ReadFrame::Inline { first: true });
        } else if self.stack.is_empty() {
            self.stack.push(ReadFrame::Root);
        } else {
            return Err(self.input.error("expected '{'"));
        }
        Ok(())
    }

    fn read_struct_key(&mut self) -> Result<Option<String>> {
        match self.stack.last_mut() {
            Some(ReadFrame::Inline { first }) => {
                let was_first = std::mem::replace(first, false);
                self.input.skip_whitespace_and_comments();
                if self.input.peek_raw() == Some('}') {
                    return Ok(None);
                }
                if !was_first {
                    self.input.expect(',')?;
                    self.input.skip_whitespace_and_comments();
                }
                self.key_value().map(Some)
            }
            Some(ReadFrame::Root | ReadFrame::Section) => {
                let root = self.stack.last() == Some(&ReadFrame::Root);
                if !self.input.at_line_start() {
                    self.end_of_line()?;
                }
                self.input.skip_whitespace_and_comments();
                if self.input.eof() {
                    return Ok(None);
                }
                if self.input.peek_raw() == Some('[') {
                    if !root {
                        return Ok(None);
                    }
                    return match self.section_header()? {
                        Some(name) => {
                            self.end_of_line()?;
                            self.section_pending = true;
                            Ok(Some(name))
                        }
                        None => Err(self.input.error("expected a table header")),
                    };
                }
                self.key_value().map(Some)
            }
            _ => Err(Error::custom("struct key outside a struct")),
        }
    }

    fn read_struct_end(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(ReadFrame::Inline { .. }) => self.input.expect('}'),
            Some(ReadFrame::Root | ReadFrame::Section) => Ok(()),
            _ => Err(Error::custom("unbalanced container end")),
        }
    }

    fn read_matrix(&mut self) -> Result<Matrix> {
        self.skip_blank();
        self.input.expect('{')?;
        let mut dims = None;
        let mut data = None;
        let mut first = true;
        loop {
            self.input.skip_whitespace();
            if self.input.eat_raw('}') {
                break;
            }
            if !first {
                self.input.expect(',')?;
                self.input.skip_whitespace();
            }
            first = false;
            let key = self.key_value()?;
            match key.as_str() {
                MATRIX_MARKER => {
                    if !self.eat_word("true") && !self.eat_word("false") {
                        return Err(self.input.error("expected a bool"));
                    }
                }
                "dims" => {
                    let start = self.input.pos();
                    let values = self.number_list()?;
                    let parsed: Option<Vec<usize>> = values
                        .iter()
                        .map(|&d| (d >= 0.0 && d.fract() == 0.0).then_some(d as usize))
                        .collect();
                    let Some(parsed) = parsed else {
                        let msg = "matrix dims must be non-negative integers";
                        return Err(self.input.error_at(start, msg));
                    };
                    dims = Some(parsed);
                }
                "data" => data = Some(self.number_list()?),
                _ => {
                    let msg = format!("unexpected matrix field '{}'", key);
                    return Err(self.input.error(&msg));
                }
            }
        }
        match (dims, data) {
            (Some(dims), Some(data)) => Matrix::from_data(dims, data),
            _ => Err(Error::invalid_matrix("matrix needs both dims and data")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deserialize_with, serialize_with, StructMap, Value};

    fn to_toml(value: &Value) -> String {
        let bytes = serialize_with(value, &mut TomlCodec::new(), &CodecOptions::new()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn from_toml(text: &str) -> Result<Value> {
        deserialize_with(text.as_bytes(), &mut TomlCodec::new(), &CodecOptions::new())
    }

    fn sample() -> Value {
        let mut address = StructMap::new();
        address.set("city", Value::from("Paris"));
        address.set("zip", Value::from(75001));
        let mut map = StructMap::new();
        map.set("name", Value::from("Alice"));
        map.set(
            "scores",
            Value::List(vec![Value::from(90), Value::from(85)]),
        );
        map.set("address", Value::Struct(address));
        map.set("weird key", Value::Float(0.5));
        map.set("empty", Value::Struct(StructMap::new()));
        Value::Struct(map)
    }

    #[test]
    fn test_document_layout() {
        assert_eq!(
            to_toml(&sample()),
            "name = \"Alice\"\nscores = [90, 85]\naddress = { city = \"Paris\", zip = 75001 }\n\
             \"weird key\" = 0.5\nempty = {}\n"
        );
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(from_toml(&to_toml(&sample())).unwrap(), sample());
    }

    #[test]
    fn test_bare_root_values() {
        let list = Value::List(vec![Value::from(true), Value::from("x")]);
        assert_eq!(to_toml(&list), "[true, \"x\"]\n");
        assert_eq!(from_toml("[true, \"x\"]\n").unwrap(), list);
        let single = Value::List(vec![Value::from("x")]);
        assert_eq!(from_toml(&to_toml(&single)).unwrap(), single);
        assert_eq!(from_toml("42").unwrap(), Value::Int(42));
        assert_eq!(from_toml("-inf").unwrap(), Value::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn test_empty_document_is_empty_table() {
        assert_eq!(from_toml("").unwrap(), Value::Struct(StructMap::new()));
        assert_eq!(
            from_toml("# only a comment\n").unwrap(),
            Value::Struct(StructMap::new())
        );
        assert_eq!(to_toml(&Value::Struct(StructMap::new())), "");
    }

    #[test]
    fn test_sections_and_comments() {
        let text = "# config\ntitle = 'raw \\n'  # trailing\n\n\
                    [owner]\nname = \"Tom\"\nage = 36\n\n\
                    [db]\nports = [\n  8000,\n  8001,\n]\n";
        let value = from_toml(text).unwrap();
        assert_eq!(value.struct_get("title"), Some(&Value::from("raw \\n")));
        let owner = value.struct_get("owner").unwrap();
        assert_eq!(owner.struct_get("name"), Some(&Value::from("Tom")));
        assert_eq!(owner.struct_get("age"), Some(&Value::Int(36)));
        let ports = value.struct_get("db").and_then(|db| db.struct_get("ports"));
        assert_eq!(
            ports,
            Some(&Value::List(vec![Value::from(8000), Value::from(8001)]))
        );
    }

    #[test]
    fn test_matrix() {
        let m = Matrix::from_data(vec![3], vec![1.0, f64::INFINITY, -2.5]).unwrap();
        let mut map = StructMap::new();
        map.set("m", Value::Matrix(m));
        let value = Value::Struct(map);
        let text = to_toml(&value);
        assert_eq!(
            text,
            "m = { __matrix = true, dims = [3], data = [1.0, inf, -2.5] }\n"
        );
        assert_eq!(from_toml(&text).unwrap(), value);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "a = ",
            "a = 1 b = 2",
            "a = [1, 2",
            "a = { b = 1",
            "a.b = 1",
            "= 1",
        ] {
            assert!(from_toml(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
