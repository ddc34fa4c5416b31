//! Human-readable JSON.
//!
//! Output is indented (2 spaces by default) with one element or entry per line,
//! and ends with a newline:
//!
//! ```text
//! {
//!   "name": "Alice",
//!   "scores": [
//!     90,
//!     85
//!   ]
//! }
//! ```
//!
//! Floats always carry a fraction or exponent so they read back as floats. JSON has
//! no NaN or infinity, so those are written as `null` and read back as `0`.
//! Matrices are written as `{"__matrix": true, "dims": [...], "data": [...]}` and
//! recognised by that leading marker key.

use crate::scan::{format_float, NumberToken, Scanner};
use crate::{Codec, CodecOptions, Error, Kind, Matrix, Result};
use tracing::warn;

/// Marker key that distinguishes an encoded matrix from an ordinary struct.
pub const MATRIX_MARKER: &str = "__matrix";

#[derive(Debug)]
struct Frame {
    list: bool,
    first: bool,
}

/// JSON text codec.
#[derive(Debug)]
pub struct JsonCodec {
    indent: usize,
    out: String,
    frames: Vec<Frame>,
    after_key: bool,
    input: Scanner,
}

pub(crate) fn write_escaped(out: &mut String, s: &str) {
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
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn json_float(v: f64) -> String {
    if v.is_finite() {
        format_float(v)
    } else {
        warn!(value = %v, "JSON cannot represent non-finite floats, writing null");
        "null".to_string()
    }
}

impl JsonCodec {
    #[must_use]
    pub fn new(options: &CodecOptions) -> Self {
        JsonCodec {
            indent: options.indent,
            out: String::new(),
            frames: Vec::new(),
            after_key: false,
            input: Scanner::default(),
        }
    }

    fn newline_indent(&mut self) {
        self.out.push('\n');
        let width = self.frames.len() * self.indent;
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    /// Comma, newline and indentation before the next element of the open container.
    fn separate(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if !frame.first {
            self.out.push(',');
        }
        frame.first = false;
        self.newline_indent();
    }

    fn value_prefix(&mut self) {
        if self.after_key {
            self.after_key = false;
        } else {
            self.separate();
        }
    }

    fn open(&mut self, bracket: char, list: bool) {
        self.value_prefix();
        self.out.push(bracket);
        self.frames.push(Frame { list, first: true });
    }

    fn close(&mut self, bracket: char, list: bool) -> Result<()> {
        match self.frames.pop() {
            Some(frame) if frame.list == list => {
                if !frame.first {
                    self.newline_indent();
                }
                self.out.push(bracket);
                Ok(())
            }
            _ => Err(Error::custom("unbalanced container end")),
        }
    }

    fn keyword(&mut self, word: &str) -> bool {
        self.input.skip_whitespace();
        let rest = self.input.rest();
        if !rest.starts_with(word) {
            return false;
        }
        let boundary = rest[word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        if boundary {
            self.input.advance(word.len());
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Result<NumberToken> {
        self.input.skip_whitespace();
        self.input.number()
    }

    /// Reads a bracketed list of numbers, with `null` as `0.0`.
    fn number_list(&mut self) -> Result<Vec<f64>> {
        self.input.expect('[')?;
        let count = self.input.count_items(']', false)?;
        let mut items = Vec::with_capacity(count.min(4096));
        for i in 0..count {
            if i > 0 {
                self.input.expect(',')?;
            }
            if self.keyword("null") {
                items.push(0.0);
            } else {
                items.push(self.number()?.as_f64());
            }
        }
        self.input.expect(']')?;
        Ok(items)
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new(&CodecOptions::default())
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
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
        self.out.push('\n');
        Ok(std::mem::take(&mut self.out).into_bytes())
    }

    fn init_read(&mut self, input: &[u8]) -> Result<()> {
        self.input = Scanner::new(input)?;
        Ok(())
    }

    fn finish_read(&mut self) -> Result<()> {
        self.input.skip_whitespace();
        if !self.input.eof() {
            return Err(self.input.error("trailing characters after document"));
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
        let text = json_float(v);
        self.out.push_str(&text);
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.value_prefix();
        write_escaped(&mut self.out, v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.value_prefix();
        self.out.push_str(if v { "true" } else { "false" });
        Ok(())
    }

    fn write_array_begin(&mut self, _size: usize) -> Result<()> {
        self.open('[', true);
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<()> {
        self.close(']', true)
    }

    fn write_struct_begin(&mut self) -> Result<()> {
        self.open('{', false);
        Ok(())
    }

    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        self.separate();
        write_escaped(&mut self.out, key);
        self.out.push_str(": ");
        self.after_key = true;
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        self.close('}', false)
    }

    fn write_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        self.value_prefix();
        let dims: Vec<String> = matrix.dims().iter().map(ToString::to_string).collect();
        let data: Vec<String> = matrix.data().iter().map(|&x| json_float(x)).collect();
        self.out.push_str(&format!(
            "{{\"{}\": true, \"dims\": [{}], \"data\": [{}]}}",
            MATRIX_MARKER,
            dims.join(", "),
            data.join(", ")
        ));
        Ok(())
    }

    fn read_peek(&mut self) -> Result<Kind> {
        self.input.skip_whitespace();
        if self.input.eat_raw(',') {
            self.input.skip_whitespace();
        }
        let Some(ch) = self.input.peek_raw() else {
            return Err(self.input.error("unexpected end of input"));
        };
        match ch {
            '"' => Ok(Kind::String),
            '[' => Ok(Kind::List),
            '{' => {
                let save = self.input.pos();
                self.input.advance(1);
                self.input.skip_whitespace();
                let is_matrix = self.input.starts_with(&format!("\"{}\"", MATRIX_MARKER));
                self.input.set_pos(save);
                Ok(if is_matrix {
                    Kind::Matrix
                } else {
                    Kind::Struct
                })
            }
            '-' | '0'..='9' => self
                .input
                .number_kind_ahead()
                .ok_or_else(|| self.input.error("invalid number")),
            't' | 'f' if self.input.starts_with("true") || self.input.starts_with("false") => {
                Ok(Kind::Bool)
            }
            'n' if self.input.starts_with("null") => Ok(Kind::Int),
            _ => Err(self.input.error(&format!("unexpected character '{}'", ch))),
        }
    }

    fn read_int(&mut self) -> Result<i64> {
        if self.keyword("null") {
            return Ok(0);
        }
        let start = self.input.pos();
        match self.number()? {
            NumberToken::Int(i) => Ok(i),
            _ => Err(self.input.error_at(start, "expected an integer")),
        }
    }

    fn read_uint(&mut self) -> Result<u64> {
        if self.keyword("null") {
            return Ok(0);
        }
        let start = self.input.pos();
        match self.number()? {
            NumberToken::Uint(u) => Ok(u),
            NumberToken::Int(i) if i >= 0 => Ok(i as u64),
            _ => Err(self.input.error_at(start, "expected an unsigned integer")),
        }
    }

    fn read_float(&mut self) -> Result<f64> {
        if self.keyword("null") {
            return Ok(0.0);
        }
        Ok(self.number()?.as_f64())
    }

    fn read_string(&mut self) -> Result<String> {
        self.input.skip_whitespace();
        self.input.quoted_string()
    }

    fn read_bool(&mut self) -> Result<bool> {
        if self.keyword("true") {
            Ok(true)
        } else if self.keyword("false") {
            Ok(false)
        } else {
            Err(self.input.error("expected 'true' or 'false'"))
        }
    }

    fn read_array_begin(&mut self) -> Result<usize> {
        self.input.expect('[')?;
        self.input.count_items(']', false)
    }

    fn read_array_end(&mut self) -> Result<()> {
        self.input.expect(']')
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        self.input.expect('{')
    }

    fn read_struct_key(&mut self) -> Result<Option<String>> {
        self.input.skip_whitespace();
        if self.input.eat_raw(',') {
            self.input.skip_whitespace();
        }
        match self.input.peek_raw() {
            Some('}') => Ok(None),
            Some('"') => {
                let key = self.input.quoted_string()?;
                self.input.expect(':')?;
                Ok(Some(key))
            }
            Some(_) => Err(self.input.error("expected a quoted key")),
            None => Err(self.input.error("unexpected end of input in object")),
        }
    }

    fn read_struct_end(&mut self) -> Result<()> {
        self.input.expect('}')
    }

    fn read_matrix(&mut self) -> Result<Matrix> {
        self.input.expect('{')?;
        let mut dims = None;
        let mut data = None;
        while let Some(key) = self.read_struct_key()? {
            match key.as_str() {
                MATRIX_MARKER => {
                    self.read_bool()?;
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
        self.input.expect('}')?;
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

    fn to_json(value: &Value) -> String {
        let bytes = serialize_with(value, &mut JsonCodec::default(), &CodecOptions::new()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn from_json(text: &str) -> Result<Value> {
        deserialize_with(
            text.as_bytes(),
            &mut JsonCodec::default(),
            &CodecOptions::new(),
        )
    }

    fn person() -> Value {
        let mut map = StructMap::new();
        map.set("name", Value::from("Alice"));
        map.set("age", Value::from(30));
        map.set(
            "scores",
            Value::List(vec![Value::from(95), Value::from(87), Value::from(92)]),
        );
        Value::Struct(map)
    }

    #[test]
    fn test_pretty_layout() {
        assert_eq!(
            to_json(&person()),
            "{\n  \"name\": \"Alice\",\n  \"age\": 30,\n  \"scores\": [\n    \
             95,\n    87,\n    92\n  ]\n}\n"
        );
    }

    #[test]
    fn test_empty_containers() {
        let mut map = StructMap::new();
        map.set("a", Value::List(vec![]));
        map.set("b", Value::Struct(StructMap::new()));
        assert_eq!(
            to_json(&Value::Struct(map)),
            "{\n  \"a\": [],\n  \"b\": {}\n}\n"
        );
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(from_json(&to_json(&person())).unwrap(), person());
    }

    #[test]
    fn test_escapes() {
        let value = Value::from("Hello \"World\"\n\u{1}");
        let text = to_json(&value);
        assert_eq!(text, "\"Hello \\\"World\\\"\\n\\u0001\"\n");
        assert_eq!(from_json(&text).unwrap(), value);
    }

    #[test]
    fn test_floats() {
        assert_eq!(to_json(&Value::Float(1.0)), "1.0\n");
        assert_eq!(from_json("1.0").unwrap(), Value::Float(1.0));
        assert_eq!(from_json("2e3").unwrap(), Value::Float(2000.0));
        assert_eq!(to_json(&Value::Float(f64::NAN)), "null\n");
        assert_eq!(from_json("null").unwrap(), Value::Int(0));
    }

    #[test]
    fn test_large_unsigned() {
        assert_eq!(
            from_json("18446744073709551615").unwrap(),
            Value::Uint(u64::MAX)
        );
        assert_eq!(from_json("42").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_compact_input() {
        let value = from_json(r#"{"a":[1,2.5,"x",true,{"b":null}],"c":false}"#).unwrap();
        let list = value.struct_get("a").unwrap();
        assert_eq!(list.list_size(), 5);
        assert_eq!(list.list_get(1), Some(&Value::Float(2.5)));
        assert_eq!(
            list.list_get(4).and_then(|v| v.struct_get("b")),
            Some(&Value::Int(0))
        );
    }

    #[test]
    fn test_matrix() {
        let m = Matrix::from_data(vec![2, 2], vec![1.0, 2.5, -3.0, 4.0]).unwrap();
        let text = to_json(&Value::Matrix(m.clone()));
        assert_eq!(
            text,
            "{\"__matrix\": true, \"dims\": [2, 2], \"data\": [1.0, 2.5, -3.0, 4.0]}\n"
        );
        assert_eq!(from_json(&text).unwrap(), Value::Matrix(m));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "{\"a\": [1, 2",
            "{\"a\" 1}",
            "[1, 2] x",
            "tru",
            "",
            "{1: 2}",
            "\"open",
        ] {
            assert!(
                matches!(from_json(bad), Err(Error::Syntax { .. })),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_custom_indent() {
        let mut codec = JsonCodec::new(&CodecOptions::new().with_indent(4));
        let value = Value::List(vec![Value::from(1)]);
        let bytes = serialize_with(&value, &mut codec, &CodecOptions::new()).unwrap();
        assert_eq!(bytes, b"[\n    1\n]\n");
    }
}
