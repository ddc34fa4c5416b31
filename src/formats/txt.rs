//! A minimal, brace-delimited text format.
//!
//! ```text
//! {
//! 	name: "Alice"
//! 	scores: [90, 85]
//! 	address: {
//! 		city: "Paris"
//! 	}
//! }
//! ```
//!
//! Struct entries sit one per line, indented with tabs. Lists are written on one
//! line. Strings are always quoted; keys only when they are not identifiers. The
//! reader ignores layout and accepts commas between struct entries. Matrices are not
//! supported.

use crate::scan::{format_float, is_identifier_char, is_identifier_start, NumberToken, Scanner};
use crate::{Codec, Error, Kind, Result};

use super::json::write_escaped;

fn txt_float(v: f64) -> String {
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

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().map_or(false, is_identifier_start) && chars.all(is_identifier_char)
}

#[derive(Debug)]
struct Frame {
    list: bool,
    first: bool,
}

/// Txt codec.
#[derive(Debug, Default)]
pub struct TxtCodec {
    out: String,
    frames: Vec<Frame>,
    after_key: bool,
    input: Scanner,
}

impl TxtCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn depth(&self) -> usize {
        self.frames.iter().filter(|f| !f.list).count()
    }

    fn newline_indent(&mut self, depth: usize) {
        self.out.push('\n');
        self.out.extend(std::iter::repeat('\t').take(depth));
    }

    fn value_prefix(&mut self) {
        if self.after_key {
            self.after_key = false;
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            if frame.list {
                if !frame.first {
                    self.out.push_str(", ");
                }
                frame.first = false;
            }
        }
    }

    fn word(&mut self, word: &str) -> bool {
        self.input.skip_whitespace();
        let rest = self.input.rest();
        if rest.starts_with(word) && !rest[word.len()..].starts_with(is_identifier_char) {
            self.input.advance(word.len());
            true
        } else {
            false
        }
    }

    fn special_float(&mut self) -> Option<f64> {
        if self.word("nan") {
            Some(f64::NAN)
        } else if self.word("inf") {
            Some(f64::INFINITY)
        } else if self.word("-inf") {
            Some(f64::NEG_INFINITY)
        } else {
            None
        }
    }

    fn number(&mut self) -> Result<NumberToken> {
        self.input.skip_whitespace();
        self.input.number()
    }
}

impl Codec for TxtCodec {
    fn name(&self) -> &'static str {
        "txt"
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
        self.out.push_str(&txt_float(v));
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
        self.value_prefix();
        self.out.push('[');
        self.frames.push(Frame {
            list: true,
            first: true,
        });
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame { list: true, .. }) => {
                self.out.push(']');
                Ok(())
            }
            _ => Err(Error::custom("unbalanced container end")),
        }
    }

    fn write_struct_begin(&mut self) -> Result<()> {
        self.value_prefix();
        self.out.push('{');
        self.frames.push(Frame {
            list: false,
            first: true,
        });
        Ok(())
    }

    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        match self.frames.last_mut() {
            Some(frame) if !frame.list => frame.first = false,
            _ => return Err(Error::custom("struct key outside a struct")),
        }
        let depth = self.depth();
        self.newline_indent(depth);
        if is_identifier(key) {
            self.out.push_str(key);
        } else {
            write_escaped(&mut self.out, key);
        }
        self.out.push_str(": ");
        self.after_key = true;
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame { list: false, first }) => {
                if !first {
                    let depth = self.depth();
                    self.newline_indent(depth);
                }
                self.out.push('}');
                Ok(())
            }
            _ => Err(Error::custom("unbalanced container end")),
        }
    }

    fn read_peek(&mut self) -> Result<Kind> {
        self.input.skip_whitespace();
        if self.input.eat_raw(',') {
            self.input.skip_whitespace();
        }
        let Some(ch) = self.input.peek_raw() else {
            return Err(self.input.error("unexpected end of input"));
        };
        let save = self.input.pos();
        let kind = match ch {
            '"' => Kind::String,
            '[' => Kind::List,
            '{' => Kind::Struct,
            _ if self.word("true") || self.word("false") => Kind::Bool,
            _ if self.special_float().is_some() => Kind::Float,
            _ => match self.input.number_kind_ahead() {
                Some(kind) => kind,
                None => {
                    let msg = format!("unexpected character '{}'", ch);
                    return Err(self.input.error(&msg));
                }
            },
        };
        self.input.set_pos(save);
        Ok(kind)
    }

    fn read_int(&mut self) -> Result<i64> {
        let start = self.input.pos();
        match self.number()? {
            NumberToken::Int(i) => Ok(i),
            _ => Err(self.input.error_at(start, "expected an integer")),
        }
    }

    fn read_uint(&mut self) -> Result<u64> {
        let start = self.input.pos();
        match self.number()? {
            NumberToken::Uint(u) => Ok(u),
            NumberToken::Int(i) if i >= 0 => Ok(i as u64),
            _ => Err(self.input.error_at(start, "expected an unsigned integer")),
        }
    }

    fn read_float(&mut self) -> Result<f64> {
        match self.special_float() {
            Some(v) => Ok(v),
            None => Ok(self.number()?.as_f64()),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        self.input.skip_whitespace();
        self.input.quoted_string()
    }

    fn read_bool(&mut self) -> Result<bool> {
        if self.word("true") {
            Ok(true)
        } else if self.word("false") {
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
        let key = match self.input.peek_raw() {
            Some('}') => return Ok(None),
            Some('"') => self.input.quoted_string()?,
            Some(_) => self
                .input
                .identifier()
                .ok_or_else(|| self.input.error("expected a key"))?,
            None => return Err(self.input.error("unexpected end of input in struct")),
        };
        self.input.expect(':')?;
        Ok(Some(key))
    }

    fn read_struct_end(&mut self) -> Result<()> {
        self.input.expect('}')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deserialize_with, serialize_with, CodecOptions, Matrix, StructMap, Value};

    fn to_txt(value: &Value) -> Result<String> {
        let bytes = serialize_with(value, &mut TxtCodec::new(), &CodecOptions::new())?;
        Ok(String::from_utf8(bytes).unwrap())
    }

    fn from_txt(text: &str) -> Result<Value> {
        deserialize_with(text.as_bytes(), &mut TxtCodec::new(), &CodecOptions::new())
    }

    fn sample() -> Value {
        let mut address = StructMap::new();
        address.set("city", Value::from("Paris"));
        let mut tagged = StructMap::new();
        tagged.set("id", Value::from(7));
        let mut map = StructMap::new();
        map.set("name", Value::from("Alice"));
        map.set(
            "scores",
            Value::List(vec![Value::from(90), Value::from(85)]),
        );
        map.set("address", Value::Struct(address));
        map.set("odd key", Value::Float(-0.25));
        map.set("items", Value::List(vec![Value::Struct(tagged)]));
        Value::Struct(map)
    }

    #[test]
    fn test_layout() {
        assert_eq!(
            to_txt(&sample()).unwrap(),
            "{\n\tname: \"Alice\"\n\tscores: [90, 85]\n\taddress: {\n\t\tcity: \"Paris\"\n\t}\n\
             \t\"odd key\": -0.25\n\titems: [{\n\t\tid: 7\n\t}]\n}\n"
        );
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(from_txt(&to_txt(&sample()).unwrap()).unwrap(), sample());
    }

    #[test]
    fn test_free_layout_input() {
        let value = from_txt("{a: 1, b: [true, \"x\"], c: {}, d: nan}").unwrap();
        assert_eq!(value.struct_get("a"), Some(&Value::Int(1)));
        assert_eq!(
            value.struct_get("c"),
            Some(&Value::Struct(StructMap::new()))
        );
        let d = value.struct_get("d");
        assert!(matches!(d, Some(Value::Float(f)) if f.is_nan()));
    }

    #[test]
    fn test_matrix_is_unsupported() {
        let m = Value::Matrix(Matrix::new(&[2]).unwrap());
        assert!(matches!(
            to_txt(&m),
            Err(Error::Unsupported { codec: "txt", .. })
        ));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["{a 1}", "[1, 2", "{a: 1} x", "@"] {
            assert!(from_txt(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
