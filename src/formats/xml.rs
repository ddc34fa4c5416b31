//! XML documents with one element per value.
//!
//! Elements are named after the value kind, and struct entries carry their key in a
//! `key` attribute:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <document>
//!   <struct>
//!     <string key="name">Alice</string>
//!     <list key="scores">
//!       <int>90</int>
//!       <int>85</int>
//!     </list>
//!     <matrix key="m" dims="2,2">1.0 2.0 3.0 4.0</matrix>
//!   </struct>
//! </document>
//! ```
//!
//! Text and attribute values escape markup characters and every control character,
//! so string content, including whitespace, survives exactly.

use crate::scan::{format_float, Scanner};
use crate::{Codec, CodecOptions, Error, Kind, Matrix, Result};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const ROOT: &str = "document";

fn element_name(kind: Kind) -> &'static str {
    match kind {
        Kind::Int => "int",
        Kind::Uint => "uint",
        Kind::Float => "float",
        Kind::String => "string",
        Kind::Bool => "bool",
        Kind::List => "list",
        Kind::Struct => "struct",
        Kind::Matrix => "matrix",
    }
}

fn element_kind(name: &str) -> Option<Kind> {
    Some(match name {
        "int" => Kind::Int,
        "uint" => Kind::Uint,
        "float" => Kind::Float,
        "string" => Kind::String,
        "bool" => Kind::Bool,
        "list" => Kind::List,
        "struct" => Kind::Struct,
        "matrix" => Kind::Matrix,
        _ => return None,
    })
}

fn escape(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 => out.push_str(&format!("&#{};", c as u32)),
            c => out.push(c),
        }
    }
}

fn xml_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "INF".to_string()
    } else if v == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        format_float(v)
    }
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "NaN" | "nan" => Some(f64::NAN),
        "INF" | "inf" | "+INF" => Some(f64::INFINITY),
        "-INF" | "-inf" => Some(f64::NEG_INFINITY),
        _ if text.bytes().any(|b| b.is_ascii_digit()) => text.parse().ok(),
        _ => None,
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

/// A parsed start tag.
#[derive(Debug)]
struct Tag {
    name: String,
    attrs: Vec<(String, String)>,
    /// Self-closing, with no content or end tag.
    empty: bool,
}

impl Tag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// XML codec.
#[derive(Debug)]
pub struct XmlCodec {
    indent: usize,
    out: String,
    /// Whether each open element has children yet.
    frames: Vec<bool>,
    key: Option<String>,
    input: Scanner,
    root: String,
    /// Start tag consumed by `read_peek` or `read_struct_key` but not yet by a read.
    pending: Option<Tag>,
    /// Open containers on the read side: element name, or `None` when self-closing.
    open: Vec<Option<String>>,
}

impl XmlCodec {
    #[must_use]
    pub fn new(options: &CodecOptions) -> Self {
        XmlCodec {
            indent: options.indent,
            out: String::new(),
            frames: Vec::new(),
            key: None,
            input: Scanner::default(),
            root: String::new(),
            pending: None,
            open: Vec::new(),
        }
    }

    fn start_tag(&mut self, kind: Kind, extra: Option<(&str, &str)>) {
        if let Some(has_children) = self.frames.last_mut() {
            *has_children = true;
        }
        self.out.push('\n');
        let width = self.frames.len() * self.indent;
        self.out.extend(std::iter::repeat(' ').take(width));
        self.out.push('<');
        self.out.push_str(element_name(kind));
        if let Some(key) = self.key.take() {
            self.out.push_str(" key=\"");
            escape(&mut self.out, &key);
            self.out.push('"');
        }
        if let Some((name, value)) = extra {
            self.out.push_str(&format!(" {}=\"", name));
            escape(&mut self.out, value);
            self.out.push('"');
        }
        self.out.push('>');
    }

    fn leaf(&mut self, kind: Kind, text: &str) {
        self.start_tag(kind, None);
        escape(&mut self.out, text);
        self.out.push_str(&format!("</{}>", element_name(kind)));
    }

    fn open_container(&mut self, kind: Kind) {
        self.start_tag(kind, None);
        self.frames.push(false);
    }

    fn close_container(&mut self, kind: Kind) -> Result<()> {
        let has_children = self
            .frames
            .pop()
            .ok_or_else(|| Error::custom("unbalanced container end"))?;
        if has_children {
            self.out.push('\n');
            let width = self.frames.len() * self.indent;
            self.out.extend(std::iter::repeat(' ').take(width));
        }
        self.out.push_str(&format!("</{}>", element_name(kind)));
        Ok(())
    }

    // Reading.

    /// Skips whitespace, comments, processing instructions and doctype declarations.
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.input.skip_whitespace();
            let end = if self.input.starts_with("<!--") {
                "-->"
            } else if self.input.starts_with("<?") {
                "?>"
            } else if self.input.starts_with("<!") && !self.input.starts_with("<![CDATA[") {
                ">"
            } else {
                return Ok(());
            };
            match self.input.rest().find(end) {
                Some(i) => self.input.advance(i + end.len()),
                None => return Err(self.input.error("unterminated markup declaration")),
            }
        }
    }

    fn name(&mut self) -> Result<String> {
        let name = self.input.take_while(is_name_char).to_string();
        if name.is_empty() {
            return Err(self.input.error("expected a name"));
        }
        Ok(name)
    }

    fn attr_value(&mut self) -> Result<String> {
        let quote = match self.input.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.input.error("expected a quoted attribute value")),
        };
        let start = self.input.pos();
        let raw = self.input.take_while(|c| c != quote).to_string();
        if !self.input.eat_raw(quote) {
            return Err(self.input.error_at(start, "unterminated attribute value"));
        }
        self.decode(&raw, start)
    }

    fn parse_tag(&mut self) -> Result<Tag> {
        self.skip_misc()?;
        if self.input.starts_with("</") || !self.input.eat_raw('<') {
            return Err(self.input.error("expected an element"));
        }
        let name = self.name()?;
        let mut attrs = Vec::new();
        loop {
            self.input.skip_whitespace();
            if self.input.eat_raw('>') {
                return Ok(Tag {
                    name,
                    attrs,
                    empty: false,
                });
            }
            if self.input.starts_with("/>") {
                self.input.advance(2);
                return Ok(Tag {
                    name,
                    attrs,
                    empty: true,
                });
            }
            let attr = self.name()?;
            if !self.input.eat('=') {
                return Err(self.input.error("expected '=' after attribute name"));
            }
            self.input.skip_whitespace();
            let value = self.attr_value()?;
            attrs.push((attr, value));
        }
    }

    fn end_tag(&mut self, name: &str) -> Result<()> {
        self.skip_misc()?;
        let start = self.input.pos();
        if !self.input.starts_with("</") {
            return Err(self.input.error(&format!("expected '</{}>'", name)));
        }
        self.input.advance(2);
        let found = self.name()?;
        if found != name {
            return Err(self.input.error_at(
                start,
                &format!("mismatched end tag: expected '{}', found '{}'", name, found),
            ));
        }
        self.input.expect('>')
    }

    /// Takes the pending start tag, or parses the next one, and checks its kind.
    fn take_tag(&mut self, kind: Kind) -> Result<Tag> {
        let tag = match self.pending.take() {
            Some(tag) => tag,
            None => self.parse_tag()?,
        };
        if element_kind(&tag.name) != Some(kind) {
            return Err(Error::type_mismatch(element_name(kind), &tag.name));
        }
        Ok(tag)
    }

    /// Decodes entity and character references.
    fn decode(&self, raw: &str, pos: usize) -> Result<String> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            rest = &rest[amp..];
            let semi = rest
                .find(';')
                .ok_or_else(|| self.input.error_at(pos, "unterminated entity reference"))?;
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            let ch = ch.ok_or_else(|| {
                self.input
                    .error_at(pos, &format!("unknown entity reference '&{};'", entity))
            })?;
            out.push(ch);
            rest = &rest[semi + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Text content of a leaf element, through its end tag.
    fn leaf_text(&mut self, kind: Kind) -> Result<String> {
        let tag = self.take_tag(kind)?;
        if tag.empty {
            return Ok(String::new());
        }
        let mut text = String::new();
        loop {
            let start = self.input.pos();
            let raw = self.input.take_while(|c| c != '<').to_string();
            text.push_str(&self.decode(&raw, start)?);
            if self.input.starts_with("<![CDATA[") {
                self.input.advance("<![CDATA[".len());
                let end = self
                    .input
                    .rest()
                    .find("]]>")
                    .ok_or_else(|| self.input.error("unterminated CDATA section"))?;
                text.push_str(&self.input.rest()[..end]);
                self.input.advance(end + 3);
            } else if self.input.starts_with("<!--") {
                self.skip_misc()?;
            } else {
                break;
            }
        }
        self.end_tag(&tag.name)?;
        Ok(text)
    }

    fn number_text(&mut self, kind: Kind) -> Result<(String, usize)> {
        let pos = self.input.pos();
        let text = self.leaf_text(kind)?;
        Ok((text.trim().to_string(), pos))
    }

    /// Counts the child elements of the element whose start tag was just read.
    fn count_children(&self) -> Result<usize> {
        let rest = self.input.rest();
        let bytes = rest.as_bytes();
        let mut depth = 0usize;
        let mut count = 0usize;
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'<' {
                i += 1;
                continue;
            }
            let tail = &rest[i..];
            let at = i;
            let skip_to = move |end: &str| tail.find(end).map(|j| at + j + end.len());
            if tail.starts_with("<!--") {
                i = skip_to("-->").ok_or_else(|| self.input.error("unterminated comment"))?;
            } else if tail.starts_with("<![CDATA[") {
                i = skip_to("]]>").ok_or_else(|| self.input.error("unterminated CDATA section"))?;
            } else if tail.starts_with("<?") {
                i = skip_to("?>").ok_or_else(|| self.input.error("unterminated instruction"))?;
            } else if tail.starts_with("</") {
                if depth == 0 {
                    return Ok(count);
                }
                depth -= 1;
                i += 2;
            } else {
                // Find the end of the start tag, skipping quoted attribute values.
                let mut quote = None;
                let mut j = i + 1;
                while j < bytes.len() {
                    match (quote, bytes[j]) {
                        (None, b'"' | b'\'') => quote = Some(bytes[j]),
                        (Some(q), b) if b == q => quote = None,
                        (None, b'>') => break,
                        _ => {}
                    }
                    j += 1;
                }
                if j >= bytes.len() {
                    break;
                }
                if depth == 0 {
                    count += 1;
                }
                if bytes[j - 1] != b'/' {
                    depth += 1;
                }
                i = j + 1;
            }
        }
        Err(self.input.error("unterminated element"))
    }

    fn open_read_container(&mut self, kind: Kind) -> Result<bool> {
        let tag = self.take_tag(kind)?;
        let empty = tag.empty;
        self.open.push((!empty).then_some(tag.name));
        Ok(empty)
    }

    fn close_read_container(&mut self) -> Result<()> {
        match self.open.pop() {
            Some(Some(name)) => self.end_tag(&name),
            Some(None) => Ok(()),
            None => Err(Error::custom("unbalanced container end")),
        }
    }
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new(&CodecOptions::default())
    }
}

impl Codec for XmlCodec {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn is_text(&self) -> bool {
        true
    }

    fn init_write(&mut self) -> Result<()> {
        self.out.clear();
        self.out.push_str(DECLARATION);
        self.out.push('\n');
        self.out.push_str(&format!("<{}>", ROOT));
        self.frames.clear();
        self.frames.push(false);
        self.key = None;
        Ok(())
    }

    fn finish_write(&mut self) -> Result<Vec<u8>> {
        if self.frames.len() != 1 {
            return Err(Error::custom("unclosed container at end of document"));
        }
        self.frames.clear();
        self.out.push_str(&format!("\n</{}>\n", ROOT));
        Ok(std::mem::take(&mut self.out).into_bytes())
    }

    fn init_read(&mut self, input: &[u8]) -> Result<()> {
        self.input = Scanner::new(input)?;
        self.pending = None;
        self.open.clear();
        let tag = self.parse_tag()?;
        if tag.name != ROOT && tag.name != "root" {
            let msg = format!("unexpected root element '{}'", tag.name);
            return Err(self.input.error(&msg));
        }
        if tag.empty {
            return Err(self.input.error("empty document element"));
        }
        self.root = tag.name;
        Ok(())
    }

    fn finish_read(&mut self) -> Result<()> {
        let root = std::mem::take(&mut self.root);
        self.end_tag(&root)?;
        self.skip_misc()?;
        if !self.input.eof() {
            return Err(self.input.error("trailing content after document element"));
        }
        Ok(())
    }

    fn write_int(&mut self, v: i64) -> Result<()> {
        self.leaf(Kind::Int, &v.to_string());
        Ok(())
    }

    fn write_uint(&mut self, v: u64) -> Result<()> {
        self.leaf(Kind::Uint, &v.to_string());
        Ok(())
    }

    fn write_float(&mut self, v: f64) -> Result<()> {
        self.leaf(Kind::Float, &xml_float(v));
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.leaf(Kind::String, v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.leaf(Kind::Bool, if v { "true" } else { "false" });
        Ok(())
    }

    fn write_array_begin(&mut self, _size: usize) -> Result<()> {
        self.open_container(Kind::List);
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<()> {
        self.close_container(Kind::List)
    }

    fn write_struct_begin(&mut self) -> Result<()> {
        self.open_container(Kind::Struct);
        Ok(())
    }

    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        self.key = Some(key.to_string());
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        self.close_container(Kind::Struct)
    }

    fn write_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        let dims: Vec<String> = matrix.dims().iter().map(ToString::to_string).collect();
        self.start_tag(Kind::Matrix, Some(("dims", &dims.join(","))));
        let data: Vec<String> = matrix.data().iter().map(|&x| xml_float(x)).collect();
        self.out.push_str(&data.join(" "));
        self.out.push_str("</matrix>");
        Ok(())
    }

    fn read_peek(&mut self) -> Result<Kind> {
        if self.pending.is_none() {
            let tag = self.parse_tag()?;
            self.pending = Some(tag);
        }
        let name = self.pending.as_ref().map_or("", |tag| tag.name.as_str());
        element_kind(name)
            .ok_or_else(|| self.input.error(&format!("unknown element '{}'", name)))
    }

    fn read_int(&mut self) -> Result<i64> {
        let (text, pos) = self.number_text(Kind::Int)?;
        text.parse().map_err(|_| {
            let msg = format!("invalid integer '{}'", text);
            self.input.error_at(pos, &msg)
        })
    }

    fn read_uint(&mut self) -> Result<u64> {
        let (text, pos) = self.number_text(Kind::Uint)?;
        text.parse().map_err(|_| {
            let msg = format!("invalid unsigned integer '{}'", text);
            self.input.error_at(pos, &msg)
        })
    }

    fn read_float(&mut self) -> Result<f64> {
        let (text, pos) = self.number_text(Kind::Float)?;
        parse_float(&text).ok_or_else(|| {
            let msg = format!("invalid float '{}'", text);
            self.input.error_at(pos, &msg)
        })
    }

    fn read_string(&mut self) -> Result<String> {
        self.leaf_text(Kind::String)
    }

    fn read_bool(&mut self) -> Result<bool> {
        let (text, pos) = self.number_text(Kind::Bool)?;
        match text.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => {
                let msg = format!("invalid bool '{}'", text);
                Err(self.input.error_at(pos, &msg))
            }
        }
    }

    fn read_array_begin(&mut self) -> Result<usize> {
        if self.open_read_container(Kind::List)? {
            return Ok(0);
        }
        self.count_children()
    }

    fn read_array_end(&mut self) -> Result<()> {
        self.close_read_container()
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        self.open_read_container(Kind::Struct)?;
        Ok(())
    }

    fn read_struct_key(&mut self) -> Result<Option<String>> {
        if matches!(self.open.last(), Some(None)) {
            return Ok(None);
        }
        self.skip_misc()?;
        if self.input.starts_with("</") {
            return Ok(None);
        }
        let tag = self.parse_tag()?;
        let Some(key) = tag.attr("key").map(str::to_string) else {
            let msg = format!("<{}> entry has no key attribute", tag.name);
            return Err(self.input.error(&msg));
        };
        self.pending = Some(tag);
        Ok(Some(key))
    }

    fn read_struct_end(&mut self) -> Result<()> {
        self.close_read_container()
    }

    fn read_matrix(&mut self) -> Result<Matrix> {
        let pos = self.input.pos();
        if self.pending.is_none() {
            let tag = self.parse_tag()?;
            self.pending = Some(tag);
        }
        let dims_attr = self
            .pending
            .as_ref()
            .and_then(|tag| tag.attr("dims"))
            .map(str::to_string)
            .ok_or_else(|| self.input.error_at(pos, "matrix has no dims attribute"))?;
        let dims = dims_attr
            .split(',')
            .map(|d| d.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| {
                let msg = format!("invalid matrix dims '{}'", dims_attr);
                self.input.error_at(pos, &msg)
            })?;
        let text = self.leaf_text(Kind::Matrix)?;
        let data = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| {
                parse_float(t).ok_or_else(|| {
                    let msg = format!("invalid matrix element '{}'", t);
                    self.input.error_at(pos, &msg)
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Matrix::from_data(dims, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deserialize_with, serialize_with, StructMap, Value};

    fn to_xml(value: &Value) -> String {
        let bytes = serialize_with(value, &mut XmlCodec::default(), &CodecOptions::new()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn from_xml(text: &str) -> Result<Value> {
        deserialize_with(
            text.as_bytes(),
            &mut XmlCodec::default(),
            &CodecOptions::new(),
        )
    }

    fn sample() -> Value {
        let mut map = StructMap::new();
        map.set("name", Value::from("Alice"));
        map.set(
            "scores",
            Value::List(vec![Value::from(90), Value::from(85)]),
        );
        map.set("empty", Value::List(vec![]));
        Value::Struct(map)
    }

    #[test]
    fn test_document_layout() {
        assert_eq!(
            to_xml(&sample()),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<document>\n  <struct>\n    \
             <string key=\"name\">Alice</string>\n    <list key=\"scores\">\n      \
             <int>90</int>\n      <int>85</int>\n    </list>\n    \
             <list key=\"empty\"></list>\n  </struct>\n</document>\n"
        );
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(from_xml(&to_xml(&sample())).unwrap(), sample());
    }

    #[test]
    fn test_escaping() {
        let mut map = StructMap::new();
        map.set("a<b>&\"c\"", Value::from("x < y && 'z'\n\ttab"));
        let value = Value::Struct(map);
        let text = to_xml(&value);
        assert!(text.contains("key=\"a&lt;b&gt;&amp;&quot;c&quot;\""));
        let escaped = "x &lt; y &amp;&amp; &apos;z&apos;&#10;&#9;tab";
        assert!(text.contains(escaped));
        assert_eq!(from_xml(&text).unwrap(), value);
    }

    #[test]
    fn test_scalars() {
        assert_eq!(
            from_xml(&to_xml(&Value::Uint(u64::MAX))).unwrap(),
            Value::Uint(u64::MAX)
        );
        assert_eq!(
            from_xml(&to_xml(&Value::Float(0.5))).unwrap(),
            Value::Float(0.5)
        );
        assert_eq!(
            from_xml(&to_xml(&Value::Float(f64::NEG_INFINITY))).unwrap(),
            Value::Float(f64::NEG_INFINITY)
        );
        assert_eq!(
            from_xml(&to_xml(&Value::Bool(false))).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_hand_written_input() {
        let text = "<?xml version=\"1.0\"?>\n<!-- people -->\n<root>\n<struct>\
                    <string key='greeting'>caf&#xE9; &amp; more</string>\
                    <list key=\"none\"/>\
                    <string key=\"cdata\"><![CDATA[<raw>]]></string>\
                    </struct>\n</root>";
        let value = from_xml(text).unwrap();
        assert_eq!(
            value.struct_get("greeting"),
            Some(&Value::from("café & more"))
        );
        assert_eq!(value.struct_get("none"), Some(&Value::List(vec![])));
        assert_eq!(value.struct_get("cdata"), Some(&Value::from("<raw>")));
    }

    #[test]
    fn test_matrix() {
        let m = Matrix::from_data(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.5]).unwrap();
        let text = to_xml(&Value::Matrix(m.clone()));
        let element = "<matrix dims=\"2,3\">1.0 2.0 3.0 4.0 5.0 6.5</matrix>";
        assert!(text.contains(element));
        assert_eq!(from_xml(&text).unwrap(), Value::Matrix(m));
    }

    #[test]
    fn test_malformed() {
        for bad in [
            "<document><int>1</int>",
            "<document><int>1</float></document>",
            "<document><widget/></document>",
            "<other><int>1</int></other>",
            "<document><struct><int>1</int></struct></document>",
            "<document><int>x</int></document>",
            "<document><string>&bogus;</string></document>",
        ] {
            assert!(from_xml(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
