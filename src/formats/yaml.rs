//! YAML documents in block style.
//!
//! Structs become indented `key: value` mappings and long lists become `- item`
//! sequences. Lists with at most [`CodecOptions::flow_list_limit`] elements are
//! written inline as `[a, b]` unless their parent is a block list, and anything
//! nested inside a flow collection stays flow:
//!
//! ```text
//! name: Alice
//! tags: [admin, ops]
//! address:
//!   city: Paris
//!   zip: 75001
//! pairs: [[1, 2], [3, 4]]
//! ```
//!
//! A container that is an item of a block list starts on the item's line, so a
//! list of structs reads `- a: 1` followed by `  b: 2`.
//!
//! Strings are written plain when they cannot be mistaken for another scalar and
//! double-quoted otherwise. Matrices use a local tag:
//! `!matrix {dims: [2, 2], data: [1.0, 2.0, 3.0, 4.0]}`.
//!
//! The reader handles the subset this writer produces plus the common hand-written
//! forms: comments, a leading `---`, single-quoted strings, compact lists that sit
//! at the same column as their key, and null values (`~`, `null`, or nothing),
//! which read back as `0`.

use crate::scan::{format_float, Scanner};
use crate::{Codec, CodecOptions, Error, Kind, Matrix, Result};

/// Characters that may not start a plain scalar.
const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
    '`', ' ',
];

/// Characters that force quoting anywhere in a scalar.
const SPECIAL: &[char] = &[
    ':', '#', '\n', '\r', '\t', '\\', '"', '\'', '[', ']', '{', '}', ',', '&', '*', '!', '|',
    '>', '%', '@',
];

const RESERVED: &[&str] = &["true", "false", "yes", "no", "on", "off", "null"];

fn is_null_word(s: &str) -> bool {
    s.is_empty() || matches!(s, "~" | "null" | "Null" | "NULL")
}

fn parse_bool_word(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            Some(false)
        }
        _ => None,
    }
}

fn parse_special_float(s: &str) -> Option<f64> {
    match s {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => None,
    }
}

fn is_number_byte(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')
}

fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit()) && s.bytes().all(is_number_byte)
}

/// Kind of an unquoted scalar.
fn plain_kind(s: &str) -> Kind {
    if is_null_word(s) {
        Kind::Int
    } else if parse_bool_word(s).is_some() {
        Kind::Bool
    } else if parse_special_float(s).is_some() {
        Kind::Float
    } else if looks_numeric(s) {
        if s.parse::<i64>().is_ok() {
            Kind::Int
        } else if s.parse::<u64>().is_ok() {
            Kind::Uint
        } else if s.parse::<f64>().is_ok() {
            Kind::Float
        } else {
            Kind::String
        }
    } else {
        Kind::String
    }
}

fn needs_quotes(s: &str) -> bool {
    let (Some(first), Some(last)) = (s.chars().next(), s.chars().next_back()) else {
        return true;
    };
    if INDICATORS.contains(&first) || first.is_whitespace() || last.is_whitespace() {
        return true;
    }
    if s.contains(SPECIAL) || s.contains(char::is_control) || s.starts_with("...") {
        return true;
    }
    let digits = s.trim_start_matches(['+', '-']);
    if digits.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    let reserved = RESERVED.iter().any(|word| s.eq_ignore_ascii_case(word));
    reserved || s == "~" || plain_kind(s) != Kind::String
}

fn write_scalar_string(out: &mut String, s: &str) {
    if !needs_quotes(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn yaml_float(v: f64) -> String {
    if v.is_nan() {
        ".nan".to_string()
    } else if v == f64::INFINITY {
        ".inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else {
        format_float(v)
    }
}

/// A list item marker: `-` followed by a blank or the end of the line.
fn is_item_marker(line: &str) -> bool {
    let line = line.trim_end_matches('\r');
    line == "-" || line.starts_with("- ") || line.starts_with("-\t")
}

#[derive(Debug)]
enum Frame {
    Flow { map: bool, first: bool },
    BlockList { col: usize },
    /// `lead` is written before `{}` when the mapping turns out empty.
    BlockMap {
        col: usize,
        first: bool,
        lead: &'static str,
    },
}

#[derive(Debug)]
enum ReadFrame {
    Flow,
    BlockList {
        col: usize,
        first: bool,
        entered: bool,
    },
    BlockMap { col: usize, first: bool },
}

/// YAML codec.
#[derive(Debug)]
pub struct YamlCodec {
    flow_list_limit: usize,
    out: String,
    frames: Vec<Frame>,
    /// The cursor sits right after `- ` and a block container may start on this line.
    inline: bool,
    after_key: bool,
    input: Scanner,
    stack: Vec<ReadFrame>,
    /// `read_peek` found an empty value; the next scalar read yields zero.
    null_pending: bool,
}

impl YamlCodec {
    #[must_use]
    pub fn new(options: &CodecOptions) -> Self {
        YamlCodec {
            flow_list_limit: options.flow_list_limit,
            out: String::new(),
            frames: Vec::new(),
            inline: false,
            after_key: false,
            input: Scanner::default(),
            stack: Vec::new(),
            null_pending: false,
        }
    }

    fn in_flow(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Flow { .. }))
    }

    /// Column of a block container opened at the current position.
    fn child_col(&self) -> usize {
        match self.frames.last() {
            Some(Frame::BlockList { col, .. } | Frame::BlockMap { col, .. }) => col + 2,
            _ => 0,
        }
    }

    fn line(&mut self, col: usize) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.extend(std::iter::repeat(' ').take(col));
    }

    /// Writes whatever precedes a value. `block` is set when the value opens a
    /// block container, which starts on the following line after a key.
    fn prefix(&mut self, block: bool) {
        if self.after_key {
            self.after_key = false;
            if !block {
                self.out.push(' ');
            }
            return;
        }
        let list_col = match self.frames.last_mut() {
            Some(Frame::Flow { first, .. }) => {
                if !*first {
                    self.out.push_str(", ");
                }
                *first = false;
                None
            }
            Some(Frame::BlockList { col }) => Some(*col),
            _ => None,
        };
        if let Some(col) = list_col {
            if self.inline {
                self.inline = false;
            } else {
                self.line(col);
            }
            self.out.push_str("- ");
            self.inline = block;
        }
    }

    fn scalar(&mut self, text: &str) {
        self.prefix(false);
        self.out.push_str(text);
    }

    // Reading.

    fn read_top_is_flow(&self) -> bool {
        matches!(self.stack.last(), Some(ReadFrame::Flow))
    }

    /// Finishes the current line and moves to the start of the next line with
    /// content, returning its indentation, or `None` at the end of input.
    fn seek_line(&mut self) -> Result<Option<usize>> {
        if !self.input.at_line_start() {
            self.input.skip_inline_whitespace();
            match self.input.peek_raw() {
                None => return Ok(None),
                Some('#' | '\n' | '\r') => self.input.skip_line(),
                Some(c) => {
                    return Err(self.input.error(&format!("unexpected '{}' after value", c)))
                }
            }
        }
        loop {
            let start = self.input.pos();
            self.input.skip_inline_whitespace();
            match self.input.peek_raw() {
                None => return Ok(None),
                Some('#' | '\n' | '\r') => self.input.skip_line(),
                Some(_) => {
                    let indent = self.input.pos() - start;
                    self.input.set_pos(start);
                    return Ok(Some(indent));
                }
            }
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.input.peek_raw(), None | Some('\n' | '\r' | '#'))
    }

    /// Counts the items of a block list whose first marker is at the cursor.
    fn count_block_items(&self, col: usize) -> usize {
        let mut count = 1;
        for line in self.input.rest().split('\n').skip(1) {
            let content = line.trim_start_matches([' ', '\t']);
            if content.trim_end().is_empty() || content.starts_with('#') {
                continue;
            }
            let indent = line.len() - content.len();
            if indent > col {
                continue;
            }
            if indent == col && is_item_marker(content) {
                count += 1;
                continue;
            }
            break;
        }
        count
    }

    /// Consumes the `-` marker of the next block list item.
    fn enter_item(&mut self) -> Result<()> {
        let (col, first) = match self.stack.last_mut() {
            Some(ReadFrame::BlockList {
                col,
                first,
                entered,
            }) if !*entered => {
                *entered = true;
                let was_first = *first;
                *first = false;
                (*col, was_first)
            }
            _ => return Ok(()),
        };
        if !first {
            match self.seek_line()? {
                Some(indent) if indent == col => self.input.advance(indent),
                _ => return Err(self.input.error("expected a list item")),
            }
        }
        if !is_item_marker(self.input.rest_of_line()) {
            return Err(self.input.error("expected '-'"));
        }
        self.input.advance(1);
        Ok(())
    }

    /// Marks the value of the current list item as fully read.
    fn value_done(&mut self) {
        if let Some(ReadFrame::BlockList { entered, .. }) = self.stack.last_mut() {
            *entered = false;
        }
    }

    /// Length of the unquoted scalar at the cursor.
    fn plain_len(&self, flow: bool) -> usize {
        let line = self.input.rest_of_line();
        let mut end = line.len();
        let mut prev_blank = false;
        for (i, c) in line.char_indices() {
            if (c == '#' && prev_blank) || (flow && matches!(c, ',' | ']' | '}')) {
                end = i;
                break;
            }
            prev_blank = c == ' ' || c == '\t';
        }
        line[..end].trim_end_matches([' ', '\t']).len()
    }

    fn take_plain(&mut self) -> String {
        let flow = self.read_top_is_flow();
        if flow {
            self.input.skip_whitespace();
        } else {
            self.input.skip_inline_whitespace();
        }
        let len = self.plain_len(flow);
        let text = self.input.rest()[..len].to_string();
        self.input.advance(len);
        text
    }

    /// Reads a mapping key and its `:`.
    fn read_key(&mut self, flow: bool) -> Result<String> {
        let key = match self.input.peek_raw() {
            Some('"') => self.input.quoted_string()?,
            Some('\'') => self.input.single_quoted_string()?,
            _ => {
                let line = self.input.rest_of_line();
                let end = line
                    .char_indices()
                    .find(|&(i, c)| {
                        c == ':'
                            && (flow
                                || line[i + 1..]
                                    .chars()
                                    .next()
                                    .map_or(true, |n| n == ' ' || n == '\t'))
                    })
                    .map(|(i, _)| i)
                    .ok_or_else(|| self.input.error("expected a mapping key"))?;
                let key = line[..end].trim_end_matches([' ', '\t']).to_string();
                if key.is_empty() || key.starts_with(['-', '[', '{', '#']) {
                    return Err(self.input.error("expected a mapping key"));
                }
                self.input.advance(end);
                key
            }
        };
        self.input.skip_inline_whitespace();
        if !self.input.eat_raw(':') {
            return Err(self.input.error("expected ':' after key"));
        }
        if !flow && !matches!(self.input.peek_raw(), None | Some(' ' | '\t' | '\n' | '\r')) {
            return Err(self.input.error("expected a blank after ':'"));
        }
        Ok(key)
    }

    fn mapping_key_ahead(&mut self) -> bool {
        let save = self.input.pos();
        let found = self.read_key(false).is_ok();
        self.input.set_pos(save);
        found
    }

    /// Positions the cursor on the next value and classifies it. `parent_col` is the
    /// column a block value on a following line must be indented past.
    fn locate_value(&mut self, parent_col: Option<usize>) -> Result<Kind> {
        let flow = self.read_top_is_flow();
        if flow {
            self.input.skip_whitespace_and_comments();
            if self.input.eat_raw(',') {
                self.input.skip_whitespace_and_comments();
            }
        } else {
            self.input.skip_inline_whitespace();
            if self.at_line_end() {
                let under_key = matches!(self.stack.last(), Some(ReadFrame::BlockMap { .. }));
                match self.seek_line()? {
                    Some(indent) if parent_col.map_or(true, |col| indent > col) => {
                        self.input.advance(indent);
                    }
                    Some(indent)
                        if under_key
                            && Some(indent) == parent_col
                            && is_item_marker(&self.input.rest_of_line()[indent..]) =>
                    {
                        self.input.advance(indent);
                    }
                    _ => {
                        self.null_pending = true;
                        return Ok(Kind::Int);
                    }
                }
            }
        }
        self.classify(flow)
    }

    fn classify(&mut self, flow: bool) -> Result<Kind> {
        let Some(ch) = self.input.peek_raw() else {
            return Err(self.input.error("unexpected end of input"));
        };
        if !flow && is_item_marker(self.input.rest_of_line()) {
            return Ok(Kind::List);
        }
        match ch {
            '[' => return Ok(Kind::List),
            '{' => return Ok(Kind::Struct),
            '!' if self.input.starts_with("!matrix") => return Ok(Kind::Matrix),
            _ => {}
        }
        if !flow && self.mapping_key_ahead() {
            return Ok(Kind::Struct);
        }
        match ch {
            '"' | '\'' => Ok(Kind::String),
            _ => {
                let len = self.plain_len(flow);
                Ok(plain_kind(&self.input.rest()[..len]))
            }
        }
    }

    fn finish_scalar<T>(&mut self, value: T) -> Result<T> {
        self.value_done();
        Ok(value)
    }

    fn number_list(&mut self) -> Result<Vec<f64>> {
        self.input.expect('[')?;
        let count = self.input.count_items(']', true)?;
        let mut items = Vec::with_capacity(count.min(4096));
        for i in 0..count {
            if i > 0 {
                self.input.expect(',')?;
            }
            self.input.skip_whitespace();
            let len = self.plain_len(true);
            let word = self.input.rest()[..len].to_string();
            let value = parse_float_word(&word)
                .ok_or_else(|| self.input.error(&format!("invalid number '{}'", word)))?;
            self.input.advance(len);
            items.push(value);
        }
        self.input.expect(']')?;
        Ok(items)
    }
}

fn parse_float_word(word: &str) -> Option<f64> {
    if is_null_word(word) {
        return Some(0.0);
    }
    parse_special_float(word).or_else(|| {
        looks_numeric(word)
            .then(|| word.parse::<f64>().ok())
            .flatten()
    })
}

impl Default for YamlCodec {
    fn default() -> Self {
        Self::new(&CodecOptions::default())
    }
}

impl Codec for YamlCodec {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn is_text(&self) -> bool {
        true
    }

    fn init_write(&mut self) -> Result<()> {
        self.out.clear();
        self.frames.clear();
        self.inline = false;
        self.after_key = false;
        Ok(())
    }

    fn finish_write(&mut self) -> Result<Vec<u8>> {
        if !self.frames.is_empty() {
            return Err(Error::custom("unclosed container at end of document"));
        }
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        Ok(std::mem::take(&mut self.out).into_bytes())
    }

    fn init_read(&mut self, input: &[u8]) -> Result<()> {
        self.input = Scanner::new(input)?;
        self.stack.clear();
        self.null_pending = false;
        if let Some(indent) = self.seek_line()? {
            let start = self.input.pos();
            self.input.advance(indent);
            if self.input.starts_with("---") {
                self.input.skip_line();
            } else {
                self.input.set_pos(start);
            }
        }
        Ok(())
    }

    fn finish_read(&mut self) -> Result<()> {
        match self.seek_line()? {
            None => Ok(()),
            Some(indent) => {
                self.input.advance(indent);
                if self.input.starts_with("...") {
                    Ok(())
                } else {
                    Err(self.input.error("unexpected content after document"))
                }
            }
        }
    }

    fn write_int(&mut self, v: i64) -> Result<()> {
        self.scalar(&v.to_string());
        Ok(())
    }

    fn write_uint(&mut self, v: u64) -> Result<()> {
        self.scalar(&v.to_string());
        Ok(())
    }

    fn write_float(&mut self, v: f64) -> Result<()> {
        self.scalar(&yaml_float(v));
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.prefix(false);
        write_scalar_string(&mut self.out, v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.scalar(if v { "true" } else { "false" });
        Ok(())
    }

    fn write_array_begin(&mut self, size: usize) -> Result<()> {
        let parent_block_list = matches!(self.frames.last(), Some(Frame::BlockList { .. }));
        let flow = self.in_flow()
            || size == 0
            || (size <= self.flow_list_limit && !parent_block_list);
        if flow {
            self.prefix(false);
            self.out.push('[');
            self.frames.push(Frame::Flow {
                map: false,
                first: true,
            });
        } else {
            let col = self.child_col();
            self.prefix(true);
            self.frames.push(Frame::BlockList { col });
        }
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame::Flow { map: false, .. }) => self.out.push(']'),
            Some(Frame::BlockList { .. }) => {}
            _ => return Err(Error::custom("unbalanced container end")),
        }
        self.inline = false;
        Ok(())
    }

    fn write_struct_begin(&mut self) -> Result<()> {
        if self.in_flow() {
            self.prefix(false);
            self.out.push('{');
            self.frames.push(Frame::Flow {
                map: true,
                first: true,
            });
        } else {
            let lead = if self.after_key { " " } else { "" };
            let col = self.child_col();
            self.prefix(true);
            self.frames.push(Frame::BlockMap {
                col,
                first: true,
                lead,
            });
        }
        Ok(())
    }

    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        let block_col = match self.frames.last_mut() {
            Some(Frame::Flow { map: true, first }) => {
                if !*first {
                    self.out.push_str(", ");
                }
                *first = false;
                None
            }
            Some(Frame::BlockMap { col, first, .. }) => {
                *first = false;
                Some(*col)
            }
            _ => return Err(Error::custom("struct key outside a struct")),
        };
        if let Some(col) = block_col {
            if self.inline {
                self.inline = false;
            } else {
                self.line(col);
            }
        }
        write_scalar_string(&mut self.out, key);
        self.out.push(':');
        self.after_key = true;
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame::Flow { map: true, .. }) => self.out.push('}'),
            Some(Frame::BlockMap { first, lead, .. }) => {
                if first {
                    self.out.push_str(lead);
                    self.out.push_str("{}");
                }
            }
            _ => return Err(Error::custom("unbalanced container end")),
        }
        self.inline = false;
        Ok(())
    }

    fn write_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        let dims: Vec<String> = matrix.dims().iter().map(ToString::to_string).collect();
        let data: Vec<String> = matrix.data().iter().map(|&x| yaml_float(x)).collect();
        self.scalar(&format!(
            "!matrix {{dims: [{}], data: [{}]}}",
            dims.join(", "),
            data.join(", ")
        ));
        Ok(())
    }

    fn read_peek(&mut self) -> Result<Kind> {
        if self.null_pending {
            return Ok(Kind::Int);
        }
        let parent_col = match self.stack.last() {
            Some(ReadFrame::BlockMap { col, .. }) => Some(*col),
            Some(ReadFrame::BlockList { col, .. }) => {
                let col = *col;
                self.enter_item()?;
                Some(col)
            }
            _ => None,
        };
        self.locate_value(parent_col)
    }

    fn read_int(&mut self) -> Result<i64> {
        if std::mem::take(&mut self.null_pending) {
            return self.finish_scalar(0);
        }
        let start = self.input.pos();
        let word = self.take_plain();
        if is_null_word(&word) {
            return self.finish_scalar(0);
        }
        let value = word
            .parse::<i64>()
            .map_err(|_| self.input.error_at(start, "expected an integer"))?;
        self.finish_scalar(value)
    }

    fn read_uint(&mut self) -> Result<u64> {
        if std::mem::take(&mut self.null_pending) {
            return self.finish_scalar(0);
        }
        let start = self.input.pos();
        let word = self.take_plain();
        if is_null_word(&word) {
            return self.finish_scalar(0);
        }
        let value = word
            .parse::<u64>()
            .map_err(|_| self.input.error_at(start, "expected an unsigned integer"))?;
        self.finish_scalar(value)
    }

    fn read_float(&mut self) -> Result<f64> {
        if std::mem::take(&mut self.null_pending) {
            return self.finish_scalar(0.0);
        }
        let start = self.input.pos();
        let word = self.take_plain();
        let value = parse_float_word(&word)
            .ok_or_else(|| self.input.error_at(start, "expected a float"))?;
        self.finish_scalar(value)
    }

    fn read_string(&mut self) -> Result<String> {
        if std::mem::take(&mut self.null_pending) {
            return self.finish_scalar(String::new());
        }
        if self.read_top_is_flow() {
            self.input.skip_whitespace();
        } else {
            self.input.skip_inline_whitespace();
        }
        let value = match self.input.peek_raw() {
            Some('"') => self.input.quoted_string()?,
            Some('\'') => self.input.single_quoted_string()?,
            _ => self.take_plain(),
        };
        self.finish_scalar(value)
    }

    fn read_bool(&mut self) -> Result<bool> {
        let start = self.input.pos();
        let word = self.take_plain();
        let value = parse_bool_word(&word)
            .ok_or_else(|| self.input.error_at(start, "expected 'true' or 'false'"))?;
        self.finish_scalar(value)
    }

    fn read_array_begin(&mut self) -> Result<usize> {
        if self.read_top_is_flow() {
            self.input.skip_whitespace();
        } else {
            self.input.skip_inline_whitespace();
        }
        if self.input.eat_raw('[') {
            let count = self.input.count_items(']', true)?;
            self.stack.push(ReadFrame::Flow);
            return Ok(count);
        }
        if !is_item_marker(self.input.rest_of_line()) {
            return Err(self.input.error("expected a list"));
        }
        let col = self.input.column();
        let count = self.count_block_items(col);
        self.stack.push(ReadFrame::BlockList {
            col,
            first: true,
            entered: false,
        });
        Ok(count)
    }

    fn read_array_end(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(ReadFrame::Flow) => {
                self.input.skip_whitespace_and_comments();
                self.input.eat_raw(',');
                self.input.expect(']')?;
            }
            Some(ReadFrame::BlockList { .. }) => {}
            _ => return Err(Error::custom("unbalanced container end")),
        }
        self.value_done();
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        if self.read_top_is_flow() {
            self.input.skip_whitespace();
        } else {
            self.input.skip_inline_whitespace();
        }
        if self.input.eat_raw('{') {
            self.stack.push(ReadFrame::Flow);
        } else {
            let col = self.input.column();
            self.stack.push(ReadFrame::BlockMap { col, first: true });
        }
        Ok(())
    }

    fn read_struct_key(&mut self) -> Result<Option<String>> {
        if self.read_top_is_flow() {
            self.input.skip_whitespace_and_comments();
            if self.input.eat_raw(',') {
                self.input.skip_whitespace_and_comments();
            }
            if self.input.peek_raw() == Some('}') {
                return Ok(None);
            }
            return self.read_key(true).map(Some);
        }
        let (col, first) = match self.stack.last_mut() {
            Some(ReadFrame::BlockMap { col, first }) => {
                let was_first = *first;
                *first = false;
                (*col, was_first)
            }
            _ => return Err(Error::custom("struct key outside a struct")),
        };
        if !first {
            match self.seek_line()? {
                None => return Ok(None),
                Some(indent) if indent < col => return Ok(None),
                Some(indent) if indent == col => {
                    self.input.advance(indent);
                    if self.input.starts_with("...") {
                        self.input.set_pos(self.input.pos() - indent);
                        return Ok(None);
                    }
                }
                Some(indent) => {
                    self.input.advance(indent);
                    return Err(self.input.error("unexpected indentation"));
                }
            }
        }
        self.read_key(false).map(Some)
    }

    fn read_struct_end(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(ReadFrame::Flow) => self.input.expect('}')?,
            Some(ReadFrame::BlockMap { .. }) => {}
            _ => return Err(Error::custom("unbalanced container end")),
        }
        self.value_done();
        Ok(())
    }

    fn read_matrix(&mut self) -> Result<Matrix> {
        if self.read_top_is_flow() {
            self.input.skip_whitespace();
        } else {
            self.input.skip_inline_whitespace();
        }
        if !self.input.starts_with("!matrix") {
            return Err(self.input.error("expected '!matrix'"));
        }
        self.input.advance("!matrix".len());
        self.input.expect('{')?;
        let mut dims = None;
        let mut data = None;
        loop {
            self.input.skip_whitespace();
            self.input.eat_raw(',');
            if self.input.eat('}') {
                break;
            }
            self.input.skip_whitespace();
            let key = self.read_key(true)?;
            self.input.skip_whitespace();
            match key.as_str() {
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
        let matrix = match (dims, data) {
            (Some(dims), Some(data)) => Matrix::from_data(dims, data)?,
            _ => return Err(Error::invalid_matrix("matrix needs both dims and data")),
        };
        self.finish_scalar(matrix)
    }
}
