//! # polycodec
//!
//! A format-agnostic serialization engine: one dynamic object model and a set of
//! pluggable codecs that write it to, and read it back from, several wire formats.
//!
//! ## Overview
//!
//! - [`Value`]: structs (ordered, unique keys), lists, signed and unsigned integers,
//!   floats, strings, booleans and N-dimensional `f64` matrices
//! - [`Codec`]: the node-level capability table a format implements
//! - [`Serializer`] / [`Deserializer`]: the generic walkers that drive any codec
//! - [`Format`]: the built-in formats and the factory for their codecs
//!
//! | format | codec | output |
//! |---|---|---|
//! | [`Format::Binary`] | [`formats::BinaryCodec`] | tagged TLV bytes |
//! | [`Format::JsonBinary`] | [`formats::BinaryCodec`] | TLV bytes, JSON tag table |
//! | [`Format::JsonText`] | [`formats::JsonCodec`] | JSON |
//! | [`Format::Yaml`] | [`formats::YamlCodec`] | block/flow YAML |
//! | [`Format::Xml`] | [`formats::XmlCodec`] | element-per-value XML |
//! | [`Format::Toml`] | [`formats::TomlCodec`] | TOML |
//! | [`Format::Txt`] | [`formats::TxtCodec`] | brace-delimited text |
//!
//! ## Quick Start
//!
//! ```rust
//! use polycodec::{convert, read, value, write, Format};
//!
//! let doc = value!({
//!     "name": "Alice",
//!     "scores": [90, 85]
//! });
//!
//! let bytes = write(Format::Binary, &doc).unwrap();
//! assert_eq!(read(Format::Binary, &bytes).unwrap(), doc);
//!
//! let yaml = convert(Format::Binary, Format::Yaml, &bytes).unwrap();
//! assert_eq!(String::from_utf8(yaml).unwrap(), "name: Alice\nscores: [90, 85]\n");
//! ```
//!
//! ## Typed Data
//!
//! Any `T: Serialize` can go through a format via [`to_vec`] and come back with
//! [`from_slice`]:
//!
//! ```rust
//! use polycodec::{from_slice, to_vec, Format};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//! let toml = to_vec(Format::Toml, &user).unwrap();
//! assert_eq!(toml, b"id = 123\nname = \"Alice\"\nactive = true\n");
//!
//! let back: User = from_slice(Format::Toml, &toml).unwrap();
//! assert_eq!(back, user);
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code
//! - Decoding never trusts a length prefix for allocation
//! - Nesting depth is bounded by [`CodecOptions::max_depth`]
//! - A failed read returns an error and never a partial tree

#![forbid(unsafe_code)]

pub mod codec;
pub mod de;
pub mod error;
pub mod format;
pub mod formats;
pub mod macros;
pub mod map;
pub mod matrix;
pub mod options;
pub mod scan;
pub mod ser;
pub mod value;

pub use codec::Codec;
pub use de::{deserialize, deserialize_with, Deserializer, ValueDeserializer};
pub use error::{Error, Result};
pub use format::Format;
pub use map::StructMap;
pub use matrix::Matrix;
pub use options::{CodecOptions, DEFAULT_MAX_DEPTH};
pub use ser::{serialize, serialize_with, Serializer, ValueSerializer};
pub use value::{Kind, Value};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::debug;

/// Encodes a value in the given format with default options.
///
/// # Examples
///
/// ```rust
/// use polycodec::{write, Format, Value};
///
/// let bytes = write(Format::JsonText, &Value::from(vec![Value::from(1)])).unwrap();
/// assert_eq!(bytes, b"[\n  1\n]\n");
/// ```
///
/// # Errors
///
/// Returns an error if the format cannot represent a node of the tree (for
/// example a matrix in Txt) or the tree is nested deeper than the depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn write(format: Format, value: &Value) -> Result<Vec<u8>> {
    write_with_options(format, value, &CodecOptions::default())
}

/// Encodes a value in the given format with custom options.
///
/// # Errors
///
/// See [`write`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn write_with_options(
    format: Format,
    value: &Value,
    options: &CodecOptions,
) -> Result<Vec<u8>> {
    let mut codec = format.codec(options);
    let bytes = serialize_with(value, codec.as_mut(), options)?;
    debug!(%format, bytes = bytes.len(), "wrote document");
    Ok(bytes)
}

/// Decodes one document in the given format with default options.
///
/// # Examples
///
/// ```rust
/// use polycodec::{read, Format, Value};
///
/// let value = read(Format::JsonText, b"{\"a\": 1}").unwrap();
/// assert_eq!(value.struct_get("a"), Some(&Value::Int(1)));
/// ```
///
/// # Errors
///
/// Returns an error if the input is malformed or truncated, has trailing content,
/// or nests deeper than the depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn read(format: Format, input: &[u8]) -> Result<Value> {
    read_with_options(format, input, &CodecOptions::default())
}

/// Decodes one document in the given format with custom options.
///
/// # Errors
///
/// See [`read`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn read_with_options(format: Format, input: &[u8], options: &CodecOptions) -> Result<Value> {
    let mut codec = format.codec(options);
    let value = deserialize_with(input, codec.as_mut(), options)?;
    debug!(
        %format,
        bytes = input.len(),
        kind = value.kind().name(),
        "read document"
    );
    Ok(value)
}

fn require_text(format: Format) -> Result<()> {
    if format.is_text() {
        Ok(())
    } else {
        Err(Error::custom(format!("{} is not a text format", format)))
    }
}

/// Decodes a document of a text format from a string.
///
/// # Errors
///
/// Fails for [`Format::Binary`] and [`Format::JsonBinary`], and otherwise as
/// [`read`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn read_str(format: Format, input: &str) -> Result<Value> {
    require_text(format)?;
    read(format, input.as_bytes())
}

/// Encodes a value in a text format as a string.
///
/// # Examples
///
/// ```rust
/// use polycodec::{value, write_string, Format};
///
/// let text = write_string(Format::Yaml, &value!({ "ok": true })).unwrap();
/// assert_eq!(text, "ok: true\n");
/// assert!(write_string(Format::Binary, &value!(1)).is_err());
/// ```
///
/// # Errors
///
/// Fails for [`Format::Binary`] and [`Format::JsonBinary`], and otherwise as
/// [`write`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn write_string(format: Format, value: &Value) -> Result<String> {
    require_text(format)?;
    let bytes = write(format, value)?;
    String::from_utf8(bytes).map_err(|e| Error::custom(e.to_string()))
}

/// Reads a document in one format and writes it in another.
///
/// The intermediate tree is not validated against the destination; a node the
/// destination cannot represent fails the write.
///
/// # Errors
///
/// Any error from the read or the write.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn convert(from: Format, to: Format, input: &[u8]) -> Result<Vec<u8>> {
    convert_with_options(from, to, input, &CodecOptions::default())
}

/// [`convert`] with custom options for both sides.
///
/// # Errors
///
/// Any error from the read or the write.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn convert_with_options(
    from: Format,
    to: Format,
    input: &[u8],
    options: &CodecOptions,
) -> Result<Vec<u8>> {
    debug!(%from, %to, bytes = input.len(), "converting document");
    let value = read_with_options(from, input, options)?;
    write_with_options(to, &value, options)
}

/// Encodes a value and writes it to an I/O stream.
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(mut writer: W, format: Format, value: &Value) -> Result<()>
where
    W: io::Write,
{
    let bytes = write(format, value)?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::io(&e.to_string()))
}

/// Reads an I/O stream to the end and decodes it.
///
/// # Examples
///
/// ```rust
/// use polycodec::{from_reader, Format, Value};
/// use std::io::Cursor;
///
/// let value = from_reader(Cursor::new(b"a = 1\n"), Format::Toml).unwrap();
/// assert_eq!(value.struct_get("a"), Some(&Value::Int(1)));
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails or the input cannot be decoded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R, format: Format) -> Result<Value>
where
    R: io::Read,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    read(format, &bytes)
}

/// Reads and decodes a file. The format is taken from the extension unless given.
///
/// # Errors
///
/// Returns an error if the format cannot be determined, the file cannot be read,
/// or its content cannot be decoded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn read_file(path: impl AsRef<Path>, format: Option<Format>) -> Result<Value> {
    let path = path.as_ref();
    let format = resolve_format(path, format)?;
    let bytes = std::fs::read(path).map_err(|e| Error::io(&format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), %format, "reading file");
    read(format, &bytes)
}

/// Encodes a value into a file, replacing its content. The format is taken from the
/// extension unless given.
///
/// # Errors
///
/// Returns an error if the format cannot be determined, encoding fails, or the file
/// cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn write_file(path: impl AsRef<Path>, format: Option<Format>, value: &Value) -> Result<()> {
    let path = path.as_ref();
    let format = resolve_format(path, format)?;
    let bytes = write(format, value)?;
    debug!(
        path = %path.display(),
        %format,
        bytes = bytes.len(),
        "writing file"
    );
    std::fs::write(path, bytes).map_err(|e| Error::io(&format!("{}: {}", path.display(), e)))
}

fn resolve_format(path: &Path, format: Option<Format>) -> Result<Format> {
    match format.or_else(|| Format::from_path(path)) {
        Some(format) => Ok(format),
        None => Err(Error::custom(format!(
            "cannot determine the format of {}",
            path.display()
        ))),
    }
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use polycodec::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(value.struct_get("y"), Some(&Value::Int(2)));
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] for `None`, `()` and other values with no
/// counterpart in the object model.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Rebuild a `T: Deserialize` from a [`Value`].
///
/// # Errors
///
/// Returns an error if the tree does not have the shape `T` expects.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// Serialize any `T: Serialize` directly into a format.
///
/// # Errors
///
/// Any error from [`to_value`] or [`write`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T>(format: Format, value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    write(format, &to_value(value)?)
}

/// Deserialize a `T` from bytes in a format.
///
/// # Errors
///
/// Any error from [`read`] or [`from_value`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(format: Format, input: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    from_value(read(format, input)?)
}
