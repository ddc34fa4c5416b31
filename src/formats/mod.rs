//! Concrete codecs, one module per wire format.
//!
//! Each codec implements [`Codec`](crate::Codec) and keeps its own write buffer and
//! read cursor, so one instance can encode or decode any number of documents in
//! sequence. Most callers go through [`Format::codec`](crate::Format::codec) rather
//! than naming these types directly.

pub mod binary;
pub mod json;
pub mod toml;
pub mod txt;
pub mod xml;
pub mod yaml;

pub use binary::{BinaryCodec, TagSet, BINARY_TAGS, JSON_BINARY_TAGS};
pub use json::JsonCodec;
pub use toml::TomlCodec;
pub use txt::TxtCodec;
pub use xml::XmlCodec;
pub use yaml::YamlCodec;
