//! Format identifiers and the codec factory.
//!
//! ```rust
//! use polycodec::{CodecOptions, Format};
//!
//! let format: Format = "yml".parse().unwrap();
//! assert_eq!(format, Format::Yaml);
//! assert_eq!(Format::from_extension(".jsonb"), Some(Format::JsonBinary));
//!
//! let codec = format.codec(&CodecOptions::default());
//! assert_eq!(codec.name(), "yaml");
//! assert!(codec.is_text());
//! ```

use crate::formats::{BinaryCodec, JsonCodec, TomlCodec, TxtCodec, XmlCodec, YamlCodec};
use crate::{Codec, CodecOptions, Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Every supported wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    JsonText,
    JsonBinary,
    Yaml,
    Xml,
    Binary,
    Toml,
    Txt,
}

impl Format {
    /// All formats, in declaration order.
    pub const ALL: [Format; 7] = [
        Format::JsonText,
        Format::JsonBinary,
        Format::Yaml,
        Format::Xml,
        Format::Binary,
        Format::Toml,
        Format::Txt,
    ];

    /// A fresh codec for this format.
    #[must_use]
    pub fn codec(self, options: &CodecOptions) -> Box<dyn Codec> {
        match self {
            Format::JsonText => Box::new(JsonCodec::new(options)),
            Format::JsonBinary => Box::new(BinaryCodec::json_binary()),
            Format::Yaml => Box::new(YamlCodec::new(options)),
            Format::Xml => Box::new(XmlCodec::new(options)),
            Format::Binary => Box::new(BinaryCodec::binary()),
            Format::Toml => Box::new(TomlCodec::new()),
            Format::Txt => Box::new(TxtCodec::new()),
        }
    }

    /// The canonical name, which is also the codec's [`Codec::name`].
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Format::JsonText => "json",
            Format::JsonBinary => "json-binary",
            Format::Yaml => "yaml",
            Format::Xml => "xml",
            Format::Binary => "binary",
            Format::Toml => "toml",
            Format::Txt => "txt",
        }
    }

    /// The preferred file extension, without the dot.
    #[inline]
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Format::JsonText => "json",
            Format::JsonBinary => "jsonb",
            Format::Yaml => "yaml",
            Format::Xml => "xml",
            Format::Binary => "bin",
            Format::Toml => "toml",
            Format::Txt => "txt",
        }
    }

    /// Looks up a format by file extension, with or without the leading dot,
    /// ignoring case.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        match ext.as_str() {
            "yml" => Some(Format::Yaml),
            _ => Format::ALL.into_iter().find(|f| f.extension() == ext),
        }
    }

    /// Looks up a format from a path's extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    /// Whether the format's output is printable text.
    #[inline]
    #[must_use]
    pub fn is_text(self) -> bool {
        !matches!(self, Format::JsonBinary | Format::Binary)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a format name or common alias, ignoring case.
impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" | "json-text" => Ok(Format::JsonText),
            "json-binary" | "jsonb" => Ok(Format::JsonBinary),
            "yaml" | "yml" => Ok(Format::Yaml),
            "xml" => Ok(Format::Xml),
            "binary" | "bin" => Ok(Format::Binary),
            "toml" => Ok(Format::Toml),
            "txt" | "text" => Ok(Format::Txt),
            _ => Err(Error::custom(format!("unknown format '{}'", s))),
        }
    }
}
