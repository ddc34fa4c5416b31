//! Configuration options shared by the engine and the codecs.
//!
//! [`CodecOptions`] is passed to [`Format::codec`](crate::Format::codec) and to the
//! serialize/deserialize walkers. Each codec reads the fields that apply to it and
//! ignores the rest.
//!
//! ## Examples
//!
//! ```rust
//! use polycodec::{write_with_options, CodecOptions, Format, Value};
//!
//! let value = Value::from(vec![Value::from(1), Value::from(2)]);
//!
//! // Four-space JSON indentation
//! let options = CodecOptions::new().with_indent(4);
//! let json = write_with_options(Format::JsonText, &value, &options).unwrap();
//! assert!(String::from_utf8(json).unwrap().contains("\n    1"));
//!
//! // Never use YAML flow lists
//! let options = CodecOptions::new().with_flow_list_limit(0);
//! let yaml = write_with_options(Format::Yaml, &value, &options).unwrap();
//! assert_eq!(String::from_utf8(yaml).unwrap(), "- 1\n- 2\n");
//! ```

/// Default limit on container nesting for both walkers.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunable behaviour for writers and readers.
///
/// - `indent`: spaces per nesting level in JSON output (YAML always uses 2, TOML and
///   XML nest inline or by element, Txt uses tabs)
/// - `max_depth`: deepest container nesting accepted when writing or reading
/// - `flow_list_limit`: YAML lists with at most this many elements are written in
///   flow style `[a, b]`
///
/// # Examples
///
/// ```rust
/// use polycodec::CodecOptions;
///
/// let options = CodecOptions::new()
///     .with_indent(4)
///     .with_max_depth(16)
///     .with_flow_list_limit(3);
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    pub indent: usize,
    pub max_depth: usize,
    pub flow_list_limit: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            indent: 2,
            max_depth: DEFAULT_MAX_DEPTH,
            flow_list_limit: 8,
        }
    }
}

impl CodecOptions {
    /// Creates default options (2-space indent, depth 128, YAML flow lists up to 8).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::CodecOptions;
    ///
    /// let options = CodecOptions::new();
    /// assert_eq!(options.indent, 2);
    /// assert_eq!(options.flow_list_limit, 8);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of spaces per indentation level.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the maximum container nesting depth.
    ///
    /// A tree nested deeper fails with
    /// [`Error::DepthLimitExceeded`](crate::Error::DepthLimitExceeded).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the largest YAML list written in flow style.
    #[must_use]
    pub fn with_flow_list_limit(mut self, limit: usize) -> Self {
        self.flow_list_limit = limit;
        self
    }
}
