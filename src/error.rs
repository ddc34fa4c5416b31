//! Error types for the object model, the engine and every codec.
//!
//! All fallible operations in the crate return [`Result<T>`], which carries an
//! [`Error`] describing what went wrong and, for text formats, where.
//!
//! ## Error Categories
//!
//! - **Syntax Errors**: Malformed text input with line/column information
//! - **Truncated / Corrupt Binary**: Byte offset of the failing read
//! - **Type Mismatches**: Typed setters and container operations on the wrong variant
//! - **Unsupported Capabilities**: A codec that cannot encode or decode a given node
//! - **Limits**: Matrix size overflow and nesting depth
//!
//! ## Examples
//!
//! ```rust
//! use polycodec::{read_str, Error, Format};
//!
//! let result = read_str(Format::JsonText, "{\"a\": [1, 2");
//! assert!(matches!(result, Err(Error::Syntax { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while building, encoding or decoding values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed text input
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax {
        line: usize,
        col: usize,
        msg: String,
    },

    /// Operation applied to a value of the wrong variant
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Binary input ended before a complete value was read
    #[error("Unexpected end of input at offset {offset}: expected {expected}")]
    UnexpectedEof { offset: usize, expected: String },

    /// Binary input that cannot be decoded
    #[error("Invalid data at offset {offset}: {msg}")]
    InvalidData { offset: usize, msg: String },

    /// The codec does not implement the requested operation
    #[error("{codec} codec does not support {operation}")]
    Unsupported {
        codec: &'static str,
        operation: &'static str,
    },

    /// `add` on a struct that already holds the key
    #[error("Duplicate struct key: {0}")]
    DuplicateKey(String),

    /// Index-based container access past the end
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Matrix shape or buffer that violates the matrix invariants
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),

    /// Containers nested deeper than the configured limit
    #[error("Nesting depth exceeds the limit of {0}")]
    DepthLimitExceeded(usize),

    /// Rust value with no counterpart in the object model
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::Error;
    ///
    /// let err = Error::syntax(10, 5, "unexpected token");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::Error;
    ///
    /// let err = Error::type_mismatch("int", "string");
    /// assert!(err.to_string().contains("expected int"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates an end-of-input error for a binary read at `offset`.
    pub fn unexpected_eof(offset: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            offset,
            expected: expected.to_string(),
        }
    }

    /// Creates an invalid-data error for a binary read at `offset`.
    pub fn invalid_data(offset: usize, msg: &str) -> Self {
        Error::InvalidData {
            offset,
            msg: msg.to_string(),
        }
    }

    /// Creates the error a codec returns for an operation it does not implement.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::Error;
    ///
    /// let err = Error::unsupported("txt", "write_matrix");
    /// assert_eq!(err.to_string(), "txt codec does not support write_matrix");
    /// ```
    pub fn unsupported(codec: &'static str, operation: &'static str) -> Self {
        Error::Unsupported { codec, operation }
    }

    /// Creates an invalid matrix error.
    pub fn invalid_matrix(msg: &str) -> Self {
        Error::InvalidMatrix(msg.to_string())
    }

    /// Creates an unsupported type error for Rust values the object model cannot hold.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for stream and file failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::syntax(3, 7, "expected ':'").to_string(),
            "Syntax error at line 3, column 7: expected ':'"
        );
        assert_eq!(
            Error::unexpected_eof(12, "string bytes").to_string(),
            "Unexpected end of input at offset 12: expected string bytes"
        );
        assert_eq!(
            Error::DepthLimitExceeded(128).to_string(),
            "Nesting depth exceeds the limit of 128"
        );
    }

    #[test]
    fn test_serde_custom() {
        let err = <Error as serde::de::Error>::custom("missing field");
        assert_eq!(err, Error::Custom("missing field".to_string()));
    }
}
