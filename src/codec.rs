//! The codec capability table.
//!
//! A [`Codec`] is a stateful encoder/decoder driven node by node by the generic
//! walkers in [`ser`](crate::ser) and [`de`](crate::de). The walkers never look at
//! bytes; codecs never look at whole trees.
//!
//! Every data operation has a default body that fails with
//! [`Error::Unsupported`], so a codec only implements what its format can express.
//! A call sequence for one document is:
//!
//! ```text
//! init_write  -> write_* ...  -> finish_write -> bytes
//! init_read(bytes) -> read_peek / read_* ... -> finish_read
//! ```
//!
//! ## Implementing a codec
//!
//! ```rust
//! use polycodec::{serialize_with, Codec, CodecOptions, Error, Result, Value};
//!
//! /// Writes integers as decimal lines and supports nothing else.
//! #[derive(Default)]
//! struct Lines(String);
//!
//! impl Codec for Lines {
//!     fn name(&self) -> &'static str {
//!         "lines"
//!     }
//!
//!     fn finish_write(&mut self) -> Result<Vec<u8>> {
//!         Ok(std::mem::take(&mut self.0).into_bytes())
//!     }
//!
//!     fn write_int(&mut self, v: i64) -> Result<()> {
//!         self.0.push_str(&format!("{}\n", v));
//!         Ok(())
//!     }
//! }
//!
//! let mut codec = Lines::default();
//! let bytes = serialize_with(&Value::from(7), &mut codec, &CodecOptions::new()).unwrap();
//! assert_eq!(bytes, b"7\n");
//!
//! let err = serialize_with(&Value::from("x"), &mut codec, &CodecOptions::new()).unwrap_err();
//! assert_eq!(err, Error::unsupported("lines", "write_string"));
//! ```

use crate::{Error, Kind, Matrix, Result};

/// Node-level encode/decode operations for one wire format.
pub trait Codec {
    /// Short lower-case codec name used in errors and logs.
    fn name(&self) -> &'static str;

    /// `true` when the encoded output is UTF-8 text.
    fn is_text(&self) -> bool {
        false
    }

    /// Resets the writer before a document.
    fn init_write(&mut self) -> Result<()> {
        Ok(())
    }

    /// Completes the document and hands over the encoded bytes.
    fn finish_write(&mut self) -> Result<Vec<u8>>;

    /// Loads the input for the next document.
    fn init_read(&mut self, input: &[u8]) -> Result<()> {
        let _ = input;
        Err(Error::unsupported(self.name(), "init_read"))
    }

    /// Called once the root value has been read.
    fn finish_read(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_int(&mut self, v: i64) -> Result<()> {
        let _ = v;
        Err(Error::unsupported(self.name(), "write_int"))
    }

    fn write_uint(&mut self, v: u64) -> Result<()> {
        let _ = v;
        Err(Error::unsupported(self.name(), "write_uint"))
    }

    fn write_float(&mut self, v: f64) -> Result<()> {
        let _ = v;
        Err(Error::unsupported(self.name(), "write_float"))
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        let _ = v;
        Err(Error::unsupported(self.name(), "write_string"))
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        let _ = v;
        Err(Error::unsupported(self.name(), "write_bool"))
    }

    /// Opens a list of `size` elements.
    fn write_array_begin(&mut self, size: usize) -> Result<()> {
        let _ = size;
        Err(Error::unsupported(self.name(), "write_array_begin"))
    }

    fn write_array_end(&mut self) -> Result<()> {
        Err(Error::unsupported(self.name(), "write_array_end"))
    }

    fn write_struct_begin(&mut self) -> Result<()> {
        Err(Error::unsupported(self.name(), "write_struct_begin"))
    }

    /// Writes the key of the next struct entry; its value follows immediately.
    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        let _ = key;
        Err(Error::unsupported(self.name(), "write_struct_key"))
    }

    fn write_struct_end(&mut self) -> Result<()> {
        Err(Error::unsupported(self.name(), "write_struct_end"))
    }

    fn write_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        let _ = matrix;
        Err(Error::unsupported(self.name(), "write_matrix"))
    }

    /// Reports the kind of the next value without consuming it.
    fn read_peek(&mut self) -> Result<Kind> {
        Err(Error::unsupported(self.name(), "read_peek"))
    }

    fn read_int(&mut self) -> Result<i64> {
        Err(Error::unsupported(self.name(), "read_int"))
    }

    fn read_uint(&mut self) -> Result<u64> {
        Err(Error::unsupported(self.name(), "read_uint"))
    }

    fn read_float(&mut self) -> Result<f64> {
        Err(Error::unsupported(self.name(), "read_float"))
    }

    fn read_string(&mut self) -> Result<String> {
        Err(Error::unsupported(self.name(), "read_string"))
    }

    fn read_bool(&mut self) -> Result<bool> {
        Err(Error::unsupported(self.name(), "read_bool"))
    }

    /// Opens a list and returns the number of elements that follow.
    fn read_array_begin(&mut self) -> Result<usize> {
        Err(Error::unsupported(self.name(), "read_array_begin"))
    }

    fn read_array_end(&mut self) -> Result<()> {
        Err(Error::unsupported(self.name(), "read_array_end"))
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        Err(Error::unsupported(self.name(), "read_struct_begin"))
    }

    /// Next key of the open struct, or `None` once the struct has no more entries.
    fn read_struct_key(&mut self) -> Result<Option<String>> {
        Err(Error::unsupported(self.name(), "read_struct_key"))
    }

    fn read_struct_end(&mut self) -> Result<()> {
        Err(Error::unsupported(self.name(), "read_struct_end"))
    }

    fn read_matrix(&mut self) -> Result<Matrix> {
        Err(Error::unsupported(self.name(), "read_matrix"))
    }
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn is_text(&self) -> bool {
        (**self).is_text()
    }
    fn init_write(&mut self) -> Result<()> {
        (**self).init_write()
    }
    fn finish_write(&mut self) -> Result<Vec<u8>> {
        (**self).finish_write()
    }
    fn init_read(&mut self, input: &[u8]) -> Result<()> {
        (**self).init_read(input)
    }
    fn finish_read(&mut self) -> Result<()> {
        (**self).finish_read()
    }
    fn write_int(&mut self, v: i64) -> Result<()> {
        (**self).write_int(v)
    }
    fn write_uint(&mut self, v: u64) -> Result<()> {
        (**self).write_uint(v)
    }
    fn write_float(&mut self, v: f64) -> Result<()> {
        (**self).write_float(v)
    }
    fn write_string(&mut self, v: &str) -> Result<()> {
        (**self).write_string(v)
    }
    fn write_bool(&mut self, v: bool) -> Result<()> {
        (**self).write_bool(v)
    }
    fn write_array_begin(&mut self, size: usize) -> Result<()> {
        (**self).write_array_begin(size)
    }
    fn write_array_end(&mut self) -> Result<()> {
        (**self).write_array_end()
    }
    fn write_struct_begin(&mut self) -> Result<()> {
        (**self).write_struct_begin()
    }
    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        (**self).write_struct_key(key)
    }
    fn write_struct_end(&mut self) -> Result<()> {
        (**self).write_struct_end()
    }
    fn write_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        (**self).write_matrix(matrix)
    }
    fn read_peek(&mut self) -> Result<Kind> {
        (**self).read_peek()
    }
    fn read_int(&mut self) -> Result<i64> {
        (**self).read_int()
    }
    fn read_uint(&mut self) -> Result<u64> {
        (**self).read_uint()
    }
    fn read_float(&mut self) -> Result<f64> {
        (**self).read_float()
    }
    fn read_string(&mut self) -> Result<String> {
        (**self).read_string()
    }
    fn read_bool(&mut self) -> Result<bool> {
        (**self).read_bool()
    }
    fn read_array_begin(&mut self) -> Result<usize> {
        (**self).read_array_begin()
    }
    fn read_array_end(&mut self) -> Result<()> {
        (**self).read_array_end()
    }
    fn read_struct_begin(&mut self) -> Result<()> {
        (**self).read_struct_begin()
    }
    fn read_struct_key(&mut self) -> Result<Option<String>> {
        (**self).read_struct_key()
    }
    fn read_struct_end(&mut self) -> Result<()> {
        (**self).read_struct_end()
    }
    fn read_matrix(&mut self) -> Result<Matrix> {
        (**self).read_matrix()
    }
}
