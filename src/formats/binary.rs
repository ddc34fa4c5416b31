//! Tagged binary encoding (TLV) shared by the Binary and JsonBinary formats.
//!
//! Every value starts with a one-byte tag. All integers are little-endian.
//!
//! ```text
//! int     tag  i64
//! uint    tag  u64
//! float   tag  f64 (IEEE-754 bits)
//! string  tag  u32 len, len bytes of UTF-8
//! bool    tag  u8 (0 or 1)
//! list    tag  u32 count, count values
//! struct  tag  (u32 key_len, key bytes, value)*, u32 0
//! matrix  tag  u32 ndims, ndims x u32 dim, product(dims) x f64
//! ```
//!
//! A struct key can never be empty, so a zero key length terminates the struct.

use crate::{Codec, Error, Kind, Matrix, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// One tag byte per value kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagSet {
    pub int: u8,
    pub uint: u8,
    pub float: u8,
    pub string: u8,
    pub bool: u8,
    pub list: u8,
    pub structure: u8,
    pub matrix: u8,
}

impl TagSet {
    /// The tag byte for `kind`.
    #[must_use]
    pub const fn tag(&self, kind: Kind) -> u8 {
        match kind {
            Kind::Int => self.int,
            Kind::Uint => self.uint,
            Kind::Float => self.float,
            Kind::String => self.string,
            Kind::Bool => self.bool,
            Kind::List => self.list,
            Kind::Struct => self.structure,
            Kind::Matrix => self.matrix,
        }
    }

    /// The kind a tag byte stands for, if any.
    #[must_use]
    pub fn kind(&self, tag: u8) -> Option<Kind> {
        [
            Kind::Int,
            Kind::Uint,
            Kind::Float,
            Kind::String,
            Kind::Bool,
            Kind::List,
            Kind::Struct,
            Kind::Matrix,
        ]
        .into_iter()
        .find(|&kind| self.tag(kind) == tag)
    }
}

/// Tags of the Binary format.
pub const BINARY_TAGS: TagSet = TagSet {
    int: 0x01,
    uint: 0x02,
    float: 0x03,
    string: 0x04,
    bool: 0x05,
    list: 0x06,
    structure: 0x07,
    matrix: 0x08,
};

/// Tags of the JsonBinary format. The byte values currently match [`BINARY_TAGS`].
pub const JSON_BINARY_TAGS: TagSet = TagSet {
    int: 0x01,
    uint: 0x02,
    float: 0x03,
    string: 0x04,
    bool: 0x05,
    list: 0x06,
    structure: 0x07,
    matrix: 0x08,
};

/// TLV encoder/decoder parameterised by a [`TagSet`].
///
/// # Examples
///
/// ```rust
/// use polycodec::formats::BinaryCodec;
/// use polycodec::{deserialize_with, serialize_with, CodecOptions, Value};
///
/// let options = CodecOptions::new();
/// let mut codec = BinaryCodec::binary();
/// let bytes = serialize_with(&Value::from("hi"), &mut codec, &options).unwrap();
/// assert_eq!(bytes, [0x04, 2, 0, 0, 0, b'h', b'i']);
///
/// let back = deserialize_with(&bytes, &mut codec, &options).unwrap();
/// assert_eq!(back, Value::from("hi"));
/// ```
#[derive(Debug)]
pub struct BinaryCodec {
    name: &'static str,
    tags: TagSet,
    out: BytesMut,
    input: Bytes,
    input_len: usize,
}

impl BinaryCodec {
    #[must_use]
    pub fn with_tags(name: &'static str, tags: TagSet) -> Self {
        BinaryCodec {
            name,
            tags,
            out: BytesMut::new(),
            input: Bytes::new(),
            input_len: 0,
        }
    }

    /// Codec for the Binary format.
    #[must_use]
    pub fn binary() -> Self {
        Self::with_tags("binary", BINARY_TAGS)
    }

    /// Codec for the JsonBinary format.
    #[must_use]
    pub fn json_binary() -> Self {
        Self::with_tags("json-binary", JSON_BINARY_TAGS)
    }

    /// Offset of the read cursor from the start of the input.
    fn offset(&self) -> usize {
        self.input_len - self.input.remaining()
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.input.remaining() < n {
            Err(Error::unexpected_eof(self.offset(), what))
        } else {
            Ok(())
        }
    }

    fn expect_tag(&mut self, kind: Kind) -> Result<()> {
        self.need(1, "type tag")?;
        let tag = self.input.chunk()[0];
        if tag != self.tags.tag(kind) {
            return Err(Error::InvalidData {
                offset: self.offset(),
                msg: format!("expected {} tag, found 0x{:02x}", kind, tag),
            });
        }
        self.input.advance(1);
        Ok(())
    }

    fn read_len(&mut self, what: &str) -> Result<usize> {
        self.need(4, what)?;
        Ok(self.input.get_u32_le() as usize)
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        self.need(len, "string bytes")?;
        let offset = self.offset();
        let bytes = self.input.copy_to_bytes(len);
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            let at = offset + e.utf8_error().valid_up_to();
            Error::invalid_data(at, "invalid UTF-8")
        })
    }

    fn put_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| Error::invalid_data(self.out.len(), "length does not fit in u32"))?;
        self.out.put_u32_le(len);
        Ok(())
    }

    fn put_tag(&mut self, kind: Kind) {
        self.out.put_u8(self.tags.tag(kind));
    }
}

impl Codec for BinaryCodec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn init_write(&mut self) -> Result<()> {
        self.out.clear();
        Ok(())
    }

    fn finish_write(&mut self) -> Result<Vec<u8>> {
        Ok(self.out.split().to_vec())
    }

    fn init_read(&mut self, input: &[u8]) -> Result<()> {
        self.input = Bytes::copy_from_slice(input);
        self.input_len = input.len();
        Ok(())
    }

    fn finish_read(&mut self) -> Result<()> {
        if self.input.has_remaining() {
            return Err(Error::invalid_data(
                self.offset(),
                "trailing bytes after value",
            ));
        }
        Ok(())
    }

    fn write_int(&mut self, v: i64) -> Result<()> {
        self.put_tag(Kind::Int);
        self.out.put_i64_le(v);
        Ok(())
    }

    fn write_uint(&mut self, v: u64) -> Result<()> {
        self.put_tag(Kind::Uint);
        self.out.put_u64_le(v);
        Ok(())
    }

    fn write_float(&mut self, v: f64) -> Result<()> {
        self.put_tag(Kind::Float);
        self.out.put_f64_le(v);
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.put_tag(Kind::String);
        self.put_len(v.len())?;
        self.out.put_slice(v.as_bytes());
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.put_tag(Kind::Bool);
        self.out.put_u8(u8::from(v));
        Ok(())
    }

    fn write_array_begin(&mut self, size: usize) -> Result<()> {
        self.put_tag(Kind::List);
        self.put_len(size)
    }

    fn write_array_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_struct_begin(&mut self) -> Result<()> {
        self.put_tag(Kind::Struct);
        Ok(())
    }

    fn write_struct_key(&mut self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::invalid_data(
                self.out.len(),
                "empty struct keys cannot be encoded",
            ));
        }
        self.put_len(key.len())?;
        self.out.put_slice(key.as_bytes());
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        self.out.put_u32_le(0);
        Ok(())
    }

    fn write_matrix(&mut self, matrix: &Matrix) -> Result<()> {
        self.put_tag(Kind::Matrix);
        self.put_len(matrix.ndims())?;
        for &dim in matrix.dims() {
            self.put_len(dim)?;
        }
        self.out.reserve(matrix.total_size() * 8);
        for &x in matrix.data() {
            self.out.put_f64_le(x);
        }
        Ok(())
    }

    fn read_peek(&mut self) -> Result<Kind> {
        self.need(1, "type tag")?;
        let tag = self.input.chunk()[0];
        self.tags.kind(tag).ok_or_else(|| Error::InvalidData {
            offset: self.offset(),
            msg: format!("unknown type tag 0x{:02x}", tag),
        })
    }

    fn read_int(&mut self) -> Result<i64> {
        self.expect_tag(Kind::Int)?;
        self.need(8, "int payload")?;
        Ok(self.input.get_i64_le())
    }

    fn read_uint(&mut self) -> Result<u64> {
        self.expect_tag(Kind::Uint)?;
        self.need(8, "uint payload")?;
        Ok(self.input.get_u64_le())
    }

    fn read_float(&mut self) -> Result<f64> {
        self.expect_tag(Kind::Float)?;
        self.need(8, "float payload")?;
        Ok(self.input.get_f64_le())
    }

    fn read_string(&mut self) -> Result<String> {
        self.expect_tag(Kind::String)?;
        let len = self.read_len("string length")?;
        self.read_utf8(len)
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.expect_tag(Kind::Bool)?;
        self.need(1, "bool payload")?;
        match self.input.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidData {
                offset: self.offset() - 1,
                msg: format!("bool byte must be 0 or 1, found {}", other),
            }),
        }
    }

    fn read_array_begin(&mut self) -> Result<usize> {
        self.expect_tag(Kind::List)?;
        self.read_len("list count")
    }

    fn read_array_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        self.expect_tag(Kind::Struct)
    }

    fn read_struct_key(&mut self) -> Result<Option<String>> {
        self.need(4, "struct key length")?;
        let chunk = self.input.chunk();
        let len = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        self.input.advance(4);
        if len == 0 {
            return Ok(None);
        }
        self.read_utf8(len).map(Some)
    }

    fn read_struct_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_matrix(&mut self) -> Result<Matrix> {
        self.expect_tag(Kind::Matrix)?;
        let ndims = self.read_len("matrix rank")?;
        let dims_bytes = ndims
            .checked_mul(4)
            .ok_or_else(|| Error::invalid_matrix("rank overflows"))?;
        self.need(dims_bytes, "matrix dimensions")?;
        let dims: Vec<usize> = (0..ndims)
            .map(|_| self.input.get_u32_le() as usize)
            .collect();

        let total = Matrix::checked_size(&dims)?;
        let data_bytes = total
            .checked_mul(8)
            .ok_or_else(|| Error::invalid_matrix("total size overflows usize"))?;
        self.need(data_bytes, "matrix data")?;
        let data = (0..total).map(|_| self.input.get_f64_le()).collect();
        Matrix::from_data(dims, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deserialize_with, serialize_with, CodecOptions, StructMap, Value};

    fn encode(value: &Value) -> Vec<u8> {
        serialize_with(value, &mut BinaryCodec::binary(), &CodecOptions::new()).unwrap()
    }

    fn decode(bytes: &[u8]) -> Result<Value> {
        deserialize_with(bytes, &mut BinaryCodec::binary(), &CodecOptions::new())
    }

    #[test]
    fn test_int_layout() {
        let mut expected = vec![0x01];
        expected.extend(&(-2i64).to_le_bytes());
        assert_eq!(encode(&Value::Int(-2)), expected);
    }

    #[test]
    fn test_struct_layout() {
        let mut map = StructMap::new();
        map.set("a", Value::Bool(true));
        let bytes = encode(&Value::Struct(map));

        let mut expected = vec![0x07];
        expected.extend(&1u32.to_le_bytes());
        expected.push(b'a');
        expected.extend([0x05, 0x01]);
        expected.extend(&0u32.to_le_bytes());
        assert_eq!(bytes, expected);
        assert_eq!(
            decode(&bytes).unwrap().struct_get("a"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_matrix_layout() {
        let m = Matrix::from_data(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let bytes = encode(&Value::Matrix(m.clone()));
        assert_eq!(bytes.len(), 1 + 4 + 2 * 4 + 6 * 8);
        assert_eq!(bytes[0], 0x08);

        let back = decode(&bytes).unwrap();
        assert_eq!(back.as_matrix().and_then(|m| m.get(&[1, 2])), Some(6.0));
        assert_eq!(back, Value::Matrix(m));
    }

    #[test]
    fn test_every_truncation_fails() {
        let mut map = StructMap::new();
        map.set("name", Value::from("Alice"));
        map.set("xs", Value::List(vec![Value::Float(1.5), Value::Uint(3)]));
        let bytes = encode(&Value::Struct(map));

        for cut in 0..bytes.len() {
            assert!(
                matches!(decode(&bytes[..cut]), Err(Error::UnexpectedEof { .. })),
                "prefix of {} bytes decoded",
                cut
            );
        }
    }

    #[test]
    fn test_corrupt_input() {
        assert!(matches!(
            decode(&[0x09]),
            Err(Error::InvalidData { offset: 0, .. })
        ));
        assert!(matches!(
            decode(&[0x05, 0x02]),
            Err(Error::InvalidData { .. })
        ));

        let mut bad_utf8 = vec![0x04];
        bad_utf8.extend(&2u32.to_le_bytes());
        bad_utf8.extend([0xC3, 0x28]);
        assert!(matches!(
            decode(&bad_utf8),
            Err(Error::InvalidData { offset: 5, .. })
        ));

        let mut trailing = encode(&Value::Bool(false));
        trailing.push(0);
        assert!(decode(&trailing).is_err());
    }

    #[test]
    fn test_huge_matrix_header_does_not_allocate() {
        let mut bytes = vec![0x08];
        bytes.extend(&2u32.to_le_bytes());
        bytes.extend(&u32::MAX.to_le_bytes());
        bytes.extend(&u32::MAX.to_le_bytes());
        assert!(decode(&bytes).is_err());

        let mut zero = vec![0x08];
        zero.extend(&1u32.to_le_bytes());
        zero.extend(&0u32.to_le_bytes());
        assert!(matches!(decode(&zero), Err(Error::InvalidMatrix(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut map = StructMap::new();
        map.set("", Value::Int(1));
        let result = serialize_with(
            &Value::Struct(map),
            &mut BinaryCodec::binary(),
            &CodecOptions::new(),
        );
        assert!(matches!(result, Err(Error::InvalidData { .. })));
    }

    #[test]
    fn test_json_binary_shares_layout() {
        let value = Value::List(vec![Value::from("x"), Value::Uint(9)]);
        let mut codec = BinaryCodec::json_binary();
        let json_binary = serialize_with(&value, &mut codec, &CodecOptions::new()).unwrap();
        assert_eq!(json_binary, encode(&value));
    }
}
