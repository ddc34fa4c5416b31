//! Serialization: walking a [`Value`] tree into a codec.
//!
//! This module holds two serializers:
//!
//! - [`Serializer`]: the generic engine. It visits a tree depth-first and emits one
//!   codec call per node, so any [`Codec`] can encode any tree it has capabilities for.
//! - [`ValueSerializer`]: a serde `Serializer` that turns any `T: Serialize` into a
//!   [`Value`]; it backs [`to_value`](crate::to_value) and [`to_vec`](crate::to_vec).
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use polycodec::{value, write, Format};
//!
//! let doc = value!({ "name": "Alice", "tags": ["a", "b"] });
//! let bytes = write(Format::Binary, &doc).unwrap();
//! assert_eq!(bytes[0], 0x07);
//! ```
//!
//! ## Direct Serializer Usage
//!
//! ```rust
//! use polycodec::{Codec, CodecOptions, Serializer, Value};
//! use polycodec::formats::JsonCodec;
//!
//! let options = CodecOptions::new();
//! let mut codec = JsonCodec::new(&options);
//! codec.init_write().unwrap();
//! Serializer::new(&mut codec, &options)
//!     .serialize(&Value::from(vec![Value::from(1), Value::from(2)]))
//!     .unwrap();
//! let text = String::from_utf8(codec.finish_write().unwrap()).unwrap();
//! assert_eq!(text, "[\n  1,\n  2\n]\n");
//! ```

use crate::{Codec, CodecOptions, Error, Result, StructMap, Value};
use serde::{ser, Serialize};
use tracing::trace;

/// The generic engine's write side.
///
/// Borrows a codec for the duration of one walk and tracks container nesting
/// against [`CodecOptions::max_depth`].
pub struct Serializer<'a, C: Codec + ?Sized> {
    codec: &'a mut C,
    max_depth: usize,
    depth: usize,
}

impl<'a, C: Codec + ?Sized> Serializer<'a, C> {
    pub fn new(codec: &'a mut C, options: &CodecOptions) -> Self {
        Serializer {
            codec,
            max_depth: options.max_depth,
            depth: 0,
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::DepthLimitExceeded(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    /// Emits `value` and all its descendants. The first codec error aborts the walk.
    ///
    /// # Errors
    ///
    /// Any codec error, or [`Error::DepthLimitExceeded`] for a tree nested deeper
    /// than the configured limit.
    pub fn serialize(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Int(i) => self.codec.write_int(*i),
            Value::Uint(u) => self.codec.write_uint(*u),
            Value::Float(f) => self.codec.write_float(*f),
            Value::String(s) => self.codec.write_string(s),
            Value::Bool(b) => self.codec.write_bool(*b),
            Value::Matrix(m) => self.codec.write_matrix(m),
            Value::List(items) => {
                self.enter()?;
                trace!(
                    codec = self.codec.name(),
                    depth = self.depth,
                    len = items.len(),
                    "write list"
                );
                self.codec.write_array_begin(items.len())?;
                for item in items {
                    self.serialize(item)?;
                }
                self.codec.write_array_end()?;
                self.depth -= 1;
                Ok(())
            }
            Value::Struct(map) => {
                self.enter()?;
                trace!(
                    codec = self.codec.name(),
                    depth = self.depth,
                    len = map.len(),
                    "write struct"
                );
                self.codec.write_struct_begin()?;
                for (key, item) in map {
                    self.codec.write_struct_key(key)?;
                    self.serialize(item)?;
                }
                self.codec.write_struct_end()?;
                self.depth -= 1;
                Ok(())
            }
        }
    }
}

/// Walks `value` into an already initialised codec.
///
/// # Errors
///
/// See [`Serializer::serialize`].
pub fn serialize<C: Codec + ?Sized>(
    value: &Value,
    codec: &mut C,
    options: &CodecOptions,
) -> Result<()> {
    Serializer::new(codec, options).serialize(value)
}

/// Encodes one complete document: `init_write`, the walk, then `finish_write`.
///
/// # Errors
///
/// Any error raised by the codec or the walk.
pub fn serialize_with<C: Codec + ?Sized>(
    value: &Value,
    codec: &mut C,
    options: &CodecOptions,
) -> Result<Vec<u8>> {
    codec.init_write()?;
    serialize(value, codec, options)?;
    codec.finish_write()
}

/// Serde serializer producing a [`Value`].
///
/// Unsigned integers that fit `i64` become `Int`; larger ones become `Uint`.
/// Enums use the externally tagged form: a unit variant is its name as a string,
/// any other variant is a one-entry struct `{variant: content}`. `None` and `()`
/// have no counterpart in the object model and are rejected.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: StructMap,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

/// Wraps variant content as `{variant: content}`.
fn tagged(variant: &'static str, content: Value) -> Value {
    let mut map = StructMap::with_capacity(1);
    map.set(variant, content);
    Value::Struct(map)
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(i64::try_from(v).map_or(Value::Uint(v), Value::Int))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Float(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        let bytes = v.iter().map(|&b| Value::Int(b as i64)).collect();
        Ok(Value::List(bytes))
    }

    fn serialize_none(self) -> Result<Value> {
        Err(Error::unsupported_type(
            "None (skip the field with skip_serializing_if)",
        ))
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Err(Error::unsupported_type("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Err(Error::UnsupportedType(format!("unit struct {}", name)))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(len.min(4096)),
            variant,
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let list = Value::List(self.vec);
        match self.variant {
            Some(variant) => tagged(variant, list),
            None => list,
        }
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: StructMap::new(),
            current_key: None,
            variant,
        }
    }

    fn finish(self) -> Value {
        let map = Value::Struct(self.map);
        match self.variant {
            Some(variant) => tagged(variant, map),
            None => map,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            Value::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            Value::Int(i) => {
                self.current_key = Some(i.to_string());
                Ok(())
            }
            Value::Uint(u) => {
                self.current_key = Some(u.to_string());
                Ok(())
            }
            _ => Err(Error::custom("map keys must be strings or integers")),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.set(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.set(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.set(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::BinaryCodec;
    use crate::Matrix;

    /// Records codec calls instead of encoding them.
    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Codec for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }
        fn finish_write(&mut self) -> Result<Vec<u8>> {
            Ok(self.0.join(" ").into_bytes())
        }
        fn write_int(&mut self, v: i64) -> Result<()> {
            self.0.push(format!("int:{}", v));
            Ok(())
        }
        fn write_string(&mut self, v: &str) -> Result<()> {
            self.0.push(format!("str:{}", v));
            Ok(())
        }
        fn write_array_begin(&mut self, size: usize) -> Result<()> {
            self.0.push(format!("[{}", size));
            Ok(())
        }
        fn write_array_end(&mut self) -> Result<()> {
            self.0.push("]".to_string());
            Ok(())
        }
        fn write_struct_begin(&mut self) -> Result<()> {
            self.0.push("{".to_string());
            Ok(())
        }
        fn write_struct_key(&mut self, key: &str) -> Result<()> {
            self.0.push(format!("{}=", key));
            Ok(())
        }
        fn write_struct_end(&mut self) -> Result<()> {
            self.0.push("}".to_string());
            Ok(())
        }
    }

    fn record(value: &Value) -> Result<String> {
        let mut codec = Recorder::default();
        let bytes = serialize_with(value, &mut codec, &CodecOptions::new())?;
        Ok(String::from_utf8(bytes).unwrap_or_default())
    }

    #[test]
    fn test_walk_order() {
        let mut obj = StructMap::new();
        obj.set("b", Value::from(1));
        obj.set("a", Value::List(vec![Value::from("x"), Value::from(2)]));
        assert_eq!(
            record(&Value::Struct(obj)).unwrap(),
            "{ b= int:1 a= [2 str:x int:2 ] }"
        );
    }

    #[test]
    fn test_missing_capability_aborts_walk() {
        let value = Value::List(vec![Value::from(1), Value::from(true), Value::from(3)]);
        assert_eq!(
            record(&value).unwrap_err(),
            Error::unsupported("recorder", "write_bool")
        );
        assert!(record(&Value::Matrix(Matrix::default())).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::from(0);
        for _ in 0..5 {
            value = Value::List(vec![value]);
        }
        let mut codec = BinaryCodec::binary();
        let options = CodecOptions::new().with_max_depth(4);
        assert_eq!(
            serialize_with(&value, &mut codec, &options).unwrap_err(),
            Error::DepthLimitExceeded(4)
        );
        let options = CodecOptions::new().with_max_depth(5);
        assert!(serialize_with(&value, &mut codec, &options).is_ok());
    }

    #[test]
    fn test_value_serializer_enums() {
        #[derive(Serialize)]
        enum Shape {
            Empty,
            Circle(f64),
            Rect { w: i32, h: i32 },
            Pair(i32, i32),
        }

        assert_eq!(to_value(&Shape::Empty).unwrap(), Value::from("Empty"));
        assert_eq!(
            to_value(&Shape::Circle(1.5)).unwrap().struct_get("Circle"),
            Some(&Value::Float(1.5))
        );
        let rect = to_value(&Shape::Rect { w: 2, h: 3 }).unwrap();
        assert_eq!(
            rect.struct_get("Rect").and_then(|r| r.struct_get("h")),
            Some(&Value::Int(3))
        );
        let pair = to_value(&Shape::Pair(4, 5)).unwrap();
        assert_eq!(pair.struct_get("Pair").map(Value::list_size), Some(2));
    }

    #[test]
    fn test_value_serializer_rejects_none_and_unit() {
        assert!(matches!(
            to_value(&None::<i32>),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(to_value(&()), Err(Error::UnsupportedType(_))));
        assert_eq!(to_value(&Some(3)).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_value_serializer_unsigned() {
        assert_eq!(to_value(&7u8).unwrap(), Value::Int(7));
        assert_eq!(to_value(&u64::MAX).unwrap(), Value::Uint(u64::MAX));
    }
}
