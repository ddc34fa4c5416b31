//! Deserialization: rebuilding a [`Value`] tree from a codec.
//!
//! This module mirrors [`ser`](crate::ser):
//!
//! - [`Deserializer`]: the generic engine. It asks the codec what comes next
//!   (`read_peek`) and calls the matching read operation, recursing into containers.
//! - [`ValueDeserializer`]: a serde `Deserializer` over an owned [`Value`]; it backs
//!   [`from_value`](crate::from_value) and [`from_slice`](crate::from_slice).
//!
//! ## Usage
//!
//! ```rust
//! use polycodec::{read_str, Format, Value};
//!
//! let value = read_str(Format::Yaml, "name: Alice\nscores: [90, 85]\n").unwrap();
//! assert_eq!(value.struct_get("name"), Some(&Value::from("Alice")));
//! assert_eq!(value.struct_get("scores").map(Value::list_size), Some(2));
//! ```

use crate::{Codec, CodecOptions, Error, Kind, Result, StructMap, Value};
use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};
use tracing::trace;

/// Upper bound on capacity reserved from an untrusted element count.
const MAX_PREALLOC: usize = 4096;

/// The generic engine's read side.
pub struct Deserializer<'a, C: Codec + ?Sized> {
    codec: &'a mut C,
    max_depth: usize,
    depth: usize,
}

impl<'a, C: Codec + ?Sized> Deserializer<'a, C> {
    pub fn new(codec: &'a mut C, options: &CodecOptions) -> Self {
        Deserializer {
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

    /// Reads the next complete value.
    ///
    /// A list reads exactly the element count announced by `read_array_begin`.
    /// Struct entries are upserted, so a repeated key in the input keeps the last
    /// value at the position of the first.
    ///
    /// # Errors
    ///
    /// Any codec error, or [`Error::DepthLimitExceeded`]. The partially built tree
    /// is dropped.
    pub fn deserialize(&mut self) -> Result<Value> {
        match self.codec.read_peek()? {
            Kind::Int => self.codec.read_int().map(Value::Int),
            Kind::Uint => self.codec.read_uint().map(Value::Uint),
            Kind::Float => self.codec.read_float().map(Value::Float),
            Kind::String => self.codec.read_string().map(Value::String),
            Kind::Bool => self.codec.read_bool().map(Value::Bool),
            Kind::Matrix => self.codec.read_matrix().map(Value::Matrix),
            Kind::List => {
                self.enter()?;
                let size = self.codec.read_array_begin()?;
                trace!(
                    codec = self.codec.name(),
                    depth = self.depth,
                    size,
                    "read list"
                );
                let mut items = Vec::with_capacity(size.min(MAX_PREALLOC));
                for _ in 0..size {
                    items.push(self.deserialize()?);
                }
                self.codec.read_array_end()?;
                self.depth -= 1;
                Ok(Value::List(items))
            }
            Kind::Struct => {
                self.enter()?;
                self.codec.read_struct_begin()?;
                trace!(codec = self.codec.name(), depth = self.depth, "read struct");
                let mut map = StructMap::new();
                while let Some(key) = self.codec.read_struct_key()? {
                    let value = self.deserialize()?;
                    map.set(key, value);
                }
                self.codec.read_struct_end()?;
                self.depth -= 1;
                Ok(Value::Struct(map))
            }
        }
    }
}

/// Reads one value from an already initialised codec.
///
/// # Errors
///
/// See [`Deserializer::deserialize`].
pub fn deserialize<C: Codec + ?Sized>(codec: &mut C, options: &CodecOptions) -> Result<Value> {
    Deserializer::new(codec, options).deserialize()
}

/// Decodes one complete document: `init_read`, the walk, then `finish_read`.
///
/// # Errors
///
/// Any error raised by the codec or the walk.
pub fn deserialize_with<C: Codec + ?Sized>(
    input: &[u8],
    codec: &mut C,
    options: &CodecOptions,
) -> Result<Value> {
    codec.init_read(input)?;
    let value = deserialize(codec, options)?;
    codec.finish_read()?;
    Ok(value)
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: StructMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(self.variant.into_deserializer())?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::List(items)) => visitor.visit_seq(SeqDeserializer::new(items)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Struct(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

/// Serde deserializer that consumes an owned [`Value`].
///
/// A matrix is presented as a map with `dims` and `data` entries. `Option` fields
/// present in the tree are always `Some`.
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Uint(u) => visitor.visit_u64(u),
            Value::Float(f) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::List(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Struct(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Matrix(m) => {
                let (dims, data) = m.into_parts();
                let mut map = StructMap::with_capacity(2);
                let dims = dims.into_iter().map(|d| Value::Uint(d as u64)).collect();
                let data = data.into_iter().map(Value::Float).collect();
                map.set("dims", Value::List(dims));
                map.set("data", Value::List(data));
                visitor.visit_map(MapDeserializer::new(map))
            }
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Struct(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(Error::custom("expected enum variant")),
                }
            }
            other => Err(Error::type_mismatch("enum", other.kind().name())),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::BinaryCodec;
    use crate::{serialize_with, Matrix};
    use serde::Deserialize;

    fn from_value<T: de::DeserializeOwned>(value: Value) -> Result<T> {
        T::deserialize(ValueDeserializer::new(value))
    }

    /// Replays a fixed script of peeks; only lists and ints.
    struct Script {
        kinds: Vec<Kind>,
        sizes: Vec<usize>,
    }

    impl Codec for Script {
        fn name(&self) -> &'static str {
            "script"
        }
        fn finish_write(&mut self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn read_peek(&mut self) -> Result<Kind> {
            if self.kinds.is_empty() {
                return Err(Error::unexpected_eof(0, "value"));
            }
            Ok(self.kinds.remove(0))
        }
        fn read_int(&mut self) -> Result<i64> {
            Ok(1)
        }
        fn read_array_begin(&mut self) -> Result<usize> {
            Ok(self.sizes.remove(0))
        }
        fn read_array_end(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_list_reads_announced_count() {
        let mut codec = Script {
            kinds: vec![Kind::List, Kind::Int, Kind::Int],
            sizes: vec![2],
        };
        let value = deserialize(&mut codec, &CodecOptions::new()).unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(1), Value::Int(1)]));
    }

    #[test]
    fn test_error_mid_list_propagates() {
        let mut codec = Script {
            kinds: vec![Kind::List, Kind::Int],
            sizes: vec![usize::MAX],
        };
        assert!(matches!(
            deserialize(&mut codec, &CodecOptions::new()),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_unsupported_read() {
        let mut codec = Script {
            kinds: vec![Kind::Bool],
            sizes: vec![],
        };
        assert_eq!(
            deserialize(&mut codec, &CodecOptions::new()).unwrap_err(),
            Error::unsupported("script", "read_bool")
        );
    }

    #[test]
    fn test_depth_limit_on_read() {
        let mut value = Value::from(0);
        for _ in 0..10 {
            value = Value::List(vec![value]);
        }
        let mut codec = BinaryCodec::binary();
        let bytes = serialize_with(&value, &mut codec, &CodecOptions::new()).unwrap();

        let strict = CodecOptions::new().with_max_depth(9);
        assert_eq!(
            deserialize_with(&bytes, &mut codec, &strict).unwrap_err(),
            Error::DepthLimitExceeded(9)
        );
        assert_eq!(
            deserialize_with(&bytes, &mut codec, &CodecOptions::new()).unwrap(),
            value
        );
    }

    #[test]
    fn test_value_deserializer_struct() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct User {
            name: String,
            age: u8,
            nickname: Option<String>,
            email: Option<String>,
        }

        let mut map = StructMap::new();
        map.set("name", Value::from("Alice"));
        map.set("age", Value::from(30));
        map.set("nickname", Value::from("Al"));
        let user: User = from_value(Value::Struct(map)).unwrap();
        assert_eq!(
            user,
            User {
                name: "Alice".to_string(),
                age: 30,
                nickname: Some("Al".to_string()),
                email: None,
            }
        );
    }

    #[test]
    fn test_value_deserializer_enum() {
        #[derive(Deserialize, Debug, PartialEq)]
        enum Shape {
            Empty,
            Circle(f64),
            Rect { w: i32, h: i32 },
        }

        assert_eq!(
            from_value::<Shape>(Value::from("Empty")).unwrap(),
            Shape::Empty
        );

        let mut circle = StructMap::new();
        circle.set("Circle", Value::from(2.0));
        assert_eq!(
            from_value::<Shape>(Value::Struct(circle)).unwrap(),
            Shape::Circle(2.0)
        );

        let mut dims = StructMap::new();
        dims.set("w", Value::from(1));
        dims.set("h", Value::from(2));
        let mut rect = StructMap::new();
        rect.set("Rect", Value::Struct(dims));
        assert_eq!(
            from_value::<Shape>(Value::Struct(rect)).unwrap(),
            Shape::Rect { w: 1, h: 2 }
        );

        assert!(from_value::<Shape>(Value::from(3)).is_err());
    }

    #[test]
    fn test_value_deserializer_matrix() {
        #[derive(Deserialize)]
        struct Grid {
            dims: Vec<usize>,
            data: Vec<f64>,
        }

        let m = Matrix::from_data(vec![1, 2], vec![0.5, 1.5]).unwrap();
        let grid: Grid = from_value(Value::Matrix(m)).unwrap();
        assert_eq!(grid.dims, vec![1, 2]);
        assert_eq!(grid.data, vec![0.5, 1.5]);
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(from_value::<f64>(Value::Int(3)).unwrap(), 3.0);
        assert_eq!(from_value::<u64>(Value::Uint(u64::MAX)).unwrap(), u64::MAX);
        assert!(from_value::<u8>(Value::Int(300)).is_err());
    }
}
