//! Dynamic value representation.
//!
//! This module provides the [`Value`] enum, the single object type every codec reads
//! and writes, and [`Kind`], its field-less discriminant.
//!
//! ## Core Types
//!
//! - [`Value`]: struct, list, signed/unsigned integer, float, string, bool or matrix
//! - [`Kind`]: which variant a value is (also what codecs report from `read_peek`)
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use polycodec::{value, Kind, Value};
//!
//! let empty_list = Value::new(Kind::List);
//! let number = Value::from(42);
//! let text = Value::from("hello");
//!
//! let obj = value!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert_eq!(obj.struct_size(), 2);
//! ```
//!
//! ### Typed Access
//!
//! Getters never fail: on a variant mismatch they return the type's default, so
//! `get_uint` on an `Int` is `0`. The `coerce_*` accessors convert between `Int`,
//! `Uint` and `Float` when the number is exactly representable. Setters refuse a
//! mismatch.
//!
//! ```rust
//! use polycodec::Value;
//!
//! let mut value = Value::from(42);
//! assert_eq!(value.get_int(), 42);
//! assert_eq!(value.get_uint(), 0);
//! assert_eq!(value.coerce_u64(), Some(42));
//! assert_eq!(value.get_string(), "");
//!
//! assert!(value.set_int(7).is_ok());
//! assert!(value.set_string("seven").is_err());
//! assert_eq!(value.get_int(), 7);
//! ```
//!
//! ### Converting from Rust Types
//!
//! ```rust
//! use polycodec::{to_value, Value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value: Value = to_value(&Point { x: 10, y: 20 }).unwrap();
//! assert_eq!(value.struct_get("x"), Some(&Value::Int(10)));
//! ```

use crate::{Error, Matrix, Result, StructMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The variant of a [`Value`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Struct,
    List,
    Int,
    Uint,
    Float,
    String,
    Bool,
    Matrix,
}

impl Kind {
    /// Lower-case name used in error messages and by the XML codec.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Struct => "struct",
            Kind::List => "list",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Bool => "bool",
            Kind::Matrix => "matrix",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically-typed tree of data that any codec can encode.
///
/// Containers own their children: inserting moves the child in, removing hands it
/// back, and dropping a container drops the whole subtree. `clone()` produces a
/// fully independent deep copy.
///
/// # Examples
///
/// ```rust
/// use polycodec::{Kind, Value};
///
/// let mut list = Value::new(Kind::List);
/// list.list_push(Value::from(1)).unwrap();
/// list.list_push(Value::from("two")).unwrap();
///
/// assert_eq!(list.list_size(), 2);
/// assert_eq!(list.list_get(1).map(Value::kind), Some(Kind::String));
/// assert!(list.list_get(2).is_none());
/// ```
#[derive(Clone, Debug)]
pub enum Value {
    Struct(StructMap),
    List(Vec<Value>),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bool(bool),
    Matrix(Matrix),
}

fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn float_to_u64(f: f64) -> Option<u64> {
    if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn int_to_f64(i: i64) -> Option<f64> {
    let f = i as f64;
    (float_to_i64(f) == Some(i)).then_some(f)
}

fn uint_to_f64(u: u64) -> Option<f64> {
    let f = u as f64;
    (float_to_u64(f) == Some(u)).then_some(f)
}

impl Value {
    /// Creates the empty or zero value of a variant.
    ///
    /// A new matrix is a single-element `[1]` matrix holding `0.0`.
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        match kind {
            Kind::Struct => Value::Struct(StructMap::new()),
            Kind::List => Value::List(Vec::new()),
            Kind::Int => Value::Int(0),
            Kind::Uint => Value::Uint(0),
            Kind::Float => Value::Float(0.0),
            Kind::String => Value::String(String::new()),
            Kind::Bool => Value::Bool(false),
            Kind::Matrix => Value::Matrix(Matrix::default()),
        }
    }

    /// Returns the variant of this value.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Value::Struct(_) => Kind::Struct,
            Value::List(_) => Kind::List,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Bool(_) => Kind::Bool,
            Value::Matrix(_) => Kind::Matrix,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_struct(&self) -> bool {
        matches!(self, Value::Struct(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Returns `true` for `Int`, `Uint` and `Float`.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Uint(_) | Value::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_matrix(&self) -> bool {
        matches!(self, Value::Matrix(_))
    }

    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Any numeric variant as an `i64`, when the number is exactly representable.
    ///
    /// Unlike [`as_i64`](Self::as_i64), this accepts `Uint` and whole `Float` values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::Value;
    ///
    /// assert_eq!(Value::Uint(7).coerce_i64(), Some(7));
    /// assert_eq!(Value::Uint(u64::MAX).coerce_i64(), None);
    /// assert_eq!(Value::Float(2.0).coerce_i64(), Some(2));
    /// assert_eq!(Value::Float(2.5).coerce_i64(), None);
    /// ```
    #[must_use]
    pub fn coerce_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            Value::Float(f) => float_to_i64(*f),
            _ => None,
        }
    }

    /// Any numeric variant as a `u64`: non-negative `Int` and whole `Float` values.
    #[must_use]
    pub fn coerce_u64(&self) -> Option<u64> {
        match self {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::Uint(u) => Some(*u),
            Value::Float(f) => float_to_u64(*f),
            _ => None,
        }
    }

    /// Any numeric variant as an `f64`, for integers that an `f64` holds exactly.
    #[must_use]
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => int_to_f64(*i),
            Value::Uint(u) => uint_to_f64(*u),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_struct(&self) -> Option<&StructMap> {
        match self {
            Value::Struct(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    #[inline]
    pub fn as_matrix_mut(&mut self) -> Option<&mut Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_int(&self) -> i64 {
        self.as_i64().unwrap_or(0)
    }

    #[must_use]
    pub fn get_uint(&self) -> u64 {
        self.as_u64().unwrap_or(0)
    }

    #[must_use]
    pub fn get_float(&self) -> f64 {
        self.as_f64().unwrap_or(0.0)
    }

    #[must_use]
    pub fn get_bool(&self) -> bool {
        self.as_bool().unwrap_or(false)
    }

    #[must_use]
    pub fn get_string(&self) -> &str {
        self.as_str().unwrap_or("")
    }

    fn mismatch(&self, expected: Kind) -> Error {
        Error::type_mismatch(expected.name(), self.kind().name())
    }

    /// Overwrites an `Int` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] without modifying any other variant.
    pub fn set_int(&mut self, v: i64) -> Result<()> {
        match self {
            Value::Int(i) => {
                *i = v;
                Ok(())
            }
            _ => Err(self.mismatch(Kind::Int)),
        }
    }

    /// Overwrites a `Uint` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] without modifying any other variant.
    pub fn set_uint(&mut self, v: u64) -> Result<()> {
        match self {
            Value::Uint(u) => {
                *u = v;
                Ok(())
            }
            _ => Err(self.mismatch(Kind::Uint)),
        }
    }

    /// Overwrites a `Float` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] without modifying any other variant.
    pub fn set_float(&mut self, v: f64) -> Result<()> {
        match self {
            Value::Float(f) => {
                *f = v;
                Ok(())
            }
            _ => Err(self.mismatch(Kind::Float)),
        }
    }

    /// Overwrites a `Bool` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] without modifying any other variant.
    pub fn set_bool(&mut self, v: bool) -> Result<()> {
        match self {
            Value::Bool(b) => {
                *b = v;
                Ok(())
            }
            _ => Err(self.mismatch(Kind::Bool)),
        }
    }

    /// Overwrites a `String` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] without modifying any other variant.
    pub fn set_string(&mut self, v: impl Into<String>) -> Result<()> {
        match self {
            Value::String(s) => {
                *s = v.into();
                Ok(())
            }
            _ => Err(self.mismatch(Kind::String)),
        }
    }

    fn list_mut(&mut self) -> Result<&mut Vec<Value>> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(other.mismatch(Kind::List)),
        }
    }

    fn struct_mut(&mut self) -> Result<&mut StructMap> {
        match self {
            Value::Struct(map) => Ok(map),
            other => Err(other.mismatch(Kind::Struct)),
        }
    }

    /// Number of list elements; `0` for any other variant.
    #[must_use]
    pub fn list_size(&self) -> usize {
        self.as_list().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn list_get(&self, index: usize) -> Option<&Value> {
        self.as_list().and_then(|items| items.get(index))
    }

    pub fn list_get_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            Value::List(items) => items.get_mut(index),
            _ => None,
        }
    }

    /// Replaces the element at `index`, dropping the previous one.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this is not a list, [`Error::IndexOutOfBounds`] if
    /// `index` is past the end.
    pub fn list_set(&mut self, index: usize, value: Value) -> Result<()> {
        let items = self.list_mut()?;
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Inserts at `index`, shifting later elements; `index == len` appends.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this is not a list, [`Error::IndexOutOfBounds`] if
    /// `index > len`.
    pub fn list_insert(&mut self, index: usize, value: Value) -> Result<()> {
        let items = self.list_mut()?;
        if index > items.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: items.len(),
            });
        }
        items.insert(index, value);
        Ok(())
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this is not a list, [`Error::IndexOutOfBounds`] if
    /// `index` is past the end.
    pub fn list_remove(&mut self, index: usize) -> Result<Value> {
        let items = self.list_mut()?;
        if index >= items.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: items.len(),
            });
        }
        Ok(items.remove(index))
    }

    /// Appends to a list.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this is not a list.
    pub fn list_push(&mut self, value: Value) -> Result<()> {
        self.list_mut()?.push(value);
        Ok(())
    }

    /// Removes the last element; `None` for an empty list or any other variant.
    pub fn list_pop(&mut self) -> Option<Value> {
        match self {
            Value::List(items) => items.pop(),
            _ => None,
        }
    }

    /// Number of struct entries; `0` for any other variant.
    #[must_use]
    pub fn struct_size(&self) -> usize {
        self.as_struct().map_or(0, StructMap::len)
    }

    #[must_use]
    pub fn struct_has(&self, key: &str) -> bool {
        self.as_struct().map_or(false, |map| map.contains_key(key))
    }

    #[must_use]
    pub fn struct_get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|map| map.get(key))
    }

    pub fn struct_get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Struct(map) => map.get_mut(key),
            _ => None,
        }
    }

    #[must_use]
    pub fn struct_key_at(&self, index: usize) -> Option<&str> {
        self.as_struct().and_then(|map| map.key_at(index))
    }

    #[must_use]
    pub fn struct_value_at(&self, index: usize) -> Option<&Value> {
        self.as_struct().and_then(|map| map.value_at(index))
    }

    /// Adds a new struct entry.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this is not a struct, [`Error::DuplicateKey`] if the
    /// key is already present (the struct is left unchanged).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::{Kind, Value};
    ///
    /// let mut obj = Value::new(Kind::Struct);
    /// obj.struct_add("k", Value::from(1)).unwrap();
    /// assert!(obj.struct_add("k", Value::from(2)).is_err());
    /// assert_eq!(obj.struct_size(), 1);
    /// ```
    pub fn struct_add(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        self.struct_mut()?.add(key, value)
    }

    /// Inserts or replaces a struct entry, returning the replaced value.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this is not a struct.
    pub fn struct_set(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        Ok(self.struct_mut()?.set(key, value))
    }

    /// Removes a struct entry; `None` if absent or if this is not a struct.
    pub fn struct_remove(&mut self, key: &str) -> Option<Value> {
        match self {
            Value::Struct(map) => map.remove(key),
            _ => None,
        }
    }
}

/// Structural equality; floats compare by bit pattern.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Matrix(a), Value::Matrix(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Struct(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Matrix(m) => write!(f, "matrix{:?}", m.dims()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Uint(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::List(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Struct(map) => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Matrix(m) => {
                use serde::ser::SerializeStruct;
                let mut out = serializer.serialize_struct("Matrix", 2)?;
                out.serialize_field("dims", m.dims())?;
                out.serialize_field("data", m.data())?;
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a struct, list, number, string or bool")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::Int(value))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(i64::try_from(value).map_or(Value::Uint(value), Value::Int))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                Err(E::custom("null has no representation in the object model"))
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = StructMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    values.set(key, value);
                }
                Ok(Value::Struct(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .coerce_i64()
            .ok_or_else(|| Error::type_mismatch("int", value.kind().name()))
    }
}

impl TryFrom<Value> for u64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .coerce_u64()
            .ok_or_else(|| Error::type_mismatch("uint", value.kind().name()))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .coerce_f64()
            .ok_or_else(|| Error::type_mismatch("float", value.kind().name()))
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch("bool", value.kind().name()))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::type_mismatch("string", other.kind().name())),
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::Int(value as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::Uint(value as u64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<StructMap> for Value {
    fn from(value: StructMap) -> Self {
        Value::Struct(value)
    }
}

impl From<Matrix> for Value {
    fn from(value: Matrix) -> Self {
        Value::Matrix(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_by_kind() {
        for kind in [
            Kind::Struct,
            Kind::List,
            Kind::Int,
            Kind::Uint,
            Kind::Float,
            Kind::String,
            Kind::Bool,
            Kind::Matrix,
        ] {
            assert_eq!(Value::new(kind).kind(), kind);
        }
        assert_eq!(
            Value::new(Kind::Matrix).as_matrix().map(Matrix::total_size),
            Some(1)
        );
    }

    #[test]
    fn test_getters_default_on_mismatch() {
        let s = Value::from("text");
        assert_eq!(s.get_int(), 0);
        assert_eq!(s.get_uint(), 0);
        assert_eq!(s.get_float(), 0.0);
        assert!(!s.get_bool());

        let n = Value::from(1);
        assert_eq!(n.get_string(), "");
        assert!(!n.get_bool());
    }

    #[test]
    fn test_numeric_getters_are_strict() {
        assert_eq!(Value::Float(2.0).get_int(), 0);
        assert_eq!(Value::Int(5).get_uint(), 0);
        assert_eq!(Value::Uint(5).get_int(), 0);
        assert_eq!(Value::Int(5).get_float(), 0.0);
        assert_eq!(Value::Uint(u64::MAX).get_uint(), u64::MAX);
        assert_eq!(Value::Float(3.25).get_float(), 3.25);
        assert_eq!(Value::Int(5).as_u64(), None);
        assert_eq!(Value::Uint(5).as_f64(), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(-5).coerce_u64(), None);
        assert_eq!(Value::Int(5).coerce_u64(), Some(5));
        assert_eq!(Value::Uint(u64::MAX).coerce_i64(), None);
        assert_eq!(Value::Float(3.0).coerce_i64(), Some(3));
        assert_eq!(Value::Float(3.25).coerce_i64(), None);
        assert_eq!(Value::Float(f64::NAN).coerce_i64(), None);
        assert_eq!(Value::Int(i64::MAX).coerce_f64(), None);
        assert_eq!(Value::Int(1 << 53).coerce_f64(), Some(9007199254740992.0));
    }

    #[test]
    fn test_setters_refuse_mismatch() {
        let mut v = Value::Int(1);
        assert!(matches!(v.set_float(2.0), Err(Error::TypeMismatch { .. })));
        assert!(v.set_bool(true).is_err());
        assert_eq!(v, Value::Int(1));

        let mut s = Value::new(Kind::String);
        s.set_string("hi").unwrap();
        assert_eq!(s.get_string(), "hi");
    }

    #[test]
    fn test_list_ops() {
        let mut list = Value::new(Kind::List);
        list.list_push(Value::from(1)).unwrap();
        list.list_push(Value::from(3)).unwrap();
        list.list_insert(1, Value::from(2)).unwrap();
        assert_eq!(list.list_size(), 3);
        assert_eq!(list.list_get(1), Some(&Value::Int(2)));

        assert!(list.list_insert(5, Value::from(0)).is_err());
        assert!(list.list_set(3, Value::from(0)).is_err());
        list.list_set(0, Value::from("one")).unwrap();

        assert_eq!(list.list_remove(1).unwrap(), Value::Int(2));
        assert!(matches!(
            list.list_remove(9),
            Err(Error::IndexOutOfBounds { index: 9, len: 2 })
        ));
        assert_eq!(list.list_pop(), Some(Value::Int(3)));
        assert_eq!(list.list_pop(), Some(Value::from("one")));
        assert_eq!(list.list_pop(), None);

        let mut not_list = Value::from(true);
        assert!(not_list.list_push(Value::from(1)).is_err());
        assert_eq!(not_list.list_size(), 0);
        assert_eq!(not_list.list_pop(), None);
    }

    #[test]
    fn test_struct_ops() {
        let mut obj = Value::new(Kind::Struct);
        obj.struct_add("a", Value::from(1)).unwrap();
        obj.struct_add("b", Value::from(2)).unwrap();
        assert!(obj.struct_add("a", Value::from(9)).is_err());
        assert_eq!(obj.struct_size(), 2);

        assert_eq!(
            obj.struct_set("a", Value::from(10)).unwrap(),
            Some(Value::Int(1))
        );
        assert_eq!(obj.struct_key_at(0), Some("a"));
        assert_eq!(obj.struct_value_at(0), Some(&Value::Int(10)));
        assert!(obj.struct_has("b"));

        assert_eq!(obj.struct_remove("a"), Some(Value::Int(10)));
        assert!(!obj.struct_has("a"));
        assert_eq!(obj.struct_key_at(0), Some("b"));

        let mut not_struct = Value::from(1);
        assert!(not_struct.struct_set("k", Value::from(1)).is_err());
        assert_eq!(not_struct.struct_get("k"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut inner = Value::new(Kind::Struct);
        inner.struct_add("n", Value::from(1)).unwrap();
        let mut original = Value::new(Kind::List);
        original.list_push(inner).unwrap();

        let mut copy = original.clone();
        copy.list_get_mut(0)
            .and_then(|v| v.struct_get_mut("n"))
            .map(|n| n.set_int(99))
            .transpose()
            .unwrap();

        assert_eq!(
            original.list_get(0).and_then(|v| v.struct_get("n")),
            Some(&Value::Int(1))
        );
        assert_eq!(
            copy.list_get(0).and_then(|v| v.struct_get("n")),
            Some(&Value::Int(99))
        );
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Int(1), Value::Uint(1));
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(Value::Uint(4)).unwrap(), 4);
        assert_eq!(f64::try_from(Value::Int(4)).unwrap(), 4.0);
        assert!(bool::try_from(Value::Int(1)).is_err());
        assert_eq!(String::try_from(Value::from("x")).unwrap(), "x");
    }
}
