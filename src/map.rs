//! Ordered map type for struct values.
//!
//! This module provides [`StructMap`], a wrapper around [`IndexMap`] that keeps
//! struct fields in insertion order. Order matters: every codec writes fields in
//! the order they were inserted, and a value read back from any format must
//! compare equal to the one that was written.
//!
//! Two insertion operations exist with different duplicate-key behaviour:
//!
//! - [`StructMap::add`] refuses a key that is already present
//! - [`StructMap::set`] replaces the existing value in place (upsert)
//!
//! ## Examples
//!
//! ```rust
//! use polycodec::{StructMap, Value};
//!
//! let mut map = StructMap::new();
//! map.add("name", Value::from("Alice")).unwrap();
//! map.add("age", Value::from(30)).unwrap();
//!
//! assert!(map.add("name", Value::from("Bob")).is_err());
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::{Error, Result, Value};
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of unique string keys to owned values.
///
/// # Examples
///
/// ```rust
/// use polycodec::{StructMap, Value};
///
/// let mut map = StructMap::new();
/// map.set("first", Value::from(1));
/// map.set("second", Value::from(2));
/// map.set("first", Value::from(10));
///
/// // Replacing a value keeps its original position
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// assert_eq!(map.get("first"), Some(&Value::from(10)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StructMap(IndexMap<String, Value>);

impl StructMap {
    /// Creates an empty `StructMap`.
    #[must_use]
    pub fn new() -> Self {
        StructMap(IndexMap::new())
    }

    /// Creates an empty `StructMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        StructMap(IndexMap::with_capacity(capacity))
    }

    /// Appends a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the key is already present; the map is
    /// left unchanged and `value` is dropped.
    pub fn add(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if self.0.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Inserts or replaces an entry.
    ///
    /// A replaced value keeps the position of the original entry and the old value
    /// is returned. New keys are appended.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes an entry and returns its value, keeping the order of the rest.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polycodec::{StructMap, Value};
    ///
    /// let mut map: StructMap = [("a", 1), ("b", 2), ("c", 3)]
    ///     .into_iter()
    ///     .map(|(k, v)| (k.to_string(), Value::from(v)))
    ///     .collect();
    ///
    /// assert_eq!(map.remove("a"), Some(Value::from(1)));
    /// assert_eq!(map.key_at(0), Some("b"));
    /// ```
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns the key stored at `index` in insertion order.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.0.get_index(index).map(|(k, _)| k.as_str())
    }

    /// Returns the value stored at `index` in insertion order.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.0.get_index(index).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value stored at `index`.
    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.0.get_index_mut(index).map(|(_, v)| v)
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns a mutable iterator over the key-value pairs, in insertion order.
    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, Value> {
        self.0.iter_mut()
    }
}

/// Two maps are equal when they hold equal entries in the same order.
impl PartialEq for StructMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl From<HashMap<String, Value>> for StructMap {
    fn from(map: HashMap<String, Value>) -> Self {
        StructMap(map.into_iter().collect())
    }
}

impl From<StructMap> for HashMap<String, Value> {
    fn from(map: StructMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for StructMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StructMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Later duplicates replace earlier ones in place, like repeated [`StructMap::set`].
impl FromIterator<(String, Value)> for StructMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        StructMap(IndexMap::from_iter(iter))
    }
}
