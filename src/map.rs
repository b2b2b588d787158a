//! Ordered map type for Sigma maps.
//!
//! Sigma map keys may be any value, not only strings: `{1=2,"3"=4}` is a map
//! with a number key and a string key. [`Map`] wraps an [`IndexMap`] keyed by
//! [`Value`](crate::Value) so that entries are written back in the order they
//! were read.
//!
//! ## Examples
//!
//! ```rust
//! use sigma::{Map, Value};
//!
//! let mut map = Map::new();
//! map.insert(Value::from(1), Value::from(2));
//! map.insert(Value::from("3"), Value::from(4));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&Value::from("3")), Some(&Value::from(4)));
//! ```

use crate::Value;
use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An insertion-ordered map from values to values.
///
/// Inserting a key equal to an existing one replaces its value in place, so
/// the last write wins while the original position is kept.
///
/// # Examples
///
/// ```rust
/// use sigma::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert(Value::from("first"), Value::from(1));
/// map.insert(Value::from("second"), Value::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec![Value::from("first"), Value::from("second")]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Map(IndexMap<Value, Value>);

impl Map {
    /// Creates an empty `Map`.
    #[must_use]
    pub fn new() -> Self {
        Map(IndexMap::new())
    }

    /// Creates an empty `Map` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Map(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sigma::{Map, Value};
    ///
    /// let mut map = Map::new();
    /// assert!(map.insert(Value::from("key"), Value::from(42)).is_none());
    /// assert!(map.insert(Value::from("key"), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.get(key)
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
    pub fn keys(&self) -> indexmap::map::Keys<'_, Value, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, Value, Value> {
        self.0.values()
    }

    /// Returns an iterator over the entries of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, Value, Value> {
        self.0.iter()
    }
}

// Entry order is ignored by equality, so it is ignored here as well.
impl Hash for Map {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.0.len());
        let mut combined: u64 = 0;
        for (k, v) in &self.0 {
            let mut entry = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut entry);
            v.hash(&mut entry);
            combined = combined.wrapping_add(entry.finish());
        }
        state.write_u64(combined);
    }
}

impl IntoIterator for Map {
    type Item = (Value, Value);
    type IntoIter = indexmap::map::IntoIter<Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a Value, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Value, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        Map(IndexMap::from_iter(iter))
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct MapVisitor;

impl<'de> Visitor<'de> for MapVisitor {
    type Value = Map;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Map, A::Error> {
        let mut map = Map::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for Map {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MapVisitor)
    }
}
