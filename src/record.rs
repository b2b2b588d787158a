//! Named objects.
//!
//! A Sigma named object such as `point{x=1,y=2}` is held in the dynamic model
//! as an [`Object`]: the serialized type name of the Rust struct plus its
//! fields in declared order. The Rust side is any struct that derives serde's
//! `Serialize` and `Deserialize` and implements `Default`; serializing the
//! default instance yields the field table, and deserializing from an
//! `Object` narrows each field into its declared type.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use sigma::{to_value, Value};
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! let object = value.as_object().unwrap();
//! assert_eq!(object.name(), "Point");
//! assert_eq!(object.get("y"), Some(&Value::from(2)));
//! ```

use crate::value::OBJECT_TOKEN;
use crate::{Map, Value};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A record held inside a [`Value`]: a type name and ordered fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Object {
    name: String,
    fields: Vec<(String, Value)>,
}

impl Object {
    /// An object of type `name` with no fields.
    #[must_use]
    pub fn new<N: Into<String>>(name: N) -> Self {
        Object {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field, or replaces it if the name is already present.
    #[must_use]
    pub fn with_field<N: Into<String>>(mut self, name: N, value: Value) -> Self {
        let name = name.into();
        if !self.set(&name, value.clone()) {
            self.fields.push((name, value));
        }
        self
    }

    /// The serialized type name (the Rust struct name unless renamed).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fields in declared order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Replaces the value of an existing field. Returns `false` if the object
    /// has no field called `field`.
    pub fn set(&mut self, field: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn push(&mut self, field: &str, value: Value) {
        self.fields.push((field.to_string(), value));
    }

    #[must_use]
    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }

    /// `{name: {field: value, ...}}`, the serde shape of an object.
    pub(crate) fn into_body(self) -> Value {
        let fields: Map = self
            .fields
            .into_iter()
            .map(|(name, value)| (Value::String(name), value))
            .collect();
        let mut body = Map::new();
        body.insert(Value::String(self.name), Value::Map(fields));
        Value::Map(body)
    }

    pub(crate) fn from_body(body: Value) -> Option<Self> {
        let Value::Map(body) = body else {
            return None;
        };
        if body.len() != 1 {
            return None;
        }
        let (name, fields) = body.into_iter().next()?;
        let (Value::String(name), Value::Map(fields)) = (name, fields) else {
            return None;
        };
        let fields = fields
            .into_iter()
            .map(|(field, value)| match field {
                Value::String(field) => Some((field, value)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Object { name, fields })
    }
}

struct Fields<'a>(&'a [(String, Value)]);

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct Body<'a>(&'a Object);

impl Serialize for Body<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.0.name, &Fields(&self.0.fields))?;
        map.end()
    }
}

/// Other formats see `{name: {field: value, ...}}`.
impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(OBJECT_TOKEN, &Body(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Object {
        Object::new("Sample")
            .with_field("count", Value::from(3))
            .with_field("label", Value::from("x"))
    }

    #[test]
    fn test_fields_in_declared_order() {
        let names: Vec<_> = sample().fields().iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["count", "label"]);
    }

    #[test]
    fn test_set_known_field_only() {
        let mut object = sample();
        assert!(object.set("count", Value::from(9)));
        assert!(!object.set("missing", Value::Null));
        assert_eq!(object.get("count"), Some(&Value::from(9)));
        assert_eq!(object.fields().len(), 2);
    }

    #[test]
    fn test_body_shape() {
        let object = sample();
        let body = object.clone().into_body();
        assert_eq!(Object::from_body(body), Some(object));
        assert_eq!(Object::from_body(Value::from(1)), None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(&sample()).unwrap();
        assert_eq!(json, serde_json::json!({ "Sample": { "count": "3", "label": "x" } }));
    }
}
