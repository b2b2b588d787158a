//! Mapping between named-object identifiers and Rust record types.
//!
//! The reader needs to know which Rust type to build for `point{...}`, and the
//! writer needs the identifier to emit for a `Point`. Both directions live in
//! a [`TypeRegistry`]. The crate-level entry points use the process-wide
//! registry returned by [`TypeRegistry::global`]; `Reader` and `Writer` can be
//! pointed at any other instance.
//!
//! A record type is any struct with serde's `Serialize` and `Deserialize`
//! plus `Default`. Types are keyed by their serialized struct name, so two
//! registered types must not share one.

use crate::{to_value, Error, Object, Result, Value};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// A registered record type.
#[derive(Clone, Debug)]
pub struct RecordType {
    type_name: String,
    rust_name: &'static str,
    template: fn() -> Result<Object>,
    bind: fn(Object) -> Result<Object>,
}

fn template<T: Serialize + Default>() -> Result<Object> {
    match to_value(&T::default())? {
        Value::Object(object) => Ok(object),
        other => Err(Error::coerce(other.kind(), std::any::type_name::<T>())),
    }
}

fn bind<T: Serialize + DeserializeOwned>(object: Object) -> Result<Object> {
    let typed: T = crate::from_value(Value::Object(object))?;
    match to_value(&typed)? {
        Value::Object(object) => Ok(object),
        other => Err(Error::coerce(other.kind(), std::any::type_name::<T>())),
    }
}

impl RecordType {
    fn of<T: Serialize + DeserializeOwned + Default>() -> Result<Self> {
        let object = template::<T>()?;
        Ok(RecordType {
            type_name: object.name().to_string(),
            rust_name: std::any::type_name::<T>(),
            template: template::<T>,
            bind: bind::<T>,
        })
    }

    /// The serialized struct name, which is what [`Object::name`] reports.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The full Rust type path.
    #[must_use]
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// An object holding the fields of the type's default instance.
    ///
    /// # Errors
    ///
    /// Fails if the default instance cannot be serialized.
    pub fn instantiate(&self) -> Result<Object> {
        (self.template)()
    }

    /// Runs `object` through the Rust type, narrowing every field into its
    /// declared type.
    ///
    /// # Errors
    ///
    /// Fails with "unable to set property" naming the first field whose value
    /// does not fit.
    pub fn bind(&self, object: Object) -> Result<Object> {
        (self.bind)(object)
    }
}

#[derive(Default)]
struct Tables {
    by_identifier: HashMap<String, RecordType>,
    by_type: HashMap<String, String>,
}

/// Bidirectional identifier/type mapping, safe to share between threads.
///
/// Registration is one-to-one: re-registering an identifier or a type drops
/// whatever it was previously paired with.
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use sigma::TypeRegistry;
///
/// #[derive(Serialize, Deserialize, Default)]
/// struct Model { i: i32 }
///
/// let registry = TypeRegistry::new();
/// registry.register::<Model>("model").unwrap();
///
/// let ty = registry.lookup_type("model").unwrap();
/// assert_eq!(ty.type_name(), "Model");
/// assert_eq!(registry.lookup_identifier("Model").as_deref(), Some("model"));
///
/// registry.clear();
/// assert!(registry.lookup_type("model").is_none());
/// ```
#[derive(Default)]
pub struct TypeRegistry {
    tables: RwLock<Tables>,
}

lazy_static! {
    static ref GLOBAL: TypeRegistry = TypeRegistry::new();
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the crate-level functions.
    #[must_use]
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Binds `identifier` to `T` in both directions.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not serialize as a struct.
    pub fn register<T>(&self, identifier: &str) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let ty = RecordType::of::<T>()?;
        let mut tables = self.tables.write();
        if let Some(previous) = tables.by_identifier.remove(identifier) {
            tables.by_type.remove(&previous.type_name);
        }
        if let Some(previous) = tables.by_type.remove(&ty.type_name) {
            tables.by_identifier.remove(&previous);
        }
        debug!(identifier, type_name = ty.rust_name, "registered object type");
        tables
            .by_type
            .insert(ty.type_name.clone(), identifier.to_string());
        tables.by_identifier.insert(identifier.to_string(), ty);
        Ok(())
    }

    /// The type bound to `identifier`.
    #[must_use]
    pub fn lookup_type(&self, identifier: &str) -> Option<RecordType> {
        self.tables.read().by_identifier.get(identifier).cloned()
    }

    /// The identifier bound to the type serialized as `type_name`.
    #[must_use]
    pub fn lookup_identifier(&self, type_name: &str) -> Option<String> {
        self.tables.read().by_type.get(type_name).cloned()
    }

    /// Removes every registration.
    pub fn clear(&self) {
        let mut tables = self.tables.write();
        let count = tables.by_identifier.len();
        tables.by_identifier.clear();
        tables.by_type.clear();
        debug!(count, "cleared object type registry");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.read().by_identifier.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registers `T` under `identifier` in the global registry.
///
/// # Errors
///
/// Fails if `T` does not serialize as a struct.
pub fn register<T>(identifier: &str) -> Result<()>
where
    T: Serialize + DeserializeOwned + Default,
{
    TypeRegistry::global().register::<T>(identifier)
}

/// Empties the global registry.
pub fn unregister_all() {
    TypeRegistry::global().clear();
}
