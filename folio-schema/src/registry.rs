//! Named type registry
//!
//! Maps a namespace string to a concrete Rust type so that a JSON payload can
//! be turned back into the right type at runtime. The registry is an explicit
//! object built once at startup and shared read-only afterwards; nothing is
//! registered through global state.
//!
//! Every named value is encoded with a `__ns__` discriminator field. When a
//! payload carries a discriminator that resolves, that type is built;
//! otherwise the statically expected type is used.

use crate::error::{SchemaError, SchemaResult};
use crate::named::{from_tagged_value, to_tagged_value};
use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Field carrying the namespace of an encoded named value
pub const DISCRIMINATOR: &str = "__ns__";

/// A type that can be registered under a namespace
pub trait NamedType:
    Serialize + DeserializeOwned + JsonSchema + Debug + Send + Sync + 'static
{
    /// Globally unique namespace of the type
    const NAMESPACE: &'static str;
}

/// Object-safe view of a decoded named value
pub trait NamedValue: Debug + Send + Sync {
    fn namespace(&self) -> &'static str;

    /// Encoded form including the discriminator
    fn to_json(&self) -> SchemaResult<JsonValue>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: NamedType> NamedValue for T {
    fn namespace(&self) -> &'static str {
        T::NAMESPACE
    }

    fn to_json(&self) -> SchemaResult<JsonValue> {
        to_tagged_value(self).map_err(|e| SchemaError::Encode(e.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<'a> dyn NamedValue + 'a {
    pub fn downcast_ref<T: NamedType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

type DecodeFn = fn(JsonValue) -> SchemaResult<Box<dyn NamedValue>>;
type SchemaFn = fn() -> JsonValue;

/// Registry entry for one named type
#[derive(Clone, Copy)]
pub struct TypeEntry {
    namespace: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
    schema: SchemaFn,
}

impl TypeEntry {
    fn of<T: NamedType>() -> Self {
        Self {
            namespace: T::NAMESPACE,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            decode: decode_named::<T>,
            schema: named_schema::<T>,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: NamedType>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Build an instance of this type from a payload
    pub fn decode(&self, value: JsonValue) -> SchemaResult<Box<dyn NamedValue>> {
        (self.decode)(value)
    }

    /// Draft-07 schema of this type, including the discriminator property
    pub fn schema(&self) -> JsonValue {
        (self.schema)()
    }
}

impl Debug for TypeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeEntry")
            .field("namespace", &self.namespace)
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn decode_named<T: NamedType>(value: JsonValue) -> SchemaResult<Box<dyn NamedValue>> {
    from_tagged_value::<T>(value)
        .map(|decoded| Box::new(decoded) as Box<dyn NamedValue>)
        .map_err(|e| SchemaError::decode(T::NAMESPACE, e))
}

fn named_schema<T: NamedType>() -> JsonValue {
    let generator = SchemaSettings::draft07().into_generator();
    let mut schema = generator.into_root_schema_for::<T>().to_value();

    if let Some(object) = schema.as_object_mut() {
        object.remove("description");
        if object.get("type").and_then(JsonValue::as_str) == Some("object") {
            let properties = object
                .entry("properties")
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if let Some(properties) = properties.as_object_mut() {
                properties.insert(
                    DISCRIMINATOR.to_string(),
                    json!({"type": "string", "const": T::NAMESPACE}),
                );
            }
            let required = object
                .entry("required")
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            if let Some(required) = required.as_array_mut() {
                if !required.iter().any(|r| r == DISCRIMINATOR) {
                    required.push(JsonValue::String(DISCRIMINATOR.to_string()));
                }
            }
        }
    }

    schema
}

/// Namespace to type mapping
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<&'static str, TypeEntry>,
    conflicts: HashMap<&'static str, Vec<&'static str>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its namespace
    ///
    /// Registering the same type twice is a no-op. Registering a different
    /// type under a taken namespace is recorded as a conflict, which is
    /// reported the first time that namespace is resolved.
    pub fn register<T: NamedType>(&mut self) -> &mut Self {
        let entry = TypeEntry::of::<T>();
        match self.entries.get(entry.namespace) {
            Some(existing) if existing.type_id == entry.type_id => {}
            Some(existing) => {
                warn!(
                    namespace = entry.namespace,
                    existing = existing.type_name,
                    duplicate = entry.type_name,
                    "Conflicting registration for namespace"
                );
                let types = self
                    .conflicts
                    .entry(entry.namespace)
                    .or_insert_with(|| vec![existing.type_name]);
                if !types.contains(&entry.type_name) {
                    types.push(entry.type_name);
                }
            }
            None => {
                self.entries.insert(entry.namespace, entry);
            }
        }
        self
    }

    /// Builder form of [`TypeRegistry::register`]
    pub fn with<T: NamedType>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn resolve(&self, namespace: &str) -> SchemaResult<&TypeEntry> {
        if let Some(types) = self.conflicts.get(namespace) {
            return Err(SchemaError::NamespaceConflict {
                namespace: namespace.to_string(),
                types: types.clone(),
            });
        }
        self.entries
            .get(namespace)
            .ok_or_else(|| SchemaError::KeyNotFound(namespace.to_string()))
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.entries.contains_key(namespace)
    }

    /// Registered namespaces in sorted order
    pub fn namespaces(&self) -> Vec<&'static str> {
        let mut namespaces: Vec<_> = self.entries.keys().copied().collect();
        namespaces.sort_unstable();
        namespaces
    }

    pub fn schema_for(&self, namespace: &str) -> SchemaResult<JsonValue> {
        Ok(self.resolve(namespace)?.schema())
    }

    /// Decode a payload that must name its own type
    pub fn decode(&self, value: JsonValue) -> SchemaResult<Box<dyn NamedValue>> {
        let namespace = discriminator_of(&value)
            .ok_or(SchemaError::MissingDiscriminator(DISCRIMINATOR))?
            .to_string();
        self.resolve(&namespace)?.decode(value)
    }

    /// Decode a payload expected to be of type `namespace`
    ///
    /// A discriminator in the payload takes precedence over `namespace`
    /// when it names a registered type. An unregistered discriminator is
    /// dropped and the payload is decoded as `namespace`.
    pub fn decode_as_namespace(
        &self,
        namespace: &str,
        mut value: JsonValue,
    ) -> SchemaResult<Box<dyn NamedValue>> {
        if let Some(tagged) = discriminator_of(&value).map(str::to_string) {
            match self.resolve(&tagged) {
                Ok(entry) => return entry.decode(value),
                Err(SchemaError::KeyNotFound(_)) => {
                    debug!(
                        namespace,
                        tagged = %tagged,
                        "Unregistered discriminator, decoding as expected type"
                    );
                    if let Some(map) = value.as_object_mut() {
                        map.remove(DISCRIMINATOR);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        self.resolve(namespace)?.decode(value)
    }

    /// Decode a payload into the concrete type `T`
    pub fn decode_as<T: NamedType>(&self, value: JsonValue) -> SchemaResult<T> {
        if let Some(tagged) = discriminator_of(&value) {
            let entry = self.resolve(tagged)?;
            if !entry.is::<T>() {
                return Err(SchemaError::decode(
                    T::NAMESPACE,
                    format!("payload is tagged as '{}'", entry.namespace()),
                ));
            }
        }
        from_tagged_value::<T>(value).map_err(|e| SchemaError::decode(T::NAMESPACE, e))
    }

    /// Encode a named value with its discriminator
    ///
    /// Fails if the value's namespace does not resolve, so that everything
    /// encoded here can be decoded again by the same registry.
    pub fn encode(&self, value: &dyn NamedValue) -> SchemaResult<JsonValue> {
        self.resolve(value.namespace())?;
        value.to_json()
    }
}

fn discriminator_of(value: &JsonValue) -> Option<&str> {
    value.get(DISCRIMINATOR).and_then(JsonValue::as_str)
}
