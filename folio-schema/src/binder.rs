//! Schema binder
//!
//! Job type schemas may reference registered named types with a private
//! `typed://<namespace>` `$ref`. The binder does two things with them:
//!
//! - [`SchemaBinder::resolve`] rewrites a schema into a self-contained
//!   Draft-07 schema where every typed reference points into the root
//!   `definitions` and each referenced type schema is inlined there.
//! - [`SchemaBinder::bind`] walks an unresolved schema and a payload
//!   together, replacing each payload node under a typed reference with an
//!   instance of the named type.

use crate::error::{SchemaError, SchemaResult};
use crate::registry::{NamedType, NamedValue, TypeRegistry};
use crate::validator::{self, ValidationOutcome};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Prefix of a `$ref` that names a registered type
pub const TYPED_REF_SCHEME: &str = "typed://";

const DEFINITIONS: &str = "definitions";

/// Keywords whose values are instance data rather than subschemas
const LITERAL_KEYWORDS: [&str; 4] = ["const", "enum", "default", "examples"];

/// The schema shapes [`SchemaBinder::bind`] understands
///
/// Everything else, including `anyOf`, `oneOf`, `allOf` and tuple-form
/// `items`, passes the payload through untouched.
enum SchemaNode<'a> {
    TypedRef(&'a str),
    Object(&'a Map<String, JsonValue>),
    Array(&'a JsonValue),
    Passthrough,
}

impl<'a> SchemaNode<'a> {
    fn classify(schema: &'a JsonValue) -> Self {
        let Some(object) = schema.as_object() else {
            return Self::Passthrough;
        };

        if let Some(alias) = object
            .get("$ref")
            .and_then(JsonValue::as_str)
            .and_then(|reference| reference.strip_prefix(TYPED_REF_SCHEME))
        {
            return Self::TypedRef(alias);
        }

        match object.get("type").and_then(JsonValue::as_str) {
            Some("object") => object
                .get("properties")
                .and_then(JsonValue::as_object)
                .map_or(Self::Passthrough, Self::Object),
            Some("array") => object
                .get("items")
                .filter(|items| items.is_object())
                .map_or(Self::Passthrough, Self::Array),
            _ => Self::Passthrough,
        }
    }
}

/// A payload after binding
#[derive(Debug)]
pub enum BoundValue {
    /// Plain JSON, left as received
    Json(JsonValue),
    Object(BTreeMap<String, BoundValue>),
    Array(Vec<BoundValue>),
    /// An instance of a registered type
    Named(Box<dyn NamedValue>),
}

impl BoundValue {
    /// Re-encode to JSON; named values carry their discriminator
    pub fn to_json(&self) -> SchemaResult<JsonValue> {
        match self {
            Self::Json(value) => Ok(value.clone()),
            Self::Object(fields) => {
                let mut map = Map::new();
                for (key, value) in fields {
                    map.insert(key.clone(), value.to_json()?);
                }
                Ok(JsonValue::Object(map))
            }
            Self::Array(items) => items
                .iter()
                .map(BoundValue::to_json)
                .collect::<SchemaResult<Vec<_>>>()
                .map(JsonValue::Array),
            Self::Named(value) => value.to_json(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&BoundValue> {
        match self {
            Self::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&dyn NamedValue> {
        match self {
            Self::Named(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    pub fn downcast_ref<T: NamedType>(&self) -> Option<&T> {
        self.as_named().and_then(|value| value.downcast_ref::<T>())
    }
}

/// Resolves and binds schemas against a [`TypeRegistry`]
#[derive(Debug, Clone)]
pub struct SchemaBinder {
    registry: Arc<TypeRegistry>,
}

impl SchemaBinder {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Produce a self-contained Draft-07 schema
    ///
    /// Typed references are rewritten to `#/definitions/<namespace>` and
    /// the referenced type schemas are inlined under the root
    /// `definitions`, transitively. Definitions nested in a generated type
    /// schema are hoisted to the root as `<namespace>.<name>`, with the
    /// type's references to them rewritten. Resolving a resolved schema
    /// returns it unchanged.
    pub fn resolve(&self, schema: &JsonValue) -> SchemaResult<JsonValue> {
        let mut resolved = schema.clone();
        let mut pending = Vec::new();
        rewrite_typed_refs(&mut resolved, &mut pending);
        if pending.is_empty() {
            return Ok(resolved);
        }

        let JsonValue::Object(root) = &mut resolved else {
            return Err(SchemaError::InvalidSchema(
                "a schema with typed references must be an object".to_string(),
            ));
        };
        let mut definitions = match root.remove(DEFINITIONS) {
            Some(JsonValue::Object(existing)) => existing,
            Some(_) => {
                return Err(SchemaError::InvalidSchema(
                    "'definitions' must be an object".to_string(),
                ))
            }
            None => Map::new(),
        };

        let mut inlined = HashSet::new();
        while let Some(namespace) = pending.pop() {
            if !inlined.insert(namespace.clone()) {
                continue;
            }

            let mut type_schema = self.registry.schema_for(&namespace)?;
            let mut nested = Map::new();
            if let JsonValue::Object(object) = &mut type_schema {
                object.remove("$schema");
                if let Some(JsonValue::Object(found)) = object.remove(DEFINITIONS) {
                    nested = found;
                }
            }

            // Nested names are only unique within their owning type
            let renames: HashMap<String, String> = nested
                .keys()
                .map(|name| {
                    (
                        local_ref(name),
                        local_ref(&qualified_definition(&namespace, name)),
                    )
                })
                .collect();
            for (name, mut nested_schema) in nested {
                rename_local_refs(&mut nested_schema, &renames);
                rewrite_typed_refs(&mut nested_schema, &mut pending);
                definitions.insert(qualified_definition(&namespace, &name), nested_schema);
            }
            rename_local_refs(&mut type_schema, &renames);
            rewrite_typed_refs(&mut type_schema, &mut pending);
            definitions.insert(namespace, type_schema);
        }

        root.insert(DEFINITIONS.to_string(), JsonValue::Object(definitions));
        Ok(resolved)
    }

    /// Bind a payload to the named types referenced by `schema`
    ///
    /// `schema` is the unresolved job type schema. A null schema or a null
    /// payload returns the payload unchanged. Object properties absent from
    /// the schema are kept as plain JSON.
    pub fn bind(&self, schema: &JsonValue, payload: JsonValue) -> SchemaResult<BoundValue> {
        if schema.is_null() || payload.is_null() {
            return Ok(BoundValue::Json(payload));
        }

        match SchemaNode::classify(schema) {
            SchemaNode::TypedRef(namespace) => self
                .registry
                .decode_as_namespace(namespace, payload)
                .map(BoundValue::Named),
            SchemaNode::Object(properties) => match payload {
                JsonValue::Object(fields) => {
                    let mut bound = BTreeMap::new();
                    for (key, value) in fields {
                        let value = match properties.get(&key) {
                            Some(property_schema) => self.bind(property_schema, value)?,
                            None => BoundValue::Json(value),
                        };
                        bound.insert(key, value);
                    }
                    Ok(BoundValue::Object(bound))
                }
                other => Ok(BoundValue::Json(other)),
            },
            SchemaNode::Array(items) => match payload {
                JsonValue::Array(values) => values
                    .into_iter()
                    .map(|value| self.bind(items, value))
                    .collect::<SchemaResult<Vec<_>>>()
                    .map(BoundValue::Array),
                other => Ok(BoundValue::Json(other)),
            },
            SchemaNode::Passthrough => Ok(BoundValue::Json(payload)),
        }
    }

    /// Validate an instance against an already resolved schema
    pub fn validate(
        &self,
        instance: &JsonValue,
        resolved_schema: &JsonValue,
    ) -> SchemaResult<ValidationOutcome> {
        validator::validate(instance, resolved_schema)
    }
}

fn rewrite_typed_refs(value: &mut JsonValue, pending: &mut Vec<String>) {
    match value {
        JsonValue::Object(map) => {
            if let Some(JsonValue::String(reference)) = map.get_mut("$ref") {
                if let Some(namespace) = reference.strip_prefix(TYPED_REF_SCHEME) {
                    let namespace = namespace.to_string();
                    *reference = format!("#/{}/{}", DEFINITIONS, escape_pointer(&namespace));
                    pending.push(namespace);
                }
            }
            for (key, child) in map.iter_mut() {
                if key != "$ref" && !LITERAL_KEYWORDS.contains(&key.as_str()) {
                    rewrite_typed_refs(child, pending);
                }
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                rewrite_typed_refs(item, pending);
            }
        }
        _ => {}
    }
}

/// Root definition name of a definition nested in the type `namespace`
fn qualified_definition(namespace: &str, name: &str) -> String {
    format!("{}.{}", namespace, name)
}

fn local_ref(name: &str) -> String {
    format!("#/{}/{}", DEFINITIONS, escape_pointer(name))
}

fn rename_local_refs(value: &mut JsonValue, renames: &HashMap<String, String>) {
    if renames.is_empty() {
        return;
    }
    match value {
        JsonValue::Object(map) => {
            if let Some(JsonValue::String(reference)) = map.get_mut("$ref") {
                if let Some(renamed) = renames.get(reference.as_str()) {
                    *reference = renamed.clone();
                }
            }
            for (key, child) in map.iter_mut() {
                if key != "$ref" && !LITERAL_KEYWORDS.contains(&key.as_str()) {
                    rename_local_refs(child, renames);
                }
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                rename_local_refs(item, renames);
            }
        }
        _ => {}
    }
}

/// Escape a JSON pointer reference token
fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct Incident {
        title: String,
        severity: u8,
        location: Location,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct Location {
        region: String,
    }

    impl NamedType for Incident {
        const NAMESPACE: &'static str = "test.Incident";
    }

    fn binder() -> SchemaBinder {
        SchemaBinder::new(Arc::new(TypeRegistry::new().with::<Incident>()))
    }

    fn incident_schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "incident": {"$ref": "typed://test.Incident"},
                "history": {"type": "array", "items": {"$ref": "typed://test.Incident"}},
                "note": {"type": "string"}
            },
            "required": ["incident"]
        })
    }

    fn incident_json(title: &str) -> JsonValue {
        json!({
            "title": title,
            "severity": 2,
            "location": {"region": "eu-west"},
            "__ns__": "test.Incident"
        })
    }

    #[test]
    fn test_resolve_inlines_type_schema() {
        let resolved = binder().resolve(&incident_schema()).unwrap();

        assert_eq!(
            resolved["properties"]["incident"]["$ref"],
            "#/definitions/test.Incident"
        );
        assert_eq!(
            resolved["properties"]["history"]["items"]["$ref"],
            "#/definitions/test.Incident"
        );
        let definition = &resolved["definitions"]["test.Incident"];
        assert_eq!(definition["type"], "object");
        assert!(definition.get("$schema").is_none());
        // Nested definitions are hoisted to the root under their owner
        assert!(resolved["definitions"].get("Location").is_none());
        assert_eq!(
            resolved["definitions"]["test.Incident.Location"]["required"],
            json!(["region"])
        );
        assert_eq!(
            definition["properties"]["location"]["$ref"],
            "#/definitions/test.Incident.Location"
        );
        assert!(!resolved.to_string().contains(TYPED_REF_SCHEME));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let binder = binder();
        let once = binder.resolve(&incident_schema()).unwrap();
        let twice = binder.resolve(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resolve_without_typed_refs_is_identity() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "integer"}}});
        assert_eq!(binder().resolve(&schema).unwrap(), schema);
    }

    #[test]
    fn test_resolve_keeps_existing_definitions() {
        let schema = json!({
            "$ref": "#/definitions/wrapper",
            "definitions": {
                "wrapper": {"type": "object", "properties": {"i": {"$ref": "typed://test.Incident"}}}
            }
        });
        let resolved = binder().resolve(&schema).unwrap();
        assert!(resolved["definitions"].get("wrapper").is_some());
        assert!(resolved["definitions"].get("test.Incident").is_some());
        assert_eq!(
            resolved["definitions"]["wrapper"]["properties"]["i"]["$ref"],
            "#/definitions/test.Incident"
        );
    }

    #[test]
    fn test_resolve_unknown_type_fails() {
        let schema = json!({"properties": {"x": {"$ref": "typed://test.Missing"}}});
        assert_eq!(
            binder().resolve(&schema).unwrap_err(),
            SchemaError::KeyNotFound("test.Missing".to_string())
        );
    }

    #[test]
    fn test_resolve_ignores_literal_values() {
        let schema = json!({
            "properties": {"x": {"const": {"$ref": "typed://test.Missing"}}}
        });
        assert_eq!(binder().resolve(&schema).unwrap(), schema);
    }

    #[test]
    fn test_resolved_schema_validates_payload() {
        let binder = binder();
        let resolved = binder.resolve(&incident_schema()).unwrap();

        let good = json!({"incident": incident_json("fire"), "history": []});
        assert!(binder.validate(&good, &resolved).unwrap().is_valid);

        let untagged = json!({"incident": {"title": "fire", "severity": 2, "location": {"region": "x"}}});
        assert!(!binder.validate(&untagged, &resolved).unwrap().is_valid);
    }

    #[test]
    fn test_bind_builds_named_values() {
        let payload = json!({
            "incident": incident_json("fire"),
            "history": [incident_json("flood"), incident_json("storm")],
            "note": "hello",
            "extra": 1
        });

        let bound = binder().bind(&incident_schema(), payload).unwrap();

        let incident = bound.get("incident").unwrap().downcast_ref::<Incident>().unwrap();
        assert_eq!(incident.title, "fire");
        assert_eq!(incident.location.region, "eu-west");

        match bound.get("history").unwrap() {
            BoundValue::Array(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].downcast_ref::<Incident>().unwrap().title, "storm");
            }
            other => panic!("expected array, got {other:?}"),
        }
        assert!(matches!(bound.get("note"), Some(BoundValue::Json(_))));
        assert!(matches!(bound.get("extra"), Some(BoundValue::Json(_))));
    }

    #[test]
    fn test_bind_then_encode_returns_payload() {
        let payload = json!({
            "incident": incident_json("fire"),
            "history": [incident_json("flood")],
            "note": "hello"
        });

        let bound = binder().bind(&incident_schema(), payload.clone()).unwrap();
        assert_eq!(bound.to_json().unwrap(), payload);
    }

    #[test]
    fn test_bind_short_circuits_on_null() {
        let binder = binder();
        let bound = binder.bind(&JsonValue::Null, json!({"incident": 1})).unwrap();
        assert!(matches!(bound, BoundValue::Json(_)));

        let bound = binder.bind(&incident_schema(), JsonValue::Null).unwrap();
        assert!(matches!(bound, BoundValue::Json(JsonValue::Null)));
    }

    #[test]
    fn test_bind_passes_through_unmatched_shapes() {
        let binder = binder();
        let schema = json!({"type": "object", "properties": {"x": {"type": "integer"}}});
        let bound = binder.bind(&schema, json!([1, 2])).unwrap();
        assert!(matches!(bound, BoundValue::Json(_)));

        let combinator = json!({"anyOf": [{"$ref": "typed://test.Incident"}, {"type": "null"}]});
        let bound = binder.bind(&combinator, incident_json("fire")).unwrap();
        assert!(matches!(bound, BoundValue::Json(_)));
    }

    #[test]
    fn test_bind_unknown_type_fails() {
        let schema = json!({"$ref": "typed://test.Missing"});
        let result = binder().bind(&schema, json!({}));
        assert_eq!(
            result.unwrap_err(),
            SchemaError::KeyNotFound("test.Missing".to_string())
        );
    }

    mod site {
        use schemars::JsonSchema;
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
        pub struct Location {
            pub lat: f64,
            pub lon: f64,
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct Station {
        name: String,
        location: site::Location,
    }

    impl NamedType for Station {
        const NAMESPACE: &'static str = "test.Station";
    }

    #[test]
    fn test_resolve_keeps_same_named_nested_types_apart() {
        let binder = SchemaBinder::new(Arc::new(
            TypeRegistry::new().with::<Incident>().with::<Station>(),
        ));
        let schema = json!({
            "type": "object",
            "properties": {
                "incident": {"$ref": "typed://test.Incident"},
                "station": {"$ref": "typed://test.Station"}
            },
            "required": ["incident", "station"]
        });
        let resolved = binder.resolve(&schema).unwrap();

        let definitions = &resolved["definitions"];
        assert_eq!(
            definitions["test.Incident.Location"]["required"],
            json!(["region"])
        );
        assert!(definitions["test.Station.Location"]["properties"]
            .get("lat")
            .is_some());

        let payload = json!({
            "incident": incident_json("fire"),
            "station": {
                "name": "north",
                "location": {"lat": 1.5, "lon": 2.5},
                "__ns__": "test.Station"
            }
        });
        let outcome = binder.validate(&payload, &resolved).unwrap();
        assert!(outcome.is_valid, "{:?}", outcome.error);
        assert_eq!(binder.resolve(&resolved).unwrap(), resolved);
    }

    #[test]
    fn test_bind_unregistered_discriminator_uses_expected_type() {
        let mut payload = incident_json("fire");
        payload["__ns__"] = json!("other.Unregistered");

        let bound = binder()
            .bind(&json!({"$ref": "typed://test.Incident"}), payload)
            .unwrap();
        let incident = bound.downcast_ref::<Incident>().unwrap();
        assert_eq!(incident.title, "fire");
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape_pointer("a/b~c"), "a~1b~0c");
    }
}
