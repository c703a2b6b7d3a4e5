//! Discriminator-aware serde helpers
//!
//! Named values are encoded as their plain serde form with an extra
//! `__ns__` field naming the type. These helpers add and strip that field
//! and can be used directly on struct fields:
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct Job {
//!     #[serde(with = "folio_schema::named::option")]
//!     completion_details: Option<CompletionDetails>,
//! }
//! ```

use crate::registry::{NamedType, DISCRIMINATOR};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Encode a named value, adding its discriminator
///
/// Values whose serde form is not a JSON object are returned untagged.
pub fn to_tagged_value<T: NamedType>(value: &T) -> Result<JsonValue, serde_json::Error> {
    let mut encoded = serde_json::to_value(value)?;
    if let JsonValue::Object(map) = &mut encoded {
        map.insert(
            DISCRIMINATOR.to_string(),
            JsonValue::String(T::NAMESPACE.to_string()),
        );
    }
    Ok(encoded)
}

/// Decode a named value, stripping and checking its discriminator
///
/// A missing discriminator is accepted; a discriminator naming another
/// type is rejected.
pub fn from_tagged_value<T: NamedType>(mut value: JsonValue) -> Result<T, serde_json::Error> {
    if let JsonValue::Object(map) = &mut value {
        match map.remove(DISCRIMINATOR) {
            Some(JsonValue::String(ns)) if ns != T::NAMESPACE => {
                return Err(de::Error::custom(format!(
                    "expected namespace '{}', found '{}'",
                    T::NAMESPACE,
                    ns
                )));
            }
            Some(JsonValue::String(_)) | None => {}
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "'{}' must be a string, found {}",
                    DISCRIMINATOR, other
                )));
            }
        }
    }
    serde_json::from_value(value)
}

pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: NamedType,
    S: Serializer,
{
    to_tagged_value(value)
        .map_err(ser::Error::custom)?
        .serialize(serializer)
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: NamedType,
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    from_tagged_value(value).map_err(de::Error::custom)
}

/// Same as the parent module, for `Option<T>` fields
pub mod option {
    use super::*;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: NamedType,
        S: Serializer,
    {
        match value {
            Some(inner) => super::serialize(inner, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: NamedType,
        D: Deserializer<'de>,
    {
        match Option::<JsonValue>::deserialize(deserializer)? {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => from_tagged_value(value).map(Some).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl NamedType for Point {
        const NAMESPACE: &'static str = "test.Point";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "crate::named")]
        point: Point,
        #[serde(default, with = "crate::named::option")]
        maybe: Option<Point>,
    }

    #[test]
    fn test_tagged_value_carries_namespace() {
        let value = to_tagged_value(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(value, json!({"x": 1, "y": 2, "__ns__": "test.Point"}));
    }

    #[test]
    fn test_untagged_value_is_accepted() {
        let point: Point = from_tagged_value(json!({"x": 3, "y": 4})).unwrap();
        assert_eq!(point, Point { x: 3, y: 4 });
    }

    #[test]
    fn test_foreign_namespace_is_rejected() {
        let result: Result<Point, _> =
            from_tagged_value(json!({"x": 3, "y": 4, "__ns__": "test.Other"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_nested_fields_are_tagged() {
        let holder = Holder {
            point: Point { x: 1, y: 1 },
            maybe: None,
        };
        let value = serde_json::to_value(&holder).unwrap();
        assert_eq!(value["point"]["__ns__"], "test.Point");
        assert!(value["maybe"].is_null());

        let decoded: Holder = serde_json::from_value(json!({
            "point": {"x": 5, "y": 6, "__ns__": "test.Point"},
            "maybe": {"x": 7, "y": 8, "__ns__": "test.Point"}
        }))
        .unwrap();
        assert_eq!(decoded.point, Point { x: 5, y: 6 });
        assert_eq!(decoded.maybe, Some(Point { x: 7, y: 8 }));
    }
}
