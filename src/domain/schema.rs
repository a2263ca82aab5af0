//! Schema fragments as consumed by the sample generator.
//!
//! A [`SchemaNode`] is the JSON-Schema subset found inside OpenAPI and Swagger
//! documents. Numeric constraint keywords are kept as `f64` so that a
//! malformed value (a negative `minLength`, a zero `multipleOf`) still parses
//! and is rejected later by the constraint-aware generator. A keyword whose
//! JSON shape is wrong (`"maxLength": "10"`, `"enum": 5`) is dropped rather
//! than failing the whole node.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The `type` keyword, restricted to the kinds the generator dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

/// `exclusiveMinimum` / `exclusiveMaximum` in either dialect.
///
/// OpenAPI 3.0 and Swagger 2.0 use a boolean that turns the matching
/// `minimum`/`maximum` exclusive; JSON Schema 2019+ (OpenAPI 3.1) carries the
/// bound itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Value(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<SchemaKind>,
    #[serde(
        rename = "enum",
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Value>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub properties: IndexMap<String, SchemaNode>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required: Vec<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    /// Raw `$ref` pointer when this node is a reference rather than an inline schema
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub all_of: Vec<SchemaNode>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub one_of: Vec<SchemaNode>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub any_of: Vec<SchemaNode>,
}

impl SchemaNode {
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Effective exclusive lower bound, if any.
    pub fn exclusive_minimum_value(&self) -> Option<f64> {
        match self.exclusive_minimum {
            Some(ExclusiveBound::Value(bound)) => Some(bound),
            Some(ExclusiveBound::Flag(true)) => self.minimum,
            _ => None,
        }
    }

    /// Effective exclusive upper bound, if any.
    pub fn exclusive_maximum_value(&self) -> Option<f64> {
        match self.exclusive_maximum {
            Some(ExclusiveBound::Value(bound)) => Some(bound),
            Some(ExclusiveBound::Flag(true)) => self.maximum,
            _ => None,
        }
    }

    /// First entry of `examples`.
    ///
    /// Accepts the JSON Schema list form and the OpenAPI map of Example
    /// Objects, where the entry's `value` is used when present.
    pub fn first_example(&self) -> Option<Value> {
        match self.examples.as_ref()? {
            Value::Array(items) => items.first().cloned(),
            Value::Object(entries) => entries
                .values()
                .next()
                .map(|entry| entry.get("value").cloned().unwrap_or_else(|| entry.clone())),
            _ => None,
        }
    }
}

/// Trailing path segment of a reference (`#/components/schemas/User` → `User`).
pub fn reference_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<Option<SchemaKind>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => SchemaKind::from_name(&name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .filter(|name| *name != "null")
            .find_map(SchemaKind::from_name),
        _ => None,
    })
}

/// Keyword that is absent when its value has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_object_schema() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "integer", "minimum": 1 },
                "tags": { "type": "array", "items": { "type": "string" } },
                "owner": { "$ref": "#/components/schemas/User" }
            }
        }))
        .unwrap();

        assert_eq!(node.kind, Some(SchemaKind::Object));
        assert!(node.is_required("id"));
        assert!(!node.is_required("tags"));
        let names: Vec<&str> = node.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "tags", "owner"]);
        assert_eq!(node.properties["id"].minimum, Some(1.0));
        assert_eq!(
            node.properties["tags"].items.as_ref().unwrap().kind,
            Some(SchemaKind::String)
        );
        assert_eq!(
            node.properties["owner"].reference.as_deref(),
            Some("#/components/schemas/User")
        );
    }

    #[test]
    fn test_type_list_skips_null() {
        let node = SchemaNode::from_value(&json!({ "type": ["null", "integer"] })).unwrap();
        assert_eq!(node.kind, Some(SchemaKind::Integer));
    }

    #[test]
    fn test_unknown_type_has_no_kind() {
        let node = SchemaNode::from_value(&json!({ "type": "file" })).unwrap();
        assert_eq!(node.kind, None);
    }

    #[test]
    fn test_exclusive_bounds_in_both_dialects() {
        let flagged = SchemaNode::from_value(&json!({
            "type": "number",
            "minimum": 10,
            "exclusiveMinimum": true,
            "maximum": 20,
            "exclusiveMaximum": false
        }))
        .unwrap();
        assert_eq!(flagged.exclusive_minimum_value(), Some(10.0));
        assert_eq!(flagged.exclusive_maximum_value(), None);

        let valued = SchemaNode::from_value(&json!({
            "type": "number",
            "exclusiveMinimum": 0,
            "exclusiveMaximum": 1.5
        }))
        .unwrap();
        assert_eq!(valued.exclusive_minimum_value(), Some(0.0));
        assert_eq!(valued.exclusive_maximum_value(), Some(1.5));
    }

    #[test]
    fn test_additional_properties_forms() {
        let allowed = SchemaNode::from_value(&json!({ "additionalProperties": true })).unwrap();
        assert_eq!(
            allowed.additional_properties,
            Some(AdditionalProperties::Allowed(true))
        );

        let typed = SchemaNode::from_value(&json!({
            "additionalProperties": { "type": "integer" }
        }))
        .unwrap();
        match typed.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => {
                assert_eq!(schema.kind, Some(SchemaKind::Integer))
            }
            other => panic!("unexpected additionalProperties: {:?}", other),
        }
    }

    #[test]
    fn test_first_example_from_list_and_map() {
        let listed = SchemaNode::from_value(&json!({ "examples": ["a", "b"] })).unwrap();
        assert_eq!(listed.first_example(), Some(json!("a")));

        let mapped = SchemaNode::from_value(&json!({
            "examples": {
                "first": { "summary": "one", "value": { "id": 7 } },
                "second": { "value": { "id": 8 } }
            }
        }))
        .unwrap();
        assert_eq!(mapped.first_example(), Some(json!({ "id": 7 })));

        let empty = SchemaNode::from_value(&json!({ "examples": [] })).unwrap();
        assert_eq!(empty.first_example(), None);
    }

    #[test]
    fn test_malformed_constraints_still_parse() {
        let node = SchemaNode::from_value(&json!({
            "type": "string",
            "minLength": -2,
            "maxLength": 2.5
        }))
        .unwrap();
        assert_eq!(node.min_length, Some(-2.0));
        assert_eq!(node.max_length, Some(2.5));
    }

    #[test]
    fn test_mistyped_keywords_are_dropped() {
        let node = SchemaNode::from_value(&json!({
            "type": "string",
            "maxLength": "10",
            "enum": 5,
            "required": "id",
            "items": "string",
            "properties": { "id": "not-a-schema" },
            "exclusiveMinimum": "yes",
            "minLength": 2
        }))
        .unwrap();

        assert_eq!(node.kind, Some(SchemaKind::String));
        assert_eq!(node.max_length, None);
        assert!(node.enum_values.is_empty());
        assert!(node.required.is_empty());
        assert!(node.items.is_none());
        assert!(node.properties.is_empty());
        assert_eq!(node.exclusive_minimum, None);
        assert_eq!(node.min_length, Some(2.0));

        let numeric_type = SchemaNode::from_value(&json!({ "type": 5 })).unwrap();
        assert_eq!(numeric_type.kind, None);
    }

    #[test]
    fn test_non_object_schema_is_rejected() {
        assert!(SchemaNode::from_value(&json!("string")).is_err());
        assert!(SchemaNode::from_value(&json!(42)).is_err());
    }

    #[test]
    fn test_reference_name() {
        assert_eq!(reference_name("#/components/schemas/Pet"), "Pet");
        assert_eq!(reference_name("#/definitions/Order"), "Order");
        assert_eq!(reference_name("Pet"), "Pet");
    }
}
