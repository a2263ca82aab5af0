//! Reusable named schemas and the registry used to resolve `$ref`.
//!
//! Named schemas come from two places: the `components.schemas` (OpenAPI 3)
//! or `definitions` (Swagger 2) section of a loaded document, and schema
//! files declared in configuration.
//!
//! ## Example Schema Definition
//!
//! ```yaml
//! name: User
//! description: Standard user information schema
//! schema:
//!   type: object
//!   properties:
//!     username:
//!       type: string
//!     email:
//!       type: string
//!       format: email
//!   required:
//!     - username
//!     - email
//! ```
//!
//! A schema then refers to it with `$ref: User` or
//! `$ref: "#/components/schemas/User"`; only the trailing segment is matched.

use crate::domain::schema::{reference_name, SchemaNode};
use crate::domain::ReferenceResolver;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for a reusable JSON schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Unique name for this schema (matched against `$ref`)
    pub name: String,
    /// Human-readable description of the schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags for categorization and filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// The actual JSON Schema definition
    pub schema: Value,
}

/// Named schemas keyed by name, in insertion order
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, SchemaNode>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[SchemaConfig]) -> Result<Self, String> {
        let mut registry = Self::new();
        for config in configs {
            let node = SchemaNode::from_value(&config.schema)
                .map_err(|e| format!("schema '{}': {}", config.name, e))?;
            registry.insert(config.name.clone(), node);
        }
        Ok(registry)
    }

    /// Insert or replace a named schema
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) {
        self.schemas.insert(name.into(), node);
    }

    /// Merge another registry; its entries win on equal names
    pub fn extend(&mut self, other: SchemaRegistry) {
        self.schemas.extend(other.schemas);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl ReferenceResolver for SchemaRegistry {
    fn resolve(&self, reference: &str) -> Option<&SchemaNode> {
        self.schemas
            .get(reference)
            .or_else(|| self.schemas.get(reference_name(reference)))
    }
}

/// Extract the reference string from a bare `{"$ref": ...}` object
pub fn get_ref(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get("$ref").and_then(Value::as_str),
        _ => None,
    }
}
