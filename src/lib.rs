//! # Specimen - schema-driven sample values
//!
//! Specimen synthesizes plausible example values from OpenAPI / JSON-Schema
//! fragments and uses them to write `.http` request files for whole API
//! documents.
//!
//! ## Features
//!
//! - **Constraint-aware generation**: formats, enums, lengths, numeric bounds,
//!   item counts and required properties are honored
//! - **Never fails**: malformed schemas fall back to a simplified generator
//! - **Reproducible**: injectable random source and clock, optional seed
//! - **References**: placeholder objects, or resolution through a schema registry
//! - **Request files**: OpenAPI 3 and Swagger 2 documents rendered as `.http`
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! let value = specimen::generate(&json!({
//!     "type": "object",
//!     "required": ["id"],
//!     "properties": { "id": { "type": "string", "format": "uuid" } }
//! }));
//! assert_eq!(value["id"], "123e4567-e89b-12d3-a456-426614174000");
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: schema nodes, API operations, errors and the resolver/clock seams
//! - **Adapters**: sample generator, document loader, request assembler
//! - **Application**: the use cases behind the command line
//! - **Config**: layered settings and the named schema registry

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;

use crate::adapters::sample_generator::SampleGenerator;
use crate::domain::SchemaNode;
use serde_json::Value;

/// Generate a sample for a raw schema with default settings.
///
/// A value that is not a schema object yields `null`; keywords with a value
/// of the wrong shape are ignored.
pub fn generate(schema: &Value) -> Value {
    match SchemaNode::from_value(schema) {
        Ok(node) => SampleGenerator::default().generate(Some(&node)),
        Err(e) => {
            tracing::debug!("Not a schema: {}", e);
            Value::Null
        }
    }
}
