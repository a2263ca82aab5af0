//! OpenAPI 3 / Swagger 2 document loading.
//!
//! The document is kept as raw JSON and walked on demand: operations are
//! extracted in document order with their parameters and request body, and
//! local `#/...` references on parameter and body objects are followed by
//! JSON pointer. Schema `$ref`s are left in place for the sample generator.

use crate::config::schema::get_ref;
use crate::config::SchemaRegistry;
use crate::domain::error::SpecError;
use crate::domain::operation::{ApiOperation, ApiParameter, ParameterLocation, RequestBody};
use crate::domain::schema::{SchemaKind, SchemaNode};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Longest chain of `$ref` -> `$ref` hops followed before giving up
const MAX_REFERENCE_CHAIN: usize = 16;

const DEFAULT_BASE_URL: &str = "http://localhost";

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Swagger 2 parameter fields that describe the parameter rather than its value
const PARAMETER_ONLY_FIELDS: [&str; 6] = [
    "name",
    "in",
    "required",
    "description",
    "allowEmptyValue",
    "collectionFormat",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    Swagger2,
    OpenApi3,
}

#[derive(Debug, Clone)]
pub struct SpecDocument {
    raw: Value,
    version: SpecVersion,
}

/// A parameter object after location dispatch
enum ParameterEntry {
    Param(ApiParameter),
    Body { required: bool, schema: SchemaNode },
    FormField { name: String, required: bool, schema: SchemaNode },
}

impl SpecDocument {
    pub async fn load(path: &Path) -> Result<Self, SpecError> {
        let text = tokio::fs::read_to_string(path).await?;
        let extension = path.extension().and_then(|e| e.to_str());
        let document = Self::parse(&text, extension)?;
        debug!("Loaded {:?} document from {}", document.version, path.display());
        Ok(document)
    }

    /// Parse document text; `extension` picks the format, JSON then YAML when unknown
    pub fn parse(text: &str, extension: Option<&str>) -> Result<Self, SpecError> {
        Self::from_value(parse_document_value(text, extension)?)
    }

    pub fn from_value(raw: Value) -> Result<Self, SpecError> {
        if !raw.is_object() {
            return Err(SpecError::Malformed(
                "document root must be a mapping".to_string(),
            ));
        }

        let version = if let Some(openapi) = raw.get("openapi") {
            match openapi.as_str() {
                Some(v) if v.starts_with("3.") => SpecVersion::OpenApi3,
                _ => return Err(SpecError::UnsupportedVersion(format!("openapi {}", openapi))),
            }
        } else if let Some(swagger) = raw.get("swagger") {
            // unquoted `swagger: 2.0` arrives as a YAML float
            let is_two = swagger.as_str() == Some("2.0") || swagger.as_f64() == Some(2.0);
            if !is_two {
                return Err(SpecError::UnsupportedVersion(format!("swagger {}", swagger)));
            }
            SpecVersion::Swagger2
        } else {
            return Err(SpecError::UnsupportedVersion(
                "missing 'openapi' or 'swagger' field".to_string(),
            ));
        };

        Ok(Self { raw, version })
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn title(&self) -> Option<&str> {
        self.raw.pointer("/info/title").and_then(Value::as_str)
    }

    /// Server root, without a trailing slash
    pub fn base_url(&self) -> String {
        let url = match self.version {
            SpecVersion::OpenApi3 => match self.raw.pointer("/servers/0/url").and_then(Value::as_str) {
                Some(url) if url.starts_with('/') => format!("{}{}", DEFAULT_BASE_URL, url),
                Some(url) if !url.is_empty() => url.to_string(),
                _ => DEFAULT_BASE_URL.to_string(),
            },
            SpecVersion::Swagger2 => {
                let base_path = self
                    .raw
                    .get("basePath")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                match self.raw.get("host").and_then(Value::as_str) {
                    Some(host) => {
                        let scheme = self
                            .raw
                            .pointer("/schemes/0")
                            .and_then(Value::as_str)
                            .unwrap_or("http");
                        format!("{}://{}{}", scheme, host, base_path)
                    }
                    None => format!("{}{}", DEFAULT_BASE_URL, base_path),
                }
            }
        };
        url.trim_end_matches('/').to_string()
    }

    /// Named schemas from `components.schemas` or `definitions`
    pub fn registry(&self) -> Result<SchemaRegistry, SpecError> {
        let pointer = match self.version {
            SpecVersion::OpenApi3 => "/components/schemas",
            SpecVersion::Swagger2 => "/definitions",
        };

        let mut registry = SchemaRegistry::new();
        if let Some(schemas) = self.raw.pointer(pointer).and_then(Value::as_object) {
            for (name, schema) in schemas {
                let node = SchemaNode::from_value(schema).map_err(|source| SpecError::Schema {
                    location: format!("#{}/{}", pointer, name),
                    source,
                })?;
                registry.insert(name.clone(), node);
            }
        }
        Ok(registry)
    }

    /// Every operation under `paths`, in document order
    pub fn operations(&self) -> Result<Vec<ApiOperation>, SpecError> {
        let Some(paths) = self.raw.get("paths") else {
            return Ok(Vec::new());
        };
        let paths = paths
            .as_object()
            .ok_or_else(|| SpecError::Malformed("'paths' must be a mapping".to_string()))?;

        let mut operations = Vec::new();
        for (path, item) in paths {
            let item = self.resolve_local(item)?;
            let Some(item) = item.as_object() else {
                warn!("Skipping path '{}': not a mapping", path);
                continue;
            };
            let shared = item.get("parameters");

            for (method, operation) in item {
                if !HTTP_METHODS.contains(&method.as_str()) {
                    continue;
                }
                operations.push(self.operation(path, method, operation, shared)?);
            }
        }
        Ok(operations)
    }

    fn operation(
        &self,
        path: &str,
        method: &str,
        operation: &Value,
        shared: Option<&Value>,
    ) -> Result<ApiOperation, SpecError> {
        let method = method.to_uppercase();
        let location = format!("{} {}", method, path);

        let mut merged: IndexMap<(String, String), &Value> = IndexMap::new();
        for list in [shared, operation.get("parameters")].into_iter().flatten() {
            for parameter in list.as_array().into_iter().flatten() {
                let parameter = self.resolve_local(parameter)?;
                let name = parameter.get("name").and_then(Value::as_str).unwrap_or_default();
                let place = parameter.get("in").and_then(Value::as_str).unwrap_or_default();
                merged.insert((name.to_string(), place.to_string()), parameter);
            }
        }

        let mut parameters = Vec::new();
        let mut body = None;
        let mut form_fields = Vec::new();
        for parameter in merged.values() {
            match self.parameter(parameter, &location)? {
                Some(ParameterEntry::Param(param)) => parameters.push(param),
                Some(ParameterEntry::Body { required, schema }) => {
                    body = Some(RequestBody {
                        content_type: self.swagger_content_type(operation),
                        required,
                        schema: Some(schema),
                    });
                }
                Some(ParameterEntry::FormField { name, required, schema }) => {
                    form_fields.push((name, required, schema));
                }
                None => {}
            }
        }

        if body.is_none() && !form_fields.is_empty() {
            body = Some(self.form_body(operation, form_fields));
        }
        if let Some(request_body) = operation.get("requestBody") {
            body = self.request_body(request_body, &location)?;
        }

        Ok(ApiOperation {
            method,
            path: path.to_string(),
            operation_id: text_field(operation, "operationId"),
            summary: text_field(operation, "summary"),
            parameters,
            body,
        })
    }

    fn parameter(&self, value: &Value, location: &str) -> Result<Option<ParameterEntry>, SpecError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecError::Malformed(format!("{}: parameter without a name", location)))?
            .to_string();
        let place = value.get("in").and_then(Value::as_str).unwrap_or_default();
        let required = value.get("required").and_then(Value::as_bool).unwrap_or(false);
        let schema_location = format!("{} parameter '{}'", location, name);

        if self.version == SpecVersion::Swagger2 {
            match place {
                "body" => {
                    let schema = match value.get("schema") {
                        Some(schema) => parse_schema(schema, &schema_location)?,
                        None => SchemaNode::default(),
                    };
                    return Ok(Some(ParameterEntry::Body { required, schema }));
                }
                "formData" => {
                    let schema = parse_schema(&inline_schema(value), &schema_location)?;
                    return Ok(Some(ParameterEntry::FormField { name, required, schema }));
                }
                _ => {}
            }
        }

        let Some(parameter_location) = ParameterLocation::from_name(place) else {
            warn!("{}: skipping parameter '{}' with unsupported location '{}'", location, name, place);
            return Ok(None);
        };

        let schema = match self.version {
            SpecVersion::Swagger2 => Some(parse_schema(&inline_schema(value), &schema_location)?),
            SpecVersion::OpenApi3 => {
                let declared = value.get("schema").or_else(|| {
                    value
                        .get("content")
                        .and_then(Value::as_object)
                        .and_then(|content| content.values().next())
                        .and_then(|media| media.get("schema"))
                });
                match declared {
                    Some(schema) => {
                        let mut node = parse_schema(schema, &schema_location)?;
                        if node.example.is_none() {
                            node.example = value.get("example").cloned();
                        }
                        Some(node)
                    }
                    None => None,
                }
            }
        };

        Ok(Some(ParameterEntry::Param(ApiParameter {
            name,
            location: parameter_location,
            required: required || parameter_location == ParameterLocation::Path,
            schema,
        })))
    }

    fn request_body(&self, value: &Value, location: &str) -> Result<Option<RequestBody>, SpecError> {
        let value = self.resolve_local(value)?;
        let Some(content) = value.get("content").and_then(Value::as_object) else {
            return Ok(None);
        };
        let Some((content_type, media)) = content
            .get_key_value(JSON_CONTENT_TYPE)
            .or_else(|| content.iter().next())
        else {
            return Ok(None);
        };

        let mut schema = match media.get("schema") {
            Some(schema) => parse_schema(schema, &format!("{} request body", location))?,
            None => SchemaNode::default(),
        };
        if let Some(example) = media.get("example") {
            schema.example = Some(example.clone());
        } else if let Some(examples) = media.get("examples") {
            schema.examples = Some(self.resolve_examples(examples)?);
        }

        Ok(Some(RequestBody {
            content_type: content_type.clone(),
            required: value.get("required").and_then(Value::as_bool).unwrap_or(false),
            schema: Some(schema),
        }))
    }

    /// Media-level `examples` map with referenced Example Objects inlined
    fn resolve_examples(&self, examples: &Value) -> Result<Value, SpecError> {
        let Some(entries) = examples.as_object() else {
            return Ok(examples.clone());
        };
        let mut resolved = Map::new();
        for (name, entry) in entries {
            resolved.insert(name.clone(), self.resolve_local(entry)?.clone());
        }
        Ok(Value::Object(resolved))
    }

    fn form_body(&self, operation: &Value, fields: Vec<(String, bool, SchemaNode)>) -> RequestBody {
        let content_type = if self.consumes(operation).any(|c| c == MULTIPART_CONTENT_TYPE) {
            MULTIPART_CONTENT_TYPE
        } else {
            FORM_CONTENT_TYPE
        };

        let mut schema = SchemaNode::of_kind(SchemaKind::Object);
        for (name, required, field) in fields {
            if required {
                schema.required.push(name.clone());
            }
            schema.properties.insert(name, field);
        }

        RequestBody {
            content_type: content_type.to_string(),
            required: !schema.required.is_empty(),
            schema: Some(schema),
        }
    }

    fn swagger_content_type(&self, operation: &Value) -> String {
        let mut consumes = self.consumes(operation).peekable();
        let first = consumes.peek().map(|c| c.to_string());
        if consumes.any(|c| c == JSON_CONTENT_TYPE) {
            return JSON_CONTENT_TYPE.to_string();
        }
        first.unwrap_or_else(|| JSON_CONTENT_TYPE.to_string())
    }

    /// Operation-level `consumes`, falling back to the document-level list
    fn consumes<'a>(&'a self, operation: &'a Value) -> impl Iterator<Item = &'a str> {
        operation
            .get("consumes")
            .or_else(|| self.raw.get("consumes"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    /// Follow local `{"$ref": "#/..."}` objects until a concrete value is reached
    fn resolve_local<'a>(&'a self, mut value: &'a Value) -> Result<&'a Value, SpecError> {
        for _ in 0..MAX_REFERENCE_CHAIN {
            let Some(reference) = get_ref(value) else {
                return Ok(value);
            };
            value = reference
                .strip_prefix('#')
                .and_then(|pointer| self.raw.pointer(pointer))
                .ok_or_else(|| SpecError::UnresolvedReference(reference.to_string()))?;
        }
        Err(SpecError::Malformed(format!(
            "reference chain longer than {} hops",
            MAX_REFERENCE_CHAIN
        )))
    }
}

/// Whether a parsed file looks like an OpenAPI or Swagger document
pub fn is_api_document(value: &Value) -> bool {
    value.get("openapi").is_some() || value.get("swagger").is_some()
}

/// Parse JSON or YAML text into a JSON value
pub fn parse_document_value(text: &str, extension: Option<&str>) -> Result<Value, SpecError> {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("json") => serde_json::from_str(text).map_err(|e| SpecError::Parse(e.to_string())),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(text).map_err(|e| SpecError::Parse(e.to_string()))
        }
        _ => serde_json::from_str(text).or_else(|json_err| {
            serde_yaml::from_str(text).map_err(|yaml_err| {
                SpecError::Parse(format!("not JSON ({}) nor YAML ({})", json_err, yaml_err))
            })
        }),
    }
}

fn parse_schema(value: &Value, location: &str) -> Result<SchemaNode, SpecError> {
    SchemaNode::from_value(value).map_err(|source| SpecError::Schema {
        location: location.to_string(),
        source,
    })
}

/// Swagger 2 non-body parameters carry their schema keywords inline
fn inline_schema(parameter: &Value) -> Value {
    let mut schema = parameter.as_object().cloned().unwrap_or_default();
    for field in PARAMETER_ONLY_FIELDS {
        schema.remove(field);
    }
    Value::Object(schema)
}

fn text_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}
