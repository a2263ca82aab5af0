//! Operations extracted from an API document, ready for request assembly.

use crate::domain::schema::SchemaNode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<SchemaNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub content_type: String,
    pub required: bool,
    pub schema: Option<SchemaNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiOperation {
    /// Upper-case HTTP method
    pub method: String,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub parameters: Vec<ApiParameter>,
    pub body: Option<RequestBody>,
}

impl ApiOperation {
    /// Human-readable label: summary, then operationId, then `METHOD path`.
    pub fn title(&self) -> String {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.operation_id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }
}
