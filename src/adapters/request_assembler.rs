//! Turns API operations into `.http` request files filled with sample values.
//!
//! Every parameter and request body is generated once from its schema and
//! serialized according to where it goes: path segments and query strings are
//! URL-encoded, headers and cookies take plain text, and bodies follow their
//! content type.

use crate::adapters::sample_generator::SampleGenerator;
use crate::adapters::spec_loader::SpecDocument;
use crate::config::OutputSettings;
use crate::domain::error::AssembleError;
use crate::domain::operation::{ApiOperation, ParameterLocation, RequestBody};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::debug;

pub const MULTIPART_BOUNDARY: &str = "SpecimenFormBoundary";

const HTTP_TEMPLATE: &str = r#"@baseUrl = {{ base_url }}
{% for request in requests %}
### {{ request.title }}
{{ request.method }} {% raw %}{{baseUrl}}{% endraw %}{{ request.target }}
{% for header in request.headers -%}
{{ header.name }}: {{ header.value }}
{% endfor -%}
{% if request.body %}
{{ request.body }}
{% endif -%}
{% endfor -%}
"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

/// One assembled request; `target` is the path and query relative to the base URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpRequest {
    pub title: String,
    pub method: String,
    pub target: String,
    pub headers: Vec<HttpHeader>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

pub struct RequestAssembler {
    generator: Arc<SampleGenerator>,
    options: OutputSettings,
}

impl RequestAssembler {
    pub fn new(generator: Arc<SampleGenerator>, options: OutputSettings) -> Self {
        Self { generator, options }
    }

    /// Render the whole document as a `.http` file
    pub fn render<R>(&self, document: &SpecDocument, rng: &mut R) -> Result<String, AssembleError>
    where
        R: Rng + ?Sized,
    {
        let base_url = self
            .options
            .base_url
            .clone()
            .unwrap_or_else(|| document.base_url());
        let requests = self.assemble(document, rng)?;
        self.render_requests(&base_url, &requests)
    }

    pub fn assemble<R>(
        &self,
        document: &SpecDocument,
        rng: &mut R,
    ) -> Result<Vec<HttpRequest>, AssembleError>
    where
        R: Rng + ?Sized,
    {
        document
            .operations()?
            .iter()
            .map(|operation| self.assemble_operation(operation, rng))
            .collect()
    }

    pub fn assemble_operation<R>(
        &self,
        operation: &ApiOperation,
        rng: &mut R,
    ) -> Result<HttpRequest, AssembleError>
    where
        R: Rng + ?Sized,
    {
        let mut path = operation.path.clone();
        let mut query = Vec::new();
        let mut headers = Vec::new();
        let mut cookies = Vec::new();

        for parameter in &operation.parameters {
            if !parameter.required && !self.options.include_optional_parameters {
                continue;
            }
            let value = self.generator.generate_with_rng(parameter.schema.as_ref(), rng);

            match parameter.location {
                ParameterLocation::Path => {
                    let placeholder = format!("{{{}}}", parameter.name);
                    let text = plain_text(&value);
                    path = path.replace(&placeholder, &urlencoding::encode(&text));
                }
                ParameterLocation::Query => {
                    for (name, text) in form_pairs(&parameter.name, &value) {
                        query.push(format!(
                            "{}={}",
                            urlencoding::encode(&name),
                            urlencoding::encode(&text)
                        ));
                    }
                }
                ParameterLocation::Header => headers.push(HttpHeader {
                    name: parameter.name.clone(),
                    value: plain_text(&value),
                }),
                ParameterLocation::Cookie => {
                    cookies.push(format!("{}={}", parameter.name, plain_text(&value)))
                }
            }
        }

        if !cookies.is_empty() {
            headers.push(HttpHeader {
                name: "Cookie".to_string(),
                value: cookies.join("; "),
            });
        }

        let mut body = None;
        if let Some(request_body) = &operation.body {
            if request_body.required || self.options.include_optional_parameters {
                let (content_type, text) = self.encode_body(request_body, rng)?;
                headers.push(HttpHeader {
                    name: "Content-Type".to_string(),
                    value: content_type,
                });
                body = Some(text);
            }
        }

        let target = if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query.join("&"))
        };
        debug!("Assembled {} {}", operation.method, target);

        Ok(HttpRequest {
            title: operation.title(),
            method: operation.method.clone(),
            target,
            headers,
            body,
        })
    }

    pub fn render_requests(
        &self,
        base_url: &str,
        requests: &[HttpRequest],
    ) -> Result<String, AssembleError> {
        let mut context = Context::new();
        context.insert("base_url", base_url.trim_end_matches('/'));
        context.insert("requests", requests);
        Ok(Tera::one_off(HTTP_TEMPLATE, &context, false)?)
    }

    /// Header value and body text for a request body
    fn encode_body<R>(
        &self,
        request_body: &RequestBody,
        rng: &mut R,
    ) -> Result<(String, String), AssembleError>
    where
        R: Rng + ?Sized,
    {
        let value = self
            .generator
            .generate_with_rng(request_body.schema.as_ref(), rng);
        let content_type = request_body.content_type.to_ascii_lowercase();

        if content_type.contains("json") {
            return Ok((request_body.content_type.clone(), self.json_text(&value)?));
        }
        if content_type.starts_with("application/x-www-form-urlencoded") {
            let pairs: Vec<String> = object_pairs(&value)
                .into_iter()
                .map(|(name, text)| {
                    format!("{}={}", urlencoding::encode(&name), urlencoding::encode(&text))
                })
                .collect();
            return Ok((request_body.content_type.clone(), pairs.join("&")));
        }
        if content_type.starts_with("multipart/form-data") {
            let mut text = String::new();
            for (name, part) in object_pairs(&value) {
                text.push_str(&format!(
                    "--{}\nContent-Disposition: form-data; name=\"{}\"\n\n{}\n",
                    MULTIPART_BOUNDARY, name, part
                ));
            }
            text.push_str(&format!("--{}--", MULTIPART_BOUNDARY));
            return Ok((
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
                text,
            ));
        }
        if content_type.starts_with("text/") {
            return Ok((request_body.content_type.clone(), plain_text(&value)));
        }

        Ok((request_body.content_type.clone(), self.json_text(&value)?))
    }

    fn json_text(&self, value: &Value) -> Result<String, serde_json::Error> {
        if self.options.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// Scalar text of a value; sequences and mappings use the comma-joined simple style
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => simple_style(value),
    }
}

fn simple_style(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(plain_text).collect::<Vec<_>>().join(","),
        Value::Object(entries) => entries
            .iter()
            .flat_map(|(k, v)| [k.clone(), plain_text(v)])
            .collect::<Vec<_>>()
            .join(","),
        _ => plain_text(value),
    }
}

/// Exploded form-style pairs: one per sequence item or mapping entry
pub fn form_pairs(name: &str, value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| (name.to_string(), plain_text(item)))
            .collect(),
        Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| (k.clone(), plain_text(v)))
            .collect(),
        _ => vec![(name.to_string(), plain_text(value))],
    }
}

/// Top-level fields of a form body; nested structures travel as JSON text
fn object_pairs(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::Array(_) | Value::Object(_) => v.to_string(),
                    _ => plain_text(v),
                };
                (k.clone(), text)
            })
            .collect(),
        Value::Null => Vec::new(),
        _ => vec![("value".to_string(), plain_text(value))],
    }
}
