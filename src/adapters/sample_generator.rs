//! Schema-driven sample value generation.
//!
//! Generation is a two-stage pipeline. The constraint-aware generator runs
//! first and reports malformed or unsupported input as a [`GenerationError`];
//! only then does the simplified generator, which dispatches on `type` alone
//! and cannot fail, produce the value. Callers always get a value back.
//!
//! A `$ref` is not expanded structurally. Unless a [`ReferenceResolver`] is
//! attached and knows the target, a reference becomes the placeholder
//! `{"id": 1, "name": <last segment of the reference>}`.

use crate::config::GeneratorSettings;
use crate::domain::error::GenerationError;
use crate::domain::schema::{reference_name, AdditionalProperties, SchemaKind, SchemaNode};
use crate::domain::{Clock, ReferenceResolver, SystemClock};
use base64::Engine as _;
use chrono::SecondsFormat;
use fake::faker::boolean::en::Boolean;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_MIN_LENGTH: usize = 3;
const DEFAULT_MAX_LENGTH: usize = 10;
const PREFERRED_LENGTH: usize = 5;

const DEFAULT_MIN_ITEMS: usize = 1;
const DEFAULT_MAX_ITEMS: usize = 3;
const PREFERRED_ITEMS: usize = 2;

const DEFAULT_LOW: f64 = 0.0;
const DEFAULT_HIGH: f64 = 100.0;

/// Largest factor tried when turning a fractional `multipleOf` into a whole step
const MAX_STEP_SCALE: u32 = 1000;

pub struct SampleGenerator {
    settings: GeneratorSettings,
    resolver: Option<Arc<dyn ReferenceResolver>>,
    clock: Arc<dyn Clock>,
}

/// Outcome of the `$ref` / `example` / `examples` checks that precede generation
enum Shortcut<'a> {
    Value(Value),
    Resolved(&'a SchemaNode),
    Generate,
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new(GeneratorSettings::default())
    }
}

impl SampleGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            settings,
            resolver: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Random source for one pass: seeded when configured, entropy otherwise
    pub fn rng(&self) -> StdRng {
        match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Generate a sample for `node`, or `null` when there is nothing to infer
    pub fn generate(&self, node: Option<&SchemaNode>) -> Value {
        let mut rng = self.rng();
        self.generate_with_rng(node, &mut rng)
    }

    /// Same as [`generate`](Self::generate) with a caller-owned random source
    pub fn generate_with_rng<R>(&self, node: Option<&SchemaNode>, rng: &mut R) -> Value
    where
        R: Rng + ?Sized,
    {
        let Some(node) = node else {
            return Value::Null;
        };

        match self.try_generate(node, rng) {
            Ok(value) => value,
            Err(e) => {
                debug!("Constraint-aware generation failed ({}), using simplified generator", e);
                self.generate_simple(node, rng)
            }
        }
    }

    /// Constraint-aware generation only, surfacing its failure
    pub fn try_generate<R>(&self, node: &SchemaNode, rng: &mut R) -> Result<Value, GenerationError>
    where
        R: Rng + ?Sized,
    {
        self.rich_node(node, rng, 0, 0)
    }

    /// Simplified generation: dispatch on `type` only, never fails
    pub fn generate_simple<R>(&self, node: &SchemaNode, rng: &mut R) -> Value
    where
        R: Rng + ?Sized,
    {
        if let Some(reference) = &node.reference {
            return placeholder(reference);
        }
        if let Some(example) = &node.example {
            return example.clone();
        }
        if let Some(example) = node.first_example() {
            return example;
        }

        let Some(kind) = node.kind else {
            return node.enum_values.first().cloned().unwrap_or(Value::Null);
        };

        match kind {
            SchemaKind::String => self.simple_string(node),
            SchemaKind::Number | SchemaKind::Integer => {
                if let Some(first) = node.enum_values.first() {
                    return first.clone();
                }
                let mut value = constrained_midpoint(node, kind);
                if kind == SchemaKind::Integer {
                    value = value.round();
                }
                number_value(value, kind)
            }
            SchemaKind::Boolean => Value::Bool(true),
            SchemaKind::Array => {
                let count = item_count(
                    lenient_count(node.min_items),
                    lenient_count(node.max_items),
                );
                match &node.items {
                    Some(items) => Value::Array(
                        (0..count).map(|_| self.generate_simple(items, rng)).collect(),
                    ),
                    None => Value::Array(Vec::new()),
                }
            }
            SchemaKind::Object => {
                let mut object = Map::new();
                for (name, property) in &node.properties {
                    if node.is_required(name) || self.include_optional(rng) {
                        object.insert(name.clone(), self.generate_simple(property, rng));
                    }
                }
                if let Some(extra) = &node.additional_properties {
                    let value = match extra {
                        AdditionalProperties::Allowed(true) => Some(self.additional_value()),
                        AdditionalProperties::Schema(schema) => {
                            Some(self.generate_simple(schema, rng))
                        }
                        AdditionalProperties::Allowed(false) => None,
                    };
                    if let Some(value) = value {
                        self.insert_additional(&mut object, value);
                    }
                }
                Value::Object(object)
            }
        }
    }

    fn shortcut<'a>(&'a self, node: &SchemaNode, reference_depth: usize) -> Shortcut<'a> {
        if let Some(reference) = &node.reference {
            if let Some(resolver) = &self.resolver {
                if reference_depth < self.settings.max_reference_depth {
                    if let Some(target) = resolver.resolve(reference) {
                        return Shortcut::Resolved(target);
                    }
                    debug!("Reference '{}' not found in registry, using placeholder", reference);
                } else {
                    debug!("Reference depth limit reached at '{}', using placeholder", reference);
                }
            }
            return Shortcut::Value(placeholder(reference));
        }
        if let Some(example) = &node.example {
            return Shortcut::Value(example.clone());
        }
        if let Some(example) = node.first_example() {
            return Shortcut::Value(example);
        }
        Shortcut::Generate
    }

    fn rich_node<R>(
        &self,
        node: &SchemaNode,
        rng: &mut R,
        depth: usize,
        reference_depth: usize,
    ) -> Result<Value, GenerationError>
    where
        R: Rng + ?Sized,
    {
        if depth > self.settings.max_depth {
            return Err(GenerationError::DepthExceeded(self.settings.max_depth));
        }

        match self.shortcut(node, reference_depth) {
            Shortcut::Value(value) => Ok(value),
            Shortcut::Resolved(target) => self.rich_node(target, rng, depth + 1, reference_depth + 1),
            Shortcut::Generate => self.rich_body(node, rng, depth, reference_depth),
        }
    }

    fn rich_body<R>(
        &self,
        node: &SchemaNode,
        rng: &mut R,
        depth: usize,
        reference_depth: usize,
    ) -> Result<Value, GenerationError>
    where
        R: Rng + ?Sized,
    {
        if !node.all_of.is_empty() {
            let merged = self.merge_all_of(node, reference_depth);
            return self.rich_node(&merged, rng, depth + 1, reference_depth);
        }

        let Some(kind) = node.kind else {
            if let Some(first) = node.enum_values.first() {
                return Ok(first.clone());
            }
            return match node.one_of.first().or(node.any_of.first()) {
                Some(alternative) => self.rich_node(alternative, rng, depth + 1, reference_depth),
                None => Ok(Value::Null),
            };
        };

        match kind {
            SchemaKind::String => self.rich_string(node),
            SchemaKind::Number | SchemaKind::Integer => rich_number(node, kind),
            SchemaKind::Boolean => Ok(Value::Bool(Boolean(50).fake_with_rng(rng))),
            SchemaKind::Array => {
                let count = item_count(
                    strict_count("minItems", node.min_items)?,
                    strict_count("maxItems", node.max_items)?,
                );
                match &node.items {
                    Some(items) => (0..count)
                        .map(|_| self.rich_node(items, rng, depth + 1, reference_depth))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array),
                    None => Ok(Value::Array(Vec::new())),
                }
            }
            SchemaKind::Object => {
                let mut object = Map::new();
                for (name, property) in &node.properties {
                    if node.is_required(name) || self.include_optional(rng) {
                        let value = self.rich_node(property, rng, depth + 1, reference_depth)?;
                        object.insert(name.clone(), value);
                    }
                }
                match &node.additional_properties {
                    Some(AdditionalProperties::Allowed(true)) => {
                        let value = self.additional_value();
                        self.insert_additional(&mut object, value);
                    }
                    Some(AdditionalProperties::Schema(schema)) => {
                        let value = self.rich_node(schema, rng, depth + 1, reference_depth)?;
                        self.insert_additional(&mut object, value);
                    }
                    _ => {}
                }
                Ok(Value::Object(object))
            }
        }
    }

    fn rich_string(&self, node: &SchemaNode) -> Result<Value, GenerationError> {
        if let Some(first) = node.enum_values.first() {
            return Ok(first.clone());
        }
        if let Some(literal) = node.format.as_deref().and_then(|f| self.format_literal(f, true)) {
            return Ok(Value::String(literal));
        }
        if node.pattern.is_some() {
            return Ok(Value::String(self.settings.literals.pattern.clone()));
        }

        let min = strict_count("minLength", node.min_length)?;
        let max = strict_count("maxLength", node.max_length)?;
        Ok(Value::String(self.sized_word(min, max)))
    }

    fn simple_string(&self, node: &SchemaNode) -> Value {
        if let Some(first) = node.enum_values.first() {
            return first.clone();
        }
        if let Some(literal) = node.format.as_deref().and_then(|f| self.format_literal(f, false)) {
            return Value::String(literal);
        }
        if node.pattern.is_some() {
            return Value::String(self.settings.literals.pattern.clone());
        }
        Value::String(self.sized_word(
            lenient_count(node.min_length),
            lenient_count(node.max_length),
        ))
    }

    /// Canonical literal for a string format; `extended` adds the formats
    /// only the constraint-aware generator knows.
    fn format_literal(&self, format: &str, extended: bool) -> Option<String> {
        let literals = &self.settings.literals;
        let literal = match format {
            "date" => self.clock.now().format("%Y-%m-%d").to_string(),
            "date-time" => self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "email" => literals.email.clone(),
            "uri" | "url" => literals.uri.clone(),
            "uuid" => literals.uuid.clone(),
            "ipv4" => literals.ipv4.clone(),
            "ipv6" => literals.ipv6.clone(),
            "time" if extended => self.clock.now().format("%H:%M:%S").to_string(),
            "hostname" if extended => literals.hostname.clone(),
            "byte" if extended => {
                base64::engine::general_purpose::STANDARD.encode(literals.base_word.as_bytes())
            }
            "password" if extended => "********".to_string(),
            _ => return None,
        };
        Some(literal)
    }

    /// The base word cycled or truncated to the preferred length, clamped to the length bounds
    fn sized_word(&self, min: Option<usize>, max: Option<usize>) -> String {
        let length = clamp_preferred(
            PREFERRED_LENGTH,
            min,
            max,
            (DEFAULT_MIN_LENGTH, DEFAULT_MAX_LENGTH),
        );
        self.settings
            .literals
            .base_word
            .chars()
            .cycle()
            .take(length)
            .collect()
    }

    fn include_optional<R>(&self, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        rng.gen::<f64>() <= self.settings.optional_property_probability
    }

    fn additional_value(&self) -> Value {
        Value::String(self.settings.literals.additional_property_value.clone())
    }

    fn insert_additional(&self, object: &mut Map<String, Value>, value: Value) {
        let name = &self.settings.literals.additional_property_name;
        if !object.contains_key(name) {
            object.insert(name.clone(), value);
        }
    }

    /// Flatten `allOf` members into one node.
    ///
    /// Properties and required names accumulate, nested `allOf` lists are
    /// flattened first, and every other keyword keeps the first value seen,
    /// starting with the node itself.
    fn merge_all_of(&self, node: &SchemaNode, reference_depth: usize) -> SchemaNode {
        let mut merged = SchemaNode {
            all_of: Vec::new(),
            ..node.clone()
        };

        for member in &node.all_of {
            let (member, member_depth) = match (&member.reference, &self.resolver) {
                (Some(reference), Some(resolver))
                    if reference_depth < self.settings.max_reference_depth =>
                {
                    match resolver.resolve(reference) {
                        Some(resolved) => (resolved, reference_depth + 1),
                        None => (member, reference_depth),
                    }
                }
                _ => (member, reference_depth),
            };
            let member = if member.all_of.is_empty() {
                Cow::Borrowed(member)
            } else {
                Cow::Owned(self.merge_all_of(member, member_depth))
            };
            absorb(&mut merged, &member);
        }

        if merged.kind.is_none() && !merged.properties.is_empty() {
            merged.kind = Some(SchemaKind::Object);
        }
        merged
    }
}

/// Fold one `allOf` member into the accumulated node
fn absorb(merged: &mut SchemaNode, member: &SchemaNode) {
    merged.kind = merged.kind.or(member.kind);
    if merged.enum_values.is_empty() {
        merged.enum_values = member.enum_values.clone();
    }
    merged.example = merged.example.take().or_else(|| member.example.clone());
    merged.examples = merged.examples.take().or_else(|| member.examples.clone());
    merged.format = merged.format.take().or_else(|| member.format.clone());
    merged.pattern = merged.pattern.take().or_else(|| member.pattern.clone());
    merged.minimum = merged.minimum.or(member.minimum);
    merged.maximum = merged.maximum.or(member.maximum);
    merged.exclusive_minimum = merged.exclusive_minimum.or(member.exclusive_minimum);
    merged.exclusive_maximum = merged.exclusive_maximum.or(member.exclusive_maximum);
    merged.multiple_of = merged.multiple_of.or(member.multiple_of);
    merged.min_length = merged.min_length.or(member.min_length);
    merged.max_length = merged.max_length.or(member.max_length);
    merged.min_items = merged.min_items.or(member.min_items);
    merged.max_items = merged.max_items.or(member.max_items);
    merged.items = merged.items.take().or_else(|| member.items.clone());
    merged.additional_properties = merged
        .additional_properties
        .take()
        .or_else(|| member.additional_properties.clone());
    if merged.one_of.is_empty() {
        merged.one_of = member.one_of.clone();
    }
    if merged.any_of.is_empty() {
        merged.any_of = member.any_of.clone();
    }
    for (name, property) in &member.properties {
        merged
            .properties
            .entry(name.clone())
            .or_insert_with(|| property.clone());
    }
    for name in &member.required {
        if !merged.is_required(name) {
            merged.required.push(name.clone());
        }
    }
}

fn placeholder(reference: &str) -> Value {
    json!({ "id": 1, "name": reference_name(reference) })
}

fn rich_number(node: &SchemaNode, kind: SchemaKind) -> Result<Value, GenerationError> {
    if let Some(first) = node.enum_values.first() {
        return Ok(first.clone());
    }
    if let Some(step) = node.multiple_of {
        if !(step.is_finite() && step > 0.0) {
            return Err(GenerationError::InvalidConstraint {
                keyword: "multipleOf",
                reason: format!("must be a positive number, got {}", step),
            });
        }
    }
    for (keyword, bound) in [
        ("minimum", node.minimum),
        ("maximum", node.maximum),
        ("exclusiveMinimum", node.exclusive_minimum_value()),
        ("exclusiveMaximum", node.exclusive_maximum_value()),
    ] {
        if let Some(bound) = bound.filter(|b| !b.is_finite()) {
            return Err(GenerationError::InvalidConstraint {
                keyword,
                reason: format!("must be finite, got {}", bound),
            });
        }
    }

    let midpoint = constrained_midpoint(node, kind);
    let mut value = midpoint;
    if kind == SchemaKind::Integer {
        value = midpoint.round();
        // Rounding must not step outside an inclusive interval that contains the midpoint
        if node.maximum.is_some_and(|high| value > high) {
            value = midpoint.floor();
        } else if node.minimum.is_some_and(|low| value < low) {
            value = midpoint.ceil();
        }
    }

    if !value.is_finite() {
        return Err(GenerationError::NonFiniteNumber);
    }
    Ok(number_value(value, kind))
}

/// Midpoint of the declared interval, nudged inside exclusive bounds and
/// snapped to `multipleOf`.
fn constrained_midpoint(node: &SchemaNode, kind: SchemaKind) -> f64 {
    let exclusive_min = node.exclusive_minimum_value();
    let exclusive_max = node.exclusive_maximum_value();
    let declared_low = node.minimum.or(exclusive_min);
    let declared_high = node.maximum.or(exclusive_max);
    let low = declared_low
        .unwrap_or_else(|| declared_high.map_or(DEFAULT_LOW, |h| DEFAULT_LOW.min(h)));
    let high = declared_high.unwrap_or_else(|| DEFAULT_HIGH.max(low));

    // `high - low` overflows for wide finite bounds
    let mut value = low / 2.0 + high / 2.0;
    if let Some(bound) = exclusive_min {
        if value <= bound {
            value = bound + 1.0;
        }
    }
    if let Some(bound) = exclusive_max {
        if value >= bound {
            value = bound - 1.0;
        }
    }
    if let Some(step) = node.multiple_of.filter(|s| s.is_finite() && *s > 0.0) {
        let step = match kind {
            SchemaKind::Integer => whole_step(step).unwrap_or(step),
            _ => step,
        };
        value = snap_to_step(value, step, low, high);
    }
    value
}

/// Smallest multiple of `step` that is a whole number, if one is near
fn whole_step(step: f64) -> Option<f64> {
    (1..=MAX_STEP_SCALE)
        .map(|k| step * k as f64)
        .find(|scaled| (scaled - scaled.round()).abs() < 1e-9)
        .map(f64::round)
        .filter(|scaled| scaled.is_finite() && *scaled > 0.0)
}

/// Nearest multiple of `step`, preferring one inside `[low, high]`
fn snap_to_step(value: f64, step: f64, low: f64, high: f64) -> f64 {
    let quotient = value / step;
    let nearest = quotient.round() * step;
    if nearest > high {
        quotient.floor() * step
    } else if nearest < low {
        quotient.ceil() * step
    } else {
        nearest
    }
}

/// JSON number, preferring the integer form for whole values
fn number_value(value: f64, kind: SchemaKind) -> Value {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        return Value::from(value as i64);
    }
    if kind == SchemaKind::Integer && value.is_finite() {
        return Value::from(value.round() as i64);
    }
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn item_count(min: Option<usize>, max: Option<usize>) -> usize {
    clamp_preferred(
        PREFERRED_ITEMS,
        min,
        max,
        (DEFAULT_MIN_ITEMS, DEFAULT_MAX_ITEMS),
    )
}

/// `preferred` clamped to `[min, max]`.
///
/// A missing bound takes its default, widened so it never contradicts the
/// declared one. With both declared and `min > max`, `max` wins.
fn clamp_preferred(
    preferred: usize,
    min: Option<usize>,
    max: Option<usize>,
    (default_min, default_max): (usize, usize),
) -> usize {
    let low = min.unwrap_or_else(|| max.map_or(default_min, |m| default_min.min(m)));
    let high = max.unwrap_or_else(|| default_max.max(low));
    preferred.max(low).min(high)
}

/// Length/count keyword that must be a non-negative whole number
fn strict_count(keyword: &'static str, value: Option<f64>) -> Result<Option<usize>, GenerationError> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as usize)),
        Some(v) => Err(GenerationError::InvalidConstraint {
            keyword,
            reason: format!("must be a non-negative integer, got {}", v),
        }),
    }
}

fn lenient_count(value: Option<f64>) -> Option<usize> {
    value.filter(|v| v.is_finite()).map(|v| v.max(0.0) as usize)
}
