use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use specimen::adapters::request_assembler::RequestAssembler;
use specimen::adapters::sample_generator::SampleGenerator;
use specimen::adapters::spec_loader::SpecDocument;
use specimen::config::{OutputSettings, SchemaRegistry};
use specimen::domain::SchemaNode;
use std::sync::Arc;

fn user_schema() -> SchemaNode {
    SchemaNode::from_value(&json!({
        "type": "object",
        "required": ["id", "email"],
        "properties": {
            "id": { "type": "string", "format": "uuid" },
            "email": { "type": "string", "format": "email" },
            "age": { "type": "integer", "minimum": 18, "maximum": 99 },
            "score": { "type": "number", "exclusiveMinimum": 0, "multipleOf": 0.5 },
            "tags": { "type": "array", "items": { "type": "string", "maxLength": 8 } },
            "active": { "type": "boolean" },
            "address": {
                "type": "object",
                "properties": {
                    "street": { "type": "string" },
                    "zip": { "type": "string", "pattern": "^[0-9]{5}$" }
                },
                "additionalProperties": true
            }
        }
    }))
    .unwrap()
}

fn benchmark_schema_kinds(c: &mut Criterion) {
    let generator = SampleGenerator::default();
    let mut rng = StdRng::seed_from_u64(42);

    let schemas = vec![
        ("string", json!({ "type": "string", "minLength": 3, "maxLength": 12 })),
        ("date_time", json!({ "type": "string", "format": "date-time" })),
        ("integer", json!({ "type": "integer", "minimum": -50, "maximum": 50 })),
        ("array", json!({ "type": "array", "items": { "type": "number" }, "minItems": 3 })),
        ("reference", json!({ "$ref": "#/components/schemas/Pet" })),
        ("malformed", json!({ "type": "string", "minLength": -1 })),
    ];

    let mut group = c.benchmark_group("schema_kinds");
    for (name, schema) in schemas {
        let node = SchemaNode::from_value(&schema).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &node, |b, node| {
            b.iter(|| generator.generate_with_rng(black_box(Some(node)), &mut rng));
        });
    }
    group.finish();
}

fn benchmark_nested_object(c: &mut Criterion) {
    let generator = SampleGenerator::default();
    let schema = user_schema();
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("nested_object", |b| {
        b.iter(|| generator.generate_with_rng(black_box(Some(&schema)), &mut rng));
    });
}

fn benchmark_resolved_reference(c: &mut Criterion) {
    let mut registry = SchemaRegistry::new();
    registry.insert("User", user_schema());
    let generator = SampleGenerator::default().with_resolver(Arc::new(registry));
    let schema = SchemaNode::reference("#/components/schemas/User");
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("resolved_reference", |b| {
        b.iter(|| generator.generate_with_rng(black_box(Some(&schema)), &mut rng));
    });
}

fn benchmark_http_render(c: &mut Criterion) {
    let document = SpecDocument::from_value(json!({
        "openapi": "3.0.0",
        "servers": [{ "url": "https://api.example.com" }],
        "paths": {
            "/users/{id}": {
                "get": {
                    "parameters": [
                        { "name": "id", "in": "path", "schema": { "type": "integer" } },
                        { "name": "fields", "in": "query", "schema": { "type": "array", "items": { "type": "string" } } }
                    ]
                },
                "put": {
                    "requestBody": {
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/User" } } }
                    }
                }
            }
        }
    }))
    .unwrap();
    let assembler = RequestAssembler::new(Arc::new(SampleGenerator::default()), OutputSettings::default());
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("http_render", |b| {
        b.iter(|| assembler.render(black_box(&document), &mut rng).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_schema_kinds,
    benchmark_nested_object,
    benchmark_resolved_reference,
    benchmark_http_render
);
criterion_main!(benches);
