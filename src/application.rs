//! Use cases behind the `sample` and `http` commands.

use crate::adapters::request_assembler::RequestAssembler;
use crate::adapters::sample_generator::SampleGenerator;
use crate::adapters::spec_loader::{is_api_document, parse_document_value, SpecDocument};
use crate::cli::{HttpArgs, SampleArgs};
use crate::config::{SchemaRegistry, Settings};
use crate::domain::SchemaNode;
use anyhow::{bail, Context};
use std::sync::Arc;
use tracing::{debug, info};

/// Generator configured from settings; the registry is only attached when
/// reference resolution is enabled.
pub fn build_generator(settings: &Settings, registry: SchemaRegistry) -> SampleGenerator {
    let generator = SampleGenerator::new(settings.generator.clone());
    if settings.generator.resolve_references && !registry.is_empty() {
        info!("Resolving references against {} named schemas", registry.len());
        debug!("Named schemas: {}", registry.names().collect::<Vec<_>>().join(", "));
        generator.with_resolver(Arc::new(registry))
    } else {
        generator
    }
}

/// Generate one value for the schema in `args.file` and return it as JSON text
pub async fn sample(settings: &Settings, args: &SampleArgs) -> anyhow::Result<String> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let extension = args.file.extension().and_then(|e| e.to_str());
    let raw = parse_document_value(&text, extension)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let mut registry = settings.registry()?;
    if is_api_document(&raw) {
        let document = SpecDocument::from_value(raw.clone())?;
        registry.extend(document.registry()?);
    }

    let target = match args.pointer.as_deref() {
        Some(pointer) => raw
            .pointer(pointer)
            .with_context(|| format!("Pointer '{}' not found in {}", pointer, args.file.display()))?,
        None if is_api_document(&raw) => {
            bail!("{} is an API document; select a schema with --pointer", args.file.display())
        }
        None => &raw,
    };
    let node = SchemaNode::from_value(target).context("Selected value is not a schema")?;

    let generator = build_generator(settings, registry);
    let value = generator.generate(Some(&node));

    let rendered = if args.compact || !settings.output.pretty {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    Ok(rendered)
}

/// Render the `.http` request file for the document in `args.spec`
pub async fn http_file(settings: &Settings, args: &HttpArgs) -> anyhow::Result<String> {
    let document = SpecDocument::load(&args.spec)
        .await
        .with_context(|| format!("Failed to load {}", args.spec.display()))?;
    info!(
        "Loaded '{}' from {}",
        document.title().unwrap_or("untitled"),
        args.spec.display()
    );

    let mut registry = settings.registry()?;
    registry.extend(document.registry()?);

    let generator = Arc::new(build_generator(settings, registry));
    let mut rng = generator.rng();
    let assembler = RequestAssembler::new(generator, settings.output.clone());

    Ok(assembler.render(&document, &mut rng)?)
}
