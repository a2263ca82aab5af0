//! Error types shared across the generator, loader and assembler

use thiserror::Error;

/// Failures of the constraint-aware generator.
///
/// These never reach callers of `SampleGenerator::generate`; they only select
/// the simplified generator.
#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    /// A constraint keyword holds a value the generator cannot honor
    #[error("Invalid constraint {keyword}: {reason}")]
    InvalidConstraint {
        keyword: &'static str,
        reason: String,
    },

    /// Schema nesting went past the configured depth
    #[error("Maximum generation depth {0} exceeded")]
    DepthExceeded(usize),

    /// Numeric bounds produced an infinite or NaN value
    #[error("Numeric bounds produced a non-finite value")]
    NonFiniteNumber,
}

/// Errors raised while reading an OpenAPI or Swagger document
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// Neither an `openapi: 3.x` nor a `swagger: "2.0"` document
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unresolved local reference: '{0}'")]
    UnresolvedReference(String),

    #[error("Invalid schema at {location}: {source}")]
    Schema {
        location: String,
        source: serde_json::Error,
    },
}

/// Errors raised while assembling the request file
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Body encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
