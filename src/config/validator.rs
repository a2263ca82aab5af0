use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;

use crate::config::{GeneratorSettings, LiteralSettings, OutputSettings, SchemaConfig, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_generator(&settings.generator) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_literals(&settings.generator.literals) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_output(&settings.output) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_definitions(&settings.definitions) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_generator(generator: &GeneratorSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let probability = generator.optional_property_probability;
        if !(0.0..=1.0).contains(&probability) {
            errors.push(ValidationError::InvalidValue {
                field: "generator.optional_property_probability".to_string(),
                reason: format!("Must be between 0 and 1, got {}", probability),
            });
        }

        if generator.max_depth == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.max_depth".to_string(),
                reason: "Depth must be greater than 0".to_string(),
            });
        }

        if generator.max_reference_depth == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.max_reference_depth".to_string(),
                reason: "Depth must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_literals(literals: &LiteralSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if uuid::Uuid::parse_str(&literals.uuid).is_err() {
            errors.push(ValidationError::InvalidValue {
                field: "generator.literals.uuid".to_string(),
                reason: format!("'{}' is not a UUID", literals.uuid),
            });
        }

        if literals.ipv4.parse::<Ipv4Addr>().is_err() {
            errors.push(ValidationError::InvalidValue {
                field: "generator.literals.ipv4".to_string(),
                reason: format!("'{}' is not an IPv4 address", literals.ipv4),
            });
        }

        if literals.ipv6.parse::<Ipv6Addr>().is_err() {
            errors.push(ValidationError::InvalidValue {
                field: "generator.literals.ipv6".to_string(),
                reason: format!("'{}' is not an IPv6 address", literals.ipv6),
            });
        }

        if literals.base_word.is_empty() {
            errors.push(ValidationError::MissingField(
                "generator.literals.base_word".to_string(),
            ));
        }

        if literals.additional_property_name.is_empty() {
            errors.push(ValidationError::MissingField(
                "generator.literals.additional_property_name".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_output(output: &OutputSettings) -> Result<(), Vec<ValidationError>> {
        match &output.base_url {
            Some(url) if url.trim().is_empty() => Err(vec![ValidationError::InvalidValue {
                field: "output.base_url".to_string(),
                reason: "Base URL must not be empty when set".to_string(),
            }]),
            _ => Ok(()),
        }
    }

    fn validate_definitions(definitions: &[SchemaConfig]) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_names = HashMap::new();

        for (idx, definition) in definitions.iter().enumerate() {
            if let Some(prev_idx) = seen_names.insert(&definition.name, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Schema name '{}' appears at indices {} and {}",
                    definition.name, prev_idx, idx
                )));
            }

            if definition.name.is_empty() {
                errors.push(ValidationError::MissingField(format!(
                    "definitions[{}].name",
                    idx
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
