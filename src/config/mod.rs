use anyhow::Context;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod schema;
pub mod validator;

pub use schema::{SchemaConfig, SchemaRegistry};

use crate::cli::{Cli, Command};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub schemas: SchemaSourceSettings,
    /// Named reusable schemas, declared inline or loaded from `schemas.dir`
    #[serde(default)]
    pub definitions: Vec<SchemaConfig>,
}

/// Knobs of the sample generator
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorSettings {
    /// Chance that an optional object property is included
    #[serde(default = "default_optional_probability")]
    pub optional_property_probability: f64,
    /// Seed for reproducible output; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Nesting limit of the constraint-aware generator
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Follow `$ref` through the schema registry instead of emitting placeholders
    #[serde(default)]
    pub resolve_references: bool,
    #[serde(default = "default_max_reference_depth")]
    pub max_reference_depth: usize,
    #[serde(default)]
    pub literals: LiteralSettings,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            optional_property_probability: default_optional_probability(),
            seed: None,
            max_depth: default_max_depth(),
            resolve_references: false,
            max_reference_depth: default_max_reference_depth(),
            literals: LiteralSettings::default(),
        }
    }
}

fn default_optional_probability() -> f64 {
    0.7
}

fn default_max_depth() -> usize {
    32
}

fn default_max_reference_depth() -> usize {
    4
}

/// Fixed values emitted for string formats and synthetic properties
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiteralSettings {
    pub email: String,
    pub uri: String,
    pub uuid: String,
    pub ipv4: String,
    pub ipv6: String,
    pub hostname: String,
    /// Returned for strings constrained by `pattern`
    pub pattern: String,
    /// Word repeated or truncated to build plain strings
    pub base_word: String,
    pub additional_property_name: String,
    pub additional_property_value: String,
}

impl Default for LiteralSettings {
    fn default() -> Self {
        Self {
            email: "user@example.com".to_string(),
            uri: "https://example.com".to_string(),
            uuid: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            ipv4: "192.168.1.1".to_string(),
            ipv6: "2001:0db8:85a3:0000:0000:8a2e:0370:7334".to_string(),
            hostname: "example.com".to_string(),
            pattern: "pattern-match".to_string(),
            base_word: "example".to_string(),
            additional_property_name: "additionalProp1".to_string(),
            additional_property_value: "string".to_string(),
        }
    }
}

/// Request file rendering options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Overrides the server URL declared by the document
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_true")]
    pub include_optional_parameters: bool,
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            include_optional_parameters: true,
            pretty: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaSourceSettings {
    /// Directory of named schema files, relative to the configuration file
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Settings {
    /// Create settings from CLI arguments (config file, environment, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.load_external_schemas(&cli.config)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(config_path: &Path) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(config_path)?;
        settings.load_external_schemas(config_path)?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("SPECIMEN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        // The config crate lowercases keys, which would break camelCase schema keywords
        settings.definitions = Self::load_inline_definitions(config_path)?;
        Ok(settings)
    }

    fn load_inline_definitions(config_path: &Path) -> Result<Vec<SchemaConfig>, anyhow::Error> {
        #[derive(Deserialize)]
        struct DefinitionsFile {
            #[serde(default)]
            definitions: Vec<SchemaConfig>,
        }

        if !config_path.is_file() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let file: DefinitionsFile = match config_path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        Ok(file.definitions)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// Apply CLI argument overrides to settings
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(seed) = cli.seed {
            self.generator.seed = Some(seed);
        }
        if cli.resolve_refs {
            self.generator.resolve_references = true;
        }
        if let Command::Http(args) = &cli.command {
            if let Some(base_url) = &args.base_url {
                self.output.base_url = Some(base_url.clone());
            }
        }
    }

    fn load_external_schemas(&mut self, config_path: &Path) -> Result<(), anyhow::Error> {
        let Some(dir) = self.schemas.dir.clone() else {
            return Ok(());
        };
        let root = config_path.parent().unwrap_or_else(|| Path::new("."));
        let dir = if dir.is_absolute() { dir } else { root.join(dir) };
        self.load_schemas_from_dir(&dir)
    }

    fn load_schemas_from_dir(&mut self, path: &Path) -> Result<(), anyhow::Error> {
        let pattern = format!("{}/*", path.display());
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) => {
                    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                        if matches!(ext, "json" | "yaml" | "yml" | "toml") {
                            let content = std::fs::read_to_string(&path)?;
                            let definition: SchemaConfig = match ext {
                                "json" => serde_json::from_str(&content)?,
                                "toml" => toml::from_str(&content)?,
                                _ => serde_yaml::from_str(&content)?,
                            };
                            tracing::debug!("Loaded schema '{}' from {}", definition.name, path.display());
                            self.definitions.push(definition);
                        }
                    }
                }
                Err(e) => tracing::warn!("Failed to read glob entry: {}", e),
            }
        }
        Ok(())
    }

    /// Registry over the configured named schemas
    pub fn registry(&self) -> Result<SchemaRegistry, anyhow::Error> {
        SchemaRegistry::from_configs(&self.definitions)
            .map_err(|e| anyhow::anyhow!("Invalid schema definition: {}", e))
    }
}
