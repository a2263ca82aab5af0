use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Specimen - schema-driven sample values and request files for OpenAPI documents
#[derive(Parser, Debug, Clone)]
#[command(name = "specimen", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SPECIMEN_CONFIG", default_value = "specimen.toml", global = true)]
    pub config: PathBuf,

    /// Seed for reproducible output
    #[arg(long, env = "SPECIMEN_SEED", global = true)]
    pub seed: Option<u64>,

    /// Generate `$ref` targets from the schema registry instead of placeholders
    #[arg(long, global = true)]
    pub resolve_refs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print a sample value for a schema file
    Sample(SampleArgs),
    /// Write a `.http` request file for an OpenAPI or Swagger document
    Http(HttpArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    /// JSON or YAML schema, or a whole API document
    pub file: PathBuf,

    /// JSON pointer selecting the schema inside the file (e.g. /components/schemas/Pet)
    #[arg(short, long)]
    pub pointer: Option<String>,

    /// Print the value on a single line
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HttpArgs {
    /// OpenAPI 3 or Swagger 2 document
    pub spec: PathBuf,

    /// Output file; stdout when absent
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Base URL written as `@baseUrl`, overriding the document's servers
    #[arg(long)]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["specimen", "sample", "pet.json"]);
        assert_eq!(cli.config, PathBuf::from("specimen.toml"));
        assert!(cli.seed.is_none());
        assert!(!cli.resolve_refs);
        match cli.command {
            Command::Sample(args) => {
                assert_eq!(args.file, PathBuf::from("pet.json"));
                assert!(args.pointer.is_none());
                assert!(!args.compact);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_sample_with_args() {
        let cli = Cli::parse_from([
            "specimen",
            "--config",
            "custom.toml",
            "--seed",
            "42",
            "--resolve-refs",
            "sample",
            "petstore.yaml",
            "--pointer",
            "/components/schemas/Pet",
            "--compact",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.seed, Some(42));
        assert!(cli.resolve_refs);
        match cli.command {
            Command::Sample(args) => {
                assert_eq!(args.pointer.as_deref(), Some("/components/schemas/Pet"));
                assert!(args.compact);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_http_with_args() {
        let cli = Cli::parse_from([
            "specimen",
            "http",
            "api.json",
            "--out",
            "requests/api.http",
            "--base-url",
            "http://localhost:3000",
            "--seed",
            "7",
        ]);
        assert_eq!(cli.seed, Some(7));
        match cli.command {
            Command::Http(args) => {
                assert_eq!(args.spec, PathBuf::from("api.json"));
                assert_eq!(args.out, Some(PathBuf::from("requests/api.http")));
                assert_eq!(args.base_url.as_deref(), Some("http://localhost:3000"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["specimen"]).is_err());
    }
}
