use anyhow::Context;
use clap::Parser;
use specimen::application;
use specimen::cli::{Cli, Command};
use specimen::config::Settings;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the generated output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;

    match &cli.command {
        Command::Sample(args) => {
            let value = application::sample(&settings, args).await?;
            println!("{}", value);
        }
        Command::Http(args) => {
            let rendered = application::http_file(&settings, args).await?;
            match &args.out {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .with_context(|| format!("Failed to create {}", parent.display()))?;
                    }
                    tokio::fs::write(path, rendered)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote requests to {}", path.display());
                }
                None => print!("{}", rendered),
            }
        }
    }

    Ok(())
}
