//! Folio server binary

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use folio_config::{ConfigLoader, FolioConfig, LogLevel};
use folio_schema::SchemaBinder;
use folio_server::cli::{Cli, Commands, ConfigCommands};
use folio_server::services::{create_type_registry, load_job_types};
use folio_server::Server;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A sample must not depend on a valid configuration
    if let Some(Commands::Config {
        config_cmd: ConfigCommands::Sample,
    }) = &cli.command
    {
        print!("{}", FolioConfig::generate_sample());
        return Ok(());
    }

    let mut config = ConfigLoader::new()
        .load(cli.config.as_ref())
        .context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow!("Invalid --log-level '{}': {}", level, e))?;
    }
    folio_logging::init_logging_from_config(&config.logging)?;

    match cli.command {
        None => serve(config, None, None).await,
        Some(Commands::Serve { bind, port }) => serve(config, bind, port).await,
        Some(Commands::Validate { job_types_dir }) => validate(&config, job_types_dir).await,
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Show => {
                print!("{}", serde_yaml::to_string(&config)?);
                Ok(())
            }
            ConfigCommands::Sample => Ok(()),
        },
    }
}

async fn serve(mut config: FolioConfig, bind: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let server = Server::new(config).await?;
    server.start().await
}

/// Load every job type and print what was loaded and what was skipped
async fn validate(config: &FolioConfig, job_types_dir: Option<PathBuf>) -> Result<()> {
    let directory = job_types_dir.unwrap_or_else(|| config.job_types.directory.clone());
    let binder = Arc::new(SchemaBinder::new(Arc::new(create_type_registry())));
    let (_, report) = load_job_types(&directory, binder).await?;

    for id in &report.loaded {
        println!("ok      {}", id);
    }
    for skipped in &report.skipped {
        println!("skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    println!(
        "{} job types loaded, {} skipped",
        report.loaded.len(),
        report.skipped.len()
    );

    if report.skipped.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} job types in {} could not be loaded",
            report.skipped.len(),
            directory.display()
        ))
    }
}
