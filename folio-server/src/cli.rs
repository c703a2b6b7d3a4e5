//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "folio", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Serve the REST API and run submitted jobs (default)
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(long, value_name = "ADDRESS")]
        bind: Option<String>,

        /// Port to listen on, overriding the configuration
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// Load every job type in a directory and report the ones that fail
    Validate {
        /// Job types directory, defaulting to the configured one
        #[arg(long, value_name = "PATH")]
        job_types_dir: Option<PathBuf>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Print a sample configuration file with every default
    Sample,

    /// Print the configuration in use after environment overrides
    Show,
}
