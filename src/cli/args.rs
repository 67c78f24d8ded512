//! CLI argument definitions using clap
//!
//! Commands:
//! - geoportal serve [--config <path>]
//! - geoportal check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// geoportal - read-only GeoJSON API over PostGIS layers
#[derive(Parser, Debug)]
#[command(name = "geoportal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        /// Path to configuration file (built-in defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load and validate a configuration file, then print the effective settings
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./geoportal.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_without_config() {
        let cli = Cli::try_parse_from(["geoportal", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { config: None }));
    }

    #[test]
    fn test_check_config_default_path() {
        let cli = Cli::try_parse_from(["geoportal", "check-config"]).unwrap();
        match cli.command {
            Command::CheckConfig { config } => {
                assert_eq!(config, PathBuf::from("./geoportal.json"))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["geoportal", "migrate"]).is_err());
    }
}
