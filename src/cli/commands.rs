//! CLI command implementations

use std::path::Path;

use serde_json::json;

use crate::config::AppConfig;
use crate::http_server::HttpServer;
use crate::logging::{init_logging, DEFAULT_FILTER};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config } => serve(config.as_deref()),
        Command::CheckConfig { config } => check_config(&config),
    }
}

fn load_config(config_path: Option<&Path>) -> CliResult<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Start the HTTP API server and block until shutdown
pub fn serve(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    init_logging(DEFAULT_FILTER).map_err(CliError::logging_error)?;

    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        dbname = %config.database.dbname,
        schema = %config.database.schema,
        layers = config.layers.len(),
        "configuration loaded"
    );

    let server = HttpServer::from_config(&config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Validate a configuration file and print the effective settings
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    let summary = config_summary(&config);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Effective settings without the database password
fn config_summary(config: &AppConfig) -> serde_json::Value {
    json!({
        "server": config.server,
        "database": {
            "host": config.database.host,
            "port": config.database.port,
            "user": config.database.user,
            "dbname": config.database.dbname,
            "schema": config.database.schema,
            "geometry_column": config.database.geometry_column,
        },
        "layers": config.layers,
    })
}
