use anyhow::{Context, Result};
use colored::Colorize;
use pricing_service::config::Config;
use pricing_service::database::create_pool;
use pricing_service::observability::init_tracing;
use sqlx::PgPool;
use std::path::Path;

pub mod admin;
pub mod import;

/// Load configuration, start logging and connect to the configured database
///
/// `config_file` replaces the usual search path. Management commands always
/// work against PostgreSQL; the in-memory store the server falls back to
/// would discard their work on exit.
pub async fn connect(config_file: Option<&Path>) -> Result<(Config, PgPool)> {
    let config = match config_file {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    init_tracing(&config).context("Failed to initialize logging")?;

    let Some(database) = config.database.as_ref() else {
        anyhow::bail!(
            "No database configured.\n\n\
            Set [database] url in config.toml or export PRICING_DATABASE__URL"
        );
    };

    let pool = create_pool(database)
        .await
        .context("Failed to connect to the database")?;
    Ok((config, pool))
}

/// Success message with checkmark
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Warning message
pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
