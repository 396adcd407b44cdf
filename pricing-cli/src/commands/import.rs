use anyhow::{Context, Result};
use colored::Colorize;
use pricing_service::error::Error;
use pricing_service::products::import::{import_file, ImportSummary};
use pricing_service::products::{PgProductRepository, ProductRepository};
use std::path::{Path, PathBuf};

use super::{connect, success};

pub async fn execute(config_file: Option<&Path>, csv_file: PathBuf) -> Result<()> {
    if !csv_file.is_file() {
        anyhow::bail!("CSV file not found: {}", csv_file.display());
    }

    let (_config, pool) = connect(config_file).await?;
    let products = PgProductRepository::new(pool);

    let summary = run(&csv_file, &products).await?;
    success(&format!(
        "Imported {} product(s) from {}",
        summary.imported,
        csv_file.display()
    ));
    Ok(())
}

/// Import the file, printing per-field details when a row is rejected
async fn run(csv_file: &Path, products: &dyn ProductRepository) -> Result<ImportSummary> {
    match import_file(csv_file, products).await {
        Ok(summary) => Ok(summary),
        Err(Error::InvalidRow { line, errors }) => {
            eprintln!("{} line {}", "Rejected row at".red().bold(), line);
            for (field, messages) in errors.iter() {
                for message in messages {
                    eprintln!("  {}: {}", field.bold(), message);
                }
            }
            anyhow::bail!("Import aborted; no products were saved")
        }
        Err(e) => Err(e).with_context(|| format!("Failed to import {}", csv_file.display())),
    }
}
