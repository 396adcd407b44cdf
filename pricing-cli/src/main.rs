use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

/// pricing-cli - management commands for the pricing service
#[derive(Parser)]
#[command(name = "pricing-cli")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Read configuration from this file instead of the usual search path
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-load products from a CSV file (all rows or none)
    ImportProducts {
        /// Path to the CSV file
        #[arg(value_name = "CSV_FILE")]
        csv_file: PathBuf,
    },
    /// Create the bootstrap administrator if it does not exist yet
    CreateAdmin {
        /// Administrator username
        #[arg(long, default_value = "admin")]
        username: String,

        /// Administrator email
        #[arg(long, default_value = "admin@gmail.com")]
        email: String,

        /// Administrator password
        #[arg(long, env = "PRICING_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::ImportProducts { csv_file } => {
            commands::import::execute(cli.config.as_deref(), csv_file).await
        }
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => commands::admin::execute(cli.config.as_deref(), &username, &email, &password).await,
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "pricing-cli",
            "create-admin",
            "--password",
            "s3cret",
            "--config",
            "/tmp/pricing.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pricing.toml")));
        match cli.command {
            Commands::CreateAdmin {
                username, email, ..
            } => {
                assert_eq!(username, "admin");
                assert_eq!(email, "admin@gmail.com");
            }
            Commands::ImportProducts { .. } => panic!("expected create-admin"),
        }
    }
}
