use anyhow::{Context, Result};
use pricing_service::accounts::{Account, AccountService, PgAccountRepository};
use pricing_service::auth::{DefaultPasswordPolicy, PasswordHasher};
use std::path::Path;
use std::sync::Arc;

use super::{connect, success, warning};

pub async fn execute(
    config_file: Option<&Path>,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let (config, pool) = connect(config_file).await?;

    let hasher = PasswordHasher::new(&config.password).context("Invalid password settings")?;
    let service = AccountService::new(
        Arc::new(PgAccountRepository::new(pool)),
        hasher,
        Arc::new(DefaultPasswordPolicy::new(config.password.min_password_length)),
    );

    match run(&service, username, email, password).await? {
        Some(account) => success(&format!(
            "Created admin '{}' <{}> (id {})",
            account.username, account.email, account.id
        )),
        None => warning(&format!("User '{}' already exists; nothing to do", username)),
    }
    Ok(())
}

async fn run(
    service: &AccountService,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Option<Account>> {
    service
        .ensure_admin(username, email, password)
        .await
        .with_context(|| format!("Failed to create admin '{}'", username))
}
