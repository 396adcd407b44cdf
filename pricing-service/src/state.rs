//! Application state management

use sqlx::PgPool;
use std::sync::Arc;

use crate::accounts::{AccountRepository, AccountService, MemoryAccountRepository, PgAccountRepository};
use crate::auth::{DefaultPasswordPolicy, JwtGenerator, PasswordHasher, PasswordPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::middleware::JwtAuth;
use crate::products::{MemoryProductRepository, PgProductRepository, ProductRepository};

/// Application state shared across handlers
///
/// Cheap to clone; every member is reference counted.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    accounts: AccountService,
    products: Arc<dyn ProductRepository>,
    tokens: JwtGenerator,
    auth: JwtAuth,
    db_pool: Option<PgPool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.config.service.name)
            .field("database", &self.db_pool.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create a new builder for AppState
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registration and login workflows
    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    /// Product storage
    pub fn products(&self) -> &Arc<dyn ProductRepository> {
        &self.products
    }

    /// Token issuer
    pub fn tokens(&self) -> &JwtGenerator {
        &self.tokens
    }

    /// Token validator
    pub fn auth(&self) -> &JwtAuth {
        &self.auth
    }

    /// Database pool, when running against PostgreSQL
    pub fn db(&self) -> Option<&PgPool> {
        self.db_pool.as_ref()
    }

    /// In-memory state with a fixed signing secret and fast hashing
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let mut config = Config::default();
        config.jwt.secret = Some("test-signing-secret".to_string());
        config.password.memory_cost_kib = 1024;
        config.password.time_cost = 1;
        config.password.parallelism = 1;

        let hasher = PasswordHasher::new(&config.password)
            .expect("test password parameters are valid");
        let tokens = JwtGenerator::new(&config.jwt).expect("test secret is set");
        let auth = JwtAuth::new(&config.jwt).expect("test secret is set");
        let policy: Arc<dyn PasswordPolicy> =
            Arc::new(DefaultPasswordPolicy::new(config.password.min_password_length));

        Self {
            accounts: AccountService::new(Arc::new(MemoryAccountRepository::new()), hasher, policy),
            products: Arc::new(MemoryProductRepository::new()),
            tokens,
            auth,
            db_pool: None,
            config: Arc::new(config),
        }
    }

    /// Same state with routes mounted under `prefix`
    #[cfg(test)]
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        let mut config = (*self.config).clone();
        config.service.path_prefix = prefix.to_string();
        self.config = Arc::new(config);
        self
    }
}

/// Builder for AppState
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<Config>,
    db_pool: Option<PgPool>,
    accounts: Option<Arc<dyn AccountRepository>>,
    products: Option<Arc<dyn ProductRepository>>,
    policy: Option<Arc<dyn PasswordPolicy>>,
}

impl AppStateBuilder {
    /// Create a new builder
    ///
    /// By default config comes from `Config::default()`, storage from the
    /// configured database (or memory when none is configured), and the
    /// password policy from [`DefaultPasswordPolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an existing database pool instead of connecting
    pub fn db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Override account storage
    pub fn accounts(mut self, accounts: Arc<dyn AccountRepository>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Override product storage
    pub fn products(mut self, products: Arc<dyn ProductRepository>) -> Self {
        self.products = Some(products);
        self
    }

    /// Override the password policy
    pub fn password_policy(mut self, policy: Arc<dyn PasswordPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the AppState, connecting to the database if one is configured
    pub async fn build(self) -> Result<AppState> {
        let config = self.config.unwrap_or_default();

        let db_pool = match (self.db_pool, &config.database) {
            (Some(pool), _) => Some(pool),
            (None, Some(db_config)) => Some(crate::database::create_pool(db_config).await?),
            (None, None) => None,
        };

        let (accounts, products): (Arc<dyn AccountRepository>, Arc<dyn ProductRepository>) =
            match &db_pool {
                Some(pool) => (
                    Arc::new(PgAccountRepository::new(pool.clone())),
                    Arc::new(PgProductRepository::new(pool.clone())),
                ),
                None => {
                    tracing::warn!(
                        "No database configured; accounts and products are kept in memory and lost on restart"
                    );
                    (
                        Arc::new(MemoryAccountRepository::new()),
                        Arc::new(MemoryProductRepository::new()),
                    )
                }
            };
        let accounts = self.accounts.unwrap_or(accounts);
        let products = self.products.unwrap_or(products);

        let policy = self.policy.unwrap_or_else(|| {
            Arc::new(DefaultPasswordPolicy::new(config.password.min_password_length))
        });
        let hasher = PasswordHasher::new(&config.password)?;
        let tokens = JwtGenerator::new(&config.jwt)?;
        let auth = JwtAuth::new(&config.jwt)?;

        Ok(AppState {
            accounts: AccountService::new(accounts, hasher, policy),
            products,
            tokens,
            auth,
            db_pool,
            config: Arc::new(config),
        })
    }
}
