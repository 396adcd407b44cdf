//! Account persistence
//!
//! [`PgAccountRepository`] is the production store. [`MemoryAccountRepository`]
//! backs tests and database-less runs; it enforces the same uniqueness rules
//! and reports violations with the same constraint names.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::model::{Account, NewAccount};
use super::role::Role;
use crate::error::{DatabaseError, DatabaseOperation, Result};

/// Unique constraint on `accounts.username`
pub const USERNAME_CONSTRAINT: &str = "accounts_username_key";

/// Unique constraint on `accounts.email`
pub const EMAIL_CONSTRAINT: &str = "accounts_email_key";

/// Account storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account with staff and superuser flags cleared
    ///
    /// Fails with a constraint violation naming [`USERNAME_CONSTRAINT`] or
    /// [`EMAIL_CONSTRAINT`] on duplicates.
    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// Set the staff and superuser flags on an existing account
    async fn elevate(&self, id: i64) -> Result<Account>;

    /// Look up by primary key
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;

    /// Look up by exact email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Look up by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    custom_role: Option<String>,
    is_staff: bool,
    is_superuser: bool,
    date_joined: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role: Role::from_column(row.role),
            custom_role: row.custom_role,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            date_joined: row.date_joined,
        }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, role, custom_role, is_staff, is_superuser, date_joined";

/// PostgreSQL-backed account store
#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a repository over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE {} = $1",
            ACCOUNT_COLUMNS, column
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let sql = format!(
            "INSERT INTO accounts (username, email, password_hash, role, custom_role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.role.as_str())
            .bind(&account.custom_role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Insert))?;

        Ok(row.into())
    }

    async fn elevate(&self, id: i64) -> Result<Account> {
        let sql = format!(
            "UPDATE accounts SET is_staff = TRUE, is_superuser = TRUE WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Update))?;

        row.map(Account::from).ok_or_else(|| {
            DatabaseError::not_found(DatabaseOperation::Update, format!("Account {} not found", id))
                .into()
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.find_one("username", username).await
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
struct MemoryAccounts {
    next_id: i64,
    rows: BTreeMap<i64, Account>,
}

/// In-memory account store
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    inner: RwLock<MemoryAccounts>,
}

impl MemoryAccountRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let mut inner = self.inner.write().await;

        let conflict = inner.rows.values().find_map(|existing| {
            if existing.username == account.username {
                Some(USERNAME_CONSTRAINT)
            } else if existing.email == account.email {
                Some(EMAIL_CONSTRAINT)
            } else {
                None
            }
        });
        if let Some(constraint) = conflict {
            return Err(DatabaseError::constraint_violation(
                DatabaseOperation::Insert,
                format!("duplicate key value violates unique constraint \"{}\"", constraint),
            )
            .add_context(constraint)
            .into());
        }

        inner.next_id += 1;
        let stored = Account {
            id: inner.next_id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            custom_role: account.custom_role,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
        };
        inner.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn elevate(&self, id: i64) -> Result<Account> {
        let mut inner = self.inner.write().await;
        let account = inner.rows.get_mut(&id).ok_or_else(|| {
            DatabaseError::not_found(DatabaseOperation::Update, format!("Account {} not found", id))
        })?;
        account.is_staff = true;
        account.is_superuser = true;
        Ok(account.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().find(|a| a.username == username).cloned())
    }
}
