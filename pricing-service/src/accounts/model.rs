//! Account records

use chrono::{DateTime, Utc};

use super::role::Role;

/// A stored account
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Primary key
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Unique email address, used to log in
    pub email: String,
    /// Argon2id PHC string; never serialized
    pub password_hash: String,
    /// Role
    pub role: Role,
    /// Human role label; required for custom roles, optional otherwise
    pub custom_role: Option<String>,
    /// May access staff tooling
    pub is_staff: bool,
    /// Has every permission
    pub is_superuser: bool,
    /// Creation time
    pub date_joined: DateTime<Utc>,
}

/// Data needed to create an account
///
/// Privilege flags are not part of creation; see
/// [`super::repository::AccountRepository::elevate`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Unique login name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Already-hashed password
    pub password_hash: String,
    /// Role
    pub role: Role,
    /// Human role label
    pub custom_role: Option<String>,
}
