//! Authentication configuration structures
//!
//! Configuration for password hashing and JWT issuance/validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Password hashing configuration following OWASP guidelines
///
/// Default values are based on OWASP recommendations for Argon2id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    #[serde(default = "default_memory_cost")]
    pub memory_cost_kib: u32,

    /// Time cost / iterations (default: 3)
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,

    /// Parallelism degree (default: 4)
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,

    /// Minimum password length (default: 8)
    #[serde(default = "default_min_length")]
    pub min_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: default_memory_cost(),
            time_cost: default_time_cost(),
            parallelism: default_parallelism(),
            min_password_length: default_min_length(),
        }
    }
}

/// JWT issuance and validation
///
/// Tokens are signed with a shared secret. Provide it inline (`secret`) or
/// from a file (`secret_path`); the file wins when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Inline signing secret
    #[serde(default)]
    pub secret: Option<String>,

    /// Path to a file holding the signing secret
    #[serde(default)]
    pub secret_path: Option<PathBuf>,

    /// JWT algorithm (HS256, HS384, HS512)
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    /// Issuer claim, set on issue and checked on validation
    #[serde(default)]
    pub issuer: Option<String>,

    /// Audience claim, set on issue and checked on validation
    #[serde(default)]
    pub audience: Option<String>,

    /// Access token lifetime in seconds (default: 300 = 5 min)
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime_secs: i64,

    /// Refresh token lifetime in seconds (default: 86400 = 1 day)
    #[serde(default = "default_refresh_token_lifetime")]
    pub refresh_token_lifetime_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            secret_path: None,
            algorithm: default_jwt_algorithm(),
            issuer: None,
            audience: None,
            access_token_lifetime_secs: default_access_token_lifetime(),
            refresh_token_lifetime_secs: default_refresh_token_lifetime(),
        }
    }
}

fn default_memory_cost() -> u32 {
    65536
}

fn default_time_cost() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

fn default_min_length() -> usize {
    8
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_lifetime() -> i64 {
    300
}

fn default_refresh_token_lifetime() -> i64 {
    86400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_config_defaults() {
        let config = PasswordConfig::default();
        assert_eq!(config.memory_cost_kib, 65536);
        assert_eq!(config.time_cost, 3);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.min_password_length, 8);
    }

    #[test]
    fn test_jwt_config_defaults() {
        let config = JwtConfig::default();
        assert_eq!(config.algorithm, "HS256");
        assert_eq!(config.access_token_lifetime_secs, 300);
        assert_eq!(config.refresh_token_lifetime_secs, 86400);
        assert!(config.secret.is_none());
        assert!(config.secret_path.is_none());
    }

    #[test]
    fn test_jwt_config_partial_deserialize() {
        let config: JwtConfig =
            serde_json::from_str(r#"{"secret": "s3cret", "issuer": "pricing"}"#).unwrap();
        assert_eq!(config.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.issuer.as_deref(), Some("pricing"));
        assert_eq!(config.algorithm, "HS256");
    }
}
