//! Token issuance
//!
//! Login hands out a refresh/access pair. The access token is derived from the
//! refresh token's claims, so both name the same account and roles. Refresh
//! tokens are not rotated: `/token/refresh` only mints a new access token.
//!
//! # Example
//!
//! ```rust,ignore
//! use pricing_service::auth::{ClaimsBuilder, JwtGenerator};
//!
//! let generator = JwtGenerator::new(&config.jwt)?;
//! let claims = ClaimsBuilder::new()
//!     .user(account.id)
//!     .email(&account.email)
//!     .role(account.role.as_str())
//!     .build()?;
//! let pair = generator.issue_pair(&claims)?;
//! ```

pub mod jwt_generator;

use jsonwebtoken::Algorithm;
use std::fs;

use crate::auth::config::JwtConfig;
use crate::error::Error;
use crate::middleware::token::{Claims, TokenType};

/// Access token and the refresh token it was issued alongside
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access_token: String,

    /// Long-lived token exchanged at `/token/refresh`
    pub refresh_token: String,
}

/// Builder for the account-identifying part of a token
#[derive(Debug, Clone, Default)]
pub struct ClaimsBuilder {
    sub: Option<String>,
    email: Option<String>,
    username: Option<String>,
    roles: Vec<String>,
}

impl ClaimsBuilder {
    /// Create a new claims builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a user subject (adds "user:" prefix)
    pub fn user(mut self, user_id: impl ToString) -> Self {
        self.sub = Some(format!("user:{}", user_id.to_string()));
        self
    }

    /// Set the email
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the username
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Add a role
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Build the Claims
    ///
    /// `exp`, `iat`, `jti`, `iss`, `aud` and `token_type` are set by the generator.
    pub fn build(self) -> Result<Claims, Error> {
        let sub = self
            .sub
            .ok_or_else(|| Error::Internal("Token subject (sub) is required".to_string()))?;

        Ok(Claims {
            sub,
            email: self.email,
            username: self.username,
            roles: self.roles,
            token_type: TokenType::Access,
            exp: 0,
            iat: None,
            jti: None,
            iss: None,
            aud: None,
        })
    }
}

/// Read the signing secret from `secret_path`, falling back to `secret`
pub fn load_secret(config: &JwtConfig) -> Result<Vec<u8>, Error> {
    let secret = if let Some(path) = &config.secret_path {
        let bytes = fs::read(path).map_err(|e| {
            Error::Config(Box::new(figment::Error::from(format!(
                "Failed to read JWT secret from path '{}': {}",
                path.display(),
                e
            ))))
        })?;
        // Secret files usually end with a newline
        let trimmed_len = bytes
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |pos| pos + 1);
        bytes[..trimmed_len].to_vec()
    } else if let Some(secret) = &config.secret {
        secret.as_bytes().to_vec()
    } else {
        return Err(Error::Config(Box::new(figment::Error::from(
            "JWT signing secret is not configured: set jwt.secret or jwt.secret_path",
        ))));
    };

    if secret.is_empty() {
        return Err(Error::Config(Box::new(figment::Error::from(
            "JWT signing secret is empty",
        ))));
    }

    Ok(secret)
}

/// Parse a configured algorithm name; only HMAC algorithms are accepted
pub fn parse_algorithm(alg: &str) -> Result<Algorithm, Error> {
    match alg.to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(Error::Config(Box::new(figment::Error::from(format!(
            "Unsupported JWT algorithm: {} (expected HS256, HS384 or HS512)",
            alg
        ))))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_claims_builder_user() {
        let claims = ClaimsBuilder::new()
            .user(123)
            .email("test@example.com")
            .username("tester")
            .role("buyer")
            .build()
            .unwrap();

        assert_eq!(claims.sub, "user:123");
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
        assert_eq!(claims.username.as_deref(), Some("tester"));
        assert_eq!(claims.roles, vec!["buyer"]);
    }

    #[test]
    fn test_claims_builder_missing_subject() {
        assert!(ClaimsBuilder::new().email("test@example.com").build().is_err());
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("hs256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
    }

    #[test]
    fn test_load_secret_prefers_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();

        let config = JwtConfig {
            secret: Some("inline".to_string()),
            secret_path: Some(file.path().to_path_buf()),
            ..JwtConfig::default()
        };
        assert_eq!(load_secret(&config).unwrap(), b"from-file".to_vec());
    }

    #[test]
    fn test_load_secret_missing() {
        assert!(matches!(
            load_secret(&JwtConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
