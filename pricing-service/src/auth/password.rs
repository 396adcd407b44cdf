//! Password hashing using Argon2id
//!
//! Hashes are stored in PHC string format, so the parameters travel with the
//! hash and verification works across configuration changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use pricing_service::auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("my_secure_password")?;
//!
//! assert!(hasher.verify("my_secure_password", &hash)?);
//! assert!(!hasher.verify("wrong_password", &hash)?);
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::auth::config::PasswordConfig;
use crate::error::Error;

/// Password hasher using Argon2id
///
/// Strength rules are not enforced here; see [`crate::auth::policy`].
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHasher {
    /// Create a new password hasher with custom configuration
    ///
    /// Fails when the Argon2 parameters are out of range (e.g. a memory cost
    /// below 8 KiB per lane).
    pub fn new(config: &PasswordConfig) -> Result<Self, Error> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| {
            Error::Config(Box::new(figment::Error::from(format!(
                "Invalid Argon2 parameters (m={}, t={}, p={}): {}",
                config.memory_cost_kib, config.time_cost, config.parallelism, e
            ))))
        })?;

        Ok(Self { params })
    }

    /// Hash a password
    ///
    /// Returns a PHC string such as `$argon2id$v=19$m=65536,t=3,p=4$...`.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a hash
    ///
    /// Uses constant-time comparison. Returns `Ok(false)` on mismatch and an
    /// error only when the stored hash is malformed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Auth(format!("Invalid password hash format: {}", e)))?;

        // Parameters are read from the hash
        let argon2 = Argon2::default();

        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Auth(format!("Password verification failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
            min_password_length: 8,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery", &hash).unwrap());
        assert!(!hasher.verify("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = fast_hasher();
        let first = hasher.hash("same_password").unwrap();
        let second = hasher.hash("same_password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_hash_is_an_error() {
        let hasher = fast_hasher();
        assert!(hasher.verify("password", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = PasswordConfig {
            memory_cost_kib: 1,
            time_cost: 0,
            parallelism: 1,
            min_password_length: 8,
        };
        assert!(matches!(
            PasswordHasher::new(&config),
            Err(Error::Config(_))
        ));
    }
}
