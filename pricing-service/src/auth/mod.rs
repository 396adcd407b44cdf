//! Credential handling: password hashing, password policy and token issuance
//!
//! Token *validation* lives in [`crate::middleware`]; this module only
//! produces credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use pricing_service::auth::{ClaimsBuilder, JwtGenerator, PasswordHasher};
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("Lantern#Orbit42")?;
//! assert!(hasher.verify("Lantern#Orbit42", &hash)?);
//!
//! let generator = JwtGenerator::new(&config.jwt)?;
//! let claims = ClaimsBuilder::new().user(42).email("a@example.com").build()?;
//! let pair = generator.issue_pair(&claims)?;
//! ```

// Configuration
pub mod config;

// Password hashing (Argon2id)
pub mod password;

// Password strength rules
pub mod policy;

// Token generation
pub mod tokens;

pub use config::{JwtConfig, PasswordConfig};
pub use password::PasswordHasher;
pub use policy::{DefaultPasswordPolicy, PasswordPolicy, UserAttributes};
pub use tokens::jwt_generator::JwtGenerator;
pub use tokens::{ClaimsBuilder, TokenPair};
