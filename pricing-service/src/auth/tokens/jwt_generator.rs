//! JWT token generation
//!
//! Signs access and refresh tokens. The matching validator is
//! [`crate::middleware::jwt::JwtAuth`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::auth::config::JwtConfig;
use crate::error::Error;
use crate::middleware::token::{Claims, TokenType};

use super::{load_secret, parse_algorithm, TokenPair};

/// JWT token generator
#[derive(Clone)]
pub struct JwtGenerator {
    encoding_key: Arc<EncodingKey>,
    algorithm: Algorithm,
    issuer: Option<String>,
    audience: Option<String>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl std::fmt::Debug for JwtGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtGenerator")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl JwtGenerator {
    /// Create a new JWT generator from configuration
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        let secret = load_secret(config)?;
        Self::from_secret(&secret, config)
    }

    /// Create a generator from an explicit secret, taking the rest from `config`
    pub fn from_secret(secret: &[u8], config: &JwtConfig) -> Result<Self, Error> {
        let algorithm = parse_algorithm(&config.algorithm)?;

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            algorithm,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_lifetime: Duration::seconds(config.access_token_lifetime_secs),
            refresh_lifetime: Duration::seconds(config.refresh_token_lifetime_secs),
        })
    }

    /// Issue a refresh token and an access token derived from it
    pub fn issue_pair(&self, claims: &Claims) -> Result<TokenPair, Error> {
        let refresh_token = self.generate(claims, TokenType::Refresh, self.refresh_lifetime)?;
        let access_token = self.generate(claims, TokenType::Access, self.access_lifetime)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token from validated refresh claims
    pub fn access_from_refresh(&self, refresh: &Claims) -> Result<String, Error> {
        if refresh.token_type != TokenType::Refresh {
            return Err(Error::Unauthorized("Token has wrong type".to_string()));
        }
        self.generate(refresh, TokenType::Access, self.access_lifetime)
    }

    /// Sign `claims` as a token of the given type, expiring `lifetime` from now
    ///
    /// `exp`, `iat`, `jti`, `iss` and `aud` are always overwritten.
    pub fn generate(
        &self,
        claims: &Claims,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<String, Error> {
        let now = Utc::now();

        let jwt_claims = Claims {
            sub: claims.sub.clone(),
            email: claims.email.clone(),
            username: claims.username.clone(),
            roles: claims.roles.clone(),
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: Some(now.timestamp()),
            jti: Some(uuid::Uuid::new_v4().simple().to_string()),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let header = Header::new(self.algorithm);
        encode(&header, &jwt_claims, &self.encoding_key).map_err(|e| Error::Jwt(Box::new(e)))
    }
}
