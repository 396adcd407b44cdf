//! Bearer token claims and header extraction

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Message when no usable Authorization header was sent
pub const MISSING_CREDENTIALS: &str = "Authentication credentials were not provided.";

/// Message when a token fails signature, expiry or type checks
pub const INVALID_TOKEN: &str = "Given token not valid for any token type";

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token sent as `Authorization: Bearer ...`
    Access,
    /// Long-lived token exchanged for new access tokens
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject, `user:{account id}`
    pub sub: String,

    /// Email (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Username (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,

    /// Access or refresh
    pub token_type: TokenType,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Token ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issuer (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Token validator trait
pub trait TokenValidator: Send + Sync + Clone {
    /// Validate an access token and extract claims
    fn validate_token(&self, token: &str) -> Result<Claims, Error>;
}

/// Extract token from Authorization header (Bearer scheme)
///
/// A missing header and a non-Bearer scheme both count as "no credentials".
pub fn extract_token(headers: &HeaderMap) -> Result<String, Error> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized(MISSING_CREDENTIALS.to_string()))?;

    let mut parts = auth_header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token.to_string()),
        (Some("Bearer"), _, _) => Err(Error::Unauthorized(
            "Authorization header must contain two space-delimited values".to_string(),
        )),
        _ => Err(Error::Unauthorized(MISSING_CREDENTIALS.to_string())),
    }
}
