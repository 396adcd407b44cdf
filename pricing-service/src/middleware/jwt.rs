//! JWT authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use std::sync::Arc;

use super::token::{extract_token, Claims, TokenType, TokenValidator, INVALID_TOKEN};
use crate::auth::config::JwtConfig;
use crate::auth::tokens::{load_secret, parse_algorithm};
use crate::error::Error;

/// JWT authentication middleware state
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtAuth {
    /// Create a new JWT authentication middleware
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        let secret = load_secret(config)?;
        Self::from_secret(&secret, config)
    }

    /// Create a validator from an explicit secret, taking the rest from `config`
    pub fn from_secret(secret: &[u8], config: &JwtConfig) -> Result<Self, Error> {
        let algorithm = parse_algorithm(&config.algorithm)?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        }

        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation,
        })
    }

    /// Validate a token and require the given type
    ///
    /// Every failure (bad signature, expired, wrong issuer, wrong type)
    /// collapses into the same 401 message.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, Error> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                Error::Unauthorized(INVALID_TOKEN.to_string())
            })?
            .claims;

        if claims.token_type != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.token_type,
                "Rejected token of wrong type"
            );
            return Err(Error::Unauthorized(INVALID_TOKEN.to_string()));
        }

        Ok(claims)
    }

    /// Middleware function to validate JWT and inject claims
    pub async fn middleware(
        State(auth): State<Self>,
        mut request: Request<Body>,
        next: Next,
    ) -> Result<Response, Error> {
        let token = extract_token(request.headers()).inspect_err(|_| {
            tracing::warn!(path = %request.uri().path(), "Request without credentials");
        })?;

        let claims = auth.validate_token(&token).inspect_err(|_| {
            tracing::warn!(path = %request.uri().path(), "Request with invalid token");
        })?;

        tracing::debug!(sub = %claims.sub, "Authenticated request");
        request.extensions_mut().insert(claims);

        Ok(next.run(request).await)
    }
}

impl TokenValidator for JwtAuth {
    fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        self.validate(token, TokenType::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::{jwt_generator::JwtGenerator, ClaimsBuilder};
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"middleware-test-secret";

    fn pair(config: &JwtConfig) -> (JwtGenerator, JwtAuth) {
        (
            JwtGenerator::from_secret(SECRET, config).unwrap(),
            JwtAuth::from_secret(SECRET, config).unwrap(),
        )
    }

    fn claims() -> Claims {
        ClaimsBuilder::new()
            .user(1)
            .username("alice")
            .role("buyer")
            .build()
            .unwrap()
    }

    #[test]
    fn test_access_token_round_trip() {
        let (generator, auth) = pair(&JwtConfig::default());
        let tokens = generator.issue_pair(&claims()).unwrap();

        let decoded = auth.validate_token(&tokens.access_token).unwrap();
        assert_eq!(decoded.sub, "user:1");
        assert_eq!(decoded.token_type, TokenType::Access);
        assert_eq!(decoded.roles, vec!["buyer"]);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let (generator, auth) = pair(&JwtConfig::default());
        let tokens = generator.issue_pair(&claims()).unwrap();

        assert!(auth.validate_token(&tokens.refresh_token).is_err());
        assert!(auth
            .validate(&tokens.refresh_token, TokenType::Refresh)
            .is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let (generator, auth) = pair(&JwtConfig::default());
        let token = generator
            .generate(&claims(), TokenType::Access, chrono::Duration::hours(-1))
            .unwrap();

        assert!(matches!(
            auth.validate_token(&token),
            Err(Error::Unauthorized(msg)) if msg == INVALID_TOKEN
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = JwtConfig::default();
        let generator = JwtGenerator::from_secret(b"other-secret", &config).unwrap();
        let auth = JwtAuth::from_secret(SECRET, &config).unwrap();
        let tokens = generator.issue_pair(&claims()).unwrap();

        assert!(auth.validate_token(&tokens.access_token).is_err());
    }

    #[test]
    fn test_issuer_mismatch_rejected() {
        let issuing = JwtConfig {
            issuer: Some("someone-else".to_string()),
            ..JwtConfig::default()
        };
        let validating = JwtConfig {
            issuer: Some("pricing-service".to_string()),
            ..JwtConfig::default()
        };
        let generator = JwtGenerator::from_secret(SECRET, &issuing).unwrap();
        let auth = JwtAuth::from_secret(SECRET, &validating).unwrap();
        let tokens = generator.issue_pair(&claims()).unwrap();

        assert!(auth.validate_token(&tokens.access_token).is_err());
    }

    async fn whoami(Extension(claims): Extension<Claims>) -> String {
        claims.sub
    }

    fn app(auth: JwtAuth) -> Router {
        Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(auth, JwtAuth::middleware))
    }

    #[tokio::test]
    async fn test_middleware_rejects_missing_header() {
        let (_, auth) = pair(&JwtConfig::default());
        let response = app(auth)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_injects_claims() {
        let (generator, auth) = pair(&JwtConfig::default());
        let tokens = generator.issue_pair(&claims()).unwrap();

        let response = app(auth)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/protected")
                    .header("Authorization", format!("Bearer {}", tokens.access_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"user:1");
    }
}
