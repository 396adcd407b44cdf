//! Registration, login and token refresh endpoints

use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::model::Account;
use crate::auth::ClaimsBuilder;
use crate::error::{Error, Result};
use crate::extract::JsonObject;
use crate::input::{Fields, TextRule};
use crate::middleware::TokenType;
use crate::responses::ApiResponse;
use crate::state::AppState;

/// Message sent with a successful registration
pub const REGISTERED: &str = "Registration successful. Please login.";

/// Message sent with a successful login
pub const LOGGED_IN: &str = "Login successful";

/// 401 message for an unusable refresh token
pub const REFRESH_REJECTED: &str = "Token is invalid or expired";

/// Login payload returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct LoginData {
    /// Account username
    pub username: String,
    /// Account email
    pub email: String,
    /// Role name
    pub role: String,
    /// Custom role label, `null` for built-in roles
    pub custom_role: Option<String>,
    /// Refresh token
    pub refresh: String,
    /// Access token
    pub access: String,
}

/// Response to a token refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshData {
    /// Newly minted access token
    pub access: String,
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    JsonObject(payload): JsonObject,
) -> Result<ApiResponse<()>> {
    state.accounts().register(&payload).await?;

    Ok(ApiResponse::message(REGISTERED).with_status(StatusCode::CREATED))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    JsonObject(payload): JsonObject,
) -> Result<ApiResponse<LoginData>> {
    let accounts = state.accounts();
    let credentials = accounts.validate_credentials(&payload)?;
    let account = accounts.authenticate(&credentials).await?;

    let claims = ClaimsBuilder::new()
        .user(account.id)
        .email(&account.email)
        .username(&account.username)
        .role(account.role.as_str())
        .build()?;
    let pair = state.tokens().issue_pair(&claims)?;

    Ok(ApiResponse::ok(login_data(account, pair.refresh_token, pair.access_token))
        .with_message(LOGGED_IN))
}

/// `POST /token/refresh`
///
/// The refresh token itself is not rotated.
pub async fn refresh(
    State(state): State<AppState>,
    JsonObject(payload): JsonObject,
) -> Result<ApiResponse<RefreshData>> {
    let mut fields = Fields::new(&payload);
    let token = fields.text("refresh", TextRule::required().untrimmed());
    fields.finish()?;
    let token = token.unwrap_or_default();

    let claims = state
        .auth()
        .validate(&token, TokenType::Refresh)
        .map_err(|_| Error::Unauthorized(REFRESH_REJECTED.to_string()))?;

    let access = state.tokens().access_from_refresh(&claims)?;
    tracing::debug!(sub = %claims.sub, "Access token refreshed");

    Ok(ApiResponse::ok(RefreshData { access }))
}

fn login_data(account: Account, refresh: String, access: String) -> LoginData {
    LoginData {
        custom_role: account.custom_role,
        role: account.role.as_str().to_string(),
        username: account.username,
        email: account.email,
        refresh,
        access,
    }
}
