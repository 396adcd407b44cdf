//! Standard response envelope
//!
//! Every handler answers with the same JSON shape:
//!
//! ```json
//! { "success": true, "message": "Operation successful", "data": { ... } }
//! { "success": false, "message": "Validation error", "errors": { "name": ["This field is required."] } }
//! ```
//!
//! `data` is only present when a payload was supplied and `errors` only on the
//! validation variant. Status codes travel with the response builders:
//!
//! - [`ApiResponse`] - success envelope (200 by default, 201 via [`ApiResponse::created`])
//! - [`ErrorResponse`] - failure envelope (400 by default)
//! - [`NoContent`] - bare 204, used for deletes
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use pricing_service::responses::{ApiResponse, ErrorResponse, FieldErrors};
//!
//! async fn create() -> Result<ApiResponse<Product>, ErrorResponse> {
//!     let mut errors = FieldErrors::new();
//!     errors.add("name", "This field is required.");
//!     Err(ErrorResponse::validation(errors))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message used when a success response does not carry its own
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Operation successful";

/// Message used when an error response does not carry its own
pub const DEFAULT_FAILURE_MESSAGE: &str = "Operation failed";

/// Message of the validation-error variant
pub const VALIDATION_ERROR_MESSAGE: &str = "Validation error";

// ============================================================================
// Field errors
// ============================================================================

/// Field name to ordered list of error messages
///
/// Serializes as a plain JSON object, e.g. `{"email": ["Enter a valid email address."]}`.
/// Fields are kept sorted so responses are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty error map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map holding a single error
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Append an error to a field, keeping insertion order per field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the given field has at least one error
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Errors recorded for a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Total number of messages across all fields
    pub fn error_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Iterate over fields and their messages
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when empty, otherwise a validation error
    pub fn into_result(self) -> crate::error::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::error::Error::Validation(self))
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Wire shape shared by success and error responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    /// True for successful calls
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Payload, only when one was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Field errors, only on validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

// ============================================================================
// Success
// ============================================================================

/// Success envelope with a status code
///
/// # Example
///
/// ```rust,ignore
/// async fn get_product() -> ApiResponse<Product> {
///     ApiResponse::ok(product).with_message("Product loaded")
/// }
/// ```
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: Option<String>,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 200 OK with a payload
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
            data: Some(data),
        }
    }

    /// 201 Created with a payload
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: None,
            data: Some(data),
        }
    }

    /// Override the default message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Override the status code
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Status code this response will be sent with
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Build the wire envelope
    pub fn into_envelope(self) -> Envelope<T> {
        Envelope {
            success: true,
            message: self
                .message
                .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
            data: self.data,
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope without a `data` member
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.into_envelope())).into_response()
    }
}

// ============================================================================
// Failure
// ============================================================================

/// Failure envelope with a status code
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    status: StatusCode,
    message: Option<String>,
    errors: Option<FieldErrors>,
}

impl ErrorResponse {
    /// Error envelope with the default message
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
            errors: None,
        }
    }

    /// Error envelope with a message
    pub fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            errors: None,
        }
    }

    /// 400 "Validation error" carrying field errors
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: Some(VALIDATION_ERROR_MESSAGE.to_string()),
            errors: Some(errors),
        }
    }

    /// Attach field errors to any error envelope
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Status code this response will be sent with
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Build the wire envelope
    pub fn into_envelope(self) -> Envelope<()> {
        Envelope {
            success: false,
            message: self
                .message
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            data: None,
            errors: self.errors,
        }
    }
}

impl Default for ErrorResponse {
    fn default() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.into_envelope())).into_response()
    }
}

// ============================================================================
// 204 No Content
// ============================================================================

/// HTTP 204 No Content response
///
/// Sent with an empty body. Used by deletes.
#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}
