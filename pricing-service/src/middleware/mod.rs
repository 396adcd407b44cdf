//! Middleware for bearer authentication and request tracking

// Token claims and header parsing
pub mod token;

// JWT authentication
pub mod jwt;

pub mod request_tracking;

pub use jwt::JwtAuth;
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, MakeRequestUuidV7,
    REQUEST_ID_HEADER, SENSITIVE_HEADERS,
};
pub use token::{Claims, TokenType, TokenValidator};
