//! Request builders shared by router tests

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use serde_json::Value;

use crate::auth::ClaimsBuilder;
use crate::state::AppState;

/// Host used for absolute links in responses
pub const TEST_HOST: &str = "testserver";

/// Bodiless request, optionally with a bearer token
pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    builder(method, uri, token)
        .body(Body::empty())
        .unwrap()
}

/// JSON request, optionally with a bearer token
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    builder(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, TEST_HOST);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
}

/// Collect a response body as JSON
pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Access token for a synthetic account
pub fn bearer_token(state: &AppState) -> String {
    let claims = ClaimsBuilder::new()
        .user(1)
        .email("tester@example.com")
        .username("tester")
        .role("buyer")
        .build()
        .unwrap();
    state.tokens().issue_pair(&claims).unwrap().access_token
}
