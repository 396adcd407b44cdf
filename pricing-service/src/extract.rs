//! Request extractors that fail with the standard envelope

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::input::expect_object;

/// JSON request body that must be an object
///
/// Field-level checks are left to [`crate::input::Fields`]; this only
/// guarantees the body parsed and is a JSON object.
#[derive(Debug, Clone, Default)]
pub struct JsonObject(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        Ok(JsonObject(expect_object(value)?))
    }
}

/// Query string extractor whose rejection is the standard envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection_to_error)?;
        Ok(QueryParams(value))
    }
}

fn query_rejection_to_error(rejection: QueryRejection) -> Error {
    Error::Rejected {
        status: rejection.status(),
        message: rejection.body_text(),
    }
}

fn rejection_to_error(rejection: JsonRejection) -> Error {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => Error::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Unsupported media type in request; expected application/json.".to_string(),
        },
        JsonRejection::JsonSyntaxError(e) => {
            Error::BadRequest(format!("JSON parse error - {}", e.body_text()))
        }
        JsonRejection::JsonDataError(e) => {
            Error::BadRequest(format!("JSON parse error - {}", e.body_text()))
        }
        other => Error::Rejected {
            status: other.status(),
            message: other.body_text(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, response::IntoResponse, routing::post, Router};
    use tower::ServiceExt;

    async fn echo(JsonObject(map): JsonObject) -> impl IntoResponse {
        map.len().to_string()
    }

    async fn send(content_type: Option<&str>, body: &'static str) -> (StatusCode, Value) {
        let mut request = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            request = request.header("content-type", ct);
        }
        let response = Router::new()
            .route("/", post(echo))
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_accepts_object() {
        let (status, _) = send(Some("application/json"), r#"{"a": 1, "b": 2}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_is_envelope() {
        let (status, body) = send(Some("application/json"), r#"{"a": "#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("JSON parse error"));
    }

    #[tokio::test]
    async fn test_array_body_is_validation_error() {
        let (status, body) = send(Some("application/json"), "[1, 2]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(
            body["errors"]["non_field_errors"][0],
            "Invalid data. Expected a dictionary, but got list."
        );
    }

    #[derive(Debug, serde::Deserialize)]
    struct Search {
        q: Option<String>,
    }

    async fn search(QueryParams(search): QueryParams<Search>) -> String {
        search.q.unwrap_or_default()
    }

    #[tokio::test]
    async fn test_duplicate_query_key_is_envelope() {
        let response = Router::new()
            .route("/", axum::routing::get(search))
            .oneshot(
                axum::http::Request::builder()
                    .uri("/?q=a&q=b")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("duplicate field"));
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let (status, body) = send(None, r#"{"a": 1}"#).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["success"], false);
    }
}
