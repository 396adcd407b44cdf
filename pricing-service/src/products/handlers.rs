//! Product catalog endpoints
//!
//! Every route here sits behind bearer authentication.

use axum::extract::{Path, State};

use super::filter::ProductFilter;
use super::model::Product;
use super::validation::{validate_input, validate_patch, validate_replacement};
use crate::error::{Error, Result};
use crate::extract::{JsonObject, QueryParams};
use crate::pagination::{PageParams, PageUrl, Paginated};
use crate::responses::{ApiResponse, NoContent};
use crate::state::AppState;

/// 404 message for an unknown product
pub const NOT_FOUND: &str = "Not found.";

/// `GET /products`
pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ProductFilter>,
    QueryParams(params): QueryParams<PageParams>,
    PageUrl(url): PageUrl,
) -> Result<ApiResponse<Paginated<Product>>> {
    let request = params.resolve(&state.config().pagination)?;
    let products = state.products();

    let count = products.count(&filter).await?;
    let page = request.locate(count)?;
    let results = products.list(&filter, page.pagination()).await?;

    Ok(ApiResponse::ok(Paginated::new(count, results, &page, &url)))
}

/// `POST /products`
pub async fn create_product(
    State(state): State<AppState>,
    JsonObject(payload): JsonObject,
) -> Result<ApiResponse<Product>> {
    let input = validate_input(&payload)?;
    let product = state.products().create(input).await?;

    tracing::info!(product_id = product.id, name = %product.name, "Product created");
    Ok(ApiResponse::created(product).with_message("Product created successfully"))
}

/// `GET /products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Product>> {
    let id = parse_id(&id)?;
    let product = state
        .products()
        .get(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(product))
}

/// `PUT /products/{id}`: full replace
pub async fn replace_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(payload): JsonObject,
) -> Result<ApiResponse<Product>> {
    let id = parse_id(&id)?;
    let products = state.products();
    let existing = products.get(id).await?.ok_or_else(not_found)?;

    let input = validate_replacement(&payload, existing.to_input())?;
    let product = products.update(id, input).await?.ok_or_else(not_found)?;

    tracing::info!(product_id = id, "Product replaced");
    Ok(updated(product))
}

/// `PATCH /products/{id}`: absent fields keep their values
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(payload): JsonObject,
) -> Result<ApiResponse<Product>> {
    let id = parse_id(&id)?;
    let products = state.products();
    let existing = products.get(id).await?.ok_or_else(not_found)?;

    let patch = validate_patch(&payload)?;
    let product = products
        .update(id, patch.apply(existing.to_input()))
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(product_id = id, "Product updated");
    Ok(updated(product))
}

/// `DELETE /products/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<NoContent> {
    let id = parse_id(&id)?;
    if !state.products().delete(id).await? {
        return Err(not_found());
    }

    tracing::info!(product_id = id, "Product deleted");
    Ok(NoContent)
}

fn updated(product: Product) -> ApiResponse<Product> {
    let message = format!("Product {} updated successfully", product.id);
    ApiResponse::ok(product).with_message(message)
}

/// Ids that are not integers never match a route, so they are a 404
fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| not_found())
}

fn not_found() -> Error {
    Error::NotFound(NOT_FOUND.to_string())
}

#[cfg(test)]
mod tests {
    use crate::state::AppState;
    use crate::test_support::{bearer_token, json_request, read_json, request};
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn tea() -> Value {
        json!({
            "name": "Green Tea",
            "cost_price": "2.50",
            "selling_price": "4.00",
            "category": "Beverages",
            "stock_available": 10,
            "units_sold": 3,
            "customer_rating": 4,
            "demand_forecast": 12
        })
    }

    async fn setup() -> (axum::Router, String) {
        let state = AppState::for_tests();
        let token = bearer_token(&state);
        (crate::routes::router(state), token)
    }

    async fn create(app: &axum::Router, token: &str, body: Value) -> Value {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/products", Some(token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        read_json(response).await
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let (app, _) = setup().await;

        let response = app
            .clone()
            .oneshot(request("GET", "/products", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(response).await["message"],
            "Authentication credentials were not provided."
        );

        let response = app
            .oneshot(request("GET", "/products", Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(response).await["message"],
            "Given token not valid for any token type"
        );
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (app, token) = setup().await;
        let created = create(&app, &token, tea()).await;
        assert_eq!(created["message"], "Product created successfully");
        let id = created["data"]["id"].as_i64().unwrap();

        let response = app
            .oneshot(request("GET", &format!("/products/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Operation successful");
        assert_eq!(body["data"]["name"], "Green Tea");
        assert_eq!(body["data"]["cost_price"], "2.50");
        assert_eq!(body["data"]["optimized_price"], "0.00");
        assert_eq!(body["data"]["description"], "");
        assert_eq!(body["data"]["id"], id);
    }

    #[tokio::test]
    async fn test_bound_violation_names_field() {
        let (app, token) = setup().await;
        let mut body = tea();
        body["customer_rating"] = json!(7);

        let response = app
            .oneshot(json_request("POST", "/products", Some(&token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["message"], "Validation error");
        assert!(body["errors"]["customer_rating"].is_array());
    }

    #[tokio::test]
    async fn test_patch_keeps_absent_fields() {
        let (app, token) = setup().await;
        let id = create(&app, &token, tea()).await["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/products/{id}"),
                Some(&token),
                json!({"selling_price": "4.75"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["message"], format!("Product {id} updated successfully"));
        assert_eq!(body["data"]["selling_price"], "4.75");
        assert_eq!(body["data"]["name"], "Green Tea");
        assert_eq!(body["data"]["stock_available"], 10);
    }

    #[tokio::test]
    async fn test_put_requires_every_field() {
        let (app, token) = setup().await;
        let id = create(&app, &token, tea()).await["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/products/{id}"),
                Some(&token),
                json!({"name": "Only a name"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["errors"]["category"][0], "This field is required.");

        let mut replacement = tea();
        replacement["name"] = json!("Black Tea");
        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/products/{id}"),
                Some(&token),
                replacement,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["data"]["name"], "Black Tea");
    }

    #[tokio::test]
    async fn test_put_keeps_stored_optional_fields() {
        let (app, token) = setup().await;
        let mut body = tea();
        body["description"] = json!("Keep me");
        body["optimized_price"] = json!("9.99");
        let id = create(&app, &token, body).await["data"]["id"].as_i64().unwrap();

        let mut replacement = tea();
        replacement["selling_price"] = json!("5.25");
        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/products/{id}"),
                Some(&token),
                replacement,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["selling_price"], "5.25");
        assert_eq!(body["data"]["description"], "Keep me");
        assert_eq!(body["data"]["optimized_price"], "9.99");
    }

    #[tokio::test]
    async fn test_every_numeric_bound_names_its_field() {
        let (app, token) = setup().await;
        let cases = [
            ("cost_price", json!("-1")),
            ("selling_price", json!("-1")),
            ("optimized_price", json!("-1")),
            ("stock_available", json!(-1)),
            ("units_sold", json!(-1)),
            ("demand_forecast", json!(-1)),
            ("customer_rating", json!(-1)),
            ("customer_rating", json!(6)),
        ];

        for (field, value) in cases {
            let mut body = tea();
            body[field] = value.clone();
            let response = app
                .clone()
                .oneshot(json_request("POST", "/products", Some(&token), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{field}={value}");
            let body = read_json(response).await;
            assert_eq!(body["message"], "Validation error");
            let errors = body["errors"].as_object().unwrap();
            assert_eq!(errors.len(), 1, "{field}={value}: {errors:?}");
            assert!(errors.contains_key(field), "{field}={value}: {errors:?}");
        }
    }

    #[tokio::test]
    async fn test_malformed_query_is_envelope() {
        let (app, token) = setup().await;
        let response = app
            .oneshot(request("GET", "/products?name=a&name=b", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("duplicate field"));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (app, token) = setup().await;
        let id = create(&app, &token, tea()).await["data"]["id"].as_i64().unwrap();
        let uri = format!("/products/{id}");

        let response = app
            .clone()
            .oneshot(request("DELETE", &uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());

        let response = app
            .oneshot(request("DELETE", &uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_integer_id_is_not_found() {
        let (app, token) = setup().await;
        let response = app
            .oneshot(request("GET", "/products/abc", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(response).await["message"], "Not found.");
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let (app, token) = setup().await;
        for (name, category) in [
            ("Green Tea", "Beverages"),
            ("Coffee", "Beverages"),
            ("Tea Cake", "Bakery"),
            ("Iced Tea", "Beverages"),
        ] {
            let mut body = tea();
            body["name"] = json!(name);
            body["category"] = json!(category);
            create(&app, &token, body).await;
        }

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/products?name=tea&category=all&page_size=2",
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["count"], 3);
        assert_eq!(body["data"]["previous"], Value::Null);
        assert_eq!(
            body["data"]["next"],
            "http://testserver/products?category=all&name=tea&page=2&page_size=2"
        );
        let names: Vec<&str> = body["data"]["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Green Tea", "Tea Cake"]);

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/products?name=tea&category=bever&page=2&page_size=1",
                Some(&token),
            ))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["data"]["count"], 2);
        assert_eq!(body["data"]["results"][0]["name"], "Iced Tea");
        assert_eq!(
            body["data"]["previous"],
            "http://testserver/products?category=bever&name=tea&page_size=1"
        );

        let response = app
            .oneshot(request("GET", "/products?page=9", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(response).await["message"], "Invalid page.");
    }
}
