//! Route table

use axum::{
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::error::Error;
use crate::health;
use crate::middleware::JwtAuth;
use crate::products::handlers as products;
use crate::state::AppState;

/// Build the application router
///
/// Account and product routes are mounted under `service.path_prefix`;
/// health checks always live at the root.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::replace_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route_layer(from_fn_with_state(state.auth().clone(), JwtAuth::middleware));

    let api = Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/token/refresh", post(accounts::refresh))
        .merge(protected);

    let prefix = state.config().service.path_prefix.trim_matches('/').to_string();
    let app = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness));

    let app = if prefix.is_empty() {
        app.merge(api)
    } else {
        app.nest(&format!("/{}", prefix), api)
    };

    app.fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}

async fn not_found() -> Error {
    Error::NotFound("Not found.".to_string())
}

async fn method_not_allowed(method: Method) -> Error {
    Error::Rejected {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: format!("Method \"{}\" not allowed.", method),
    }
}
