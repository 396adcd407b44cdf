//! # pricing-service
//!
//! Product pricing backend: role-based accounts, JWT authentication and a
//! filtered, paginated product catalog with CSV bulk import.
//!
//! Every response, success or failure, uses the same envelope:
//!
//! ```json
//! {"success": true, "message": "Operation successful", "data": {}}
//! {"success": false, "message": "Validation error", "errors": {"name": ["This field is required."]}}
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use pricing_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::builder()
//!         .config(config.clone())
//!         .build()
//!         .await?;
//!
//!     Server::new(config).serve(router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod health;
pub mod input;
pub mod middleware;
pub mod observability;
pub mod pagination;
pub mod products;
pub mod responses;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::accounts::{Account, AccountService, Role};
    pub use crate::config::Config;
    pub use crate::error::{DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result};
    pub use crate::health::{health, readiness};
    pub use crate::middleware::{Claims, JwtAuth, TokenType};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{PageParams, Paginated, Pagination};
    pub use crate::products::{Product, ProductFilter, ProductRepository};
    pub use crate::responses::{ApiResponse, ErrorResponse, FieldErrors, NoContent};
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::state::{AppState, AppStateBuilder};
}
