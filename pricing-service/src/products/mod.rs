//! Product catalog: model, validation, filters, storage, endpoints and CSV import

pub mod filter;
pub mod handlers;
pub mod import;
pub mod model;
pub mod repository;
pub mod validation;

pub use filter::ProductFilter;
pub use model::{Product, ProductInput, ProductPatch};
pub use repository::{MemoryProductRepository, PgProductRepository, ProductRepository};
