//! Product persistence

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::filter::ProductFilter;
use super::model::{Product, ProductInput};
use crate::error::{DatabaseError, DatabaseOperation, Result};
use crate::pagination::Pagination;

/// Product storage
///
/// Lists are always ordered by id.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Number of products matching `filter`
    async fn count(&self, filter: &ProductFilter) -> Result<u64>;

    /// One window of the products matching `filter`
    async fn list(&self, filter: &ProductFilter, pagination: Pagination) -> Result<Vec<Product>>;

    async fn get(&self, id: i64) -> Result<Option<Product>>;

    async fn create(&self, input: ProductInput) -> Result<Product>;

    /// Replace every writable field; `None` if the product does not exist
    async fn update(&self, id: i64, input: ProductInput) -> Result<Option<Product>>;

    /// `false` if the product did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Insert all rows or none
    async fn insert_many(&self, inputs: Vec<ProductInput>) -> Result<u64>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

const PRODUCT_COLUMNS: &str = "id, name, description, cost_price, selling_price, category, \
     stock_available, units_sold, customer_rating, demand_forecast, optimized_price";

const INSERT_COLUMNS: &str = "name, description, cost_price, selling_price, category, \
     stock_available, units_sold, customer_rating, demand_forecast, optimized_price";

/// PostgreSQL-backed product store
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a repository over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_values(builder: &mut QueryBuilder<'_, Postgres>, input: ProductInput) {
    builder.push("(");
    let mut values = builder.separated(", ");
    values
        .push_bind(input.name)
        .push_bind(input.description)
        .push_bind(input.cost_price)
        .push_bind(input.selling_price)
        .push_bind(input.category)
        .push_bind(input.stock_available)
        .push_bind(input.units_sold)
        .push_bind(input.customer_rating)
        .push_bind(input.demand_forecast)
        .push_bind(input.optimized_price);
    builder.push(")");
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn count(&self, filter: &ProductFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        filter.push_where(&mut builder);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn list(&self, filter: &ProductFilter, pagination: Pagination) -> Result<Vec<Product>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
        filter.push_where(&mut builder);
        builder
            .push(" ORDER BY id LIMIT ")
            .push_bind(pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(pagination.offset as i64);

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn create(&self, input: ProductInput) -> Result<Product> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO products ({}) VALUES ",
            INSERT_COLUMNS
        ));
        push_values(&mut builder, input);
        builder.push(format!(" RETURNING {}", PRODUCT_COLUMNS));

        let product = builder
            .build_query_as::<Product>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Insert))?;
        Ok(product)
    }

    async fn update(&self, id: i64, input: ProductInput) -> Result<Option<Product>> {
        let sql = format!(
            "UPDATE products SET name = $1, description = $2, cost_price = $3, \
             selling_price = $4, category = $5, stock_available = $6, units_sold = $7, \
             customer_rating = $8, demand_forecast = $9, optimized_price = $10 \
             WHERE id = $11 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(input.name)
            .bind(input.description)
            .bind(input.cost_price)
            .bind(input.selling_price)
            .bind(input.category)
            .bind(input.stock_available)
            .bind(input.units_sold)
            .bind(input.customer_rating)
            .bind(input.demand_forecast)
            .bind(input.optimized_price)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Update))?;
        Ok(product)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Delete))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_many(&self, inputs: Vec<ProductInput>) -> Result<u64> {
        if inputs.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Transaction))?;

        let mut inserted = 0;
        // Postgres caps bind parameters at 65535 per statement
        for chunk in inputs.chunks(1000) {
            let mut builder = QueryBuilder::<Postgres>::new(format!(
                "INSERT INTO products ({}) ",
                INSERT_COLUMNS
            ));
            builder.push_values(chunk.iter().cloned(), |mut row, input| {
                row.push_bind(input.name)
                    .push_bind(input.description)
                    .push_bind(input.cost_price)
                    .push_bind(input.selling_price)
                    .push_bind(input.category)
                    .push_bind(input.stock_available)
                    .push_bind(input.units_sold)
                    .push_bind(input.customer_rating)
                    .push_bind(input.demand_forecast)
                    .push_bind(input.optimized_price);
            });

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Insert))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from(e).during(DatabaseOperation::Transaction))?;
        Ok(inserted)
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
struct MemoryProducts {
    next_id: i64,
    rows: BTreeMap<i64, Product>,
}

impl MemoryProducts {
    fn insert(&mut self, input: ProductInput) -> Product {
        self.next_id += 1;
        let product = Product::from_input(self.next_id, input);
        self.rows.insert(product.id, product.clone());
        product
    }
}

/// In-memory product store, ordered by id
#[derive(Debug, Default)]
pub struct MemoryProductRepository {
    inner: RwLock<MemoryProducts>,
}

impl MemoryProductRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn count(&self, filter: &ProductFilter) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn list(&self, filter: &ProductFilter, pagination: Pagination) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn create(&self, input: ProductInput) -> Result<Product> {
        Ok(self.inner.write().await.insert(input))
    }

    async fn update(&self, id: i64, input: ProductInput) -> Result<Option<Product>> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };
        *stored = Product::from_input(id, input);
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }

    async fn insert_many(&self, inputs: Vec<ProductInput>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let count = inputs.len() as u64;
        for input in inputs {
            inner.insert(input);
        }
        Ok(count)
    }
}
