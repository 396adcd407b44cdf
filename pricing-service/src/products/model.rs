//! Product records

use rust_decimal::Decimal;
use serde::Serialize;

/// A stored product
///
/// Decimal fields always carry two decimal places and serialize as strings,
/// e.g. `"12.50"`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub category: String,
    pub stock_available: i32,
    pub units_sold: i32,
    pub customer_rating: i32,
    pub demand_forecast: i32,
    pub optimized_price: Decimal,
}

/// Every writable product field
///
/// Used for creation and full replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub category: String,
    pub stock_available: i32,
    pub units_sold: i32,
    pub customer_rating: i32,
    pub demand_forecast: i32,
    pub optimized_price: Decimal,
}

/// A partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub category: Option<String>,
    pub stock_available: Option<i32>,
    pub units_sold: Option<i32>,
    pub customer_rating: Option<i32>,
    pub demand_forecast: Option<i32>,
    pub optimized_price: Option<Decimal>,
}

impl Product {
    /// Attach an id to stored field values
    pub fn from_input(id: i64, input: ProductInput) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            cost_price: input.cost_price,
            selling_price: input.selling_price,
            category: input.category,
            stock_available: input.stock_available,
            units_sold: input.units_sold,
            customer_rating: input.customer_rating,
            demand_forecast: input.demand_forecast,
            optimized_price: input.optimized_price,
        }
    }

    /// Current writable values
    pub fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            description: self.description.clone(),
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            category: self.category.clone(),
            stock_available: self.stock_available,
            units_sold: self.units_sold,
            customer_rating: self.customer_rating,
            demand_forecast: self.demand_forecast,
            optimized_price: self.optimized_price,
        }
    }
}

impl ProductPatch {
    /// Overlay the present fields onto `base`
    pub fn apply(self, base: ProductInput) -> ProductInput {
        ProductInput {
            name: self.name.unwrap_or(base.name),
            description: self.description.unwrap_or(base.description),
            cost_price: self.cost_price.unwrap_or(base.cost_price),
            selling_price: self.selling_price.unwrap_or(base.selling_price),
            category: self.category.unwrap_or(base.category),
            stock_available: self.stock_available.unwrap_or(base.stock_available),
            units_sold: self.units_sold.unwrap_or(base.units_sold),
            customer_rating: self.customer_rating.unwrap_or(base.customer_rating),
            demand_forecast: self.demand_forecast.unwrap_or(base.demand_forecast),
            optimized_price: self.optimized_price.unwrap_or(base.optimized_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample() -> ProductInput {
        ProductInput {
            name: "Green Tea".into(),
            description: String::new(),
            cost_price: dec("2.50"),
            selling_price: dec("4.00"),
            category: "Beverages".into(),
            stock_available: 10,
            units_sold: 3,
            customer_rating: 4,
            demand_forecast: 12,
            optimized_price: dec("0.00"),
        }
    }

    #[test]
    fn test_serializes_decimals_as_strings() {
        let product = Product::from_input(1, sample());
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["cost_price"], "2.50");
        assert_eq!(value["optimized_price"], "0.00");
        assert_eq!(value["stock_available"], 10);
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let patch = ProductPatch {
            selling_price: Some(dec("5.25")),
            ..ProductPatch::default()
        };
        let updated = patch.apply(sample());
        assert_eq!(updated.selling_price, dec("5.25"));
        assert_eq!(updated.name, "Green Tea");
        assert_eq!(updated.cost_price, dec("2.50"));
    }
}
