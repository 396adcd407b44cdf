//! List filters
//!
//! Two filters exist, `name` and `category`. Both are case-insensitive
//! substring matches and combine with AND. A category of `all` (any case)
//! disables the category filter. Column names are fixed; values are always
//! bound.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use super::model::Product;

/// Category value meaning "every category"
pub const ALL_CATEGORIES: &str = "all";

/// Filter query parameters
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProductFilter {
    /// Substring of the product name
    pub name: Option<String>,
    /// Substring of the category, or `all`
    pub category: Option<String>,
}

/// A single active predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `name ILIKE %value%`
    NameContains(String),
    /// `category ILIKE %value%`
    CategoryContains(String),
}

impl ProductFilter {
    /// Active predicates; empty values are ignored
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::with_capacity(2);

        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            predicates.push(Predicate::NameContains(name.to_string()));
        }
        if let Some(category) = self
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
        {
            predicates.push(Predicate::CategoryContains(category.to_string()));
        }

        predicates
    }

    /// Whether `product` passes every predicate
    pub fn matches(&self, product: &Product) -> bool {
        self.predicates().iter().all(|predicate| match predicate {
            Predicate::NameContains(needle) => contains_ignore_case(&product.name, needle),
            Predicate::CategoryContains(needle) => {
                contains_ignore_case(&product.category, needle)
            }
        })
    }

    /// Append a `WHERE` clause for the active predicates
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let predicates = self.predicates();
        if predicates.is_empty() {
            return;
        }

        builder.push(" WHERE ");
        let mut separated = builder.separated(" AND ");
        for predicate in predicates {
            let (column, needle) = match predicate {
                Predicate::NameContains(needle) => ("name", needle),
                Predicate::CategoryContains(needle) => ("category", needle),
            };
            separated.push(format!("{} ILIKE ", column));
            separated.push_bind_unseparated(format!("%{}%", escape_like(&needle)));
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Escape `LIKE` wildcards so the value matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
