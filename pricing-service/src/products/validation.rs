//! Product payload validation
//!
//! The same rules serve create, full replace, partial update and CSV rows.
//! Every failing field is reported at once.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::model::{ProductInput, ProductPatch};
use crate::error::{Error, Result};
use crate::input::{DecimalRule, Fields, IntRule, TextRule};
use crate::responses::FieldErrors;

pub const NAME_MAX_LENGTH: usize = 255;
pub const CATEGORY_MAX_LENGTH: usize = 100;

const PRICE: DecimalRule = DecimalRule {
    max_digits: 10,
    decimal_places: 2,
    min: Some((Decimal::ZERO, "0.0")),
};

const COUNT: IntRule = IntRule::at_least(0, "0");
const RATING: IntRule = IntRule::between((0, "0.0"), (5, "5.0"));
const FORECAST: IntRule = IntRule::at_least(0, "0.0");

/// Fields that must be present on create and full replace
const REQUIRED_FIELDS: [&str; 8] = [
    "name",
    "cost_price",
    "selling_price",
    "category",
    "stock_available",
    "units_sold",
    "customer_rating",
    "demand_forecast",
];

/// Validate a create or full-replace payload
///
/// `description` defaults to an empty string and `optimized_price` to zero.
pub fn validate_input(payload: &Map<String, Value>) -> Result<ProductInput> {
    let (patch, mut fields) = read(payload);
    for name in REQUIRED_FIELDS {
        fields.require(name);
    }
    fields.finish()?;

    complete(patch)
}

/// Validate a full replace of `current`
///
/// Required fields must all be present. Optional fields the payload leaves
/// out keep their stored values.
pub fn validate_replacement(
    payload: &Map<String, Value>,
    current: ProductInput,
) -> Result<ProductInput> {
    let (patch, mut fields) = read(payload);
    for name in REQUIRED_FIELDS {
        fields.require(name);
    }
    fields.finish()?;

    Ok(patch.apply(current))
}

/// Validate a partial update; absent fields stay `None`
pub fn validate_patch(payload: &Map<String, Value>) -> Result<ProductPatch> {
    let (patch, fields) = read(payload);
    fields.finish()?;
    Ok(patch)
}

/// Validate a payload and return its errors instead of failing
pub fn check_input(payload: &Map<String, Value>) -> std::result::Result<ProductInput, FieldErrors> {
    match validate_input(payload) {
        Ok(input) => Ok(input),
        Err(Error::Validation(errors)) => Err(errors),
        Err(other) => Err(FieldErrors::single(
            crate::input::NON_FIELD_ERRORS,
            other.to_string(),
        )),
    }
}

fn read(payload: &Map<String, Value>) -> (ProductPatch, Fields<'_>) {
    let mut fields = Fields::new(payload);

    let patch = ProductPatch {
        name: fields.text(
            "name",
            TextRule::required().if_present().max_length(NAME_MAX_LENGTH),
        ),
        description: fields.text("description", TextRule::optional()),
        cost_price: fields.decimal("cost_price", PRICE),
        selling_price: fields.decimal("selling_price", PRICE),
        category: fields.text(
            "category",
            TextRule::required().if_present().max_length(CATEGORY_MAX_LENGTH),
        ),
        stock_available: fields.integer("stock_available", COUNT),
        units_sold: fields.integer("units_sold", COUNT),
        customer_rating: fields.integer("customer_rating", RATING),
        demand_forecast: fields.integer("demand_forecast", FORECAST),
        optimized_price: fields.decimal("optimized_price", PRICE),
    };

    (patch, fields)
}

fn complete(patch: ProductPatch) -> Result<ProductInput> {
    let (
        Some(name),
        Some(cost_price),
        Some(selling_price),
        Some(category),
        Some(stock_available),
        Some(units_sold),
        Some(customer_rating),
        Some(demand_forecast),
    ) = (
        patch.name,
        patch.cost_price,
        patch.selling_price,
        patch.category,
        patch.stock_available,
        patch.units_sold,
        patch.customer_rating,
        patch.demand_forecast,
    )
    else {
        return Err(Error::Internal(
            "product fields missing after validation".to_string(),
        ));
    };

    Ok(ProductInput {
        name,
        description: patch.description.unwrap_or_default(),
        cost_price,
        selling_price,
        category,
        stock_available,
        units_sold,
        customer_rating,
        demand_forecast,
        optimized_price: patch
            .optimized_price
            .unwrap_or_else(|| Decimal::new(0, PRICE.decimal_places)),
    })
}
