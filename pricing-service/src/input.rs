//! Field readers for JSON request payloads
//!
//! Handlers receive the raw JSON object and read each field through
//! [`Fields`], which records one error per failing field and keeps going so
//! the client sees every problem in a single response.

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::LazyLock;
use validator::ValidateEmail;

use crate::error::{Error, Result};
use crate::responses::FieldErrors;

/// Missing required field
pub const REQUIRED: &str = "This field is required.";
/// Empty or whitespace-only string
pub const BLANK: &str = "This field may not be blank.";
/// Explicit `null`
pub const NULL: &str = "This field may not be null.";
/// Value that cannot be read as text
pub const NOT_A_STRING: &str = "Not a valid string.";
/// Value that cannot be read as an integer
pub const INVALID_INTEGER: &str = "A valid integer is required.";
/// Value that cannot be read as a decimal number
pub const INVALID_NUMBER: &str = "A valid number is required.";
/// Malformed email address
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Error recorded under this key when the payload itself is unusable
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Rules for a text field
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    /// Absent field is an error
    pub required: bool,
    /// Empty string is accepted
    pub allow_blank: bool,
    /// Maximum length in characters
    pub max_length: Option<usize>,
    /// Strip surrounding whitespace before checking
    pub trim: bool,
}

impl TextRule {
    /// Required, non-blank, trimmed
    pub const fn required() -> Self {
        Self {
            required: true,
            allow_blank: false,
            max_length: None,
            trim: true,
        }
    }

    /// Optional, blank allowed, trimmed
    pub const fn optional() -> Self {
        Self {
            required: false,
            allow_blank: true,
            max_length: None,
            trim: true,
        }
    }

    /// Set the maximum length
    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Only check the value when the field is present
    pub const fn if_present(mut self) -> Self {
        self.required = false;
        self
    }

    /// Keep whitespace as sent (passwords)
    pub const fn untrimmed(mut self) -> Self {
        self.trim = false;
        self
    }
}

/// Inclusive bounds for an integer field; the labels are what error messages print
#[derive(Debug, Clone, Copy)]
pub struct IntRule {
    /// Lower bound and its display form
    pub min: (i64, &'static str),
    /// Upper bound and its display form
    pub max: (i64, &'static str),
}

impl IntRule {
    /// Any value that fits a 32-bit column and is at least `min`
    pub const fn at_least(min: i64, label: &'static str) -> Self {
        Self {
            min: (min, label),
            max: (i32::MAX as i64, "2147483647"),
        }
    }

    /// Values in `[min, max]`
    pub const fn between(min: (i64, &'static str), max: (i64, &'static str)) -> Self {
        Self { min, max }
    }
}

/// Precision and bounds for a decimal field
#[derive(Debug, Clone, Copy)]
pub struct DecimalRule {
    /// Total significant digits
    pub max_digits: u32,
    /// Digits after the decimal point
    pub decimal_places: u32,
    /// Lower bound and its display form
    pub min: Option<(Decimal, &'static str)>,
}

/// Collects typed values and field errors from a JSON object
#[derive(Debug)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Fields<'a> {
    /// Start reading `map`
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            errors: FieldErrors::new(),
        }
    }

    /// Whether the payload contains the key (even as `null`)
    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Record an error for a field
    pub fn error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.add(name, message);
    }

    /// Whether a field already failed
    pub fn failed(&self, name: &str) -> bool {
        self.errors.contains(name)
    }

    /// Read a text field
    ///
    /// Numbers are accepted and converted to their text form. Returns `None`
    /// when the field is absent or invalid.
    pub fn text(&mut self, name: &str, rule: TextRule) -> Option<String> {
        let map = self.map;
        let value = match map.get(name) {
            None => {
                if rule.required {
                    self.error(name, REQUIRED);
                }
                return None;
            }
            Some(Value::Null) => {
                self.error(name, NULL);
                return None;
            }
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => {
                self.error(name, NOT_A_STRING);
                return None;
            }
        };

        let value = if rule.trim {
            value.trim().to_string()
        } else {
            value
        };

        if value.is_empty() && !rule.allow_blank {
            self.error(name, BLANK);
            return None;
        }

        if let Some(max) = rule.max_length {
            if value.chars().count() > max {
                self.error(
                    name,
                    format!("Ensure this field has no more than {} characters.", max),
                );
                return None;
            }
        }

        Some(value)
    }

    /// Read an optional text field that may also be `null`
    pub fn nullable_text(&mut self, name: &str, max_length: usize) -> Option<String> {
        if matches!(self.map.get(name), Some(Value::Null)) {
            return None;
        }
        self.text(name, TextRule::optional().max_length(max_length))
            .filter(|s| !s.is_empty())
    }

    /// Read an integer field, present or not; absence is the caller's concern
    pub fn integer(&mut self, name: &str, rule: IntRule) -> Option<i32> {
        let map = self.map;
        let value = map.get(name)?;
        let parsed = match value {
            Value::Null => {
                self.error(name, NULL);
                return None;
            }
            other => parse_integer(other),
        };

        let Some(number) = parsed else {
            self.error(name, INVALID_INTEGER);
            return None;
        };

        match check_int_bounds(number, rule) {
            Ok(n) => Some(n),
            Err(message) => {
                self.error(name, message);
                None
            }
        }
    }

    /// Read a decimal field, present or not; absence is the caller's concern
    pub fn decimal(&mut self, name: &str, rule: DecimalRule) -> Option<Decimal> {
        let map = self.map;
        let value = map.get(name)?;
        if value.is_null() {
            self.error(name, NULL);
            return None;
        }

        let Some(number) = parse_decimal(value) else {
            self.error(name, INVALID_NUMBER);
            return None;
        };

        match check_decimal(number, rule) {
            Ok(d) => Some(d),
            Err(message) => {
                self.error(name, message);
                None
            }
        }
    }

    /// Require a field that an integer/decimal reader skipped because it was absent
    pub fn require(&mut self, name: &str) {
        if !self.has(name) && !self.failed(name) {
            self.error(name, REQUIRED);
        }
    }

    /// Errors collected so far
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Finish reading; `Err` with every collected error if any field failed
    pub fn finish(self) -> Result<()> {
        self.errors.into_result()
    }

    #[cfg(test)]
    fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

/// Parse a JSON number or numeric string as an integer
///
/// Floats and strings with a zero fractional part (`3.0`, `"3.00"`) are accepted.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => parse_integer_str(s),
        _ => None,
    }
}

/// Parse an integer from text, allowing a zero fractional part
pub fn parse_integer_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let (whole, fraction) = s.split_once('.')?;
    if !fraction.chars().all(|c| c == '0') {
        return None;
    }
    whole.parse::<i64>().ok()
}

/// Parse a JSON number or numeric string as a decimal
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal_str(&n.to_string()),
        Value::String(s) => parse_decimal_str(s),
        _ => None,
    }
}

/// Parse a decimal from text, accepting plain and scientific notation
pub fn parse_decimal_str(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Apply integer bounds, returning the bound message on failure
pub fn check_int_bounds(value: i64, rule: IntRule) -> std::result::Result<i32, String> {
    if value < rule.min.0 {
        return Err(format!(
            "Ensure this value is greater than or equal to {}.",
            rule.min.1
        ));
    }
    if value > rule.max.0 {
        return Err(format!(
            "Ensure this value is less than or equal to {}.",
            rule.max.1
        ));
    }
    i32::try_from(value).map_err(|_| INVALID_INTEGER.to_string())
}

/// Apply precision and bounds, returning the value at exactly `decimal_places`
pub fn check_decimal(value: Decimal, rule: DecimalRule) -> std::result::Result<Decimal, String> {
    let decimals = value.scale();
    let digits = digit_count(value);
    let (total, whole) = if decimals > digits {
        (decimals, 0)
    } else {
        (digits, digits - decimals)
    };

    if total > rule.max_digits {
        return Err(format!(
            "Ensure that there are no more than {} digits in total.",
            rule.max_digits
        ));
    }
    if decimals > rule.decimal_places {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            rule.decimal_places
        ));
    }
    let max_whole = rule.max_digits - rule.decimal_places;
    if whole > max_whole {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_whole
        ));
    }
    if let Some((min, label)) = rule.min {
        if value < min {
            return Err(format!(
                "Ensure this value is greater than or equal to {}.",
                label
            ));
        }
    }

    let mut value = value;
    value.rescale(rule.decimal_places);
    Ok(value)
}

fn digit_count(value: Decimal) -> u32 {
    let mantissa = value.mantissa().unsigned_abs();
    if mantissa == 0 {
        1
    } else {
        mantissa.ilog10() + 1
    }
}

/// RFC 5322 quoted-string local part, e.g. `"john doe"`
static QUOTED_LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"(?:[\x01-\x08\x0b\x0c\x0e-\x1f!#-\[\]-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*"\z"#)
        .expect("quoted local part regex is valid")
});

/// Email syntax check
///
/// Accepts IP literals, internationalised domains and quoted local parts.
pub fn is_valid_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) if local.len() > 1 && QUOTED_LOCAL_PART.is_match(local) => {
            format!("quoted@{}", domain).validate_email()
        }
        _ => email.validate_email(),
    }
}

/// Reject payloads that are not JSON objects
pub fn expect_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::field(
            NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(&other)
            ),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
