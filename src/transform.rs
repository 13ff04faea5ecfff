//! Named value transforms
//!
//! These are the conversions a schema can request by name, which makes them
//! usable from JSON schemas where no closure can be supplied.

use serde::Deserialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Trim,
    Lowercase,
    Uppercase,
    /// Numeric value from a price string like "€12.99" or "12,99 €"
    ParsePrice,
    /// Integer or float parsed from the string
    Number,
}

impl Transform {
    /// Apply to a string value; other values pass through untouched
    pub fn apply(self, value: Value) -> Value {
        let Value::String(text) = value else {
            return value;
        };

        match self {
            Transform::Trim => Value::String(text.trim().to_string()),
            Transform::Lowercase => Value::String(text.to_lowercase()),
            Transform::Uppercase => Value::String(text.to_uppercase()),
            Transform::ParsePrice => parse_price(&text),
            Transform::Number => parse_number(text.trim()),
        }
    }
}

fn parse_price(text: &str) -> Value {
    let mut digits = String::new();
    let mut has_decimal = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if (c == '.' || c == ',') && !has_decimal && !digits.is_empty() {
            digits.push('.');
            has_decimal = true;
        }
    }

    if digits.is_empty() {
        Value::Null
    } else {
        parse_number(digits.trim_end_matches('.'))
    }
}

fn parse_number(text: &str) -> Value {
    if let Ok(int) = text.parse::<i64>() {
        return Value::Number(Number::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
