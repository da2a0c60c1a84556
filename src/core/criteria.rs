use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::models::RawFilter;

/// Explicit ordering requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    BestSelling,
    NewestArrivals,
    FastestDelivery,
    PriceLowToHigh,
    PriceHighToLow,
    Recommended,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::BestSelling => "best-selling",
            SortMode::NewestArrivals => "newest-arrivals",
            SortMode::FastestDelivery => "fastest-delivery",
            SortMode::PriceLowToHigh => "price-low-to-high",
            SortMode::PriceHighToLow => "price-high-to-low",
            SortMode::Recommended => "recommended",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "best-selling" => Ok(SortMode::BestSelling),
            "newest-arrivals" => Ok(SortMode::NewestArrivals),
            "fastest-delivery" => Ok(SortMode::FastestDelivery),
            "price-low-to-high" => Ok(SortMode::PriceLowToHigh),
            "price-high-to-low" => Ok(SortMode::PriceHighToLow),
            "recommended" => Ok(SortMode::Recommended),
            other => Err(ValidationError::new(
                "sortMode",
                format!("unknown sort mode {:?}", other),
            )),
        }
    }
}

/// Normalized, store-agnostic filter and sort specification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub text: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub max_days_to_make: Option<f64>,
    pub owner_id: Option<String>,
    pub sort_mode: Option<SortMode>,
    pub page_index: Option<usize>,
}

// Canonical key first, then the keys older clients still send.
const TEXT_KEYS: &[&str] = &["text", "txt"];
const CATEGORY_KEYS: &[&str] = &["category"];
const TAGS_KEYS: &[&str] = &["tags"];
const MIN_PRICE_KEYS: &[&str] = &["minPrice"];
const MAX_PRICE_KEYS: &[&str] = &["maxPrice"];
const DAYS_KEYS: &[&str] = &["maxDaysToMake", "daysToMake"];
const OWNER_KEYS: &[&str] = &["ownerId", "userId"];
const SORT_KEYS: &[&str] = &["sortMode", "sortBy"];
const PAGE_KEYS: &[&str] = &["pageIndex", "pageIdx"];

/// Turn raw filter input into `Criteria`
///
/// Never fails. Malformed fields are dropped and logged; an unrecognized sort
/// mode means "no explicit ordering".
pub fn normalize(raw: &RawFilter) -> Criteria {
    let mut criteria = Criteria {
        text: text_field(raw, TEXT_KEYS),
        category: text_field(raw, CATEGORY_KEYS),
        tags: tags_field(raw),
        owner_id: text_field(raw, OWNER_KEYS),
        ..Criteria::default()
    };

    criteria.min_price = keep(number_field(raw, "minPrice", MIN_PRICE_KEYS));
    criteria.max_price = keep(number_field(raw, "maxPrice", MAX_PRICE_KEYS));
    criteria.max_days_to_make = keep(number_field(raw, "maxDaysToMake", DAYS_KEYS));
    criteria.page_index = keep(page_field(raw));
    criteria.sort_mode = keep(
        text_field(raw, SORT_KEYS)
            .map(|mode| mode.parse::<SortMode>())
            .transpose(),
    );

    criteria
}

fn keep<T>(parsed: Result<Option<T>, ValidationError>) -> Option<T> {
    match parsed {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Dropping filter field: {}", e);
            None
        }
    }
}

fn lookup<'a>(raw: &'a RawFilter, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !is_blank(value))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn text_field(raw: &RawFilter, keys: &[&str]) -> Option<String> {
    match lookup(raw, keys)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn tags_field(raw: &RawFilter) -> Vec<String> {
    let as_tag = |value: &Value| match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };

    match lookup(raw, TAGS_KEYS) {
        Some(Value::Array(values)) => values.iter().filter_map(as_tag).collect(),
        Some(scalar) => as_tag(scalar).into_iter().collect(),
        None => Vec::new(),
    }
}

fn number_field(
    raw: &RawFilter,
    field: &'static str,
    keys: &[&str],
) -> Result<Option<f64>, ValidationError> {
    let number = match lookup(raw, keys) {
        None => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => {
            return Err(ValidationError::new(field, format!("expected a number, got {}", other)))
        }
    };

    match number {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(ValidationError::new(field, "not a finite number")),
    }
}

fn page_field(raw: &RawFilter) -> Result<Option<usize>, ValidationError> {
    let index = match number_field(raw, "pageIndex", PAGE_KEYS)? {
        Some(index) => index,
        None => return Ok(None),
    };

    if index < 0.0 || index.fract() != 0.0 {
        return Err(ValidationError::new(
            "pageIndex",
            format!("{} is not a non-negative integer", index),
        ));
    }

    Ok(Some(index as usize))
}
