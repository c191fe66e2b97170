use std::collections::HashMap;

use serde_json::Value;

use super::error::QueryError;
use super::types::{Condition, FilterOp, Projection, QuerySpec, SortDirection, SortKey};

/// Keys with reserved meaning that never become filter conditions.
const RESERVED_KEYS: [&str; 4] = ["sort", "fields", "page", "limit"];

/// Default page size when `limit` is absent or non-numeric.
pub const DEFAULT_LIMIT: i64 = 20;
/// Hard cap on page size; larger requests are clamped, not rejected.
pub const MAX_LIMIT: i64 = 30;

/// Translates a raw query-string map into a [`QuerySpec`].
///
/// This is the only place raw client input becomes trusted filter structure.
/// Operator names outside the allow-list and non-identifier field names are
/// rejected rather than coerced.
pub struct QueryTranslator;

impl QueryTranslator {
    pub fn translate(params: &HashMap<String, String>) -> Result<QuerySpec, QueryError> {
        let conditions = Self::parse_conditions(params)?;
        let sort = Self::parse_sort(params.get("sort").map(String::as_str))?;
        let projection = Self::parse_projection(params.get("fields").map(String::as_str))?;
        let page = Self::parse_page(params.get("page").map(String::as_str));
        let limit = Self::parse_limit(params.get("limit").map(String::as_str));

        Ok(QuerySpec {
            conditions,
            sort,
            projection,
            page,
            limit: Some(limit),
        })
    }

    fn parse_conditions(params: &HashMap<String, String>) -> Result<Vec<Condition>, QueryError> {
        let mut conditions = Vec::new();

        for (key, value) in params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }

            // `price[lte]` style keys carry an operator; plain keys mean equality.
            if let Some((field, op_name)) = Self::split_operator_key(key) {
                Self::validate_field(field)?;
                let op = FilterOp::parse(op_name)?;
                conditions.push(Condition {
                    field: field.to_string(),
                    op,
                    value: Self::parse_operand(value),
                });
            } else {
                Self::validate_field(key)?;
                conditions.push(Condition::eq(key.clone(), Self::parse_operand(value)));
            }
        }

        // Deterministic condition order regardless of map iteration
        conditions.sort_by(|a, b| a.field.cmp(&b.field));
        Ok(conditions)
    }

    fn split_operator_key(key: &str) -> Option<(&str, &str)> {
        let open = key.find('[')?;
        let close = key.rfind(']')?;
        if close != key.len() - 1 || open == 0 || open + 1 >= close {
            return None;
        }
        Some((&key[..open], &key[open + 1..close]))
    }

    /// Filter operands parse into numbers and booleans where possible so
    /// comparisons act on typed values, not digit strings. Applies to plain
    /// equality and bracketed operators alike.
    fn parse_operand(raw: &str) -> Value {
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Number(i.into());
        }
        if let Ok(f) = raw.parse::<f64>() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return Value::Number(n);
            }
        }
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        }
    }

    fn parse_sort(sort: Option<&str>) -> Result<Vec<SortKey>, QueryError> {
        let Some(sort) = sort else {
            // Absent sort means newest-created-first.
            return Ok(vec![SortKey {
                field: "created_at".to_string(),
                direction: SortDirection::Desc,
            }]);
        };

        let mut keys = Vec::new();
        for part in sort.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (field, direction) = match trimmed.strip_prefix('-') {
                Some(field) => (field, SortDirection::Desc),
                None => (trimmed, SortDirection::Asc),
            };
            Self::validate_field(field)?;
            keys.push(SortKey {
                field: field.to_string(),
                direction,
            });
        }
        Ok(keys)
    }

    fn parse_projection(fields: Option<&str>) -> Result<Projection, QueryError> {
        let Some(fields) = fields else {
            return Ok(Projection::All);
        };

        let mut names = Vec::new();
        for part in fields.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            Self::validate_field(trimmed)?;
            names.push(trimmed.to_string());
        }
        if names.is_empty() {
            return Ok(Projection::All);
        }
        Ok(Projection::Fields(names))
    }

    fn parse_page(page: Option<&str>) -> i64 {
        page.and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }

    fn parse_limit(limit: Option<&str>) -> i64 {
        match limit.and_then(|l| l.parse::<i64>().ok()) {
            Some(l) => l.clamp(1, MAX_LIMIT),
            None => DEFAULT_LIMIT,
        }
    }

    fn validate_field(field: &str) -> Result<(), QueryError> {
        let mut chars = field.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(QueryError::InvalidField(field.to_string()))
        }
    }
}
