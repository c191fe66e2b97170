use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::QueryError;

/// Allow-listed comparison operators exposed to clients.
///
/// This enum is the security boundary between untrusted query text and
/// storage-query structure: anything outside it is rejected at translation
/// time, never passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
}

impl FilterOp {
    pub fn parse(op: &str) -> Result<Self, QueryError> {
        Ok(match op {
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "ne" => FilterOp::Ne,
            other => return Err(QueryError::InvalidOperator(other.to_string())),
        })
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Ne => "<>",
        }
    }
}

/// A single field condition in a translated query.
#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Condition {
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Response projection: either the full entity or an explicit field set.
#[derive(Debug, Clone, Default)]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
}

/// The sanitized, structured result of translating raw client query
/// parameters. Derived per request, never persisted.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    /// 1-based page number; only meaningful together with `limit`.
    pub page: i64,
    /// Page size. `None` means unbounded, used for internal reads only;
    /// the translator always sets a clamped value.
    pub limit: Option<i64>,
}

impl QuerySpec {
    /// Spec carrying only filter conditions, for internal store reads.
    pub fn filter_only(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            page: 1,
            ..Default::default()
        }
    }

    /// Saturating so an absurd page number yields an empty result instead of
    /// overflowing into a panic or a negative offset.
    pub fn skip(&self) -> i64 {
        match self.limit {
            Some(limit) => (self.page.max(1) - 1).saturating_mul(limit.max(0)),
            None => 0,
        }
    }
}

/// A compiled parameterized query for the SQL-backed store.
#[derive(Debug, Clone)]
pub struct SqlPlan {
    pub query: String,
    pub params: Vec<Value>,
}
