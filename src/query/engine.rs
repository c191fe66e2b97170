use serde_json::Value;

use super::error::QueryError;
use super::types::{FilterOp, Projection, QuerySpec, SqlPlan};
use crate::store::Document;

/// Applies a translated [`QuerySpec`] to a base collection query in a fixed
/// pipeline: filter, projection, sort, pagination. Projection narrows the
/// result set, never the sort input, so sort keys stay available; pagination
/// is always last so skip/limit act on the filtered-and-sorted result.
///
/// Two backends share this component: `to_sql` compiles the spec into a
/// parameterized SELECT for the SQL store, `apply` evaluates the same pipeline
/// over in-memory documents. No side effects either way.
pub struct QueryEngine;

impl QueryEngine {
    /// Compile a spec into a parameterized query over a document table of
    /// shape (id, doc jsonb, created_at, updated_at).
    pub fn to_sql(collection: &str, spec: &QuerySpec) -> Result<SqlPlan, QueryError> {
        Self::validate_collection_name(collection)?;

        let mut params: Vec<Value> = Vec::new();
        let mut clauses: Vec<String> = Vec::new();

        for cond in &spec.conditions {
            params.push(cond.value.clone());
            clauses.push(format!(
                "{} {} ${}",
                Self::field_expr(&cond.field),
                cond.op.to_sql(),
                params.len()
            ));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let order_clause = if spec.sort.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = spec
                .sort
                .iter()
                .map(|key| format!("{} {}", Self::field_expr(&key.field), key.direction.to_sql()))
                .collect();
            format!("ORDER BY {}", parts.join(", "))
        };

        let limit_clause = match spec.limit {
            Some(limit) => format!("LIMIT {} OFFSET {}", limit, spec.skip()),
            None => String::new(),
        };

        let query = [
            "SELECT id, doc, created_at, updated_at".to_string(),
            format!("FROM \"{}\"", collection),
            where_clause,
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlPlan { query, params })
    }

    /// Evaluate the spec against in-memory documents.
    pub fn apply(spec: &QuerySpec, docs: Vec<Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs
            .into_iter()
            .filter(|doc| Self::matches(spec, doc))
            .collect();

        if !spec.sort.is_empty() {
            matched.sort_by(|a, b| {
                for key in &spec.sort {
                    let left = a.get(&key.field).unwrap_or(&Value::Null);
                    let right = b.get(&key.field).unwrap_or(&Value::Null);
                    let ord = match key.direction {
                        super::types::SortDirection::Asc => json_cmp(left, right),
                        super::types::SortDirection::Desc => json_cmp(right, left),
                    };
                    if ord != std::cmp::Ordering::Equal {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        let skip = spec.skip().max(0) as usize;
        let paged: Vec<Document> = match spec.limit {
            Some(limit) => matched.into_iter().skip(skip).take(limit.max(0) as usize).collect(),
            None => matched,
        };

        paged
            .into_iter()
            .map(|doc| Self::project(&spec.projection, doc))
            .collect()
    }

    pub fn matches(spec: &QuerySpec, doc: &Document) -> bool {
        spec.conditions.iter().all(|cond| {
            let actual = doc.get(&cond.field).unwrap_or(&Value::Null);
            let ord = json_partial_cmp(actual, &cond.value);
            match cond.op {
                FilterOp::Eq => ord == Some(std::cmp::Ordering::Equal),
                FilterOp::Ne => ord != Some(std::cmp::Ordering::Equal),
                FilterOp::Gt => ord == Some(std::cmp::Ordering::Greater),
                FilterOp::Gte => matches!(
                    ord,
                    Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
                ),
                FilterOp::Lt => ord == Some(std::cmp::Ordering::Less),
                FilterOp::Lte => matches!(
                    ord,
                    Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
                ),
            }
        })
    }

    /// Narrow a document to the projected fields. The id always survives.
    pub fn project(projection: &Projection, doc: Document) -> Document {
        match projection {
            Projection::All => doc,
            Projection::Fields(fields) => doc
                .into_iter()
                .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                .collect(),
        }
    }

    /// Top-level columns are accessed directly; everything else lives in the
    /// jsonb document. All operands compare as jsonb so numeric fields order
    /// numerically.
    fn field_expr(field: &str) -> String {
        match field {
            "id" => "to_jsonb(id)".to_string(),
            "created_at" => "to_jsonb(created_at)".to_string(),
            "updated_at" => "to_jsonb(updated_at)".to_string(),
            other => format!("doc->'{}'", other),
        }
    }

    pub(crate) fn validate_collection_name(name: &str) -> Result<(), QueryError> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(QueryError::InvalidCollectionName(name.to_string()))
        }
    }
}

/// Cross-type comparisons have no defined ordering and match nothing.
fn json_partial_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(std::cmp::Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64()?;
            let y = y.as_f64()?;
            x.partial_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting, with jsonb-style type ranking.
fn json_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    json_partial_cmp(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::{Condition, SortDirection, SortKey};
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn tours() -> Vec<Document> {
        vec![
            doc(&[("id", json!("a")), ("name", json!("Alps")), ("price", json!(900)), ("created_at", json!("2026-01-01T00:00:00Z"))]),
            doc(&[("id", json!("b")), ("name", json!("Bosphorus")), ("price", json!(1200)), ("created_at", json!("2026-01-02T00:00:00Z"))]),
            doc(&[("id", json!("c")), ("name", json!("Cappadocia")), ("price", json!(1500)), ("created_at", json!("2026-01-03T00:00:00Z"))]),
        ]
    }

    #[test]
    fn to_sql_assembles_clauses_in_pipeline_order() {
        let spec = QuerySpec {
            conditions: vec![Condition {
                field: "price".into(),
                op: FilterOp::Lte,
                value: json!(1200),
            }],
            sort: vec![SortKey {
                field: "price".into(),
                direction: SortDirection::Asc,
            }],
            projection: Projection::Fields(vec!["name".into()]),
            page: 2,
            limit: Some(10),
        };

        let plan = QueryEngine::to_sql("tours", &spec).unwrap();
        assert_eq!(
            plan.query,
            "SELECT id, doc, created_at, updated_at FROM \"tours\" \
             WHERE doc->'price' <= $1 ORDER BY doc->'price' ASC LIMIT 10 OFFSET 10"
        );
        assert_eq!(plan.params, vec![json!(1200)]);
    }

    #[test]
    fn to_sql_sorts_top_level_columns_directly() {
        let spec = QuerySpec {
            sort: vec![SortKey {
                field: "created_at".into(),
                direction: SortDirection::Desc,
            }],
            page: 1,
            limit: Some(20),
            ..Default::default()
        };
        let plan = QueryEngine::to_sql("reviews", &spec).unwrap();
        assert!(plan.query.contains("ORDER BY to_jsonb(created_at) DESC"));
    }

    #[test]
    fn to_sql_rejects_hostile_collection_names() {
        let err = QueryEngine::to_sql("tours\"; --", &QuerySpec::default()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidCollectionName(_)));
    }

    #[test]
    fn apply_filters_numerically() {
        let spec = QuerySpec {
            conditions: vec![Condition {
                field: "price".into(),
                op: FilterOp::Lte,
                value: json!(1200),
            }],
            page: 1,
            ..Default::default()
        };
        let out = QueryEngine::apply(&spec, tours());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|d| d["price"].as_i64().unwrap() <= 1200));
    }

    #[test]
    fn apply_paginates_after_sorting() {
        let spec = QuerySpec {
            sort: vec![SortKey {
                field: "price".into(),
                direction: SortDirection::Desc,
            }],
            page: 2,
            limit: Some(1),
            ..Default::default()
        };
        let out = QueryEngine::apply(&spec, tours());
        assert_eq!(out.len(), 1);
        // Second page of a descending price sort is the middle tour
        assert_eq!(out[0]["name"], json!("Bosphorus"));
    }

    #[test]
    fn apply_projects_after_sorting_on_unprojected_field() {
        let spec = QuerySpec {
            sort: vec![SortKey {
                field: "price".into(),
                direction: SortDirection::Asc,
            }],
            projection: Projection::Fields(vec!["name".into()]),
            page: 1,
            ..Default::default()
        };
        let out = QueryEngine::apply(&spec, tours());
        assert_eq!(out[0]["name"], json!("Alps"));
        assert!(out[0].get("price").is_none());
        assert!(out[0].get("id").is_some(), "id always survives projection");
    }

    #[test]
    fn ne_matches_cross_type_values() {
        let spec = QuerySpec {
            conditions: vec![Condition {
                field: "name".into(),
                op: FilterOp::Ne,
                value: json!(5),
            }],
            page: 1,
            ..Default::default()
        };
        let out = QueryEngine::apply(&spec, tours());
        assert_eq!(out.len(), 3);
    }
}
