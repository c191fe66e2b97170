use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{Document, Store, StoreError};
use crate::query::{Condition, QueryEngine, QuerySpec};

/// In-memory document store for tests and local development.
///
/// Mirrors the SQL store's contract, including unique-violation errors for
/// the field sets registered per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    unique_indexes: HashMap<String, Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the unique constraints the production schema
    /// carries: one account per email, one tour per name, one review per
    /// (tour, user) pair.
    pub fn with_default_indexes() -> Self {
        let mut store = Self::new();
        store.register_unique_index("users", &["email"]);
        store.register_unique_index("tours", &["name"]);
        store.register_unique_index("reviews", &["tour", "user"]);
        store
    }

    pub fn register_unique_index(&mut self, collection: &str, fields: &[&str]) {
        self.unique_indexes
            .entry(collection.to_string())
            .or_default()
            .push(fields.iter().map(|f| f.to_string()).collect());
    }

    fn check_unique(
        &self,
        collection: &str,
        docs: &[Document],
        candidate: &Document,
        skip_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let Some(field_sets) = self.unique_indexes.get(collection) else {
            return Ok(());
        };

        for fields in field_sets {
            let conflict = docs.iter().any(|existing| {
                if let (Some(skip), Some(Value::String(id))) = (skip_id, existing.get("id")) {
                    if id == skip {
                        return false;
                    }
                }
                fields.iter().all(|field| {
                    match (existing.get(field), candidate.get(field)) {
                        (Some(a), Some(b)) => a == b,
                        _ => false,
                    }
                })
            });
            if conflict {
                return Err(StoreError::UniqueViolation {
                    collection: collection.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        let collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Backend("Store lock poisoned".to_string()))?;
        let docs = collections.get(collection).cloned().unwrap_or_default();
        Ok(QueryEngine::apply(spec, docs))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Backend("Store lock poisoned".to_string()))?;
        let wanted = Value::String(id.to_string());
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.get("id") == Some(&wanted)))
            .cloned())
    }

    async fn find_one(
        &self,
        collection: &str,
        conditions: &[Condition],
    ) -> Result<Option<Document>, StoreError> {
        let collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Backend("Store lock poisoned".to_string()))?;
        let spec = QuerySpec::filter_only(conditions.to_vec());
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| QueryEngine::matches(&spec, doc)))
            .cloned())
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> Result<Document, StoreError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Backend("Store lock poisoned".to_string()))?;
        let docs = collections.entry(collection.to_string()).or_default();

        self.check_unique(collection, docs, &doc, None)?;

        let now = Utc::now().to_rfc3339();
        doc.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        doc.insert("created_at".to_string(), Value::String(now.clone()));
        doc.insert("updated_at".to_string(), Value::String(now));
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        mut doc: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Backend("Store lock poisoned".to_string()))?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };

        let id_string = id.to_string();
        let wanted = Value::String(id_string.clone());
        let Some(position) = docs.iter().position(|d| d.get("id") == Some(&wanted)) else {
            return Ok(None);
        };

        let docs_snapshot = docs.clone();
        self.check_unique(collection, &docs_snapshot, &doc, Some(&id_string))?;

        let created_at = docs[position].get("created_at").cloned();
        doc.insert("id".to_string(), wanted);
        if let Some(created_at) = created_at {
            doc.insert("created_at".to_string(), created_at);
        }
        doc.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        docs[position] = doc.clone();
        Ok(Some(doc))
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| StoreError::Backend("Store lock poisoned".to_string()))?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let wanted = Value::String(id.to_string());
        let before = docs.len();
        docs.retain(|doc| doc.get("id") != Some(&wanted));
        Ok(docs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let saved = store
            .insert("tours", doc(&[("name", json!("Alps"))]))
            .await
            .unwrap();
        assert!(saved.get("id").is_some());
        assert!(saved.get("created_at").is_some());
        assert!(saved.get("updated_at").is_some());
    }

    #[tokio::test]
    async fn duplicate_unique_field_is_rejected() {
        let store = MemoryStore::with_default_indexes();
        store
            .insert("users", doc(&[("email", json!("a@b.test"))]))
            .await
            .unwrap();
        let err = store
            .insert("users", doc(&[("email", json!("a@b.test"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn composite_unique_index_allows_other_pairs() {
        let store = MemoryStore::with_default_indexes();
        store
            .insert(
                "reviews",
                doc(&[("tour", json!("t1")), ("user", json!("u1"))]),
            )
            .await
            .unwrap();
        // Same user, different tour is fine
        store
            .insert(
                "reviews",
                doc(&[("tour", json!("t2")), ("user", json!("u1"))]),
            )
            .await
            .unwrap();
        let err = store
            .insert(
                "reviews",
                doc(&[("tour", json!("t1")), ("user", json!("u1"))]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn update_preserves_id_and_created_at() {
        let store = MemoryStore::new();
        let saved = store
            .insert("tours", doc(&[("name", json!("Alps"))]))
            .await
            .unwrap();
        let id: Uuid = saved["id"].as_str().unwrap().parse().unwrap();
        let updated = store
            .update_by_id("tours", id, doc(&[("name", json!("Dolomites"))]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["id"], saved["id"]);
        assert_eq!(updated["created_at"], saved["created_at"]);
        assert_eq!(updated["name"], json!("Dolomites"));
    }

    #[tokio::test]
    async fn update_does_not_conflict_with_itself() {
        let store = MemoryStore::with_default_indexes();
        let saved = store
            .insert("tours", doc(&[("name", json!("Alps"))]))
            .await
            .unwrap();
        let id: Uuid = saved["id"].as_str().unwrap().parse().unwrap();
        let updated = store
            .update_by_id(
                "tours",
                id,
                doc(&[("name", json!("Alps")), ("price", json!(900))]),
            )
            .await
            .unwrap();
        assert!(updated.is_some());
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = MemoryStore::new();
        let saved = store
            .insert("tours", doc(&[("name", json!("Alps"))]))
            .await
            .unwrap();
        let id: Uuid = saved["id"].as_str().unwrap().parse().unwrap();
        assert!(store.delete_by_id("tours", id).await.unwrap());
        assert!(!store.delete_by_id("tours", id).await.unwrap());
        assert!(store.find_by_id("tours", id).await.unwrap().is_none());
    }
}
