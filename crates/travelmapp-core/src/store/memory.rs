//! In-memory document store for tests and local tooling.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{DocumentStore, OrderBy, SortDirection};
use crate::error::{Error, Result};
use crate::models::{Document, Fields};

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// Process-local [`DocumentStore`].
///
/// Identifiers are UUID v7 strings generated by the store. Data is lost when
/// the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
    writes: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document under a fixed id, bypassing id assignment.
    ///
    /// Not counted as a write.
    pub fn insert_raw(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.write_guard()?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.read_guard()
            .map(|collections| collections.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Number of successful create/replace/delete calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|error| Error::StoreUnavailable(format!("lock poisoned: {error}")))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|error| Error::StoreUnavailable(format!("lock poisoned: {error}")))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        self.write_guard()?
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        self.record_write();
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.read_guard()?;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn list(&self, collection: &str, order: &OrderBy) -> Result<Vec<Document>> {
        let collections = self.read_guard()?;
        let mut documents = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        drop(collections);

        documents.sort_by(|left, right| {
            let ordering = compare_values(
                left.fields.get(&order.field),
                right.fields.get(&order.field),
            )
            .then_with(|| left.id.cmp(&right.id));
            match order.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        Ok(documents)
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut collections = self.write_guard()?;
        let slot = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        *slot = fields;
        drop(collections);
        self.record_write();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        if let Some(documents) = self.write_guard()?.get_mut(collection) {
            documents.remove(id);
        }
        self.record_write();
        Ok(())
    }
}

/// Missing and `null` sort first, then booleans, numbers, strings.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (left, right) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => rank(left).cmp(&rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        let Value::Object(fields) = value else {
            panic!("test fields must be an object");
        };
        fields
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let store = InMemoryDocumentStore::new();
        let first = store.create("places", fields(json!({"name": "a"}))).await.unwrap();
        let second = store.create("places", fields(json!({"name": "a"}))).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.len("places"), 2);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryDocumentStore::new();
        assert!(store.get("places", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_orders_by_field() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_raw("places", "old", fields(json!({"created_at": 1})))
            .unwrap();
        store
            .insert_raw("places", "new", fields(json!({"created_at": 3})))
            .unwrap();
        store
            .insert_raw("places", "mid", fields(json!({"created_at": 2})))
            .unwrap();
        store.insert_raw("places", "none", Fields::new()).unwrap();

        let descending = store
            .list("places", &OrderBy::descending("created_at"))
            .await
            .unwrap();
        let ids = descending.iter().map(|doc| doc.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["new", "mid", "old", "none"]);

        let ascending = store
            .list("places", &OrderBy::ascending("created_at"))
            .await
            .unwrap();
        assert_eq!(ascending[0].id, "none");
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = InMemoryDocumentStore::new();
        store.create("places", Fields::new()).await.unwrap();

        let others = store
            .list("trips", &OrderBy::descending("created_at"))
            .await
            .unwrap();
        assert!(others.is_empty());
    }

    #[tokio::test]
    async fn replace_missing_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let error = store
            .replace("places", "ghost", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn replace_overwrites_all_fields() {
        let store = InMemoryDocumentStore::new();
        let id = store
            .create("places", fields(json!({"name": "a", "description": "b"})))
            .await
            .unwrap();
        store
            .replace("places", &id, fields(json!({"name": "c"})))
            .await
            .unwrap();

        let doc = store.get("places", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields, fields(json!({"name": "c"})));
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = InMemoryDocumentStore::new();
        let id = store.create("places", Fields::new()).await.unwrap();
        store.delete("places", &id).await.unwrap();
        assert!(store.is_empty("places"));
        store.delete("places", &id).await.unwrap();
    }
}
