//! Document store contract and the in-memory reference implementation.
//!
//! The ledger persists through this seam only: documents are JSON values
//! addressed by `(collection, id)`, with an ordered range query over a
//! numeric field and an atomic transaction primitive for read-modify-write
//! paths.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur inside a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document could not be encoded or decoded.
    #[error("Document codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The backend failed (availability, timeout, poisoned state).
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Range filter over a numeric document field.
///
/// Bounded filters exclude documents that lack the order field or hold a
/// non-numeric value there; `Unbounded` keeps them, ordered before any
/// document that has the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFilter {
    /// Every document in the collection.
    Unbounded,

    /// Documents whose order field is strictly below the bound.
    LessThan(i64),

    /// Documents whose order field is strictly above the bound.
    GreaterThan(i64),
}

impl RangeFilter {
    fn matches(&self, field: Option<i64>) -> bool {
        match (self, field) {
            (RangeFilter::Unbounded, _) => true,
            (RangeFilter::LessThan(bound), Some(v)) => v < *bound,
            (RangeFilter::GreaterThan(bound), Some(v)) => v > *bound,
            (_, None) => false,
        }
    }
}

/// Key-addressable document store consumed by the ledger.
///
/// Implementations must make `run_transaction` atomic: either every write
/// performed through the [`StoreTransaction`] handle becomes visible at
/// once, or none does.
pub trait DocumentStore {
    /// Fetches a document by id, `None` if absent.
    fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Creates or overwrites a document.
    fn set_document(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()>;

    /// Removes a document. Removing an absent document is a no-op.
    fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Fetches every document in a collection.
    fn list_documents(&self, collection: &str) -> StoreResult<Vec<Value>>;

    /// Fetches documents matching a range filter over a numeric field,
    /// sorted ascending by that field.
    fn query_range(
        &self,
        collection: &str,
        order_field: &str,
        filter: RangeFilter,
    ) -> StoreResult<Vec<Value>>;

    /// Runs `body` against a transaction handle and commits its writes
    /// atomically if it returns `Ok`. Any error discards every buffered
    /// write and is returned to the caller unchanged, which lets domain
    /// errors pass through the store untouched.
    fn run_transaction<E: From<StoreError>>(
        &self,
        body: &mut dyn FnMut(&mut dyn StoreTransaction) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E>;
}

/// Handle passed to a transaction body.
///
/// Reads observe writes made earlier in the same transaction.
pub trait StoreTransaction {
    /// Fetches a document by id, `None` if absent.
    fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Creates or overwrites a document.
    fn set(&mut self, collection: &str, id: &str, doc: Value) -> StoreResult<()>;

    /// Removes a document.
    fn delete(&mut self, collection: &str, id: &str) -> StoreResult<()>;

    /// Lists the ids currently present in a collection.
    fn document_ids(&mut self, collection: &str) -> StoreResult<Vec<String>>;
}

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// In-memory document store.
///
/// Backs the CLI replay harness and the test suite. State lives behind a
/// single mutex; a transaction mutates a working copy of the collection
/// map that is swapped in on commit, so a failed transaction body leaves
/// the store untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .lock()?
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn set_document(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        if let Some(docs) = self.lock()?.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    fn list_documents(&self, collection: &str) -> StoreResult<Vec<Value>> {
        Ok(self
            .lock()?
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    fn query_range(
        &self,
        collection: &str,
        order_field: &str,
        filter: RangeFilter,
    ) -> StoreResult<Vec<Value>> {
        let guard = self.lock()?;
        let mut matched: Vec<(Option<i64>, Value)> = guard
            .get(collection)
            .map(|docs| {
                docs.values()
                    .map(|doc| (doc.get(order_field).and_then(Value::as_i64), doc.clone()))
                    .filter(|(key, _)| filter.matches(*key))
                    .collect()
            })
            .unwrap_or_default();

        matched.sort_by_key(|(key, _)| *key);
        Ok(matched.into_iter().map(|(_, doc)| doc).collect())
    }

    fn run_transaction<E: From<StoreError>>(
        &self,
        body: &mut dyn FnMut(&mut dyn StoreTransaction) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        let mut guard = self.lock().map_err(E::from)?;
        let mut working = guard.clone();
        let mut tx = MemoryTransaction {
            collections: &mut working,
        };
        body(&mut tx)?;
        *guard = working;
        Ok(())
    }
}

struct MemoryTransaction<'a> {
    collections: &'a mut Collections,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn set(&mut self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> StoreResult<()> {
        if let Some(docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    fn document_ids(&mut self, collection: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_delete_round_trip() {
        let store = MemoryStore::new();
        store
            .set_document("clients", "c1", json!({"name": "Ali"}))
            .unwrap();

        let doc = store.get_document("clients", "c1").unwrap().unwrap();
        assert_eq!(doc["name"], "Ali");

        store.delete_document("clients", "c1").unwrap();
        assert!(store.get_document("clients", "c1").unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_document_is_noop() {
        let store = MemoryStore::new();
        store.delete_document("clients", "ghost").unwrap();
    }

    #[test]
    fn test_list_documents_empty_collection() {
        let store = MemoryStore::new();
        assert!(store.list_documents("clients").unwrap().is_empty());
    }

    #[test]
    fn test_query_range_bounds() {
        let store = MemoryStore::new();
        for (id, date) in [("a", 10), ("b", 20), ("c", 30)] {
            store
                .set_document("payments", id, json!({"date": date}))
                .unwrap();
        }

        let below = store
            .query_range("payments", "date", RangeFilter::LessThan(25))
            .unwrap();
        assert_eq!(below.len(), 2);

        let above = store
            .query_range("payments", "date", RangeFilter::GreaterThan(15))
            .unwrap();
        assert_eq!(above.len(), 2);

        let all = store
            .query_range("payments", "date", RangeFilter::Unbounded)
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_query_range_sorted_ascending() {
        let store = MemoryStore::new();
        for (id, date) in [("z", 30), ("a", 10), ("m", 20)] {
            store
                .set_document("payments", id, json!({"date": date}))
                .unwrap();
        }

        let all = store
            .query_range("payments", "date", RangeFilter::Unbounded)
            .unwrap();
        let dates: Vec<i64> = all.iter().map(|d| d["date"].as_i64().unwrap()).collect();
        assert_eq!(dates, vec![10, 20, 30]);
    }

    #[test]
    fn test_bounded_query_excludes_missing_field() {
        let store = MemoryStore::new();
        store
            .set_document("clients", "due", json!({"paymentDueDate": 100}))
            .unwrap();
        store
            .set_document("clients", "no-due", json!({"paymentDueDate": null}))
            .unwrap();

        let due = store
            .query_range("clients", "paymentDueDate", RangeFilter::LessThan(200))
            .unwrap();
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_transaction_commits_all_writes() {
        let store = MemoryStore::new();
        store
            .run_transaction::<StoreError>(&mut |tx| {
                tx.set("clients", "c1", json!({"name": "Ali"}))?;
                tx.set("clients/c1/payments", "p1", json!({"amount": "5.00"}))?;
                Ok(())
            })
            .unwrap();

        assert!(store.get_document("clients", "c1").unwrap().is_some());
        assert!(store
            .get_document("clients/c1/payments", "p1")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_failed_transaction_leaves_store_unchanged() {
        let store = MemoryStore::new();
        store
            .set_document("clients", "c1", json!({"name": "Ali"}))
            .unwrap();

        let result = store.run_transaction::<StoreError>(&mut |tx| {
            tx.delete("clients", "c1")?;
            tx.set("clients", "c2", json!({"name": "Sara"}))?;
            Err(StoreError::Backend("injected".to_string()))
        });

        assert!(result.is_err());
        assert!(store.get_document("clients", "c1").unwrap().is_some());
        assert!(store.get_document("clients", "c2").unwrap().is_none());
    }

    #[test]
    fn test_transaction_reads_its_own_writes() {
        let store = MemoryStore::new();
        store
            .run_transaction::<StoreError>(&mut |tx| {
                tx.set("clients", "c1", json!({"name": "Ali"}))?;
                assert!(tx.get("clients", "c1")?.is_some());

                tx.delete("clients", "c1")?;
                assert!(tx.get("clients", "c1")?.is_none());
                assert!(tx.document_ids("clients")?.is_empty());
                Ok(())
            })
            .unwrap();
    }
}
