use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

use super::{ChangeEvent, Query, RecordStore};
use crate::dao::base::{DaoError, DaoResult};

/// Process-local store used for development and tests.
///
/// Documents keep insertion order per collection. Writes to a collection can
/// be made to fail on demand to exercise partial-failure handling.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    changes: broadcast::Sender<ChangeEvent>,
    /// collection -> writes still allowed before every further write fails
    failures: Mutex<HashMap<String, usize>>,
    failing_lookups: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new(change_buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(change_buffer.max(1));
        Self {
            collections: RwLock::new(HashMap::new()),
            changes,
            failures: Mutex::new(HashMap::new()),
            failing_lookups: Mutex::new(HashSet::new()),
        }
    }

    /// Every subsequent write to `collection` fails with `DaoError::Unavailable`.
    pub fn fail_writes_to(&self, collection: &str) {
        self.fail_writes_to_after(collection, 0);
    }

    /// Lets `allowed` more writes to `collection` through, then fails the rest.
    pub fn fail_writes_to_after(&self, collection: &str, allowed: usize) {
        self.failures.lock().insert(collection.to_string(), allowed);
    }

    pub fn restore_writes_to(&self, collection: &str) {
        self.failures.lock().remove(collection);
    }

    /// Every subsequent `find_by_id` on `collection` fails. Queries still work.
    pub fn fail_lookups_in(&self, collection: &str) {
        self.failing_lookups.lock().insert(collection.to_string());
    }

    fn check_writable(&self, collection: &str) -> DaoResult<()> {
        let mut failures = self.failures.lock();
        match failures.get_mut(collection) {
            Some(0) => Err(DaoError::Unavailable(format!(
                "writes to '{}' are failing",
                collection
            ))),
            Some(allowed) => {
                *allowed -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn publish(&self, collection: &str) {
        // No receivers is fine: nobody is listening yet
        let _ = self.changes.send(ChangeEvent {
            collection: collection.to_string(),
        });
    }

    fn run_query(&self, query: &Query) -> Vec<Document> {
        let collections = self.collections.read();
        let mut docs: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();
        // Stable sort keeps insertion order among equal keys
        docs.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit.filter(|l| *l > 0) {
            docs.truncate(limit as usize);
        }
        docs
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(256)
    }
}

fn id_of(doc: &Document) -> Option<ObjectId> {
    doc.get_object_id("_id").ok()
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> DaoResult<ObjectId> {
        self.check_writable(collection)?;

        let id = match doc.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(DaoError::Validation(format!(
                    "Unsupported _id type: {}",
                    other
                )));
            }
            None => {
                let id = ObjectId::new();
                doc.insert("_id", id);
                id
            }
        };

        {
            let mut collections = self.collections.write();
            let docs = collections.entry(collection.to_string()).or_default();
            if docs.iter().any(|d| id_of(d) == Some(id)) {
                return Err(DaoError::DuplicateKey(format!("_id {} already exists", id)));
            }
            docs.push(doc);
        }

        debug!(collection, ?id, "Inserted document");
        self.publish(collection);
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> DaoResult<Option<Document>> {
        if self.failing_lookups.lock().contains(collection) {
            return Err(DaoError::Unavailable(format!(
                "lookups in '{}' are failing",
                collection
            )));
        }
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| id_of(d) == Some(id)).cloned()))
    }

    async fn find(&self, query: &Query) -> DaoResult<Vec<Document>> {
        Ok(self.run_query(query))
    }

    async fn count(&self, query: &Query) -> DaoResult<u64> {
        let collections = self.collections.read();
        Ok(collections
            .get(&query.collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        set: Document,
    ) -> DaoResult<bool> {
        self.check_writable(collection)?;

        let matched = {
            let mut collections = self.collections.write();
            match collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| id_of(d) == Some(id)))
            {
                Some(doc) => {
                    for (key, value) in set {
                        doc.insert(key, value);
                    }
                    true
                }
                None => false,
            }
        };

        if matched {
            self.publish(collection);
        }
        Ok(matched)
    }

    async fn update_many(&self, query: &Query, set: Document) -> DaoResult<u64> {
        self.check_writable(&query.collection)?;

        let matched = {
            let mut collections = self.collections.write();
            let mut matched = 0;
            if let Some(docs) = collections.get_mut(&query.collection) {
                for doc in docs.iter_mut().filter(|d| query.matches(d)) {
                    for (key, value) in set.iter() {
                        doc.insert(key.clone(), value.clone());
                    }
                    matched += 1;
                }
            }
            matched
        };

        if matched > 0 {
            self.publish(&query.collection);
        }
        Ok(matched)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> DaoResult<bool> {
        self.check_writable(collection)?;

        let removed = {
            let mut collections = self.collections.write();
            match collections.get_mut(collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|d| id_of(d) != Some(id));
                    docs.len() != before
                }
                None => false,
            }
        };

        if removed {
            self.publish(collection);
        }
        Ok(removed)
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
