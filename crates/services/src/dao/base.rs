use std::marker::PhantomData;
use std::sync::Arc;

use bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::store::{Query, RecordStore};

#[derive(Debug, Error)]
pub enum DaoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),
    #[error("BSON deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),
    #[error("Entity not found")]
    NotFound,
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Validation: {0}")]
    Validation(String),
}

pub type DaoResult<T> = Result<T, DaoError>;

/// Typed access to one collection of the record store.
pub struct BaseDao<T> {
    store: Arc<dyn RecordStore>,
    collection: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BaseDao<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
{
    pub fn new(store: Arc<dyn RecordStore>, collection: &'static str) -> Self {
        Self {
            store,
            collection,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Empty query over this collection.
    pub fn query(&self) -> Query {
        Query::new(self.collection)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<T> {
        self.get(id).await?.ok_or(DaoError::NotFound)
    }

    pub async fn get(&self, id: ObjectId) -> DaoResult<Option<T>> {
        match self.store.find_by_id(self.collection, id).await? {
            Some(doc) => Ok(Some(bson::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn find_many(&self, query: &Query) -> DaoResult<Vec<T>> {
        let docs = self.store.find(query).await?;
        docs.into_iter()
            .map(|doc| bson::from_document(doc).map_err(DaoError::from))
            .collect()
    }

    pub async fn insert_one(&self, entity: &T) -> DaoResult<ObjectId> {
        let doc = bson::to_document(entity)?;
        let id = self.store.insert(self.collection, doc).await?;
        debug!(collection = self.collection, ?id, "Inserted document");
        Ok(id)
    }

    /// Merges `set` into the document and bumps `updated_at`.
    pub async fn update_by_id(&self, id: ObjectId, mut set: Document) -> DaoResult<bool> {
        set.insert("updated_at", bson::DateTime::now());
        self.store.update_by_id(self.collection, id, set).await
    }

    /// Merges `set` verbatim, for collections without `updated_at` or when
    /// restoring a previous value.
    pub async fn set_fields_by_id(&self, id: ObjectId, set: Document) -> DaoResult<bool> {
        self.store.update_by_id(self.collection, id, set).await
    }

    pub async fn update_many(&self, query: &Query, set: Document) -> DaoResult<u64> {
        self.store.update_many(query, set).await
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> DaoResult<bool> {
        self.store.delete_by_id(self.collection, id).await
    }

    pub async fn count(&self, query: &Query) -> DaoResult<u64> {
        self.store.count(query).await
    }
}
