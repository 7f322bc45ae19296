use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{ChangeEvent, Query, RecordStore};
use crate::dao::base::{DaoError, DaoResult};

/// MongoDB-backed store.
///
/// Every write made through this process is published on the change channel
/// right away. Writes from other processes arrive through the database change
/// stream when the deployment supports one (replica sets only).
pub struct MongoStore {
    db: Database,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MongoStore {
    pub fn new(db: Database, change_buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(change_buffer.max(1));
        Self { db, changes }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }

    fn publish(&self, collection: &str) {
        let _ = self.changes.send(ChangeEvent {
            collection: collection.to_string(),
        });
    }

    /// Forwards database change-stream events onto the change channel until
    /// the stream ends or errors.
    pub fn spawn_change_listener(&self) {
        let db = self.db.clone();
        let changes = self.changes.clone();
        tokio::spawn(async move {
            let mut stream = match db.watch().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Change streams unavailable, only local writes will refresh feeds");
                    return;
                }
            };
            info!("Listening to database change stream");
            loop {
                match stream.try_next().await {
                    Ok(Some(event)) => {
                        if let Some(coll) = event.ns.and_then(|ns| ns.coll) {
                            let _ = changes.send(ChangeEvent { collection: coll });
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Change stream failed");
                        break;
                    }
                }
            }
            info!("Change stream closed");
        });
    }
}

fn map_write_error(e: mongodb::error::Error) -> DaoError {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
        ref write_error,
    )) = *e.kind
    {
        if write_error.code == 11000 {
            return DaoError::DuplicateKey(write_error.message.clone());
        }
    }
    DaoError::Mongo(e)
}

#[async_trait]
impl RecordStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongo"
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> DaoResult<ObjectId> {
        // Assign the id client-side so the caller never depends on inserted_id's type
        let id = match doc.get_object_id("_id") {
            Ok(id) => id,
            Err(_) => {
                let id = ObjectId::new();
                doc.insert("_id", id);
                id
            }
        };

        self.collection(collection)
            .insert_one(doc)
            .await
            .map_err(map_write_error)?;

        debug!(collection, ?id, "Inserted document");
        self.publish(collection);
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> DaoResult<Option<Document>> {
        Ok(self.collection(collection).find_one(doc! { "_id": id }).await?)
    }

    async fn find(&self, query: &Query) -> DaoResult<Vec<Document>> {
        let coll = self.collection(&query.collection);
        let mut find = coll.find(query.filter_document());
        if let Some(sort) = query.sort_document() {
            find = find.sort(sort);
        }
        if let Some(limit) = query.limit {
            find = find.limit(limit);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, query: &Query) -> DaoResult<u64> {
        Ok(self
            .collection(&query.collection)
            .count_documents(query.filter_document())
            .await?)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        set: Document,
    ) -> DaoResult<bool> {
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await
            .map_err(map_write_error)?;

        let matched = result.matched_count > 0;
        if matched {
            self.publish(collection);
        }
        Ok(matched)
    }

    async fn update_many(&self, query: &Query, set: Document) -> DaoResult<u64> {
        let result = self
            .collection(&query.collection)
            .update_many(query.filter_document(), doc! { "$set": set })
            .await
            .map_err(map_write_error)?;

        if result.matched_count > 0 {
            self.publish(&query.collection);
        }
        Ok(result.matched_count)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> DaoResult<bool> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .await?;

        let removed = result.deleted_count > 0;
        if removed {
            self.publish(collection);
        }
        Ok(removed)
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
