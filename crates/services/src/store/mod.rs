pub mod memory;
pub mod mongo;
pub mod query;

use std::sync::Arc;

use alumnet_config::{Settings, StoreBackend};
use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use tokio::sync::broadcast;
use tracing::info;

use crate::dao::base::DaoResult;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query::{Filter, FilterOp, Query, SortOrder};

/// Published once per successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
}

/// Document store the rest of the crate is written against.
///
/// Updates are partial merges of top-level fields. There is no multi-document
/// atomicity; callers that need several writes to stand or fall together
/// compensate themselves (see `lifecycle::saga`).
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Generates `_id` when the document has none.
    async fn insert(&self, collection: &str, doc: Document) -> DaoResult<ObjectId>;

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> DaoResult<Option<Document>>;

    async fn find(&self, query: &Query) -> DaoResult<Vec<Document>>;

    async fn count(&self, query: &Query) -> DaoResult<u64>;

    /// Returns whether a document with `id` existed.
    async fn update_by_id(&self, collection: &str, id: ObjectId, set: Document)
    -> DaoResult<bool>;

    /// Applies `set` to every match, ignoring sort and limit. Returns the match count.
    async fn update_many(&self, query: &Query, set: Document) -> DaoResult<u64>;

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> DaoResult<bool>;

    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreOpenError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Builds the configured backend. For MongoDB this connects, ensures indexes
/// and starts the change-stream listener.
pub async fn open_store(settings: &Settings) -> Result<Arc<dyn RecordStore>, StoreOpenError> {
    match settings.store.backend {
        StoreBackend::Mongo => {
            let db = alumnet_db::connect(&settings.database).await?;
            alumnet_db::indexes::ensure_indexes(&db).await?;
            let store = MongoStore::new(db, settings.store.change_buffer);
            store.spawn_change_listener();
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Ok(Arc::new(MemoryStore::new(settings.store.change_buffer)))
        }
    }
}
