use std::sync::Arc;

use alumnet_db::models::{Notification, NotificationSource, NotificationType};
use bson::{doc, oid::ObjectId, Bson, DateTime};

use super::base::{BaseDao, DaoResult};
use crate::store::{Query, RecordStore};

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

impl NotificationDao {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            base: BaseDao::new(store, Notification::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        recipient_id: ObjectId,
        content: String,
        notification_type: NotificationType,
        source: NotificationSource,
    ) -> DaoResult<Notification> {
        let notification = Notification {
            id: None,
            recipient_id,
            content,
            notification_type,
            source,
            timestamp: DateTime::now(),
            read_at: None,
        };

        let id = self.base.insert_one(&notification).await?;
        self.base.find_by_id(id).await
    }

    /// Unread first (a null `read_at` sorts lowest), then newest first.
    pub fn feed_for(&self, recipient_id: ObjectId, limit: i64) -> Query {
        self.base
            .query()
            .eq("recipient_id", recipient_id)
            .sort_asc("read_at")
            .sort_desc("timestamp")
            .limit(limit)
    }

    pub async fn mark_all_read(&self, recipient_id: ObjectId) -> DaoResult<u64> {
        let unread = self
            .base
            .query()
            .eq("recipient_id", recipient_id)
            .eq("read_at", Bson::Null);
        self.base
            .update_many(&unread, doc! { "read_at": DateTime::now() })
            .await
    }

    /// Marks the listed notifications read, skipping ids that belong to
    /// someone else or are already read.
    pub async fn mark_read(&self, recipient_id: ObjectId, ids: &[ObjectId]) -> DaoResult<u64> {
        let now = DateTime::now();
        let mut marked = 0;
        for id in ids {
            let Some(notification) = self.base.get(*id).await? else {
                continue;
            };
            if notification.recipient_id != recipient_id || notification.is_read() {
                continue;
            }
            if self
                .base
                .set_fields_by_id(*id, doc! { "read_at": now })
                .await?
            {
                marked += 1;
            }
        }
        Ok(marked)
    }
}
