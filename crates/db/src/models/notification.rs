use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub recipient_id: ObjectId,
    pub content: String,
    pub notification_type: NotificationType,
    pub source: NotificationSource,
    pub timestamp: DateTime,
    pub read_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    MentorshipAccepted,
    MentorshipDeclined,
    MeetingScheduled,
    MeetingUpdated,
    MeetingCancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSource {
    pub entity_type: String,
    pub entity_id: ObjectId,
    pub actor_id: Option<ObjectId>,
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}
