use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub mentor_id: ObjectId,
    pub student_id: ObjectId,
    pub student_name: String,
    pub topic: String,
    pub message: Option<String>,
    /// Free-form slots suggested by the student. Not used when accepting.
    #[serde(default)]
    pub preferred_times: Vec<String>,
    #[serde(default)]
    pub status: MeetingRequestStatus,
    pub request_timestamp: DateTime,
    pub meeting_id: Option<ObjectId>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeetingRequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl MeetingRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingRequestStatus::Pending => "pending",
            MeetingRequestStatus::Accepted => "accepted",
            MeetingRequestStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for MeetingRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MeetingRequest {
    pub const COLLECTION: &'static str = "meeting_requests";
}
