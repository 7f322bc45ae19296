use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorshipRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub mentor_id: ObjectId,
    pub student_id: ObjectId,
    /// Free-text topic category chosen by the student.
    pub request_type: String,
    pub message: Option<String>,
    #[serde(default)]
    pub status: MentorshipRequestStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MentorshipRequestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl MentorshipRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentorshipRequestStatus::Pending => "pending",
            MentorshipRequestStatus::Accepted => "accepted",
            MentorshipRequestStatus::Declined => "declined",
        }
    }
}

impl std::fmt::Display for MentorshipRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MentorshipRequest {
    pub const COLLECTION: &'static str = "mentorship_requests";
}
