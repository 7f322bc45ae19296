use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// The ongoing relationship created when a mentor accepts a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentorship {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub mentor_id: ObjectId,
    pub student_id: ObjectId,
    /// Copied from the student's profile when the mentorship opens.
    #[serde(default)]
    pub student_name: String,
    pub topic: String,
    #[serde(default)]
    pub status: MentorshipStatus,
    pub from_request_id: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MentorshipStatus {
    #[default]
    Active,
    Completed,
    Pending,
}

impl MentorshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentorshipStatus::Active => "active",
            MentorshipStatus::Completed => "completed",
            MentorshipStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for MentorshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Mentorship {
    pub const COLLECTION: &'static str = "mentorships";
}
