use bson::{oid::ObjectId, DateTime};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// A scheduled mentor/student session.
///
/// Only `date_timestamp` is stored; the display date and time are rendered
/// from it on read so the two can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub mentor_id: ObjectId,
    pub mentor_name: String,
    pub student_id: ObjectId,
    pub student_name: String,
    pub topic: String,
    pub date_timestamp: DateTime,
    pub duration: String,
    pub platform: String,
    pub link: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: MeetingStatus,
    pub from_request_id: Option<ObjectId>,
    pub actual_duration_minutes: Option<u32>,
    pub rating: Option<u8>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    Cancelled,
    Completed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "Scheduled",
            MeetingStatus::Cancelled => "Cancelled",
            MeetingStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Meeting {
    pub const COLLECTION: &'static str = "meetings";

    /// e.g. "May 15, 2025"
    pub fn date_string(&self, offset: FixedOffset) -> String {
        self.date_timestamp
            .to_chrono()
            .with_timezone(&offset)
            .format("%B %-d, %Y")
            .to_string()
    }

    /// e.g. "14:00"
    pub fn time_string(&self, offset: FixedOffset) -> String {
        self.date_timestamp
            .to_chrono()
            .with_timezone(&offset)
            .format("%H:%M")
            .to_string()
    }

    /// ISO calendar date, the value a date input expects.
    pub fn form_date(&self, offset: FixedOffset) -> String {
        self.date_timestamp
            .to_chrono()
            .with_timezone(&offset)
            .format("%Y-%m-%d")
            .to_string()
    }
}
