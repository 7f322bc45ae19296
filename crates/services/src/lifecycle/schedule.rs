use alumnet_db::models::Meeting;
use bson::oid::ObjectId;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::error::{LifecycleError, LifecycleResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// The schedule form as submitted by the mentor. Blank strings count as
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingForm {
    #[serde(default)]
    pub student_id: String,
    /// Display only; filled from the roster when blank.
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub topic: String,
    /// "YYYY-MM-DD"
    #[serde(default)]
    pub date: String,
    /// "HH:MM"
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidForm {
    pub student_id: ObjectId,
    pub student_name: Option<String>,
    pub topic: String,
    pub date_timestamp: DateTime<Utc>,
    pub duration: String,
    pub platform: String,
    pub link: Option<String>,
    pub notes: Option<String>,
}

fn required(value: &str, field: &'static str) -> LifecycleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl MeetingForm {
    /// Presence is checked for every required field before anything is
    /// parsed, so a half-filled form always reports the missing field.
    pub fn validate(
        &self,
        offset: FixedOffset,
        default_duration: &str,
        default_platform: &str,
    ) -> LifecycleResult<ValidForm> {
        let student_id = required(&self.student_id, "student_id")?;
        let topic = required(&self.topic, "topic")?;
        let date = required(&self.date, "date")?;
        let time = required(&self.time, "time")?;

        let student_id = ObjectId::parse_str(&student_id)
            .map_err(|_| LifecycleError::Validation(format!("Invalid student id: {}", student_id)))?;
        let date_timestamp = parse_slot(&date, &time, offset)?;

        let or_default = |value: &str, default: &str| {
            let value = value.trim();
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };

        Ok(ValidForm {
            student_id,
            student_name: optional(Some(&self.student_name)),
            topic,
            date_timestamp,
            duration: or_default(&self.duration, default_duration),
            platform: or_default(&self.platform, default_platform),
            link: optional(self.link.as_deref()),
            notes: optional(self.notes.as_deref()),
        })
    }
}

impl MeetingForm {
    /// Pre-fills the form from a stored meeting, for editing.
    pub fn from_meeting(meeting: &Meeting, offset: FixedOffset) -> Self {
        Self {
            student_id: meeting.student_id.to_hex(),
            student_name: meeting.student_name.clone(),
            topic: meeting.topic.clone(),
            date: meeting.form_date(offset),
            time: meeting.time_string(offset),
            duration: meeting.duration.clone(),
            platform: meeting.platform.clone(),
            link: meeting.link.clone(),
            notes: meeting.notes.clone(),
        }
    }
}

/// Falls back to UTC for offsets chrono rejects (beyond +/-24h).
pub fn utc_offset(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// Interprets a form date and time as wall-clock time at `offset`.
pub fn parse_slot(date: &str, time: &str, offset: FixedOffset) -> LifecycleResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| LifecycleError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", date)))?;
    let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
        .map_err(|_| LifecycleError::Validation(format!("Invalid time '{}', expected HH:MM", time)))?;

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| LifecycleError::Validation("Ambiguous local time".to_string()))
}

/// Slot proposed when a meeting request is accepted: the next calendar day
/// (in `offset`) at `time`.
pub fn default_slot(now: DateTime<Utc>, offset: FixedOffset, time: &str) -> LifecycleResult<DateTime<Utc>> {
    let today = now.with_timezone(&offset).date_naive();
    let tomorrow = today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| LifecycleError::Validation("Date out of range".to_string()))?;
    parse_slot(&tomorrow.format(DATE_FORMAT).to_string(), time, offset)
}

/// Midnight of the current day at `offset`, the boundary between the
/// upcoming and past meeting feeds.
pub fn start_of_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = now.with_timezone(&offset).date_naive().and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&local_midnight)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or(now)
}
