use std::collections::HashSet;
use std::sync::Arc;

use alumnet_db::models::{Meeting, MeetingStatus, MentorshipStatus};
use bson::{oid::ObjectId, DateTime};
use chrono::{Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::dao::{DaoResult, Daos};
use crate::store::SortOrder;

/// Headline numbers for a mentor's communication tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeetingStats {
    /// Completed meetings.
    pub total_sessions: usize,
    /// Sum of the actual duration of completed meetings.
    pub total_hours: f64,
    /// Mean over completed meetings that carry a rating; 0 when none do.
    pub average_rating: f64,
    /// Meetings still scheduled.
    pub upcoming_sessions: usize,
    pub unique_students: usize,
}

pub fn summarize(meetings: &[Meeting]) -> MeetingStats {
    let completed: Vec<&Meeting> = meetings
        .iter()
        .filter(|m| m.status == MeetingStatus::Completed)
        .collect();

    let minutes: u64 = completed
        .iter()
        .map(|m| m.actual_duration_minutes.unwrap_or(0) as u64)
        .sum();

    let ratings: Vec<f64> = completed
        .iter()
        .filter_map(|m| m.rating.map(f64::from))
        .collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    };

    let students: HashSet<ObjectId> = meetings.iter().map(|m| m.student_id).collect();

    MeetingStats {
        total_sessions: completed.len(),
        total_hours: minutes as f64 / 60.0,
        average_rating,
        upcoming_sessions: meetings
            .iter()
            .filter(|m| m.status == MeetingStatus::Scheduled)
            .count(),
        unique_students: students.len(),
    }
}

/// Time window of the tracker, counted back from now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week,
    Month,
    #[default]
    All,
}

impl Period {
    /// Earliest meeting date included, `None` for all time.
    pub fn since(&self, now: chrono::DateTime<Utc>) -> Option<chrono::DateTime<Utc>> {
        match self {
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Which meetings the tracker, its stats and the export cover.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MeetingFilter {
    #[serde(default)]
    pub period: Period,
    pub status: Option<MeetingStatus>,
    #[serde(default)]
    pub order: SortDirection,
}

/// Dashboard numbers over the mentor's mentorships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MentorshipCounts {
    pub active: u64,
    pub completed: u64,
    /// Active plus completed.
    pub students_mentored: u64,
}

pub struct TrackerService {
    daos: Arc<Daos>,
}

impl TrackerService {
    pub fn new(daos: Arc<Daos>) -> Self {
        Self { daos }
    }

    /// Every meeting of the mentor, most recent first.
    pub async fn meetings(&self, mentor_id: ObjectId) -> DaoResult<Vec<Meeting>> {
        self.filtered(mentor_id, &MeetingFilter::default()).await
    }

    pub async fn filtered(&self, mentor_id: ObjectId, filter: &MeetingFilter) -> DaoResult<Vec<Meeting>> {
        let since = filter.period.since(Utc::now()).map(DateTime::from_chrono);
        let order = match filter.order {
            SortDirection::Asc => SortOrder::Ascending,
            SortDirection::Desc => SortOrder::Descending,
        };
        let query = self
            .daos
            .meetings
            .history_for_mentor(mentor_id, since, filter.status, order);
        self.daos.meetings.base.find_many(&query).await
    }

    pub async fn stats(&self, mentor_id: ObjectId, filter: &MeetingFilter) -> DaoResult<MeetingStats> {
        Ok(summarize(&self.filtered(mentor_id, filter).await?))
    }

    pub async fn mentorship_counts(&self, mentor_id: ObjectId) -> DaoResult<MentorshipCounts> {
        let mentorships = &self.daos.mentorships;
        let active = mentorships
            .count_for_mentor(mentor_id, MentorshipStatus::Active)
            .await?;
        let completed = mentorships
            .count_for_mentor(mentor_id, MentorshipStatus::Completed)
            .await?;
        Ok(MentorshipCounts {
            active,
            completed,
            students_mentored: active + completed,
        })
    }
}
