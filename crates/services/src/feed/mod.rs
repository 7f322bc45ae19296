pub mod subscription;

use std::sync::Arc;

use alumnet_config::LifecycleSettings;
use alumnet_db::models::{Meeting, MeetingRequest, Mentorship, MentorshipRequest, Notification};
use bson::{oid::ObjectId, DateTime};
use chrono::{FixedOffset, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use subscription::{ChangeKind, DocumentChange, Snapshot, Subscription};

use crate::dao::{DaoResult, Daos};
use crate::lifecycle::{start_of_day, utc_offset};
use crate::store::Query;

/// The dashboard lists, all scoped to the session user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Meetings from the start of today on, soonest first.
    Upcoming,
    /// Meetings before today, most recent first.
    Past,
    MentorshipRequests,
    MeetingRequests,
    /// The mentor's most recently updated mentorships.
    Mentorships,
    /// Unread first, newest first, one page.
    Notifications,
}

/// How many mentorships the dashboard's activity list shows.
pub const RECENT_MENTORSHIPS: i64 = 5;

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Upcoming => "upcoming",
            FeedKind::Past => "past",
            FeedKind::MentorshipRequests => "mentorship_requests",
            FeedKind::MeetingRequests => "meeting_requests",
            FeedKind::Mentorships => "mentorships",
            FeedKind::Notifications => "notifications",
        }
    }
}

pub struct FeedService {
    daos: Arc<Daos>,
    offset: FixedOffset,
    page_size: i64,
    channel_capacity: usize,
}

impl FeedService {
    pub fn new(daos: Arc<Daos>, lifecycle: &LifecycleSettings, channel_capacity: usize) -> Self {
        Self {
            daos,
            offset: utc_offset(lifecycle.utc_offset_minutes),
            page_size: lifecycle.notification_page_size,
            channel_capacity,
        }
    }

    fn build_query(daos: &Daos, kind: FeedKind, user_id: ObjectId, offset: FixedOffset, page_size: i64) -> Query {
        let today = || DateTime::from_chrono(start_of_day(Utc::now(), offset));
        match kind {
            FeedKind::Upcoming => daos.meetings.upcoming_for_mentor(user_id, today()),
            FeedKind::Past => daos.meetings.past_for_mentor(user_id, today()),
            FeedKind::MentorshipRequests => daos.mentorship_requests.pending_for_mentor(user_id),
            FeedKind::MeetingRequests => daos.meeting_requests.pending_for_mentor(user_id),
            FeedKind::Mentorships => daos.mentorships.recent_for_mentor(user_id, RECENT_MENTORSHIPS),
            FeedKind::Notifications => daos.notifications.feed_for(user_id, page_size),
        }
    }

    pub fn query(&self, kind: FeedKind, user_id: ObjectId) -> Query {
        Self::build_query(&self.daos, kind, user_id, self.offset, self.page_size)
    }

    /// Starts a live query. `T` must match the feed's collection: `Meeting`
    /// for the meeting feeds, `MentorshipRequest`, `MeetingRequest`,
    /// `Mentorship` or `Notification` for the others.
    pub fn subscribe<T>(&self, kind: FeedKind, user_id: ObjectId) -> Subscription<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        debug!(feed = kind.as_str(), ?user_id, "Starting feed subscription");
        let daos = self.daos.clone();
        let (offset, page_size) = (self.offset, self.page_size);
        subscription::spawn(
            self.daos.meetings.base.store().clone(),
            move || Self::build_query(&daos, kind, user_id, offset, page_size),
            self.channel_capacity,
        )
    }

    pub async fn upcoming_meetings(&self, user_id: ObjectId) -> DaoResult<Vec<Meeting>> {
        self.daos
            .meetings
            .base
            .find_many(&self.query(FeedKind::Upcoming, user_id))
            .await
    }

    pub async fn past_meetings(&self, user_id: ObjectId) -> DaoResult<Vec<Meeting>> {
        self.daos
            .meetings
            .base
            .find_many(&self.query(FeedKind::Past, user_id))
            .await
    }

    pub async fn pending_mentorship_requests(&self, user_id: ObjectId) -> DaoResult<Vec<MentorshipRequest>> {
        self.daos
            .mentorship_requests
            .base
            .find_many(&self.query(FeedKind::MentorshipRequests, user_id))
            .await
    }

    pub async fn pending_meeting_requests(&self, user_id: ObjectId) -> DaoResult<Vec<MeetingRequest>> {
        self.daos
            .meeting_requests
            .base
            .find_many(&self.query(FeedKind::MeetingRequests, user_id))
            .await
    }

    pub async fn recent_mentorships(&self, user_id: ObjectId) -> DaoResult<Vec<Mentorship>> {
        self.daos
            .mentorships
            .base
            .find_many(&self.query(FeedKind::Mentorships, user_id))
            .await
    }

    pub async fn notifications(&self, user_id: ObjectId) -> DaoResult<Vec<Notification>> {
        self.daos
            .notifications
            .base
            .find_many(&self.query(FeedKind::Notifications, user_id))
            .await
    }
}
