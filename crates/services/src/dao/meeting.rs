use std::sync::Arc;

use alumnet_db::models::{Meeting, MeetingRequest, MeetingRequestStatus, MeetingStatus};
use bson::{doc, oid::ObjectId, DateTime};

use super::base::{BaseDao, DaoResult};
use crate::store::{Query, RecordStore, SortOrder};

pub struct MeetingDao {
    pub base: BaseDao<Meeting>,
}

impl MeetingDao {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            base: BaseDao::new(store, Meeting::COLLECTION),
        }
    }

    /// Returns the new id without reading the meeting back.
    pub async fn create(&self, meeting: &Meeting) -> DaoResult<ObjectId> {
        self.base.insert_one(meeting).await
    }

    /// Meetings at or after `from`, soonest first.
    pub fn upcoming_for_mentor(&self, mentor_id: ObjectId, from: DateTime) -> Query {
        self.base
            .query()
            .eq("mentor_id", mentor_id)
            .gte("date_timestamp", from)
            .sort_asc("date_timestamp")
    }

    /// Meetings before `until`, most recent first.
    pub fn past_for_mentor(&self, mentor_id: ObjectId, until: DateTime) -> Query {
        self.base
            .query()
            .eq("mentor_id", mentor_id)
            .lt("date_timestamp", until)
            .sort_desc("date_timestamp")
    }

    /// The mentor's meetings by date, optionally from `since` on and in one
    /// status only.
    pub fn history_for_mentor(
        &self,
        mentor_id: ObjectId,
        since: Option<DateTime>,
        status: Option<MeetingStatus>,
        order: SortOrder,
    ) -> Query {
        let mut query = self.base.query().eq("mentor_id", mentor_id);
        if let Some(since) = since {
            query = query.gte("date_timestamp", since);
        }
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        match order {
            SortOrder::Ascending => query.sort_asc("date_timestamp"),
            SortOrder::Descending => query.sort_desc("date_timestamp"),
        }
    }

    pub async fn set_status(&self, id: ObjectId, status: MeetingStatus) -> DaoResult<bool> {
        self.base
            .update_by_id(id, doc! { "status": status.as_str() })
            .await
    }
}

pub struct MeetingRequestDao {
    pub base: BaseDao<MeetingRequest>,
}

impl MeetingRequestDao {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            base: BaseDao::new(store, MeetingRequest::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        mentor_id: ObjectId,
        student_id: ObjectId,
        student_name: String,
        topic: String,
        message: Option<String>,
        preferred_times: Vec<String>,
    ) -> DaoResult<MeetingRequest> {
        let request = MeetingRequest {
            id: None,
            mentor_id,
            student_id,
            student_name,
            topic,
            message,
            preferred_times,
            status: MeetingRequestStatus::Pending,
            request_timestamp: DateTime::now(),
            meeting_id: None,
            updated_at: None,
        };

        let id = self.base.insert_one(&request).await?;
        self.base.find_by_id(id).await
    }

    /// Newest first.
    pub fn pending_for_mentor(&self, mentor_id: ObjectId) -> Query {
        self.base
            .query()
            .eq("mentor_id", mentor_id)
            .eq("status", MeetingRequestStatus::Pending.as_str())
            .sort_desc("request_timestamp")
    }

    pub async fn set_status(
        &self,
        id: ObjectId,
        status: MeetingRequestStatus,
    ) -> DaoResult<bool> {
        self.base
            .update_by_id(id, doc! { "status": status.as_str() })
            .await
    }

    /// Marks the request accepted and links the meeting created for it.
    pub async fn stamp_accepted(&self, id: ObjectId, meeting_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(
                id,
                doc! {
                    "status": MeetingRequestStatus::Accepted.as_str(),
                    "meeting_id": meeting_id,
                },
            )
            .await
    }
}
