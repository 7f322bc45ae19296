use std::sync::Arc;

use alumnet_db::models::{Mentorship, MentorshipRequest, MentorshipRequestStatus, MentorshipStatus};
use bson::{doc, oid::ObjectId, DateTime};

use super::base::{BaseDao, DaoResult};
use crate::store::{Query, RecordStore};

pub struct MentorshipRequestDao {
    pub base: BaseDao<MentorshipRequest>,
}

impl MentorshipRequestDao {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            base: BaseDao::new(store, MentorshipRequest::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        mentor_id: ObjectId,
        student_id: ObjectId,
        request_type: String,
        message: Option<String>,
    ) -> DaoResult<MentorshipRequest> {
        let now = DateTime::now();
        let request = MentorshipRequest {
            id: None,
            mentor_id,
            student_id,
            request_type,
            message,
            status: MentorshipRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&request).await?;
        self.base.find_by_id(id).await
    }

    /// Newest first.
    pub fn pending_for_mentor(&self, mentor_id: ObjectId) -> Query {
        self.base
            .query()
            .eq("mentor_id", mentor_id)
            .eq("status", MentorshipRequestStatus::Pending.as_str())
            .sort_desc("created_at")
    }

    pub async fn set_status(
        &self,
        id: ObjectId,
        status: MentorshipRequestStatus,
    ) -> DaoResult<bool> {
        self.base
            .update_by_id(id, doc! { "status": status.as_str() })
            .await
    }
}

pub struct MentorshipDao {
    pub base: BaseDao<Mentorship>,
}

impl MentorshipDao {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            base: BaseDao::new(store, Mentorship::COLLECTION),
        }
    }

    /// Inserts without reading back, so the caller holds the id as soon as
    /// the write lands.
    pub async fn create(&self, mentorship: &Mentorship) -> DaoResult<ObjectId> {
        self.base.insert_one(mentorship).await
    }

    /// The mentor's most recently touched mentorships.
    pub fn recent_for_mentor(&self, mentor_id: ObjectId, limit: i64) -> Query {
        self.base
            .query()
            .eq("mentor_id", mentor_id)
            .sort_desc("updated_at")
            .limit(limit)
    }

    pub async fn count_for_mentor(
        &self,
        mentor_id: ObjectId,
        status: MentorshipStatus,
    ) -> DaoResult<u64> {
        let query = self
            .base
            .query()
            .eq("mentor_id", mentor_id)
            .eq("status", status.as_str());
        self.base.count(&query).await
    }

    pub async fn for_pair(
        &self,
        mentor_id: ObjectId,
        student_id: ObjectId,
    ) -> DaoResult<Vec<Mentorship>> {
        let query = self
            .base
            .query()
            .eq("mentor_id", mentor_id)
            .eq("student_id", student_id)
            .sort_asc("created_at");
        self.base.find_many(&query).await
    }
}
