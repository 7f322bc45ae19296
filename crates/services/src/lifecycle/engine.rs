use std::fmt::Display;
use std::sync::Arc;

use alumnet_config::LifecycleSettings;
use alumnet_db::models::{
    Meeting, MeetingRequest, MeetingRequestStatus, MeetingStatus, Mentorship, MentorshipRequest,
    MentorshipRequestStatus, MentorshipStatus, NotificationSource, NotificationType,
};
use bson::{doc, oid::ObjectId, DateTime, Document};
use chrono::{FixedOffset, Utc};
use serde::Serialize;
use tracing::info;

use super::error::{LifecycleError, LifecycleResult};
use super::saga::Saga;
use super::schedule::{default_slot, utc_offset, MeetingForm, ValidForm};
use crate::dao::{DaoResult, Daos, MentorshipRequestDao};
use crate::session::Session;

/// Result of accepting a meeting request: the meeting placed in the default
/// slot, plus the form the mentor can adjust and submit as an edit.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedMeetingRequest {
    pub meeting: Meeting,
    pub form: MeetingForm,
}

/// Drives mentorship requests, meetings and meeting requests through their
/// state machines and notifies the student about the outcome.
///
/// Transitions check the record's current status when
/// `enforce_transitions` is on; a mismatch is reported as `StaleState`
/// instead of being applied twice.
pub struct LifecycleEngine {
    daos: Arc<Daos>,
    settings: LifecycleSettings,
}

fn check_status<S>(entity: &'static str, id: ObjectId, expected: Option<S>, actual: S) -> LifecycleResult<()>
where
    S: PartialEq + Display,
{
    match expected {
        Some(expected) if expected != actual => Err(LifecycleError::StaleState {
            entity,
            id,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

async fn restore_mentorship_request(
    dao: &MentorshipRequestDao,
    id: ObjectId,
    status: MentorshipRequestStatus,
    updated_at: DateTime,
) -> DaoResult<()> {
    dao.base
        .set_fields_by_id(id, doc! { "status": status.as_str(), "updated_at": updated_at })
        .await
        .map(|_| ())
}

fn meeting_fields(form: &ValidForm, student_name: &str) -> Document {
    doc! {
        "student_id": form.student_id,
        "student_name": student_name,
        "topic": &form.topic,
        "date_timestamp": DateTime::from_chrono(form.date_timestamp),
        "duration": &form.duration,
        "platform": &form.platform,
        "link": form.link.clone(),
        "notes": form.notes.clone(),
        "status": MeetingStatus::Scheduled.as_str(),
    }
}

fn previous_meeting_fields(meeting: &Meeting) -> Document {
    doc! {
        "student_id": meeting.student_id,
        "student_name": &meeting.student_name,
        "topic": &meeting.topic,
        "date_timestamp": meeting.date_timestamp,
        "duration": &meeting.duration,
        "platform": &meeting.platform,
        "link": meeting.link.clone(),
        "notes": meeting.notes.clone(),
        "status": meeting.status.as_str(),
        "updated_at": meeting.updated_at,
    }
}

impl LifecycleEngine {
    pub fn new(daos: Arc<Daos>, settings: LifecycleSettings) -> Self {
        Self { daos, settings }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub fn daos(&self) -> &Arc<Daos> {
        &self.daos
    }

    pub fn offset(&self) -> FixedOffset {
        utc_offset(self.settings.utc_offset_minutes)
    }

    fn guard<S>(&self, status: S) -> Option<S> {
        self.settings.enforce_transitions.then_some(status)
    }

    fn source(entity_type: &str, entity_id: ObjectId, session: &Session) -> NotificationSource {
        NotificationSource {
            entity_type: entity_type.to_string(),
            entity_id,
            actor_id: Some(session.user_id),
        }
    }

    /// Accepts a pending mentorship request: marks it accepted, opens an
    /// active mentorship and notifies the student. `student_id` defaults to
    /// the request's student.
    pub async fn accept_mentorship_request(
        &self,
        session: &Session,
        request_id: ObjectId,
        student_id: Option<ObjectId>,
    ) -> LifecycleResult<Mentorship> {
        let requests = &self.daos.mentorship_requests;
        let request = requests
            .base
            .find_by_id(request_id)
            .await
            .map_err(LifecycleError::lookup("mentorship request"))?;
        check_status(
            "mentorship request",
            request_id,
            self.guard(MentorshipRequestStatus::Pending),
            request.status,
        )?;
        let student_id = student_id.unwrap_or(request.student_id);
        let student_name = self
            .daos
            .users
            .base
            .get(student_id)
            .await?
            .map(|student| student.display_name)
            .unwrap_or_default();

        let mut saga = Saga::new("accept_mentorship_request");
        saga.run(
            "update_request",
            requests.set_status(request_id, MentorshipRequestStatus::Accepted),
        )
        .await?;
        saga.on_rollback(
            "update_request",
            restore_mentorship_request(requests, request_id, request.status, request.updated_at),
        );

        let now = DateTime::now();
        let mentorship = Mentorship {
            id: None,
            mentor_id: session.user_id,
            student_id,
            student_name,
            topic: request.request_type.clone(),
            status: MentorshipStatus::Active,
            from_request_id: Some(request_id),
            created_at: now,
            updated_at: now,
        };
        let mentorships = &self.daos.mentorships;
        let mentorship_id = saga
            .run("insert_mentorship", mentorships.create(&mentorship))
            .await?;
        saga.on_rollback("insert_mentorship", async move {
            mentorships.base.delete_by_id(mentorship_id).await.map(|_| ())
        });

        saga.run(
            "notify_student",
            self.daos.notifications.create(
                student_id,
                format!("{} accepted your mentorship request", session.display_name),
                NotificationType::MentorshipAccepted,
                Self::source("mentorship_request", request_id, session),
            ),
        )
        .await?;

        info!(?request_id, mentor_id = ?session.user_id, ?student_id, "Mentorship request accepted");
        Ok(Mentorship {
            id: Some(mentorship_id),
            ..mentorship
        })
    }

    /// Declines a pending request and notifies the student. The returned
    /// request carries the new status; other fields are as they were read.
    pub async fn decline_mentorship_request(
        &self,
        session: &Session,
        request_id: ObjectId,
        student_id: Option<ObjectId>,
    ) -> LifecycleResult<MentorshipRequest> {
        let requests = &self.daos.mentorship_requests;
        let request = requests
            .base
            .find_by_id(request_id)
            .await
            .map_err(LifecycleError::lookup("mentorship request"))?;
        check_status(
            "mentorship request",
            request_id,
            self.guard(MentorshipRequestStatus::Pending),
            request.status,
        )?;
        let student_id = student_id.unwrap_or(request.student_id);

        let mut saga = Saga::new("decline_mentorship_request");
        saga.run(
            "update_request",
            requests.set_status(request_id, MentorshipRequestStatus::Declined),
        )
        .await?;
        saga.on_rollback(
            "update_request",
            restore_mentorship_request(requests, request_id, request.status, request.updated_at),
        );

        saga.run(
            "notify_student",
            self.daos.notifications.create(
                student_id,
                format!("{} declined your mentorship request", session.display_name),
                NotificationType::MentorshipDeclined,
                Self::source("mentorship_request", request_id, session),
            ),
        )
        .await?;

        info!(?request_id, mentor_id = ?session.user_id, "Mentorship request declined");
        Ok(MentorshipRequest {
            status: MentorshipRequestStatus::Declined,
            ..request
        })
    }

    /// Creates a meeting, or rewrites meeting `editing_id` from the form.
    pub async fn schedule_meeting(
        &self,
        session: &Session,
        form: &MeetingForm,
        editing_id: Option<ObjectId>,
    ) -> LifecycleResult<Meeting> {
        let valid = form.validate(
            self.offset(),
            &self.settings.default_meeting_duration,
            &self.settings.default_meeting_platform,
        )?;

        let student_name = match valid.student_name.clone() {
            Some(name) => name,
            None => {
                self.daos
                    .users
                    .base
                    .find_by_id(valid.student_id)
                    .await
                    .map_err(LifecycleError::lookup("student"))?
                    .display_name
            }
        };

        match editing_id {
            Some(meeting_id) => self.update_meeting(session, meeting_id, &valid, &student_name).await,
            None => self.create_meeting(session, &valid, student_name).await,
        }
    }

    async fn create_meeting(
        &self,
        session: &Session,
        form: &ValidForm,
        student_name: String,
    ) -> LifecycleResult<Meeting> {
        let meetings = &self.daos.meetings;
        let now = DateTime::now();
        let meeting = Meeting {
            id: None,
            mentor_id: session.user_id,
            mentor_name: session.display_name.clone(),
            student_id: form.student_id,
            student_name,
            topic: form.topic.clone(),
            date_timestamp: DateTime::from_chrono(form.date_timestamp),
            duration: form.duration.clone(),
            platform: form.platform.clone(),
            link: form.link.clone(),
            notes: form.notes.clone(),
            status: MeetingStatus::Scheduled,
            from_request_id: None,
            actual_duration_minutes: None,
            rating: None,
            created_at: now,
            updated_at: now,
        };

        let mut saga = Saga::new("schedule_meeting");
        let meeting_id = saga.run("insert_meeting", meetings.create(&meeting)).await?;
        saga.on_rollback("insert_meeting", async move {
            meetings.base.delete_by_id(meeting_id).await.map(|_| ())
        });

        if self.settings.notify_on_schedule {
            saga.run(
                "notify_student",
                self.daos.notifications.create(
                    meeting.student_id,
                    format!(
                        "{} scheduled a meeting with you: {}",
                        session.display_name, meeting.topic
                    ),
                    NotificationType::MeetingScheduled,
                    Self::source("meeting", meeting_id, session),
                ),
            )
            .await?;
        }

        let created = Meeting {
            id: Some(meeting_id),
            ..meeting
        };
        info!(meeting_id = ?created.id, mentor_id = ?session.user_id, "Meeting scheduled");
        Ok(created)
    }

    async fn update_meeting(
        &self,
        session: &Session,
        meeting_id: ObjectId,
        form: &ValidForm,
        student_name: &str,
    ) -> LifecycleResult<Meeting> {
        let meetings = &self.daos.meetings;
        let existing = meetings
            .base
            .find_by_id(meeting_id)
            .await
            .map_err(LifecycleError::lookup("meeting"))?;
        check_status(
            "meeting",
            meeting_id,
            self.guard(MeetingStatus::Scheduled),
            existing.status,
        )?;

        let mut saga = Saga::new("edit_meeting");
        saga.run(
            "update_meeting",
            meetings.base.update_by_id(meeting_id, meeting_fields(form, student_name)),
        )
        .await?;

        if self.settings.notify_on_schedule {
            let previous = previous_meeting_fields(&existing);
            saga.on_rollback("update_meeting", async move {
                meetings.base.set_fields_by_id(meeting_id, previous).await.map(|_| ())
            });
            saga.run(
                "notify_student",
                self.daos.notifications.create(
                    form.student_id,
                    format!("{} updated your meeting: {}", session.display_name, form.topic),
                    NotificationType::MeetingUpdated,
                    Self::source("meeting", meeting_id, session),
                ),
            )
            .await?;
        }

        info!(?meeting_id, mentor_id = ?session.user_id, "Meeting updated");
        meetings
            .base
            .find_by_id(meeting_id)
            .await
            .map_err(LifecycleError::lookup("meeting"))
    }

    /// Loads a meeting together with its edit form.
    pub async fn meeting_form(&self, meeting_id: ObjectId) -> LifecycleResult<(Meeting, MeetingForm)> {
        let meeting = self
            .daos
            .meetings
            .base
            .find_by_id(meeting_id)
            .await
            .map_err(LifecycleError::lookup("meeting"))?;
        let form = MeetingForm::from_meeting(&meeting, self.offset());
        Ok((meeting, form))
    }

    /// Only the status and `updated_at` change.
    pub async fn cancel_meeting(&self, session: &Session, meeting_id: ObjectId) -> LifecycleResult<Meeting> {
        let meetings = &self.daos.meetings;
        let meeting = meetings
            .base
            .find_by_id(meeting_id)
            .await
            .map_err(LifecycleError::lookup("meeting"))?;
        check_status(
            "meeting",
            meeting_id,
            self.guard(MeetingStatus::Scheduled),
            meeting.status,
        )?;

        let mut saga = Saga::new("cancel_meeting");
        saga.run(
            "update_meeting",
            meetings.set_status(meeting_id, MeetingStatus::Cancelled),
        )
        .await?;

        if self.settings.notify_on_cancel {
            let (status, updated_at) = (meeting.status, meeting.updated_at);
            saga.on_rollback("update_meeting", async move {
                meetings
                    .base
                    .set_fields_by_id(
                        meeting_id,
                        doc! { "status": status.as_str(), "updated_at": updated_at },
                    )
                    .await
                    .map(|_| ())
            });
            saga.run(
                "notify_student",
                self.daos.notifications.create(
                    meeting.student_id,
                    format!("{} cancelled your meeting: {}", session.display_name, meeting.topic),
                    NotificationType::MeetingCancelled,
                    Self::source("meeting", meeting_id, session),
                ),
            )
            .await?;
        }

        info!(?meeting_id, mentor_id = ?session.user_id, "Meeting cancelled");
        meetings
            .base
            .find_by_id(meeting_id)
            .await
            .map_err(LifecycleError::lookup("meeting"))
    }

    /// Places the requested meeting tomorrow at the default time and links
    /// it back to the request. The student's preferred times are not
    /// consulted.
    pub async fn accept_meeting_request(
        &self,
        session: &Session,
        request_id: ObjectId,
    ) -> LifecycleResult<AcceptedMeetingRequest> {
        let requests = &self.daos.meeting_requests;
        let meetings = &self.daos.meetings;
        let request: MeetingRequest = requests
            .base
            .find_by_id(request_id)
            .await
            .map_err(LifecycleError::lookup("meeting request"))?;
        check_status(
            "meeting request",
            request_id,
            self.guard(MeetingRequestStatus::Pending),
            request.status,
        )?;

        let slot = default_slot(Utc::now(), self.offset(), &self.settings.default_meeting_time)?;
        let now = DateTime::now();
        let meeting = Meeting {
            id: None,
            mentor_id: session.user_id,
            mentor_name: session.display_name.clone(),
            student_id: request.student_id,
            student_name: request.student_name.clone(),
            topic: request.topic.clone(),
            date_timestamp: DateTime::from_chrono(slot),
            duration: self.settings.default_meeting_duration.clone(),
            platform: self.settings.default_meeting_platform.clone(),
            link: None,
            notes: request.message.clone(),
            status: MeetingStatus::Scheduled,
            from_request_id: Some(request_id),
            actual_duration_minutes: None,
            rating: None,
            created_at: now,
            updated_at: now,
        };

        let mut saga = Saga::new("accept_meeting_request");
        let meeting_id = saga.run("insert_meeting", meetings.create(&meeting)).await?;
        saga.on_rollback("insert_meeting", async move {
            meetings.base.delete_by_id(meeting_id).await.map(|_| ())
        });

        saga.run("stamp_request", requests.stamp_accepted(request_id, meeting_id))
            .await?;

        info!(?request_id, ?meeting_id, mentor_id = ?session.user_id, "Meeting request accepted");
        let created = Meeting {
            id: Some(meeting_id),
            ..meeting
        };
        let form = MeetingForm::from_meeting(&created, self.offset());
        Ok(AcceptedMeetingRequest {
            meeting: created,
            form,
        })
    }

    pub async fn reject_meeting_request(
        &self,
        session: &Session,
        request_id: ObjectId,
    ) -> LifecycleResult<MeetingRequest> {
        let requests = &self.daos.meeting_requests;
        let request = requests
            .base
            .find_by_id(request_id)
            .await
            .map_err(LifecycleError::lookup("meeting request"))?;
        check_status(
            "meeting request",
            request_id,
            self.guard(MeetingRequestStatus::Pending),
            request.status,
        )?;

        requests
            .set_status(request_id, MeetingRequestStatus::Rejected)
            .await?;

        info!(?request_id, mentor_id = ?session.user_id, "Meeting request rejected");
        requests
            .base
            .find_by_id(request_id)
            .await
            .map_err(LifecycleError::lookup("meeting request"))
    }

    /// Records how long the session actually ran and, optionally, its 1-5
    /// rating.
    pub async fn complete_meeting(
        &self,
        session: &Session,
        meeting_id: ObjectId,
        actual_duration_minutes: u32,
        rating: Option<u8>,
    ) -> LifecycleResult<Meeting> {
        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                return Err(LifecycleError::Validation(format!(
                    "Rating must be between 1 and 5, got {}",
                    rating
                )));
            }
        }

        let meetings = &self.daos.meetings;
        let meeting = meetings
            .base
            .find_by_id(meeting_id)
            .await
            .map_err(LifecycleError::lookup("meeting"))?;
        check_status(
            "meeting",
            meeting_id,
            self.guard(MeetingStatus::Scheduled),
            meeting.status,
        )?;

        meetings
            .base
            .update_by_id(
                meeting_id,
                doc! {
                    "status": MeetingStatus::Completed.as_str(),
                    "actual_duration_minutes": actual_duration_minutes as i64,
                    "rating": rating.map(|r| r as i32),
                },
            )
            .await?;

        info!(?meeting_id, mentor_id = ?session.user_id, actual_duration_minutes, "Meeting completed");
        meetings
            .base
            .find_by_id(meeting_id)
            .await
            .map_err(LifecycleError::lookup("meeting"))
    }

    /// Marks the given notifications, or all unread ones, as read for the
    /// session user. Returns how many changed.
    pub async fn mark_notifications_read(
        &self,
        session: &Session,
        ids: Option<&[ObjectId]>,
    ) -> LifecycleResult<u64> {
        let notifications = &self.daos.notifications;
        let marked = match ids {
            Some(ids) => notifications.mark_read(session.user_id, ids).await?,
            None => notifications.mark_all_read(session.user_id).await?,
        };
        info!(user_id = ?session.user_id, marked, "Notifications marked read");
        Ok(marked)
    }
}
