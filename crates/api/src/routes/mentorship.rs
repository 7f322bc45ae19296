use axum::{Json, extract::State};
use alumnet_db::models::Mentorship;
use alumnet_services::tracker::MentorshipCounts;
use serde::Serialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct MentorshipResponse {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub topic: String,
    pub status: String,
    pub from_request_id: Option<String>,
    pub updated_at: String,
}

pub fn to_response(mentorship: Mentorship) -> MentorshipResponse {
    MentorshipResponse {
        id: mentorship.id.map(|id| id.to_hex()).unwrap_or_default(),
        student_id: mentorship.student_id.to_hex(),
        status: mentorship.status.to_string(),
        from_request_id: mentorship.from_request_id.map(|id| id.to_hex()),
        updated_at: mentorship.updated_at.try_to_rfc3339_string().unwrap_or_default(),
        student_name: mentorship.student_name,
        topic: mentorship.topic,
    }
}

#[derive(Debug, Serialize)]
pub struct MentorshipActivity {
    pub items: Vec<MentorshipResponse>,
    pub counts: MentorshipCounts,
}

/// Recent mentorship activity for the dashboard, plus totals over every
/// mentorship of the mentor.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MentorshipActivity>, ApiError> {
    let recent = state.feeds.recent_mentorships(auth.user_id).await?;
    let counts = state.tracker.mentorship_counts(auth.user_id).await?;

    Ok(Json(MentorshipActivity {
        items: recent.into_iter().map(to_response).collect(),
        counts,
    }))
}
