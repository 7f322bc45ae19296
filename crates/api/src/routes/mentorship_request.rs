use axum::{Json, extract::{Path, State}};
use alumnet_db::models::MentorshipRequest;
use serde::Serialize;

use super::parse_id;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState, ws::dispatcher};

#[derive(Debug, Serialize)]
pub struct MentorshipRequestResponse {
    pub id: String,
    pub mentor_id: String,
    pub student_id: String,
    pub request_type: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

pub fn to_response(request: MentorshipRequest) -> MentorshipRequestResponse {
    MentorshipRequestResponse {
        id: request.id.map(|id| id.to_hex()).unwrap_or_default(),
        mentor_id: request.mentor_id.to_hex(),
        student_id: request.student_id.to_hex(),
        request_type: request.request_type,
        message: request.message,
        status: request.status.to_string(),
        created_at: request.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

/// Pending requests addressed to the signed-in mentor, newest first.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<MentorshipRequestResponse>>, ApiError> {
    let requests = state.feeds.pending_mentorship_requests(auth.user_id).await?;
    Ok(Json(requests.into_iter().map(to_response).collect()))
}

pub async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = parse_id(&request_id, "request_id")?;

    let mentorship = state
        .lifecycle
        .accept_mentorship_request(&auth.session(), rid, None)
        .await?;

    let mentorship_id = mentorship.id.map(|id| id.to_hex()).unwrap_or_default();
    dispatcher::notify(
        &state.ws_storage,
        mentorship.student_id,
        "mentorship_request:accepted",
        serde_json::json!({
            "request_id": request_id,
            "mentorship_id": mentorship_id,
            "mentor_name": auth.display_name,
        }),
    )
    .await;

    Ok(Json(serde_json::json!({
        "message": "Mentorship request accepted",
        "mentorship_id": mentorship_id,
        "topic": mentorship.topic,
    })))
}

pub async fn decline(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = parse_id(&request_id, "request_id")?;

    let request = state
        .lifecycle
        .decline_mentorship_request(&auth.session(), rid, None)
        .await?;

    dispatcher::notify(
        &state.ws_storage,
        request.student_id,
        "mentorship_request:declined",
        serde_json::json!({
            "request_id": request_id,
            "mentor_name": auth.display_name,
        }),
    )
    .await;

    Ok(Json(serde_json::json!({
        "message": "Mentorship request declined",
        "request": to_response(request),
    })))
}
