use axum::{Json, extract::{Path, State}};
use alumnet_db::models::MeetingRequest;
use serde::Serialize;

use super::{meeting, parse_id};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState, ws::dispatcher};

#[derive(Debug, Serialize)]
pub struct MeetingRequestResponse {
    pub id: String,
    pub mentor_id: String,
    pub student_id: String,
    pub student_name: String,
    pub topic: String,
    pub message: Option<String>,
    pub preferred_times: Vec<String>,
    pub status: String,
    pub request_timestamp: String,
    pub meeting_id: Option<String>,
}

pub fn to_response(request: MeetingRequest) -> MeetingRequestResponse {
    MeetingRequestResponse {
        id: request.id.map(|id| id.to_hex()).unwrap_or_default(),
        mentor_id: request.mentor_id.to_hex(),
        student_id: request.student_id.to_hex(),
        student_name: request.student_name,
        topic: request.topic,
        message: request.message,
        preferred_times: request.preferred_times,
        status: request.status.to_string(),
        request_timestamp: request
            .request_timestamp
            .try_to_rfc3339_string()
            .unwrap_or_default(),
        meeting_id: request.meeting_id.map(|id| id.to_hex()),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<MeetingRequestResponse>>, ApiError> {
    let requests = state.feeds.pending_meeting_requests(auth.user_id).await?;
    Ok(Json(requests.into_iter().map(to_response).collect()))
}

/// Creates the meeting in the default slot and hands back the schedule form
/// so the mentor can adjust it.
pub async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = parse_id(&request_id, "request_id")?;

    let accepted = state
        .lifecycle
        .accept_meeting_request(&auth.session(), rid)
        .await?;

    let student_id = accepted.meeting.student_id;
    let meeting = meeting::to_response(accepted.meeting, state.lifecycle.offset());
    dispatcher::notify(
        &state.ws_storage,
        student_id,
        "meeting_request:accepted",
        serde_json::json!({
            "request_id": request_id,
            "meeting_id": meeting.id,
            "mentor_name": auth.display_name,
        }),
    )
    .await;

    Ok(Json(serde_json::json!({
        "message": "Meeting request accepted",
        "meeting": meeting,
        "form": accepted.form,
    })))
}

pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = parse_id(&request_id, "request_id")?;

    let request = state
        .lifecycle
        .reject_meeting_request(&auth.session(), rid)
        .await?;

    dispatcher::notify(
        &state.ws_storage,
        request.student_id,
        "meeting_request:rejected",
        serde_json::json!({
            "request_id": request_id,
            "mentor_name": auth.display_name,
        }),
    )
    .await;

    Ok(Json(serde_json::json!({
        "message": "Meeting request rejected",
        "request": to_response(request),
    })))
}
