use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::Response,
};
use alumnet_db::models::Meeting;
use alumnet_services::export::export_meetings;
use alumnet_services::lifecycle::MeetingForm;
use alumnet_services::tracker::{MeetingFilter, MeetingStats};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::parse_id;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState, ws::dispatcher};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub id: String,
    pub mentor_id: String,
    pub mentor_name: String,
    pub student_id: String,
    pub student_name: String,
    pub topic: String,
    pub date_timestamp: String,
    pub date_string: String,
    pub time_string: String,
    pub duration: String,
    pub platform: String,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub from_request_id: Option<String>,
    pub actual_duration_minutes: Option<u32>,
    pub rating: Option<u8>,
}

pub fn to_response(meeting: Meeting, offset: FixedOffset) -> MeetingResponse {
    MeetingResponse {
        id: meeting.id.map(|id| id.to_hex()).unwrap_or_default(),
        mentor_id: meeting.mentor_id.to_hex(),
        student_id: meeting.student_id.to_hex(),
        date_timestamp: meeting.date_timestamp.try_to_rfc3339_string().unwrap_or_default(),
        date_string: meeting.date_string(offset),
        time_string: meeting.time_string(offset),
        status: meeting.status.to_string(),
        from_request_id: meeting.from_request_id.map(|id| id.to_hex()),
        mentor_name: meeting.mentor_name,
        student_name: meeting.student_name,
        topic: meeting.topic,
        duration: meeting.duration,
        platform: meeting.platform,
        link: meeting.link,
        notes: meeting.notes,
        actual_duration_minutes: meeting.actual_duration_minutes,
        rating: meeting.rating,
    }
}

#[derive(Debug, Serialize)]
pub struct MeetingWithForm {
    pub meeting: MeetingResponse,
    pub form: MeetingForm,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteMeetingRequest {
    #[validate(range(min = 1, max = 1440))]
    pub actual_duration_minutes: u32,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,
}

pub async fn upcoming(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<MeetingResponse>>, ApiError> {
    let offset = state.lifecycle.offset();
    let meetings = state.feeds.upcoming_meetings(auth.user_id).await?;
    Ok(Json(meetings.into_iter().map(|m| to_response(m, offset)).collect()))
}

pub async fn past(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<MeetingResponse>>, ApiError> {
    let offset = state.lifecycle.offset();
    let meetings = state.feeds.past_meetings(auth.user_id).await?;
    Ok(Json(meetings.into_iter().map(|m| to_response(m, offset)).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<MeetingWithForm>, ApiError> {
    let mid = parse_id(&meeting_id, "meeting_id")?;
    let (meeting, form) = state.lifecycle.meeting_form(mid).await?;
    Ok(Json(MeetingWithForm {
        meeting: to_response(meeting, state.lifecycle.offset()),
        form,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(form): Json<MeetingForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let meeting = state
        .lifecycle
        .schedule_meeting(&auth.session(), &form, None)
        .await?;

    Ok(Json(announce(&state, meeting, "meeting:scheduled", "Meeting scheduled").await))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
    Json(form): Json<MeetingForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_id(&meeting_id, "meeting_id")?;
    let meeting = state
        .lifecycle
        .schedule_meeting(&auth.session(), &form, Some(mid))
        .await?;

    Ok(Json(announce(&state, meeting, "meeting:updated", "Meeting updated").await))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_id(&meeting_id, "meeting_id")?;
    let meeting = state.lifecycle.cancel_meeting(&auth.session(), mid).await?;

    Ok(Json(announce(&state, meeting, "meeting:cancelled", "Meeting cancelled").await))
}

pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
    Json(body): Json<CompleteMeetingRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()?;
    let mid = parse_id(&meeting_id, "meeting_id")?;
    let meeting = state
        .lifecycle
        .complete_meeting(&auth.session(), mid, body.actual_duration_minutes, body.rating)
        .await?;

    Ok(Json(announce(&state, meeting, "meeting:completed", "Meeting completed").await))
}

/// `?period=week|month|all&status=Completed&order=asc|desc`, all optional.
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<MeetingFilter>,
) -> Result<Json<MeetingStats>, ApiError> {
    Ok(Json(state.tracker.stats(auth.user_id, &filter).await?))
}

/// The mentor's meeting history as a spreadsheet, narrowed like `stats`.
pub async fn export(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<MeetingFilter>,
) -> Result<Response, ApiError> {
    let meetings = state.tracker.filtered(auth.user_id, &filter).await?;
    let bytes = export_meetings(&meetings, state.lifecycle.offset())
        .map_err(|e| ApiError::Internal(format!("Failed to build export: {}", e)))?;

    Response::builder()
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"meetings.xlsx\"",
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// Pushes the change to the student's open connections and builds the
/// mutation response.
async fn announce(state: &AppState, meeting: Meeting, event: &str, message: &str) -> serde_json::Value {
    let student_id = meeting.student_id;
    let response = to_response(meeting, state.lifecycle.offset());
    let data = serde_json::to_value(&response).unwrap_or_default();

    dispatcher::notify(&state.ws_storage, student_id, event, data.clone()).await;

    serde_json::json!({
        "message": message,
        "meeting": data,
    })
}
