use axum::{Json, extract::State};
use alumnet_db::models::Notification;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub content: String,
    pub notification_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub timestamp: String,
    pub read: bool,
}

pub fn to_response(notification: Notification) -> NotificationResponse {
    let read = notification.is_read();
    NotificationResponse {
        id: notification.id.map(|id| id.to_hex()).unwrap_or_default(),
        content: notification.content,
        notification_type: serde_json::to_value(notification.notification_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
        entity_type: notification.source.entity_type,
        entity_id: notification.source.entity_id.to_hex(),
        timestamp: notification.timestamp.try_to_rfc3339_string().unwrap_or_default(),
        read,
    }
}

/// Omitting `ids` marks every unread notification of the caller.
#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Option<Vec<String>>,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let notifications = state.feeds.notifications(auth.user_id).await?;
    let unread = notifications.iter().filter(|n| !n.is_read()).count();
    let items: Vec<NotificationResponse> = notifications.into_iter().map(to_response).collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "unread": unread,
    })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ids = body
        .ids
        .map(|ids| {
            ids.iter()
                .map(|id| parse_id(id, "notification id"))
                .collect::<Result<Vec<ObjectId>, _>>()
        })
        .transpose()?;

    let marked = state
        .lifecycle
        .mark_notifications_read(&auth.session(), ids.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Notifications marked as read",
        "marked": marked,
    })))
}
