use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use alumnet_db::models::{Meeting, MeetingRequest, Mentorship, MentorshipRequest, Notification};
use alumnet_services::{FeedKind, Session, feed::Subscription};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{dispatcher, storage::WsSender};
use crate::routes::{meeting, meeting_request, mentorship, mentorship_request, notification};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { feed: FeedKind },
    Unsubscribe { feed: FeedKind },
    Ping,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Verify JWT before accepting the WebSocket
    let session = match state.auth.session_from_token(&params.token) {
        Ok(s) => s,
        Err(_) => return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
}

async fn handle_socket(socket: WebSocket, state: AppState, session: Session) {
    let user_id = session.user_id;
    let connection_id = Uuid::new_v4().to_string();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (sender, mut receiver) = socket.split();
    let sender: WsSender = Arc::new(Mutex::new(sender));

    state.ws_storage.add(user_id, connection_id.clone(), sender.clone());

    let connected = serde_json::json!({
        "type": "connected",
        "data": {
            "user_id": user_id.to_hex(),
            "connection_id": connection_id,
        }
    });
    let _ = dispatcher::send_to(&sender, &connected).await;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &session, &connection_id, &sender, &text).await;
            }
            Ok(Message::Ping(data)) => {
                let mut guard = sender.lock().await;
                let _ = guard.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(?user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Also stops this connection's feed forwarders
    state.ws_storage.remove(&user_id, &connection_id);

    info!(?user_id, %connection_id, "WebSocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    session: &Session,
    connection_id: &str,
    sender: &WsSender,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            debug!(user_id = ?session.user_id, %e, "Unrecognized WS message");
            let error = serde_json::json!({
                "type": "error",
                "data": { "message": "Unrecognized message" },
            });
            let _ = dispatcher::send_to(sender, &error).await;
            return;
        }
    };

    match message {
        ClientMessage::Ping => {
            let _ = dispatcher::send_to(sender, &serde_json::json!({ "type": "pong" })).await;
        }
        ClientMessage::Subscribe { feed } => {
            let handle = spawn_forwarder(state, session, feed, sender.clone());
            state.ws_storage.set_feed(connection_id, feed, handle);
            debug!(
                user_id = ?session.user_id,
                %connection_id,
                feed = feed.as_str(),
                active = state.ws_storage.feed_count(connection_id),
                "Feed subscribed"
            );
        }
        ClientMessage::Unsubscribe { feed } => {
            let dropped = state.ws_storage.drop_feed(connection_id, feed);
            debug!(user_id = ?session.user_id, %connection_id, feed = feed.as_str(), dropped, "Feed unsubscribed");
            let ack = serde_json::json!({
                "type": "feed:unsubscribed",
                "data": { "feed": feed },
            });
            let _ = dispatcher::send_to(sender, &ack).await;
        }
    }
}

fn spawn_forwarder(state: &AppState, session: &Session, feed: FeedKind, sender: WsSender) -> JoinHandle<()> {
    let user_id = session.user_id;
    let offset = state.lifecycle.offset();
    let feeds = &state.feeds;

    match feed {
        FeedKind::Upcoming | FeedKind::Past => {
            let sub = feeds.subscribe::<Meeting>(feed, user_id);
            tokio::spawn(forward(sub, feed, sender, move |m| meeting::to_response(m, offset)))
        }
        FeedKind::MentorshipRequests => {
            let sub = feeds.subscribe::<MentorshipRequest>(feed, user_id);
            tokio::spawn(forward(sub, feed, sender, mentorship_request::to_response))
        }
        FeedKind::MeetingRequests => {
            let sub = feeds.subscribe::<MeetingRequest>(feed, user_id);
            tokio::spawn(forward(sub, feed, sender, meeting_request::to_response))
        }
        FeedKind::Mentorships => {
            let sub = feeds.subscribe::<Mentorship>(feed, user_id);
            tokio::spawn(forward(sub, feed, sender, mentorship::to_response))
        }
        FeedKind::Notifications => {
            let sub = feeds.subscribe::<Notification>(feed, user_id);
            tokio::spawn(forward(sub, feed, sender, notification::to_response))
        }
    }
}

/// Relays snapshots to the socket until the connection goes away. The
/// subscription is dropped (and its live query stopped) when this returns or
/// is aborted.
async fn forward<T, V, F>(mut sub: Subscription<T>, feed: FeedKind, sender: WsSender, render: F)
where
    V: Serialize,
    F: Fn(T) -> V,
{
    while let Some(snapshot) = sub.next().await {
        let items: Vec<V> = snapshot.items.into_iter().map(&render).collect();
        let changes: Vec<serde_json::Value> = snapshot
            .changes
            .iter()
            .map(|c| serde_json::json!({ "id": c.id.to_hex(), "kind": c.kind }))
            .collect();

        let message = serde_json::json!({
            "type": "feed:snapshot",
            "data": {
                "feed": feed,
                "items": items,
                "changes": changes,
            }
        });

        if let Err(e) = dispatcher::send_to(&sender, &message).await {
            debug!(feed = feed.as_str(), %e, "Feed forwarder stopped");
            break;
        }
    }
}
