use crate::fixtures::{seed::form_date, test_app::TestApp};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(app: &TestApp, token: &str) -> Ws {
    let (mut ws, _) = connect_async(app.ws_url(token)).await.expect("WS connect failed");
    let hello = next_json(&mut ws).await;
    assert_eq!(hello["type"], "connected");
    ws
}

async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

/// Next text frame as JSON; panics after two seconds.
async fn next_json(ws: &mut Ws) -> Value {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let msg = ws.next().await.expect("WS closed").expect("WS error");
            if let Message::Text(text) = msg {
                return serde_json::from_str::<Value>(text.as_str()).unwrap();
            }
        }
    })
    .await
    .expect("No WS message in time")
}

/// True when nothing but control frames arrive for `wait`.
async fn stays_quiet(ws: &mut Ws, wait: Duration) -> bool {
    tokio::time::timeout(wait, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(_))) => return,
                Some(Ok(_)) => continue,
                _ => return,
            }
        }
    })
    .await
    .is_err()
}

#[tokio::test]
async fn rejects_bad_token() {
    let app = TestApp::spawn().await;
    let result = connect_async(app.ws_url("not-a-token")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn ping_pong() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let mut ws = connect(&app, &pair.mentor.access_token).await;

    send_json(&mut ws, serde_json::json!({ "type": "ping" })).await;
    assert_eq!(next_json(&mut ws).await["type"], "pong");

    send_json(&mut ws, serde_json::json!({ "type": "dance" })).await;
    assert_eq!(next_json(&mut ws).await["type"], "error");
}

#[tokio::test]
async fn upcoming_feed_pushes_new_meetings() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    app.schedule_meeting(&pair, "Later", &form_date(4), "10:00").await;

    let mut ws = connect(&app, &pair.mentor.access_token).await;
    send_json(
        &mut ws,
        serde_json::json!({ "type": "subscribe", "data": { "feed": "upcoming" } }),
    )
    .await;

    let first = next_json(&mut ws).await;
    assert_eq!(first["type"], "feed:snapshot");
    assert_eq!(first["data"]["feed"], "upcoming");
    assert_eq!(first["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(first["data"]["changes"][0]["kind"], "added");

    let added = app.schedule_meeting(&pair, "Sooner", &form_date(1), "10:00").await;

    let second = next_json(&mut ws).await;
    let topics: Vec<&str> = second["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["topic"].as_str().unwrap())
        .collect();
    assert_eq!(topics, vec!["Sooner", "Later"]);
    let changes = second["data"]["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["id"], added["id"]);
    assert_eq!(changes[0]["kind"], "added");
}

#[tokio::test]
async fn unsubscribe_stops_snapshots() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let mut ws = connect(&app, &pair.mentor.access_token).await;

    send_json(
        &mut ws,
        serde_json::json!({ "type": "subscribe", "data": { "feed": "mentorship_requests" } }),
    )
    .await;
    let first = next_json(&mut ws).await;
    assert_eq!(first["data"]["feed"], "mentorship_requests");

    app.seed_mentorship_request(&pair, "Career Advice").await;
    let second = next_json(&mut ws).await;
    assert_eq!(second["data"]["items"][0]["request_type"], "Career Advice");

    send_json(
        &mut ws,
        serde_json::json!({ "type": "unsubscribe", "data": { "feed": "mentorship_requests" } }),
    )
    .await;
    assert_eq!(next_json(&mut ws).await["type"], "feed:unsubscribed");

    app.seed_mentorship_request(&pair, "Resume Review").await;
    assert!(stays_quiet(&mut ws, Duration::from_millis(300)).await);
}

#[tokio::test]
async fn student_hears_about_accepted_request() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;
    let mut student_ws = connect(&app, &pair.student.access_token).await;

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/accept", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let event = next_json(&mut student_ws).await;
    assert_eq!(event["type"], "mentorship_request:accepted");
    assert_eq!(event["data"]["request_id"], request_id.as_str());
    assert_eq!(event["data"]["mentor_name"], "Dana Alumna");
}

#[tokio::test]
async fn student_hears_about_declined_request() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;
    let mut student_ws = connect(&app, &pair.student.access_token).await;

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/decline", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let event = next_json(&mut student_ws).await;
    assert_eq!(event["type"], "mentorship_request:declined");
    assert_eq!(event["data"]["request_id"], request_id.as_str());
}

#[tokio::test]
async fn notification_feed_follows_reads() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;
    app.auth_post(
        &format!("/api/mentorship-request/{}/decline", request_id),
        &pair.mentor.access_token,
    )
    .send()
    .await
    .unwrap();

    let mut ws = connect(&app, &pair.student.access_token).await;
    send_json(
        &mut ws,
        serde_json::json!({ "type": "subscribe", "data": { "feed": "notifications" } }),
    )
    .await;
    let first = next_json(&mut ws).await;
    assert_eq!(first["data"]["items"][0]["read"], false);

    app.auth_post("/api/notification/read", &pair.student.access_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    let snapshot = next_json(&mut ws).await;
    assert_eq!(snapshot["type"], "feed:snapshot");
    assert_eq!(snapshot["data"]["items"][0]["read"], true);
    assert_eq!(snapshot["data"]["changes"][0]["kind"], "modified");
}

#[tokio::test]
async fn mentorship_feed_shows_accepted_requests() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;

    let mut ws = connect(&app, &pair.mentor.access_token).await;
    send_json(
        &mut ws,
        serde_json::json!({ "type": "subscribe", "data": { "feed": "mentorships" } }),
    )
    .await;
    let first = next_json(&mut ws).await;
    assert_eq!(first["data"]["feed"], "mentorships");
    assert!(first["data"]["items"].as_array().unwrap().is_empty());

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/accept", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();
    let accepted: Value = resp.json().await.unwrap();

    let snapshot = next_json(&mut ws).await;
    assert_eq!(snapshot["data"]["items"][0]["topic"], "Career Advice");
    assert_eq!(snapshot["data"]["items"][0]["student_name"], "Sam Student");
    assert_eq!(snapshot["data"]["changes"][0]["id"], accepted["mentorship_id"]);
    assert_eq!(snapshot["data"]["changes"][0]["kind"], "added");
}
