use crate::fixtures::{seed::form_date, test_app::TestApp};
use alumnet_db::models::NotificationType;
use serde_json::Value;

#[tokio::test]
async fn schedule_fills_defaults_and_student_name() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;

    let resp = app
        .auth_post("/api/meeting", &pair.mentor.access_token)
        .json(&serde_json::json!({
            "student_id": pair.student.hex(),
            "topic": "Interview prep",
            "date": "2030-05-15",
            "time": "14:00",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Meeting scheduled");
    let meeting = &json["meeting"];
    assert_eq!(meeting["student_name"], "Sam Student");
    assert_eq!(meeting["mentor_name"], "Dana Alumna");
    assert_eq!(meeting["date_string"], "May 15, 2030");
    assert_eq!(meeting["time_string"], "14:00");
    assert_eq!(meeting["duration"], "30 min");
    assert_eq!(meeting["platform"], "Google Meet");
    assert_eq!(meeting["status"], "Scheduled");

    // Scheduling does not notify unless configured to
    assert!(app.state.feeds.notifications(pair.student.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn schedule_reports_the_missing_field() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;

    let resp = app
        .auth_post("/api/meeting", &pair.mentor.access_token)
        .json(&serde_json::json!({
            "student_id": pair.student.hex(),
            "topic": "   ",
            "date": "2030-05-15",
            "time": "14:00",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "validation");
    assert_eq!(json["message"], "Missing information: topic");

    let resp = app
        .auth_post("/api/meeting", &pair.mentor.access_token)
        .json(&serde_json::json!({
            "student_id": pair.student.hex(),
            "topic": "Interview prep",
            "date": "15/05/2030",
            "time": "14:00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn schedule_notifies_when_enabled() {
    let app = TestApp::spawn_with_settings(|s| s.lifecycle.notify_on_schedule = true).await;
    let pair = app.seed_pair().await;

    app.schedule_meeting(&pair, "Portfolio review", &form_date(3), "09:30").await;

    let notifications = app.state.feeds.notifications(pair.student.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::MeetingScheduled);
    assert_eq!(
        notifications[0].content,
        "Dana Alumna scheduled a meeting with you: Portfolio review"
    );
}

#[tokio::test]
async fn upcoming_and_past_are_split_at_today() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;

    app.schedule_meeting(&pair, "Later", &form_date(5), "10:00").await;
    app.schedule_meeting(&pair, "Sooner", &form_date(1), "10:00").await;
    app.schedule_meeting(&pair, "Earlier", &form_date(-3), "10:00").await;
    app.schedule_meeting(&pair, "Recent", &form_date(-1), "10:00").await;

    let resp = app
        .auth_get("/api/meeting/upcoming", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let topics: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["topic"].as_str().unwrap())
        .collect();
    assert_eq!(topics, vec!["Sooner", "Later"]);

    let resp = app
        .auth_get("/api/meeting/past", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    let topics: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["topic"].as_str().unwrap())
        .collect();
    assert_eq!(topics, vec!["Recent", "Earlier"]);
}

#[tokio::test]
async fn get_returns_prefilled_form_and_update_rewrites() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let meeting = app.schedule_meeting(&pair, "Interview prep", "2030-05-15", "14:00").await;
    let id = meeting["id"].as_str().unwrap();

    let resp = app
        .auth_get(&format!("/api/meeting/{}", id), &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["form"]["date"], "2030-05-15");
    assert_eq!(json["form"]["time"], "14:00");
    assert_eq!(json["form"]["platform"], "Zoom");

    let mut form = json["form"].clone();
    form["time"] = serde_json::json!("16:30");
    form["topic"] = serde_json::json!("Mock interview");

    let resp = app
        .auth_put(&format!("/api/meeting/{}", id), &pair.mentor.access_token)
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Meeting updated");
    assert_eq!(json["meeting"]["id"], id);
    assert_eq!(json["meeting"]["time_string"], "16:30");
    assert_eq!(json["meeting"]["topic"], "Mock interview");
}

#[tokio::test]
async fn cancel_only_once() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let meeting = app.schedule_meeting(&pair, "Interview prep", &form_date(2), "14:00").await;
    let path = format!("/api/meeting/{}/cancel", meeting["id"].as_str().unwrap());

    let resp = app.auth_post(&path, &pair.mentor.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["meeting"]["status"], "Cancelled");
    assert_eq!(json["meeting"]["topic"], "Interview prep");

    let resp = app.auth_post(&path, &pair.mentor.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn complete_validates_and_feeds_stats() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let first = app.schedule_meeting(&pair, "One", &form_date(-2), "10:00").await;
    let second = app.schedule_meeting(&pair, "Two", &form_date(-1), "10:00").await;
    app.schedule_meeting(&pair, "Three", &form_date(4), "10:00").await;

    let complete = |meeting: &Value| {
        format!("/api/meeting/{}/complete", meeting["id"].as_str().unwrap())
    };

    let resp = app
        .auth_post(&complete(&first), &pair.mentor.access_token)
        .json(&serde_json::json!({ "actual_duration_minutes": 60, "rating": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    for (meeting, minutes, rating) in [(&first, 60, 5), (&second, 30, 4)] {
        let resp = app
            .auth_post(&complete(meeting), &pair.mentor.access_token)
            .json(&serde_json::json!({ "actual_duration_minutes": minutes, "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let resp = app
        .auth_get("/api/meeting/stats", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let stats: Value = resp.json().await.unwrap();
    assert_eq!(stats["total_sessions"], 2);
    assert_eq!(stats["total_hours"], 1.5);
    assert_eq!(stats["average_rating"], 4.5);
    assert_eq!(stats["upcoming_sessions"], 1);
    assert_eq!(stats["unique_students"], 1);
}

#[tokio::test]
async fn export_returns_spreadsheet() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    app.schedule_meeting(&pair, "Interview prep", &form_date(2), "14:00").await;

    let resp = app
        .auth_get("/api/meeting/export", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(content_type.contains("spreadsheetml"));
    let bytes = resp.bytes().await.unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn student_roster_lists_students_only() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    app.seed_user("Ari Student", alumnet_db::models::UserRole::Student).await;

    let resp = app
        .auth_get("/api/student", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["display_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ari Student", "Sam Student"]);
}

async fn stats_with(app: &TestApp, token: &str, query: &str) -> Value {
    let resp = app
        .auth_get(&format!("/api/meeting/stats{}", query), token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn stats_follow_period_and_status_filters() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let old = app.schedule_meeting(&pair, "Old", &form_date(-40), "10:00").await;
    let recent = app.schedule_meeting(&pair, "Recent", &form_date(-2), "10:00").await;
    app.schedule_meeting(&pair, "Next", &form_date(2), "10:00").await;

    for meeting in [&old, &recent] {
        let resp = app
            .auth_post(
                &format!("/api/meeting/{}/complete", meeting["id"].as_str().unwrap()),
                &pair.mentor.access_token,
            )
            .json(&serde_json::json!({ "actual_duration_minutes": 30 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let token = pair.mentor.access_token.as_str();
    let all = stats_with(&app, token, "").await;
    assert_eq!(all["total_sessions"], 2);
    assert_eq!(all["upcoming_sessions"], 1);

    let week = stats_with(&app, token, "?period=week").await;
    assert_eq!(week["total_sessions"], 1);
    assert_eq!(week["total_hours"], 0.5);
    assert_eq!(week["upcoming_sessions"], 1);

    let completed = stats_with(&app, token, "?status=Completed&order=asc").await;
    assert_eq!(completed["total_sessions"], 2);
    assert_eq!(completed["upcoming_sessions"], 0);

    let resp = app
        .auth_get("/api/meeting/stats?period=decade", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn export_accepts_the_tracker_filters() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    app.schedule_meeting(&pair, "Interview prep", &form_date(2), "14:00").await;

    let resp = app
        .auth_get(
            "/api/meeting/export?period=month&status=Scheduled",
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let bytes = resp.bytes().await.unwrap();
    assert_eq!(&bytes[..2], b"PK");
}
