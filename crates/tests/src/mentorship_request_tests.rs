use crate::fixtures::test_app::TestApp;
use alumnet_db::models::{MentorshipRequestStatus, MentorshipStatus, Notification};
use bson::oid::ObjectId;
use serde_json::Value;

#[tokio::test]
async fn list_shows_pending_requests_for_mentor() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    app.seed_mentorship_request(&pair, "Career Advice").await;
    app.seed_mentorship_request(&pair, "Resume Review").await;

    let resp = app
        .auth_get("/api/mentorship-request", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|r| r["status"] == "pending"));

    // The student has no requests addressed to them
    let resp = app
        .auth_get("/api/mentorship-request", &pair.student.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_requires_auth() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/mentorship-request"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn accept_creates_mentorship_and_notifies_student() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/accept", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Mentorship request accepted");
    assert_eq!(json["topic"], "Career Advice");

    let rid = ObjectId::parse_str(&request_id).unwrap();
    let request = app.state.daos.mentorship_requests.base.find_by_id(rid).await.unwrap();
    assert_eq!(request.status, MentorshipRequestStatus::Accepted);

    let mentorships = app
        .state
        .daos
        .mentorships
        .for_pair(pair.mentor.id, pair.student.id)
        .await
        .unwrap();
    assert_eq!(mentorships.len(), 1);
    assert_eq!(mentorships[0].status, MentorshipStatus::Active);
    assert_eq!(mentorships[0].from_request_id, Some(rid));

    let notifications: Vec<Notification> = app.state.feeds.notifications(pair.student.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0].content,
        "Dana Alumna accepted your mentorship request"
    );

    // Gone from the pending list
    let resp = app
        .auth_get("/api/mentorship-request", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn accepting_twice_is_rejected_as_stale() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;
    let path = format!("/api/mentorship-request/{}/accept", request_id);

    let first = app.auth_post(&path, &pair.mentor.access_token).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let second = app.auth_post(&path, &pair.mentor.access_token).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 409);
    let json: Value = second.json().await.unwrap();
    assert_eq!(json["error"], "stale_state");

    // No duplicate mentorship or notification
    let mentorships = app
        .state
        .daos
        .mentorships
        .for_pair(pair.mentor.id, pair.student.id)
        .await
        .unwrap();
    assert_eq!(mentorships.len(), 1);
    assert_eq!(app.state.feeds.notifications(pair.student.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn decline_notifies_without_mentorship() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/decline", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Mentorship request declined");
    assert_eq!(json["request"]["status"], "declined");
    assert_eq!(json["request"]["student_id"], pair.student.hex());

    let rid = ObjectId::parse_str(&request_id).unwrap();
    let request = app.state.daos.mentorship_requests.base.find_by_id(rid).await.unwrap();
    assert_eq!(request.status, MentorshipRequestStatus::Declined);

    let mentorships = app
        .state
        .daos
        .mentorships
        .for_pair(pair.mentor.id, pair.student.id)
        .await
        .unwrap();
    assert!(mentorships.is_empty());

    let notifications = app.state.feeds.notifications(pair.student.id).await.unwrap();
    assert_eq!(
        notifications[0].content,
        "Dana Alumna declined your mentorship request"
    );
}

#[tokio::test]
async fn failed_notification_rolls_back_accept() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;
    app.memory.fail_writes_to("notifications");

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/accept", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 500);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "partially_applied");

    // Compensated: still pending and no mentorship left behind
    let rid = ObjectId::parse_str(&request_id).unwrap();
    let request = app.state.daos.mentorship_requests.base.find_by_id(rid).await.unwrap();
    assert_eq!(request.status, MentorshipRequestStatus::Pending);
    let mentorships = app
        .state
        .daos
        .mentorships
        .for_pair(pair.mentor.id, pair.student.id)
        .await
        .unwrap();
    assert!(mentorships.is_empty());

    // Once the store recovers the same request goes through
    app.memory.restore_writes_to("notifications");
    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/accept", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/accept", ObjectId::new().to_hex()),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_post("/api/mentorship-request/not-an-id/accept", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}
