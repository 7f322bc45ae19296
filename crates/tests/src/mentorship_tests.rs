use crate::fixtures::test_app::TestApp;
use alumnet_db::models::MentorshipRequestStatus;
use bson::oid::ObjectId;
use serde_json::Value;

#[tokio::test]
async fn activity_lists_recent_mentorships_with_counts() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    for n in 0..6 {
        let request_id = app.seed_mentorship_request(&pair, &format!("Topic {}", n)).await;
        let resp = app
            .auth_post(
                &format!("/api/mentorship-request/{}/accept", request_id),
                &pair.mentor.access_token,
            )
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        tokio::time::sleep(tokio::time::Duration::from_millis(2)).await;
    }

    let resp = app
        .auth_get("/api/mentorship", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();

    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["topic"], "Topic 5");
    assert_eq!(items[0]["student_name"], "Sam Student");
    assert_eq!(items[0]["status"], "active");
    assert_eq!(items[4]["topic"], "Topic 1");

    assert_eq!(json["counts"]["active"], 6);
    assert_eq!(json["counts"]["completed"], 0);
    assert_eq!(json["counts"]["students_mentored"], 6);

    // Nothing is mentored by the student
    let resp = app
        .auth_get("/api/mentorship", &pair.student.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(json["items"].as_array().unwrap().is_empty());
    assert_eq!(json["counts"]["students_mentored"], 0);
}

#[tokio::test]
async fn activity_requires_auth() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/api/mentorship")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn failed_decline_notification_keeps_request_pending() {
    let app = TestApp::spawn().await;
    let pair = app.seed_pair().await;
    let request_id = app.seed_mentorship_request(&pair, "Career Advice").await;
    app.memory.fail_writes_to("notifications");

    let resp = app
        .auth_post(
            &format!("/api/mentorship-request/{}/decline", request_id),
            &pair.mentor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 500);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "partially_applied");

    let rid = ObjectId::parse_str(&request_id).unwrap();
    let request = app.state.daos.mentorship_requests.base.find_by_id(rid).await.unwrap();
    assert_eq!(request.status, MentorshipRequestStatus::Pending);

    // Still listed for the mentor, so the decline can be retried
    let resp = app
        .auth_get("/api/mentorship-request", &pair.mentor.access_token)
        .send()
        .await
        .unwrap();
    let list: Value = resp.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_names_the_store() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
    assert_eq!(json["connections"], 0);
}
