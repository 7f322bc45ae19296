use alumnet_db::models::UserRole;
use alumnet_services::Session;
use bson::oid::ObjectId;

use super::test_app::TestApp;

pub struct SeededUser {
    pub id: ObjectId,
    pub display_name: String,
    pub access_token: String,
}

impl SeededUser {
    pub fn hex(&self) -> String {
        self.id.to_hex()
    }
}

/// A mentor and one of the students on the roster.
pub struct SeededPair {
    pub mentor: SeededUser,
    pub student: SeededUser,
}

impl TestApp {
    /// Adds a roster entry and mints a token for it.
    pub async fn seed_user(&self, display_name: &str, role: UserRole) -> SeededUser {
        let email = format!(
            "{}@alumnet.test",
            display_name.to_lowercase().replace(' ', ".")
        );
        let user = self
            .state
            .daos
            .users
            .create(display_name.to_string(), email, role)
            .await
            .expect("Failed to seed user");
        let id = user.id.expect("Seeded user has an id");

        let access_token = self
            .state
            .auth
            .issue_token(&Session::new(id, display_name))
            .expect("Failed to issue token");

        SeededUser {
            id,
            display_name: display_name.to_string(),
            access_token,
        }
    }

    pub async fn seed_pair(&self) -> SeededPair {
        SeededPair {
            mentor: self.seed_user("Dana Alumna", UserRole::Alumni).await,
            student: self.seed_user("Sam Student", UserRole::Student).await,
        }
    }

    /// A pending mentorship request from the student to the mentor; returns its id.
    pub async fn seed_mentorship_request(&self, pair: &SeededPair, request_type: &str) -> String {
        let request = self
            .state
            .daos
            .mentorship_requests
            .create(
                pair.mentor.id,
                pair.student.id,
                request_type.to_string(),
                Some("Would love some guidance".to_string()),
            )
            .await
            .expect("Failed to seed mentorship request");
        request.id.expect("Seeded request has an id").to_hex()
    }

    /// A pending meeting request from the student to the mentor; returns its id.
    pub async fn seed_meeting_request(&self, pair: &SeededPair, topic: &str) -> String {
        let request = self
            .state
            .daos
            .meeting_requests
            .create(
                pair.mentor.id,
                pair.student.id,
                pair.student.display_name.clone(),
                topic.to_string(),
                None,
                vec!["Weekday evenings".to_string()],
            )
            .await
            .expect("Failed to seed meeting request");
        request.id.expect("Seeded request has an id").to_hex()
    }

    /// Schedules a meeting through the API; returns the response's `meeting` object.
    pub async fn schedule_meeting(
        &self,
        pair: &SeededPair,
        topic: &str,
        date: &str,
        time: &str,
    ) -> serde_json::Value {
        let resp = self
            .auth_post("/api/meeting", &pair.mentor.access_token)
            .json(&serde_json::json!({
                "student_id": pair.student.hex(),
                "topic": topic,
                "date": date,
                "time": time,
                "duration": "45 min",
                "platform": "Zoom",
            }))
            .send()
            .await
            .expect("Schedule request failed");

        assert_eq!(
            resp.status().as_u16(),
            200,
            "Schedule failed: {}",
            resp.text().await.unwrap_or_default()
        );
        let json: serde_json::Value = resp.json().await.expect("Failed to parse schedule response");
        json["meeting"].clone()
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }
}

/// A date `days` from today, as the schedule form expects it.
pub fn form_date(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
