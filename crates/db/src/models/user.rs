use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Roster entry. Accounts themselves live with the identity provider; this
/// collection only carries what scheduling and display need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Student,
    Alumni,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Alumni => "alumni",
            UserRole::Admin => "admin",
        }
    }
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
