use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// The acting user, passed explicitly into every lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: ObjectId,
    pub display_name: String,
}

impl Session {
    pub fn new(user_id: ObjectId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}
