use std::sync::Arc;

use alumnet_db::models::{User, UserRole};
use bson::DateTime;

use super::base::{BaseDao, DaoResult};
use crate::store::RecordStore;

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            base: BaseDao::new(store, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        display_name: String,
        email: String,
        role: UserRole,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            display_name,
            email,
            role,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    /// Roster for one role, alphabetical.
    pub async fn list_by_role(&self, role: UserRole) -> DaoResult<Vec<User>> {
        let query = self
            .base
            .query()
            .eq("role", role.as_str())
            .sort_asc("display_name");
        self.base.find_many(&query).await
    }
}
