pub mod base;
pub mod meeting;
pub mod mentorship;
pub mod notification;
pub mod user;

use std::sync::Arc;

pub use base::{BaseDao, DaoError, DaoResult};
pub use meeting::{MeetingDao, MeetingRequestDao};
pub use mentorship::{MentorshipDao, MentorshipRequestDao};
pub use notification::NotificationDao;
pub use user::UserDao;

use crate::store::RecordStore;

/// One DAO per collection, all sharing the same store.
pub struct Daos {
    pub users: UserDao,
    pub mentorship_requests: MentorshipRequestDao,
    pub mentorships: MentorshipDao,
    pub meetings: MeetingDao,
    pub meeting_requests: MeetingRequestDao,
    pub notifications: NotificationDao,
}

impl Daos {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            users: UserDao::new(store.clone()),
            mentorship_requests: MentorshipRequestDao::new(store.clone()),
            mentorships: MentorshipDao::new(store.clone()),
            meetings: MeetingDao::new(store.clone()),
            meeting_requests: MeetingRequestDao::new(store.clone()),
            notifications: NotificationDao::new(store),
        }
    }
}
