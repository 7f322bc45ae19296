pub mod meeting;
pub mod meeting_request;
pub mod mentorship;
pub mod mentorship_request;
pub mod notification;
pub mod user;

pub use meeting::*;
pub use meeting_request::*;
pub use mentorship::*;
pub use mentorship_request::*;
pub use notification::*;
pub use user::*;
