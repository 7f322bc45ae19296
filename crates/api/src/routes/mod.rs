pub mod meeting;
pub mod meeting_request;
pub mod mentorship;
pub mod mentorship_request;
pub mod notification;
pub mod student;

use bson::oid::ObjectId;

use crate::error::ApiError;

pub(crate) fn parse_id(value: &str, name: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::invalid_id(name))
}
