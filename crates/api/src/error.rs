use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use alumnet_services::auth::AuthError;
use alumnet_services::dao::base::DaoError;
use alumnet_services::lifecycle::LifecycleError;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    StaleState(String),
    PartiallyApplied(String),
    Internal(String),
    Validation(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::StaleState(msg) => (StatusCode::CONFLICT, "stale_state", msg),
            ApiError::PartiallyApplied(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "partially_applied", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn invalid_id(name: &str) -> Self {
        ApiError::BadRequest(format!("Invalid {}", name))
    }
}

impl From<DaoError> for ApiError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DaoError::DuplicateKey(msg) => ApiError::Conflict(msg),
            DaoError::Validation(msg) => ApiError::Validation(msg),
            other => {
                error!(error = %other, "Store operation failed");
                ApiError::Internal("Something went wrong, please try again".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Store(e) => e.into(),
            LifecycleError::NotFound(entity) => ApiError::NotFound(format!("{} not found", capitalize(entity))),
            LifecycleError::MissingField(field) => {
                ApiError::Validation(format!("Missing information: {}", field))
            }
            LifecycleError::Validation(msg) => ApiError::Validation(msg),
            stale @ LifecycleError::StaleState { .. } => {
                warn!(error = %stale, "Rejected stale transition");
                ApiError::StaleState(stale.to_string())
            }
            partial @ LifecycleError::PartiallyApplied { .. } => {
                error!(error = %partial, "Operation partially applied");
                ApiError::PartiallyApplied(
                    "The operation could not be completed, please try again".to_string(),
                )
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
