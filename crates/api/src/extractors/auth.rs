use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use alumnet_services::Session;
use bson::oid::ObjectId;

use crate::{error::ApiError, state::AppState};

/// The signed-in user, read from a bearer token or the `access_token` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub display_name: String,
}

impl AuthUser {
    pub fn session(&self) -> Session {
        Session::new(self.user_id, self.display_name.clone())
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                cookie
                    .trim()
                    .strip_prefix("access_token=")
                    .map(|s| s.to_string())
            })
        })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

        let session = app_state.auth.session_from_token(&token)?;

        Ok(AuthUser {
            user_id: session.user_id,
            display_name: session.display_name,
        })
    }
}

/// Helper trait for extracting AppState from composite state types
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AppState> for AppState {
    fn from_ref(input: &AppState) -> Self {
        input.clone()
    }
}
