use axum::{Json, extract::State};
use alumnet_db::models::UserRole;
use serde::Serialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub id: String,
    pub display_name: String,
    pub email: String,
}

/// Students a mentor can pick on the schedule form.
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let students = state.daos.users.list_by_role(UserRole::Student).await?;

    Ok(Json(
        students
            .into_iter()
            .map(|u| StudentResponse {
                id: u.id.map(|id| id.to_hex()).unwrap_or_default(),
                display_name: u.display_name,
                email: u.email,
            })
            .collect(),
    ))
}
