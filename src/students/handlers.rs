use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::auth::session::Session;
use crate::error::ApiError;
use crate::state::AppState;
use crate::students::repo::{self, Student};

pub fn routes() -> Router<AppState> {
    Router::new().route("/students", get(list_students))
}

#[derive(Debug, Serialize)]
pub struct StudentList {
    pub students: Vec<Student>,
}

#[instrument(skip(state, _session))]
pub async fn list_students(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<StudentList>, ApiError> {
    let students = repo::list(&state.db)
        .await
        .map_err(|e| ApiError::internal("Unable to fetch students.", e))?;
    Ok(Json(StudentList { students }))
}
