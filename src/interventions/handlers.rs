use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::repo_types::Role;
use crate::auth::session::{Session, SessionPrincipal};
use crate::error::ApiError;
use crate::interventions::dto::{
    Ack, CreateInterventionRequest, InterventionDetails, InterventionList,
    UpdateInterventionRequest, DATE_FMT,
};
use crate::interventions::repo;
use crate::state::AppState;
use crate::students;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/interventions",
            get(list_interventions).post(create_intervention),
        )
        .route("/interventions/:id", put(update_intervention_status))
}

const KNOWN_STATUSES: [&str; 3] = ["Pending", "In Progress", "Completed"];

fn require_faculty(principal: &SessionPrincipal) -> Result<(), ApiError> {
    if matches!(principal.role, Role::Faculty | Role::Admin) {
        Ok(())
    } else {
        warn!(user_id = %principal.user_id, role = ?principal.role, "faculty access denied");
        Err(ApiError::Forbidden("Forbidden. Faculty access required."))
    }
}

#[instrument(skip(state, _session))]
pub async fn list_interventions(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<InterventionList>, ApiError> {
    let rows = repo::list_with_students(&state.db)
        .await
        .map_err(|e| ApiError::internal("Unable to fetch interventions.", e))?;

    let interventions = rows.into_iter().map(InterventionDetails::from).collect();
    Ok(Json(InterventionList { interventions }))
}

#[instrument(skip(state, payload))]
pub async fn create_intervention(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(mut payload): Json<CreateInterventionRequest>,
) -> Result<(StatusCode, Json<Ack>), ApiError> {
    require_faculty(&principal)?;

    payload.student_id = payload.student_id.trim().to_string();
    payload.title = payload.title.trim().to_string();
    if payload.student_id.is_empty() || payload.title.is_empty() {
        return Err(ApiError::Validation(
            "Student ID and Title are required".to_string(),
        ));
    }

    let due_date = match payload.due_date.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(Date::parse(s, DATE_FMT).map_err(|_| {
            ApiError::Validation("Due date must be YYYY-MM-DD.".to_string())
        })?),
        None => None,
    };

    let known = students::repo::exists(&state.db, &payload.student_id)
        .await
        .map_err(|e| ApiError::internal("Unable to assign intervention right now.", e))?;
    if !known {
        return Err(ApiError::NotFound("Student not found.".to_string()));
    }

    let intervention_id = repo::insert(
        &state.db,
        &payload.student_id,
        &payload.title,
        payload.description.as_deref(),
        due_date,
    )
    .await
    .map_err(|e| ApiError::internal("Unable to assign intervention right now.", e))?;

    info!(
        user_id = %principal.user_id,
        intervention_id = %intervention_id,
        student_id = %payload.student_id,
        "intervention assigned"
    );
    Ok((
        StatusCode::CREATED,
        Json(Ack::new("Intervention assigned successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_intervention_status(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInterventionRequest>,
) -> Result<Json<Ack>, ApiError> {
    require_faculty(&principal)?;

    if !KNOWN_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::Validation("Invalid status".to_string()));
    }

    let updated = repo::update_status(&state.db, id, &payload.status)
        .await
        .map_err(|e| ApiError::internal("Unable to update status right now.", e))?;
    if updated == 0 {
        return Err(ApiError::NotFound("Intervention not found.".to_string()));
    }

    info!(
        user_id = %principal.user_id,
        intervention_id = %id,
        status = %payload.status,
        "intervention status updated"
    );
    Ok(Json(Ack::new("Status updated successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_three_known_statuses_pass() {
        assert!(KNOWN_STATUSES.contains(&"Pending"));
        assert!(KNOWN_STATUSES.contains(&"In Progress"));
        assert!(KNOWN_STATUSES.contains(&"Completed"));
        assert!(!KNOWN_STATUSES.contains(&"Done"));
        assert!(!KNOWN_STATUSES.contains(&"pending"));
        assert!(!KNOWN_STATUSES.contains(&""));
    }

    #[test]
    fn faculty_gate_admits_faculty_and_admin_only() {
        let mut principal = SessionPrincipal {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role: Role::User,
        };
        assert!(require_faculty(&principal).is_err());

        principal.role = Role::Faculty;
        assert!(require_faculty(&principal).is_ok());

        principal.role = Role::Admin;
        assert!(require_faculty(&principal).is_ok());
    }
}
