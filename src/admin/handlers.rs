use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::admin::dto::{
    Ack, CreateFacultyRequest, DashboardStats, FacultyList, UserDirectory, UserSummary,
};
use crate::admin::repo;
use crate::auth::password;
use crate::auth::repo_types::User;
use crate::auth::session::AdminSession;
use crate::error::{ApiError, StoreError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/admin/stats", get(dashboard_stats))
        .route("/admin/faculties", get(list_faculties).post(create_faculty))
        .route("/admin/faculties/:id", delete(delete_faculty))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<UserDirectory>, ApiError> {
    let users = User::list_all(&state.db)
        .await
        .map_err(|e| ApiError::internal("Unable to fetch users.", e))?;

    let users: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
    let total = users.len();
    Ok(Json(UserDirectory { users, total }))
}

#[instrument(skip(state, _admin))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<DashboardStats>, ApiError> {
    let counts = repo::dashboard_counts(&state.db)
        .await
        .map_err(|e| ApiError::internal("Unable to fetch stats.", e))?;

    Ok(Json(DashboardStats {
        total_users: counts.total_students,
        total_students: counts.total_students,
        high_risk_students: counts.high_risk_students,
        total_faculty: counts.total_faculty,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn list_faculties(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<FacultyList>, ApiError> {
    let faculties = repo::list_faculties(&state.db)
        .await
        .map_err(|e| ApiError::internal("Unable to fetch faculties.", e))?;
    Ok(Json(FacultyList { faculties }))
}

#[instrument(skip(state, payload))]
pub async fn create_faculty(
    State(state): State<AppState>,
    AdminSession(principal): AdminSession,
    Json(mut payload): Json<CreateFacultyRequest>,
) -> Result<(StatusCode, Json<Ack>), ApiError> {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_string();

    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Name, email, and password are required".to_string(),
        ));
    }

    match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(_)) => {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ))
        }
        Ok(None) => {}
        Err(e) => return Err(ApiError::internal("Unable to create faculty right now.", e)),
    }

    let hash = password::hash_password(&payload.password, state.config.auth.hash_cost)
        .map_err(|e| ApiError::internal("Unable to create faculty right now.", e))?;

    let user_id = match repo::create_faculty_account(
        &state.db,
        &payload.name,
        &payload.email,
        &hash,
        payload.department.as_deref(),
        payload.designation.as_deref(),
    )
    .await
    {
        Ok(id) => id,
        // Unique slot on users.email or faculties.email lost to a race.
        Err(StoreError::DuplicateKey) => {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ))
        }
        Err(e) => return Err(ApiError::internal("Unable to create faculty right now.", e)),
    };

    info!(
        admin = %principal.user_id,
        user_id = %user_id,
        email = %payload.email,
        "faculty account created"
    );
    Ok((
        StatusCode::CREATED,
        Json(Ack::new("Faculty account created successfully")),
    ))
}

#[instrument(skip(state))]
pub async fn delete_faculty(
    State(state): State<AppState>,
    AdminSession(principal): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Ack>, ApiError> {
    let removed = repo::delete_faculty(&state.db, id)
        .await
        .map_err(|e| ApiError::internal("Unable to delete faculty right now.", e))?;

    if removed == 0 {
        warn!(faculty_id = %id, "delete for unknown faculty");
    } else {
        info!(admin = %principal.user_id, faculty_id = %id, "faculty deleted");
    }
    Ok(Json(Ack::new("Faculty deleted successfully")))
}
