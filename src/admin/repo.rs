use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Provider, Role};
use crate::error::StoreError;

/// Faculty roster row. Listed verbatim in the admin UI.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Faculty {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn list_faculties(db: &PgPool) -> Result<Vec<Faculty>, StoreError> {
    let faculties = sqlx::query_as::<_, Faculty>(
        r#"
        SELECT id, name, email, department, designation, created_at
        FROM faculties
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(faculties)
}

/// Seed the login account and the roster row together. The account starts
/// with `must_change_password` set, so the first login forces a rotation.
pub async fn create_faculty_account(
    db: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    department: Option<&str>,
    designation: Option<&str>,
) -> Result<Uuid, StoreError> {
    let mut tx = db.begin().await?;

    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, provider, role, must_change_password)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(Provider::Password)
    .bind(Role::Faculty)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO faculties (name, email, department, designation)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(department)
    .bind(designation)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user_id)
}

/// Removes the roster row only; the login account keeps its role.
pub async fn delete_faculty(db: &PgPool, id: Uuid) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM faculties WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[derive(Debug)]
pub struct DashboardCounts {
    pub total_students: i64,
    pub high_risk_students: i64,
    pub total_faculty: i64,
}

pub async fn dashboard_counts(db: &PgPool) -> Result<DashboardCounts, StoreError> {
    let total_students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(db)
        .await?;
    let high_risk_students: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE risk_level = 'High'")
            .fetch_one(db)
            .await?;
    let total_faculty: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM faculties")
        .fetch_one(db)
        .await?;

    Ok(DashboardCounts {
        total_students,
        high_risk_students,
        total_faculty,
    })
}
