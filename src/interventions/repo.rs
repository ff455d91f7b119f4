use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::StoreError;

/// Intervention joined with the owning student, as the dashboard table
/// displays it.
#[derive(Debug, FromRow)]
pub struct InterventionWithStudent {
    pub id: Uuid,
    pub student_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<Date>,
    pub status: String,
    pub assigned_date: OffsetDateTime,
    pub student_name: String,
    pub department: Option<String>,
    pub risk_level: String,
}

pub async fn list_with_students(db: &PgPool) -> Result<Vec<InterventionWithStudent>, StoreError> {
    let rows = sqlx::query_as::<_, InterventionWithStudent>(
        r#"
        SELECT i.id, i.student_id, i.title, i.description, i.due_date, i.status,
               i.assigned_date, s.name AS student_name, s.department, s.risk_level
        FROM interventions i
        JOIN students s ON s.student_id = i.student_id
        ORDER BY i.assigned_date DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// New interventions always start Pending.
pub async fn insert(
    db: &PgPool,
    student_id: &str,
    title: &str,
    description: Option<&str>,
    due_date: Option<Date>,
) -> Result<Uuid, StoreError> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO interventions (student_id, title, description, due_date)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(student_id)
    .bind(title)
    .bind(description)
    .bind(due_date)
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn update_status(db: &PgPool, id: Uuid, status: &str) -> Result<u64, StoreError> {
    let result = sqlx::query("UPDATE interventions SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
