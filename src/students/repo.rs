use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::StoreError;

/// Student record as tracked by the risk pipeline. `risk_level` is one of
/// High / Medium / Low, enforced by a check constraint.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub department: Option<String>,
    pub semester: Option<i32>,
    pub risk_level: String,
    pub risk_score: f64,
    pub attendance_percentage: Option<f64>,
    pub sgpa: Option<f64>,
    pub backlogs: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn list(db: &PgPool) -> Result<Vec<Student>, StoreError> {
    let students = sqlx::query_as::<_, Student>(
        r#"
        SELECT student_id, name, department, semester, risk_level, risk_score,
               attendance_percentage, sgpa, backlogs, created_at
        FROM students
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(students)
}

pub async fn exists(db: &PgPool, student_id: &str) -> Result<bool, StoreError> {
    let found = sqlx::query_scalar::<_, i32>("SELECT 1 FROM students WHERE student_id = $1")
        .bind(student_id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}
