use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::admin::repo::Faculty;
use crate::auth::repo_types::{Provider, Role, User};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub provider: Provider,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub status: &'static str,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            provider: user.provider,
            created_at: user.created_at,
            // No suspension support; every account reads as active.
            status: "Active",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDirectory {
    pub users: Vec<UserSummary>,
    pub total: usize,
}

/// `total_users` mirrors `total_students`; the overview card reads either.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_students: i64,
    pub high_risk_students: i64,
    pub total_faculty: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateFacultyRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FacultyList {
    pub faculties: Vec<Faculty>,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
