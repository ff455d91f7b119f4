use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};
use uuid::Uuid;

use crate::interventions::repo::InterventionWithStudent;

pub(crate) const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Serialize)]
pub struct InterventionList {
    pub interventions: Vec<InterventionDetails>,
}

#[derive(Debug, Serialize)]
pub struct InterventionDetails {
    pub id: Uuid,
    pub student_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub assigned_date: OffsetDateTime,
    pub student_name: String,
    pub department: Option<String>,
    pub risk_level: String,
}

impl From<InterventionWithStudent> for InterventionDetails {
    fn from(row: InterventionWithStudent) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            title: row.title,
            description: row.description,
            due_date: row.due_date.and_then(|d| d.format(DATE_FMT).ok()),
            status: row.status,
            assigned_date: row.assigned_date,
            student_name: row.student_name,
            department: row.department,
            risk_level: row.risk_level,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInterventionRequest {
    pub student_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInterventionRequest {
    pub status: String,
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

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn details_render_the_due_date_as_plain_ymd() {
        let row = InterventionWithStudent {
            id: Uuid::new_v4(),
            student_id: "S-1001".to_string(),
            title: "Weekly mentoring".to_string(),
            description: None,
            due_date: Some(date!(2025 - 09 - 01)),
            status: "Pending".to_string(),
            assigned_date: OffsetDateTime::UNIX_EPOCH,
            student_name: "Asha Nair".to_string(),
            department: Some("CSE".to_string()),
            risk_level: "High".to_string(),
        };
        let details = InterventionDetails::from(row);
        assert_eq!(details.due_date.as_deref(), Some("2025-09-01"));

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["student_name"], "Asha Nair");
        assert_eq!(json["risk_level"], "High");
    }

    #[test]
    fn missing_due_date_stays_absent() {
        let row = InterventionWithStudent {
            id: Uuid::new_v4(),
            student_id: "S-1002".to_string(),
            title: "Attendance check-in".to_string(),
            description: Some("Meet after class".to_string()),
            due_date: None,
            status: "Pending".to_string(),
            assigned_date: OffsetDateTime::UNIX_EPOCH,
            student_name: "Rahul Dev".to_string(),
            department: None,
            risk_level: "Medium".to_string(),
        };
        assert!(InterventionDetails::from(row).due_date.is_none());
    }
}
