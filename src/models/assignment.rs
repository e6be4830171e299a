use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AssignmentKind {
    #[default]
    Assignment,
    Exam,
    Quiz,
    Project,
    Other,
}

impl FromStr for AssignmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assignment" => Ok(AssignmentKind::Assignment),
            "exam" => Ok(AssignmentKind::Exam),
            "quiz" => Ok(AssignmentKind::Quiz),
            "project" => Ok(AssignmentKind::Project),
            "other" => Ok(AssignmentKind::Other),
            other => Err(format!("unknown assignment type: {other}")),
        }
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssignmentKind::Assignment => "assignment",
            AssignmentKind::Exam => "exam",
            AssignmentKind::Quiz => "quiz",
            AssignmentKind::Project => "project",
            AssignmentKind::Other => "other",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub syllabus_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
    pub weight: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignmentRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub weight: Option<f64>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub weight: Option<f64>,
    pub completed: Option<bool>,
}

/// Validated field updates for an assignment.
#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub kind: Option<AssignmentKind>,
    pub weight: Option<f64>,
    pub completed: Option<bool>,
}

/// Parse a due date supplied by a client. Accepts RFC 3339 as well as the
/// second- and minute-precision local forms datetime inputs produce, and a
/// bare date (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(AppError::Validation(format!("invalid due date: {raw}")))
}

impl NewAssignmentRequest {
    /// Validate the request into an owned assignment record.
    pub fn into_assignment(self, syllabus_id: &str) -> Result<Assignment, AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("assignment title is required".to_string()));
        }
        let due_date = parse_due_date(&self.due_date)?;
        let kind = match self.kind {
            Some(raw) => raw.parse::<AssignmentKind>().map_err(AppError::Validation)?,
            None => AssignmentKind::default(),
        };
        Ok(Assignment {
            id: Uuid::new_v4().to_string(),
            syllabus_id: syllabus_id.to_string(),
            title: self.title.trim().to_string(),
            description: self.description,
            due_date,
            kind,
            weight: self.weight.unwrap_or(0.0).clamp(0.0, 100.0),
            completed: self.completed.unwrap_or(false),
        })
    }
}

impl UpdateAssignmentRequest {
    pub fn into_changes(self) -> Result<AssignmentChanges, AppError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("assignment title cannot be empty".to_string()));
            }
        }
        let due_date = self.due_date.as_deref().map(parse_due_date).transpose()?;
        let kind = self
            .kind
            .as_deref()
            .map(|raw| raw.parse::<AssignmentKind>().map_err(AppError::Validation))
            .transpose()?;
        Ok(AssignmentChanges {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            due_date,
            kind,
            weight: self.weight.map(|w| w.clamp(0.0, 100.0)),
            completed: self.completed,
        })
    }
}

/// An assignment annotated with its parent course, as returned by the
/// upcoming-assignments query. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingAssignment {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub course_code: String,
    pub course_name: String,
    pub instructor: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn new_request(due_date: &str) -> NewAssignmentRequest {
        NewAssignmentRequest {
            title: "Homework 1".to_string(),
            description: None,
            due_date: due_date.to_string(),
            kind: None,
            weight: None,
            completed: None,
        }
    }

    #[test]
    fn accepts_common_due_date_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 10, 15, 23, 59, 0).unwrap();
        for raw in [
            "2024-10-15T23:59:00Z",
            "2024-10-15T23:59:00+00:00",
            "2024-10-15T23:59:00",
            "2024-10-15T23:59",
        ] {
            assert_eq!(parse_due_date(raw).unwrap(), expected, "input: {raw}");
        }
        let midnight = Utc.with_ymd_and_hms(2024, 10, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_due_date("2024-10-15").unwrap(), midnight);
    }

    #[test]
    fn unparseable_due_date_is_rejected_at_creation() {
        let err = new_request("not a date").into_assignment("syl-1").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn weight_is_clamped_into_range() {
        let mut req = new_request("2024-10-15T23:59:00Z");
        req.weight = Some(250.0);
        assert_eq!(req.into_assignment("syl-1").unwrap().weight, 100.0);

        let mut req = new_request("2024-10-15T23:59:00Z");
        req.weight = Some(-5.0);
        assert_eq!(req.into_assignment("syl-1").unwrap().weight, 0.0);
    }

    #[test]
    fn defaults_apply_when_fields_are_omitted() {
        let assignment = new_request("2024-10-15T23:59:00Z")
            .into_assignment("syl-1")
            .unwrap();
        assert_eq!(assignment.kind, AssignmentKind::Assignment);
        assert_eq!(assignment.weight, 0.0);
        assert!(!assignment.completed);
        assert_eq!(assignment.syllabus_id, "syl-1");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut req = new_request("2024-10-15T23:59:00Z");
        req.kind = Some("homework".to_string());
        assert!(matches!(
            req.into_assignment("syl-1").unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
