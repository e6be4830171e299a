use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::assignment::{Assignment, NewAssignmentRequest};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Semester {
    Fall,
    Spring,
    Summer,
    Winter,
}

impl FromStr for Semester {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fall" => Ok(Semester::Fall),
            "spring" => Ok(Semester::Spring),
            "summer" => Ok(Semester::Summer),
            "winter" => Ok(Semester::Winter),
            other => Err(format!("unknown semester: {other}")),
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Semester::Fall => "Fall",
            Semester::Spring => "Spring",
            Semester::Summer => "Summer",
            Semester::Winter => "Winter",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub office: Option<String>,
}

/// Metadata of the uploaded document a syllabus was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalFile {
    pub filename: String,
    pub storage_path: String,
    pub media_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Syllabus {
    pub id: String,
    pub course_code: String,
    pub course_name: String,
    pub instructor: String,
    pub semester: Semester,
    pub year: i32,
    pub description: Option<String>,
    pub office_hours: Option<String>,
    pub contact_info: ContactInfo,
    pub assignments: Vec<Assignment>,
    pub original_file: Option<OriginalFile>,
    pub extracted_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSyllabusRequest {
    pub course_code: String,
    pub course_name: String,
    pub instructor: String,
    pub semester: String,
    pub year: i32,
    pub description: Option<String>,
    pub office_hours: Option<String>,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub assignments: Vec<NewAssignmentRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSyllabusRequest {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub instructor: Option<String>,
    pub semester: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub office_hours: Option<String>,
    pub contact_info: Option<ContactInfo>,
}

/// Validated field updates for a syllabus.
#[derive(Debug, Clone, Default)]
pub struct SyllabusChanges {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub instructor: Option<String>,
    pub semester: Option<Semester>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub office_hours: Option<String>,
    pub contact_info: Option<ContactInfo>,
}

impl UpdateSyllabusRequest {
    pub fn into_changes(self) -> Result<SyllabusChanges, AppError> {
        for (field, value) in [
            ("courseCode", &self.course_code),
            ("courseName", &self.course_name),
            ("instructor", &self.instructor),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(AppError::Validation(format!("{field} cannot be empty")));
                }
            }
        }
        let semester = self
            .semester
            .as_deref()
            .map(|raw| raw.parse::<Semester>().map_err(AppError::Validation))
            .transpose()?;
        Ok(SyllabusChanges {
            course_code: self.course_code,
            course_name: self.course_name,
            instructor: self.instructor,
            semester,
            year: self.year,
            description: self.description,
            office_hours: self.office_hours,
            contact_info: self.contact_info,
        })
    }
}
