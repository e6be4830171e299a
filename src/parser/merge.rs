//! Merge heuristically extracted fields with caller-supplied overrides.
//!
//! One rule per field: the explicit value wins over the heuristic one, and
//! any required field still empty afterwards receives its sentinel default,
//! so every persisted record satisfies the required-field invariant.

use crate::models::{ContactInfo, Semester};

use super::fields::ExtractedFields;

pub const FALLBACK_COURSE_CODE: &str = "UNKNOWN";
pub const FALLBACK_COURSE_NAME: &str = "Course Name Not Found";
pub const FALLBACK_INSTRUCTOR: &str = "Instructor Not Found";
pub const FALLBACK_SEMESTER: Semester = Semester::Fall;

/// Explicit course fields supplied alongside an upload.
#[derive(Debug, Clone, Default)]
pub struct CourseOverrides {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub instructor: Option<String>,
    pub semester: Option<Semester>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub office_hours: Option<String>,
}

/// A fully resolved set of course fields: required fields are guaranteed
/// non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCourse {
    pub course_code: String,
    pub course_name: String,
    pub instructor: String,
    pub semester: Semester,
    pub year: i32,
    pub description: Option<String>,
    pub office_hours: Option<String>,
    pub contact_info: ContactInfo,
}

/// Overlay `overrides` on top of `extracted`, then fill sentinel defaults.
/// `current_year` is passed in by the caller so the merge itself stays pure.
pub fn merge_course_fields(
    extracted: ExtractedFields,
    overrides: CourseOverrides,
    current_year: i32,
) -> MergedCourse {
    MergedCourse {
        course_code: pick(overrides.course_code, extracted.course_code)
            .unwrap_or_else(|| FALLBACK_COURSE_CODE.to_string()),
        course_name: pick(overrides.course_name, extracted.course_name)
            .unwrap_or_else(|| FALLBACK_COURSE_NAME.to_string()),
        instructor: pick(overrides.instructor, extracted.instructor)
            .unwrap_or_else(|| FALLBACK_INSTRUCTOR.to_string()),
        semester: overrides
            .semester
            .or(extracted.semester)
            .unwrap_or(FALLBACK_SEMESTER),
        year: overrides.year.or(extracted.year).unwrap_or(current_year),
        description: overrides.description.filter(|s| !s.trim().is_empty()),
        office_hours: pick(overrides.office_hours, extracted.office_hours),
        contact_info: ContactInfo {
            email: extracted.email,
            phone: extracted.phone,
            office: extracted.office,
        },
    }
}

/// Explicit wins over heuristic; blank strings count as absent.
fn pick(explicit: Option<String>, heuristic: Option<String>) -> Option<String> {
    explicit
        .filter(|s| !s.trim().is_empty())
        .or_else(|| heuristic.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted() -> ExtractedFields {
        ExtractedFields {
            course_code: Some("CS 101".to_string()),
            course_name: Some("Introduction to Programming".to_string()),
            instructor: Some("Dr. Jane Doe".to_string()),
            semester: Some(Semester::Fall),
            year: Some(2024),
            office_hours: Some("Office Hours: Mon 2-4".to_string()),
            email: Some("jane.doe@university.edu".to_string()),
            phone: None,
            office: None,
        }
    }

    #[test]
    fn explicit_fields_win() {
        let overrides = CourseOverrides {
            course_name: Some("Programming I".to_string()),
            semester: Some(Semester::Spring),
            year: Some(2025),
            ..Default::default()
        };
        let merged = merge_course_fields(extracted(), overrides, 2024);
        assert_eq!(merged.course_name, "Programming I");
        assert_eq!(merged.semester, Semester::Spring);
        assert_eq!(merged.year, 2025);
        // Untouched fields keep the heuristic values.
        assert_eq!(merged.course_code, "CS 101");
        assert_eq!(merged.instructor, "Dr. Jane Doe");
        assert_eq!(merged.contact_info.email.as_deref(), Some("jane.doe@university.edu"));
    }

    #[test]
    fn sentinel_defaults_fill_required_fields() {
        let merged =
            merge_course_fields(ExtractedFields::default(), CourseOverrides::default(), 2026);
        assert_eq!(merged.course_code, FALLBACK_COURSE_CODE);
        assert_eq!(merged.course_name, FALLBACK_COURSE_NAME);
        assert_eq!(merged.instructor, FALLBACK_INSTRUCTOR);
        assert_eq!(merged.semester, FALLBACK_SEMESTER);
        assert_eq!(merged.year, 2026);
    }

    #[test]
    fn blank_override_does_not_erase_heuristic_value() {
        let overrides = CourseOverrides {
            course_code: Some("   ".to_string()),
            ..Default::default()
        };
        let merged = merge_course_fields(extracted(), overrides, 2024);
        assert_eq!(merged.course_code, "CS 101");
    }

    #[test]
    fn required_fields_are_never_empty() {
        let cases = [
            (ExtractedFields::default(), CourseOverrides::default()),
            (extracted(), CourseOverrides::default()),
        ];
        for (fields, overrides) in cases {
            let merged = merge_course_fields(fields, overrides, 2024);
            assert!(!merged.course_code.is_empty());
            assert!(!merged.course_name.is_empty());
            assert!(!merged.instructor.is_empty());
        }
    }
}
