//! Time-windowed view of assignments across all courses.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Syllabus, UpcomingAssignment};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Boundary semantics of the `[now, now + days]` window. The observed
/// implementations of this query disagreed on the boundaries, so the
/// policy is a named choice instead of an implicit comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowBounds {
    /// `now <= due <= cutoff` — an assignment due exactly now or exactly
    /// at the cutoff is included.
    #[default]
    Inclusive,
    /// `now < due < cutoff` — both ends excluded.
    Strict,
}

impl WindowBounds {
    fn contains(self, due: DateTime<Utc>, now: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
        match self {
            WindowBounds::Inclusive => now <= due && due <= cutoff,
            WindowBounds::Strict => now < due && due < cutoff,
        }
    }
}

/// Select every assignment due within `days` of `now`, annotated with its
/// parent course, sorted ascending by due date. The sort is stable, so
/// ties keep (course, assignment) insertion order. `syllabi` is expected
/// in creation order.
pub fn upcoming_assignments(
    syllabi: &[Syllabus],
    now: DateTime<Utc>,
    days: i64,
    bounds: WindowBounds,
) -> Vec<UpcomingAssignment> {
    let cutoff = now + Duration::days(days);
    let mut upcoming: Vec<UpcomingAssignment> = syllabi
        .iter()
        .flat_map(|syllabus| {
            syllabus
                .assignments
                .iter()
                .filter(|a| bounds.contains(a.due_date, now, cutoff))
                .map(|a| UpcomingAssignment {
                    assignment: a.clone(),
                    course_code: syllabus.course_code.clone(),
                    course_name: syllabus.course_name.clone(),
                    instructor: syllabus.instructor.clone(),
                })
        })
        .collect();

    upcoming.sort_by_key(|entry| entry.assignment.due_date);
    upcoming
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Assignment, AssignmentKind, ContactInfo, Semester};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap()
    }

    fn course(id: &str, code: &str, assignments: Vec<Assignment>) -> Syllabus {
        Syllabus {
            id: id.to_string(),
            course_code: code.to_string(),
            course_name: format!("{code} Course"),
            instructor: "Dr. Jane Doe".to_string(),
            semester: Semester::Fall,
            year: 2024,
            description: None,
            office_hours: None,
            contact_info: ContactInfo::default(),
            assignments,
            original_file: None,
            extracted_text: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn due_in(syllabus_id: &str, id: &str, hours: i64) -> Assignment {
        Assignment {
            id: id.to_string(),
            syllabus_id: syllabus_id.to_string(),
            title: format!("Assignment {id}"),
            description: None,
            due_date: now() + Duration::hours(hours),
            kind: AssignmentKind::Assignment,
            weight: 0.0,
            completed: false,
        }
    }

    #[test]
    fn selects_only_assignments_inside_the_window() {
        let syllabi = vec![course(
            "s1",
            "CS 101",
            vec![
                due_in("s1", "past", -2),
                due_in("s1", "soon", 24),
                due_in("s1", "later", 24 * 40),
            ],
        )];
        let upcoming = upcoming_assignments(&syllabi, now(), 30, WindowBounds::Inclusive);
        let ids: Vec<&str> = upcoming.iter().map(|u| u.assignment.id.as_str()).collect();
        assert_eq!(ids, ["soon"]);
    }

    #[test]
    fn results_are_sorted_by_due_date_across_courses() {
        let syllabi = vec![
            course("s1", "CS 101", vec![due_in("s1", "b", 48)]),
            course("s2", "MATH 201", vec![due_in("s2", "a", 12), due_in("s2", "c", 72)]),
        ];
        let upcoming = upcoming_assignments(&syllabi, now(), 7, WindowBounds::Inclusive);
        let ids: Vec<&str> = upcoming.iter().map(|u| u.assignment.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(upcoming[0].course_code, "MATH 201");
        assert_eq!(upcoming[1].course_code, "CS 101");
    }

    #[test]
    fn ties_keep_insertion_order() {
        let syllabi = vec![
            course("s1", "CS 101", vec![due_in("s1", "first", 24)]),
            course("s2", "MATH 201", vec![due_in("s2", "second", 24)]),
        ];
        let upcoming = upcoming_assignments(&syllabi, now(), 7, WindowBounds::Inclusive);
        let ids: Vec<&str> = upcoming.iter().map(|u| u.assignment.id.as_str()).collect();
        assert_eq!(ids, ["first", "second"]);
    }

    #[test]
    fn inclusive_bounds_cover_both_ends() {
        let at_now = due_in("s1", "now", 0);
        let mut at_cutoff = due_in("s1", "cutoff", 0);
        at_cutoff.due_date = now() + Duration::days(7);
        let syllabi = vec![course("s1", "CS 101", vec![at_now, at_cutoff])];

        let inclusive = upcoming_assignments(&syllabi, now(), 7, WindowBounds::Inclusive);
        assert_eq!(inclusive.len(), 2);

        let strict = upcoming_assignments(&syllabi, now(), 7, WindowBounds::Strict);
        assert!(strict.is_empty());
    }

    #[test]
    fn zero_day_window_catches_only_exact_due_now() {
        let syllabi = vec![course(
            "s1",
            "CS 101",
            vec![due_in("s1", "now", 0), due_in("s1", "tomorrow", 24)],
        )];
        let upcoming = upcoming_assignments(&syllabi, now(), 0, WindowBounds::Inclusive);
        let ids: Vec<&str> = upcoming.iter().map(|u| u.assignment.id.as_str()).collect();
        assert_eq!(ids, ["now"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(upcoming_assignments(&[], now(), 30, WindowBounds::default()).is_empty());
    }

    #[test]
    fn every_result_is_inside_the_window() {
        let syllabi = vec![course(
            "s1",
            "CS 101",
            (0..10)
                .map(|i| due_in("s1", &format!("a{i}"), i * 37 - 48))
                .collect(),
        )];
        for days in [0, 1, 7, 30] {
            let cutoff = now() + Duration::days(days);
            for entry in upcoming_assignments(&syllabi, now(), days, WindowBounds::Inclusive) {
                assert!(entry.assignment.due_date >= now());
                assert!(entry.assignment.due_date <= cutoff);
            }
        }
    }
}
