//! Calendar projections of assignments.
//!
//! Event construction is batch-atomic: every event for a request is built
//! and validated before any ICS text is produced, so callers never receive
//! a truncated calendar file.

pub mod ics;
pub mod upcoming;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use crate::error::AppError;
use crate::models::{Assignment, Syllabus};

pub const CALENDAR_MEDIA_TYPE: &str = "text/calendar";
pub const ALL_CALENDAR_FILENAME: &str = "all-syllabi-calendar.ics";

const STATUS_CONFIRMED: &str = "CONFIRMED";
const BUSY: &str = "BUSY";
const EVENT_DURATION_MINUTES: u32 = 60;

/// Due instant decomposed to calendar fields, truncated to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventStart {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl EventStart {
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
            hour: instant.hour(),
            minute: instant.minute(),
        }
    }

    /// Reassemble the decomposed fields into the instant they came from,
    /// truncated to the minute.
    pub fn to_instant(self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year, self.month, self.day, self.hour, self.minute, 0)
            .single()
    }
}

/// One calendar event derived from an assignment and its owning course.
/// A pure projection: no identity beyond the UID derived from the
/// assignment id, no lifecycle of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub start: EventStart,
    pub duration_minutes: u32,
    pub location: String,
    pub status: &'static str,
    pub busy_status: &'static str,
    pub organizer_name: String,
    pub organizer_email: String,
    pub categories: [String; 2],
}

fn event_for(syllabus: &Syllabus, assignment: &Assignment) -> Result<CalendarEvent, AppError> {
    if assignment.title.trim().is_empty() {
        return Err(AppError::CalendarGeneration(format!(
            "assignment {} has an empty title",
            assignment.id
        )));
    }
    let start = EventStart::from_instant(assignment.due_date);
    if start.to_instant().is_none() || !(1970..=9999).contains(&start.year) {
        return Err(AppError::CalendarGeneration(format!(
            "assignment '{}' has an unrepresentable due date",
            assignment.title
        )));
    }

    let description = assignment
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Due: {}", assignment.title));

    Ok(CalendarEvent {
        uid: format!("{}@syllabus", assignment.id),
        title: format!("{}: {}", syllabus.course_code, assignment.title),
        description,
        start,
        duration_minutes: EVENT_DURATION_MINUTES,
        location: syllabus.course_name.clone(),
        status: STATUS_CONFIRMED,
        busy_status: BUSY,
        organizer_name: syllabus.instructor.clone(),
        organizer_email: syllabus.contact_info.email.clone().unwrap_or_default(),
        categories: [
            assignment.kind.to_string(),
            syllabus.course_code.clone(),
        ],
    })
}

/// Build one event per assignment of a single course. The first invalid
/// assignment aborts the whole batch.
pub fn build_course_events(syllabus: &Syllabus) -> Result<Vec<CalendarEvent>, AppError> {
    syllabus
        .assignments
        .iter()
        .map(|assignment| event_for(syllabus, assignment))
        .collect()
}

/// Build events across every course, in course creation order.
pub fn build_all_events(syllabi: &[Syllabus]) -> Result<Vec<CalendarEvent>, AppError> {
    syllabi.iter().map(build_course_events).try_fold(
        Vec::new(),
        |mut acc, events| {
            acc.extend(events?);
            Ok(acc)
        },
    )
}

pub fn course_calendar_filename(course_code: &str) -> String {
    format!("{course_code}-calendar.ics")
}
