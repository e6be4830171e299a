//! Heuristic field extraction over raw syllabus text.
//!
//! A deterministic set of first-match-wins rules over the trimmed,
//! non-empty lines of the document. Course-name detection depends on the
//! course code, so the code is located first and the name lookahead is
//! anchored to that line instead of relying on scan order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Semester;

static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([A-Z]{2,4}\s+\d{3,4})").unwrap());
static FILENAME_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z]{2,4}\s*\d{3,4})").unwrap());
static INSTRUCTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:instructor|professor|teacher)[:\s]+(.+)").unwrap());
static SEMESTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(fall|spring|summer|winter)\s+(\d{4})").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").unwrap());
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\(\d{3}\)\s*\d{3}-\d{4}|\d{3}-\d{3}-\d{4}|\d{10})").unwrap());
static OFFICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:office|room)[:\s]+(.+)").unwrap());

/// How many lines after the course-code line are considered for the
/// course name.
const NAME_LOOKAHEAD_LINES: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub instructor: Option<String>,
    pub semester: Option<Semester>,
    pub year: Option<i32>,
    pub office_hours: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub office: Option<String>,
}

/// Run every extraction rule over `text`. Absent fields stay `None`;
/// the function never fails. Empty input yields the all-empty value.
/// Pure: identical input always produces an identical result.
pub fn extract_fields(text: &str, filename: Option<&str>) -> ExtractedFields {
    let mut fields = ExtractedFields::default();
    if text.is_empty() {
        return fields;
    }

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    // Course code first; the name lookahead is anchored to its line.
    if let Some((code_line, code)) = find_course_code(&lines) {
        fields.course_name = find_course_name(&lines, code_line);
        fields.course_code = Some(code);
    }

    fields.instructor = find_instructor(&lines);
    if let Some((semester, year)) = find_semester_year(&lines) {
        fields.semester = Some(semester);
        fields.year = Some(year);
    }
    fields.email = find_first_capture(&lines, &EMAIL_RE);
    fields.phone = find_first_capture(&lines, &PHONE_RE);
    fields.office_hours = find_office_hours(&lines);
    fields.office = find_office(&lines);

    // Fall back to the filename when the body had no course code.
    if fields.course_code.is_none() {
        if let Some(name) = filename {
            fields.course_code = code_from_filename(name);
        }
    }

    fields
}

fn find_course_code(lines: &[&str]) -> Option<(usize, String)> {
    lines.iter().enumerate().find_map(|(i, line)| {
        COURSE_CODE_RE
            .captures(line)
            .map(|caps| (i, caps[1].to_uppercase()))
    })
}

fn find_course_name(lines: &[&str], code_line: usize) -> Option<String> {
    lines
        .iter()
        .skip(code_line + 1)
        .take(NAME_LOOKAHEAD_LINES)
        .find(|line| {
            let lower = line.to_lowercase();
            line.len() > 3
                && line.len() < 100
                && !line.chars().next().is_some_and(|c| c.is_ascii_digit())
                && !lower.contains("instructor")
                && !lower.contains("office")
                && !lower.contains("email")
        })
        .map(|line| line.to_string())
}

fn find_instructor(lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if lower.contains("instructor") || lower.contains("professor") || lower.contains("teacher")
        {
            if let Some(caps) = INSTRUCTOR_RE.captures(line) {
                return Some(caps[1].trim().to_string());
            }
            // Sometimes the name sits on the following line.
            if let Some(next) = lines.get(i + 1) {
                return Some(next.to_string());
            }
        }
    }
    None
}

fn find_semester_year(lines: &[&str]) -> Option<(Semester, i32)> {
    lines.iter().find_map(|line| {
        SEMESTER_RE.captures(line).and_then(|caps| {
            let semester = caps[1].parse::<Semester>().ok()?;
            let year = caps[2].parse::<i32>().ok()?;
            Some((semester, year))
        })
    })
}

fn find_first_capture(lines: &[&str], re: &Regex) -> Option<String> {
    lines
        .iter()
        .find_map(|line| re.captures(line).map(|caps| caps[1].to_string()))
}

fn find_office_hours(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| {
            let lower = line.to_lowercase();
            lower.contains("office hour") || lower.contains("office time")
        })
        .map(|line| line.to_string())
}

fn find_office(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if lower.contains("office") && !lower.contains("hour") && !lower.contains("time") {
            OFFICE_RE
                .captures(line)
                .map(|caps| caps[1].trim().to_string())
        } else {
            None
        }
    })
}

fn code_from_filename(filename: &str) -> Option<String> {
    FILENAME_CODE_RE
        .captures(&filename.to_lowercase())
        .map(|caps| caps[1].to_uppercase())
}
