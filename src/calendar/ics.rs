//! ICS serialization of calendar events.
//!
//! Emits an RFC 5545 VCALENDAR: CRLF line endings, escaped text values,
//! and content lines folded at 75 octets.

use chrono::{DateTime, Utc};

use super::CalendarEvent;

const PRODID: &str = "-//syllabus-backend//calendar//EN";
const FOLD_LIMIT: usize = 75;

/// Serialize `events` into a complete VCALENDAR document. `generated_at`
/// stamps DTSTAMP; it is an argument so serialization stays deterministic
/// for a given input.
pub fn to_ics(events: &[CalendarEvent], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, &format!("PRODID:{PRODID}"));
    push_line(&mut out, "METHOD:PUBLISH");

    let dtstamp = generated_at.format("%Y%m%dT%H%M%SZ").to_string();
    for event in events {
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}", event.uid));
        push_line(&mut out, &format!("DTSTAMP:{dtstamp}"));
        push_line(
            &mut out,
            &format!(
                "DTSTART:{:04}{:02}{:02}T{:02}{:02}00Z",
                event.start.year,
                event.start.month,
                event.start.day,
                event.start.hour,
                event.start.minute
            ),
        );
        push_line(
            &mut out,
            &format!("DURATION:PT{}M", event.duration_minutes),
        );
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&event.title)));
        push_line(
            &mut out,
            &format!("DESCRIPTION:{}", escape_text(&event.description)),
        );
        push_line(
            &mut out,
            &format!("LOCATION:{}", escape_text(&event.location)),
        );
        push_line(&mut out, &format!("STATUS:{}", event.status));
        push_line(
            &mut out,
            &format!("X-MICROSOFT-CDO-BUSYSTATUS:{}", event.busy_status),
        );
        push_line(
            &mut out,
            &format!(
                "ORGANIZER;CN={}:mailto:{}",
                escape_param(&event.organizer_name),
                event.organizer_email
            ),
        );
        push_line(
            &mut out,
            &format!(
                "CATEGORIES:{}",
                event
                    .categories
                    .iter()
                    .map(|c| escape_text(c))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        );
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Append a content line, folded at 75 octets with a leading space on
/// continuation lines.
fn push_line(out: &mut String, line: &str) {
    let mut remaining = line;
    let mut first = true;
    loop {
        let limit = if first { FOLD_LIMIT } else { FOLD_LIMIT - 1 };
        if remaining.len() <= limit {
            if !first {
                out.push(' ');
            }
            out.push_str(remaining);
            out.push_str("\r\n");
            return;
        }
        let split = floor_char_boundary(remaining, limit);
        if !first {
            out.push(' ');
        }
        out.push_str(&remaining[..split]);
        out.push_str("\r\n");
        remaining = &remaining[split..];
        first = false;
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Escape a TEXT value per RFC 5545 3.3.11.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Parameter values may not contain colons, semicolons or commas.
fn escape_param(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ':' | ';' | ',' | '\n' | '\r'))
        .collect()
}
