pub mod assignment;
pub mod syllabus;

pub use assignment::{
    Assignment, AssignmentChanges, AssignmentKind, NewAssignmentRequest, UpcomingAssignment,
    UpdateAssignmentRequest, parse_due_date,
};
pub use syllabus::{
    ContactInfo, NewSyllabusRequest, OriginalFile, Semester, Syllabus, SyllabusChanges,
    UpdateSyllabusRequest,
};
