pub mod fields;
pub mod merge;

pub use fields::{ExtractedFields, extract_fields};
pub use merge::{CourseOverrides, MergedCourse, merge_course_fields};
