use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::models::{
    Assignment, AssignmentChanges, ContactInfo, OriginalFile, Semester, Syllabus, SyllabusChanges,
};

const SYLLABUS_COLUMNS: &str = "id, course_code, course_name, instructor, semester, year, \
     description, office_hours, contact_email, contact_phone, contact_office, \
     original_filename, storage_path, media_type, extracted_text, created_at, updated_at";

const ASSIGNMENT_COLUMNS: &str =
    "id, syllabus_id, title, description, due_date, kind, weight, completed";

/// Flat row shape of the syllabi table; nested model values are assembled
/// in `into_syllabus`.
#[derive(Debug, FromRow)]
struct SyllabusRow {
    id: String,
    course_code: String,
    course_name: String,
    instructor: String,
    semester: Semester,
    year: i32,
    description: Option<String>,
    office_hours: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    contact_office: Option<String>,
    original_filename: Option<String>,
    storage_path: Option<String>,
    media_type: Option<String>,
    extracted_text: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SyllabusRow {
    fn into_syllabus(self, assignments: Vec<Assignment>) -> Syllabus {
        let original_file = match (self.original_filename, self.storage_path, self.media_type) {
            (Some(filename), Some(storage_path), Some(media_type)) => Some(OriginalFile {
                filename,
                storage_path,
                media_type,
            }),
            _ => None,
        };
        Syllabus {
            id: self.id,
            course_code: self.course_code,
            course_name: self.course_name,
            instructor: self.instructor,
            semester: self.semester,
            year: self.year,
            description: self.description,
            office_hours: self.office_hours,
            contact_info: ContactInfo {
                email: self.contact_email,
                phone: self.contact_phone,
                office: self.contact_office,
            },
            assignments,
            original_file,
            extracted_text: self.extracted_text,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// All syllabi, newest first, assignments embedded in insertion order.
pub async fn fetch_syllabi(db: &SqlitePool) -> Result<Vec<Syllabus>, sqlx::Error> {
    fetch_syllabi_ordered(db, "DESC").await
}

/// All syllabi in creation order, for calendar and upcoming views where
/// tie-breaking depends on insertion order.
pub async fn fetch_syllabi_in_creation_order(
    db: &SqlitePool,
) -> Result<Vec<Syllabus>, sqlx::Error> {
    fetch_syllabi_ordered(db, "ASC").await
}

async fn fetch_syllabi_ordered(
    db: &SqlitePool,
    direction: &str,
) -> Result<Vec<Syllabus>, sqlx::Error> {
    let rows: Vec<SyllabusRow> = sqlx::query_as(&format!(
        "SELECT {SYLLABUS_COLUMNS} FROM syllabi ORDER BY created_at {direction}, rowid {direction}"
    ))
    .fetch_all(db)
    .await?;

    let assignments: Vec<Assignment> = sqlx::query_as(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments ORDER BY rowid ASC"
    ))
    .fetch_all(db)
    .await?;

    let mut by_syllabus: HashMap<String, Vec<Assignment>> = HashMap::new();
    for assignment in assignments {
        by_syllabus
            .entry(assignment.syllabus_id.clone())
            .or_default()
            .push(assignment);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let assignments = by_syllabus.remove(&row.id).unwrap_or_default();
            row.into_syllabus(assignments)
        })
        .collect())
}

pub async fn find_syllabus(db: &SqlitePool, id: &str) -> Result<Option<Syllabus>, sqlx::Error> {
    let row: Option<SyllabusRow> =
        sqlx::query_as(&format!("SELECT {SYLLABUS_COLUMNS} FROM syllabi WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?;

    match row {
        Some(row) => {
            let assignments = fetch_assignments(db, &row.id).await?;
            Ok(Some(row.into_syllabus(assignments)))
        }
        None => Ok(None),
    }
}

async fn fetch_assignments(db: &SqlitePool, syllabus_id: &str) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE syllabus_id = ? ORDER BY rowid ASC"
    ))
    .bind(syllabus_id)
    .fetch_all(db)
    .await
}

/// Persist a fully built syllabus and its assignments in one transaction,
/// so a failed upload never leaves a partial record behind.
pub async fn insert_syllabus(db: &SqlitePool, syllabus: &Syllabus) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query(
        "INSERT INTO syllabi \
            (id, course_code, course_name, instructor, semester, year, description, \
            office_hours, contact_email, contact_phone, contact_office, original_filename, \
            storage_path, media_type, extracted_text, created_at, updated_at) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&syllabus.id)
    .bind(&syllabus.course_code)
    .bind(&syllabus.course_name)
    .bind(&syllabus.instructor)
    .bind(syllabus.semester)
    .bind(syllabus.year)
    .bind(&syllabus.description)
    .bind(&syllabus.office_hours)
    .bind(&syllabus.contact_info.email)
    .bind(&syllabus.contact_info.phone)
    .bind(&syllabus.contact_info.office)
    .bind(syllabus.original_file.as_ref().map(|f| f.filename.as_str()))
    .bind(syllabus.original_file.as_ref().map(|f| f.storage_path.as_str()))
    .bind(syllabus.original_file.as_ref().map(|f| f.media_type.as_str()))
    .bind(&syllabus.extracted_text)
    .bind(syllabus.created_at)
    .bind(syllabus.updated_at)
    .execute(&mut *tx)
    .await?;

    for assignment in &syllabus.assignments {
        sqlx::query(
            "INSERT INTO assignments \
                (id, syllabus_id, title, description, due_date, kind, weight, completed) \
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&assignment.id)
        .bind(&assignment.syllabus_id)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(assignment.due_date)
        .bind(assignment.kind)
        .bind(assignment.weight)
        .bind(assignment.completed)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn update_syllabus(
    db: &SqlitePool,
    id: &str,
    changes: SyllabusChanges,
) -> Result<Option<Syllabus>, sqlx::Error> {
    let mut current = match find_syllabus(db, id).await? {
        Some(s) => s,
        None => return Ok(None),
    };

    if let Some(course_code) = changes.course_code {
        current.course_code = course_code;
    }
    if let Some(course_name) = changes.course_name {
        current.course_name = course_name;
    }
    if let Some(instructor) = changes.instructor {
        current.instructor = instructor;
    }
    if let Some(semester) = changes.semester {
        current.semester = semester;
    }
    if let Some(year) = changes.year {
        current.year = year;
    }
    if let Some(description) = changes.description {
        current.description = Some(description);
    }
    if let Some(office_hours) = changes.office_hours {
        current.office_hours = Some(office_hours);
    }
    if let Some(contact_info) = changes.contact_info {
        current.contact_info = contact_info;
    }
    current.updated_at = Utc::now();

    sqlx::query(
        "UPDATE syllabi \
        SET course_code = ?, course_name = ?, instructor = ?, semester = ?, year = ?, \
            description = ?, office_hours = ?, contact_email = ?, contact_phone = ?, \
            contact_office = ?, updated_at = ? \
        WHERE id = ?",
    )
    .bind(&current.course_code)
    .bind(&current.course_name)
    .bind(&current.instructor)
    .bind(current.semester)
    .bind(current.year)
    .bind(&current.description)
    .bind(&current.office_hours)
    .bind(&current.contact_info.email)
    .bind(&current.contact_info.phone)
    .bind(&current.contact_info.office)
    .bind(current.updated_at)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

/// Delete a syllabus and its assignments, returning the record as it was
/// so the caller can release the stored original file.
pub async fn delete_syllabus(db: &SqlitePool, id: &str) -> Result<Option<Syllabus>, sqlx::Error> {
    let existing = match find_syllabus(db, id).await? {
        Some(s) => s,
        None => return Ok(None),
    };

    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM assignments WHERE syllabus_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM syllabi WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Some(existing))
}

/// Append an assignment to its syllabus, refreshing the owner's
/// updated_at stamp.
pub async fn insert_assignment(db: &SqlitePool, assignment: &Assignment) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query(
        "INSERT INTO assignments \
            (id, syllabus_id, title, description, due_date, kind, weight, completed) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&assignment.id)
    .bind(&assignment.syllabus_id)
    .bind(&assignment.title)
    .bind(&assignment.description)
    .bind(assignment.due_date)
    .bind(assignment.kind)
    .bind(assignment.weight)
    .bind(assignment.completed)
    .execute(&mut *tx)
    .await?;
    touch_syllabus(&mut tx, &assignment.syllabus_id).await?;
    tx.commit().await
}

pub async fn update_assignment(
    db: &SqlitePool,
    syllabus_id: &str,
    assignment_id: &str,
    changes: AssignmentChanges,
) -> Result<Option<Assignment>, sqlx::Error> {
    let mut current: Assignment = match sqlx::query_as(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = ? AND syllabus_id = ?"
    ))
    .bind(assignment_id)
    .bind(syllabus_id)
    .fetch_optional(db)
    .await?
    {
        Some(a) => a,
        None => return Ok(None),
    };

    if let Some(title) = changes.title {
        current.title = title;
    }
    if let Some(description) = changes.description {
        current.description = Some(description);
    }
    if let Some(due_date) = changes.due_date {
        current.due_date = due_date;
    }
    if let Some(kind) = changes.kind {
        current.kind = kind;
    }
    if let Some(weight) = changes.weight {
        current.weight = weight;
    }
    if let Some(completed) = changes.completed {
        current.completed = completed;
    }

    let mut tx = db.begin().await?;
    sqlx::query(
        "UPDATE assignments \
        SET title = ?, description = ?, due_date = ?, kind = ?, weight = ?, completed = ? \
        WHERE id = ? AND syllabus_id = ?",
    )
    .bind(&current.title)
    .bind(&current.description)
    .bind(current.due_date)
    .bind(current.kind)
    .bind(current.weight)
    .bind(current.completed)
    .bind(assignment_id)
    .bind(syllabus_id)
    .execute(&mut *tx)
    .await?;
    touch_syllabus(&mut tx, syllabus_id).await?;
    tx.commit().await?;

    Ok(Some(current))
}

pub async fn delete_assignment(
    db: &SqlitePool,
    syllabus_id: &str,
    assignment_id: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;
    let affected = sqlx::query("DELETE FROM assignments WHERE id = ? AND syllabus_id = ?")
        .bind(assignment_id)
        .bind(syllabus_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if affected > 0 {
        touch_syllabus(&mut tx, syllabus_id).await?;
    }
    tx.commit().await?;
    Ok(affected > 0)
}

async fn touch_syllabus(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE syllabi SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
