//! Upload ingestion pipeline: stage the document, extract its text, run
//! the field heuristics, merge caller overrides, persist.
//!
//! The staged file is owned by a guard that removes it on drop, so every
//! failure path (unsupported type, engine error, database error) leaves no
//! orphaned file behind. Only a fully persisted record keeps its file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::repository;
use crate::error::AppError;
use crate::extract::{TextExtractor, is_supported_media_type};
use crate::models::{OriginalFile, Syllabus};
use crate::parser::{CourseOverrides, extract_fields, merge_course_fields};

/// An uploaded document as received from the multipart request.
pub struct UploadedDocument {
    pub original_filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// A file written to the upload directory, deleted on drop unless kept.
pub struct StagedFile {
    path: PathBuf,
    keep: bool,
}

impl StagedFile {
    pub async fn create(dir: &Path, name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(Self { path, keep: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the file past the guard's lifetime.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

pub struct IngestService {
    db: SqlitePool,
    extractor: Arc<dyn TextExtractor>,
    upload_dir: PathBuf,
}

impl IngestService {
    pub fn new(db: SqlitePool, extractor: Arc<dyn TextExtractor>, upload_dir: PathBuf) -> Self {
        Self {
            db,
            extractor,
            upload_dir,
        }
    }

    /// Run the full pipeline for one uploaded document and return the
    /// persisted record.
    pub async fn ingest(
        &self,
        doc: UploadedDocument,
        overrides: CourseOverrides,
    ) -> Result<Syllabus, AppError> {
        if !is_supported_media_type(&doc.media_type) {
            return Err(AppError::UnsupportedMediaType);
        }

        let staged_name = staged_name_for(&doc.original_filename, Uuid::new_v4());
        let staged = StagedFile::create(&self.upload_dir, &staged_name, &doc.bytes).await?;

        let text = self.extractor.extract(&doc.bytes, &doc.media_type).await?;
        let extracted = extract_fields(&text, Some(&doc.original_filename));
        let now = Utc::now();
        let merged = merge_course_fields(extracted, overrides, now.year());

        let syllabus_id = Uuid::new_v4().to_string();
        let syllabus = Syllabus {
            id: syllabus_id,
            course_code: merged.course_code,
            course_name: merged.course_name,
            instructor: merged.instructor,
            semester: merged.semester,
            year: merged.year,
            description: merged.description,
            office_hours: merged.office_hours,
            contact_info: merged.contact_info,
            assignments: Vec::new(),
            original_file: Some(OriginalFile {
                filename: doc.original_filename,
                storage_path: staged.path().to_string_lossy().into_owned(),
                media_type: doc.media_type,
            }),
            extracted_text: Some(text),
            created_at: now,
            updated_at: now,
        };

        repository::insert_syllabus(&self.db, &syllabus).await?;
        let stored = staged.keep();
        info!(
            course_code = %syllabus.course_code,
            path = %stored.display(),
            "syllabus ingested"
        );
        Ok(syllabus)
    }
}

/// Unique on-disk name for a staged upload: caller-generated uuid plus the
/// original extension.
fn staged_name_for(original_filename: &str, unique: Uuid) -> String {
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();
    format!("syllabus-{unique}{extension}")
}

/// Remove a previously stored original file, ignoring a missing path.
pub async fn remove_stored_file(path: &str) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove stored file {}: {}", path, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_names_carry_the_original_extension() {
        let unique = Uuid::nil();
        assert_eq!(
            staged_name_for("CS101 Syllabus.PDF", unique),
            format!("syllabus-{unique}.pdf")
        );
        assert_eq!(staged_name_for("scan", unique), format!("syllabus-{unique}"));
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_drop() {
        let dir = std::env::temp_dir().join(format!("ingest-test-{}", Uuid::new_v4()));
        let staged = StagedFile::create(&dir, "doc.pdf", b"content").await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
        let _ = std::fs::remove_dir(&dir);
    }

    #[tokio::test]
    async fn kept_file_survives_the_guard() {
        let dir = std::env::temp_dir().join(format!("ingest-test-{}", Uuid::new_v4()));
        let staged = StagedFile::create(&dir, "doc.pdf", b"content").await.unwrap();
        let path = staged.keep();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }
}
