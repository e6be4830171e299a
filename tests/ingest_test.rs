use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;
use uuid::Uuid;

use syllabus_backend::db::repository;
use syllabus_backend::error::AppError;
use syllabus_backend::extract::{FailingTextExtractor, StaticTextExtractor, TextExtractor};
use syllabus_backend::models::Semester;
use syllabus_backend::parser::CourseOverrides;
use syllabus_backend::services::{IngestService, UploadedDocument};

const SAMPLE_TEXT: &str = "CS 101\nIntroduction to Programming\nInstructor: Dr. Jane Doe\nFall 2024\njane.doe@university.edu";

async fn setup_db() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn temp_upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("syllabus-upload-{}", Uuid::new_v4()))
}

fn service(pool: &SqlitePool, extractor: Arc<dyn TextExtractor>, dir: &PathBuf) -> IngestService {
    IngestService::new(pool.clone(), extractor, dir.clone())
}

fn pdf_upload(filename: &str) -> UploadedDocument {
    UploadedDocument {
        original_filename: filename.to_string(),
        media_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.4 stub".to_vec(),
    }
}

fn files_in(dir: &PathBuf) -> usize {
    std::fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
}

#[tokio::test]
async fn ingest_extracts_and_persists_a_syllabus() {
    let pool = setup_db().await;
    let dir = temp_upload_dir();
    let ingest = service(
        &pool,
        Arc::new(StaticTextExtractor(SAMPLE_TEXT.to_string())),
        &dir,
    );

    let syllabus = ingest
        .ingest(pdf_upload("cs101-syllabus.pdf"), CourseOverrides::default())
        .await
        .expect("ingest failed");

    assert_eq!(syllabus.course_code, "CS 101");
    assert_eq!(syllabus.course_name, "Introduction to Programming");
    assert_eq!(syllabus.instructor, "Dr. Jane Doe");
    assert_eq!(syllabus.semester, Semester::Fall);
    assert_eq!(syllabus.year, 2024);
    assert_eq!(
        syllabus.contact_info.email.as_deref(),
        Some("jane.doe@university.edu")
    );
    assert_eq!(syllabus.extracted_text.as_deref(), Some(SAMPLE_TEXT));

    // The stored file survives a successful ingest.
    let file = syllabus.original_file.as_ref().expect("file metadata missing");
    assert_eq!(file.filename, "cs101-syllabus.pdf");
    assert_eq!(file.media_type, "application/pdf");
    assert!(std::path::Path::new(&file.storage_path).exists());

    // And the record is really in the store.
    let persisted = repository::find_syllabus(&pool, &syllabus.id)
        .await
        .unwrap()
        .expect("record not persisted");
    assert_eq!(persisted.course_code, "CS 101");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn explicit_form_fields_beat_extracted_ones() {
    let pool = setup_db().await;
    let dir = temp_upload_dir();
    let ingest = service(
        &pool,
        Arc::new(StaticTextExtractor(SAMPLE_TEXT.to_string())),
        &dir,
    );

    let overrides = CourseOverrides {
        course_name: Some("Programming I".to_string()),
        semester: Some(Semester::Spring),
        year: Some(2025),
        ..Default::default()
    };
    let syllabus = ingest
        .ingest(pdf_upload("cs101.pdf"), overrides)
        .await
        .expect("ingest failed");

    assert_eq!(syllabus.course_name, "Programming I");
    assert_eq!(syllabus.semester, Semester::Spring);
    assert_eq!(syllabus.year, 2025);
    // Fields without overrides keep the extracted values.
    assert_eq!(syllabus.course_code, "CS 101");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn sentinel_defaults_fill_an_unreadable_document() {
    let pool = setup_db().await;
    let dir = temp_upload_dir();
    let ingest = service(
        &pool,
        Arc::new(StaticTextExtractor("nothing useful here".to_string())),
        &dir,
    );

    let syllabus = ingest
        .ingest(pdf_upload("scan.pdf"), CourseOverrides::default())
        .await
        .expect("ingest failed");

    assert_eq!(syllabus.course_code, "UNKNOWN");
    assert_eq!(syllabus.course_name, "Course Name Not Found");
    assert_eq!(syllabus.instructor, "Instructor Not Found");
    assert_eq!(syllabus.semester, Semester::Fall);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn unsupported_media_type_is_rejected_before_extraction() {
    let pool = setup_db().await;
    let dir = temp_upload_dir();
    let ingest = service(
        &pool,
        Arc::new(StaticTextExtractor(SAMPLE_TEXT.to_string())),
        &dir,
    );

    let doc = UploadedDocument {
        original_filename: "notes.txt".to_string(),
        media_type: "text/plain".to_string(),
        bytes: b"plain text".to_vec(),
    };
    let err = ingest.ingest(doc, CourseOverrides::default()).await.unwrap_err();
    assert!(matches!(err, AppError::UnsupportedMediaType));

    // Nothing was staged and nothing was persisted.
    assert_eq!(files_in(&dir), 0);
    assert!(repository::fetch_syllabi(&pool).await.unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn failed_extraction_removes_the_staged_file() {
    let pool = setup_db().await;
    let dir = temp_upload_dir();
    let ingest = service(&pool, Arc::new(FailingTextExtractor), &dir);

    let err = ingest
        .ingest(pdf_upload("corrupt.pdf"), CourseOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Extraction(_)));

    assert_eq!(files_in(&dir), 0, "staged file leaked");
    assert!(repository::fetch_syllabi(&pool).await.unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn image_uploads_go_through_the_same_pipeline() {
    let pool = setup_db().await;
    let dir = temp_upload_dir();
    let ingest = service(
        &pool,
        Arc::new(StaticTextExtractor(SAMPLE_TEXT.to_string())),
        &dir,
    );

    let doc = UploadedDocument {
        original_filename: "syllabus-photo.png".to_string(),
        media_type: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    };
    let syllabus = ingest.ingest(doc, CourseOverrides::default()).await.unwrap();
    assert_eq!(syllabus.course_code, "CS 101");
    assert_eq!(
        syllabus.original_file.as_ref().unwrap().media_type,
        "image/png"
    );

    let _ = std::fs::remove_dir_all(&dir);
}
