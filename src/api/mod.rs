use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Router, extract::State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use uuid::Uuid;

use crate::calendar::upcoming::{DEFAULT_WINDOW_DAYS, WindowBounds, upcoming_assignments};
use crate::calendar::{
    ALL_CALENDAR_FILENAME, CALENDAR_MEDIA_TYPE, build_all_events, build_course_events,
    course_calendar_filename, ics::to_ics,
};
use crate::config::AppConfig;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    NewAssignmentRequest, NewSyllabusRequest, Semester, Syllabus, UpcomingAssignment,
    UpdateAssignmentRequest, UpdateSyllabusRequest,
};
use crate::parser::CourseOverrides;
use crate::services::ingest::{IngestService, UploadedDocument, remove_stored_file};
use crate::state::AppState;

#[derive(Deserialize)]
struct UpcomingParams {
    days: Option<i64>,
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .route("/api/syllabi", get(list_syllabi).post(create_syllabus))
        .route("/api/syllabi/upload", post(upload_syllabus))
        .route(
            "/api/syllabi/{id}",
            get(get_syllabus).put(update_syllabus).delete(delete_syllabus),
        )
        .route("/api/syllabi/{id}/assignments", post(add_assignment))
        .route(
            "/api/syllabi/{id}/assignments/{assignment_id}",
            put(update_assignment).delete(delete_assignment),
        )
        .route("/api/calendar/syllabus/{id}", get(course_calendar))
        .route("/api/calendar/all", get(all_calendars))
        .route("/api/calendar/upcoming", get(upcoming))
        .layer(ServiceBuilder::new().layer(cors).layer(body_limit))
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("ignoring invalid CORS origin '{}': {}", origin, err);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_syllabi(State(state): State<AppState>) -> Result<Json<Vec<Syllabus>>, AppError> {
    let syllabi = repository::fetch_syllabi(&state.db).await?;
    Ok(Json(syllabi))
}

async fn get_syllabus(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Syllabus>, AppError> {
    let syllabus = repository::find_syllabus(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(syllabus))
}

async fn create_syllabus(
    State(state): State<AppState>,
    Json(req): Json<NewSyllabusRequest>,
) -> Result<(StatusCode, Json<Syllabus>), AppError> {
    for (field, value) in [
        ("courseCode", &req.course_code),
        ("courseName", &req.course_name),
        ("instructor", &req.instructor),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }
    let semester = req.semester.parse::<Semester>().map_err(AppError::Validation)?;

    let id = Uuid::new_v4().to_string();
    let assignments = req
        .assignments
        .into_iter()
        .map(|a| a.into_assignment(&id))
        .collect::<Result<Vec<_>, _>>()?;

    let now = Utc::now();
    let syllabus = Syllabus {
        id,
        course_code: req.course_code,
        course_name: req.course_name,
        instructor: req.instructor,
        semester,
        year: req.year,
        description: req.description,
        office_hours: req.office_hours,
        contact_info: req.contact_info,
        assignments,
        original_file: None,
        extracted_text: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_syllabus(&state.db, &syllabus).await?;
    Ok((StatusCode::CREATED, Json(syllabus)))
}

async fn update_syllabus(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSyllabusRequest>,
) -> Result<Json<Syllabus>, AppError> {
    let changes = req.into_changes()?;
    let syllabus = repository::update_syllabus(&state.db, &id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(syllabus))
}

async fn delete_syllabus(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = repository::delete_syllabus(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    // Release the stored document along with the record.
    if let Some(file) = &deleted.original_file {
        remove_stored_file(&file.storage_path).await;
    }
    Ok(Json(json!({ "message": "Syllabus deleted successfully" })))
}

async fn upload_syllabus(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Syllabus>), AppError> {
    let mut document: Option<UploadedDocument> = None;
    let mut overrides = CourseOverrides::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "syllabus" {
            let original_filename = field.file_name().unwrap_or("syllabus").to_string();
            let media_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            document = Some(UploadedDocument {
                original_filename,
                media_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            apply_override(&mut overrides, &name, value)?;
        }
    }

    let document = document.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let service = IngestService::new(
        state.db.clone(),
        state.extractor.clone(),
        state.config.upload_dir.clone(),
    );
    let syllabus = service.ingest(document, overrides).await?;
    Ok((StatusCode::CREATED, Json(syllabus)))
}

/// Map one multipart text field onto the override table. Blank values are
/// treated as absent; unknown fields are ignored.
fn apply_override(
    overrides: &mut CourseOverrides,
    name: &str,
    value: String,
) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    match name {
        "courseCode" => overrides.course_code = Some(value),
        "courseName" => overrides.course_name = Some(value),
        "instructor" => overrides.instructor = Some(value),
        "semester" => {
            overrides.semester = Some(value.parse::<Semester>().map_err(AppError::Validation)?);
        }
        "year" => {
            overrides.year = Some(
                value
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| AppError::Validation(format!("invalid year: {value}")))?,
            );
        }
        "description" => overrides.description = Some(value),
        "officeHours" => overrides.office_hours = Some(value),
        _ => {}
    }
    Ok(())
}

async fn add_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewAssignmentRequest>,
) -> Result<Json<Syllabus>, AppError> {
    repository::find_syllabus(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let assignment = req.into_assignment(&id)?;
    repository::insert_assignment(&state.db, &assignment).await?;
    let syllabus = repository::find_syllabus(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(syllabus))
}

async fn update_assignment(
    State(state): State<AppState>,
    Path((id, assignment_id)): Path<(String, String)>,
    Json(req): Json<UpdateAssignmentRequest>,
) -> Result<Json<Syllabus>, AppError> {
    let changes = req.into_changes()?;
    repository::update_assignment(&state.db, &id, &assignment_id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    let syllabus = repository::find_syllabus(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(syllabus))
}

async fn delete_assignment(
    State(state): State<AppState>,
    Path((id, assignment_id)): Path<(String, String)>,
) -> Result<Json<Syllabus>, AppError> {
    let removed = repository::delete_assignment(&state.db, &id, &assignment_id).await?;
    if !removed {
        return Err(AppError::NotFound);
    }
    let syllabus = repository::find_syllabus(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(syllabus))
}

async fn course_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let syllabus = repository::find_syllabus(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let events = build_course_events(&syllabus)?;
    let body = to_ics(&events, Utc::now());
    Ok(ics_response(
        body,
        &course_calendar_filename(&syllabus.course_code),
    ))
}

async fn all_calendars(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let syllabi = repository::fetch_syllabi_in_creation_order(&state.db).await?;
    let events = build_all_events(&syllabi)?;
    let body = to_ics(&events, Utc::now());
    Ok(ics_response(body, ALL_CALENDAR_FILENAME))
}

fn ics_response(body: String, filename: &str) -> impl IntoResponse + use<> {
    (
        [
            (header::CONTENT_TYPE, CALENDAR_MEDIA_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

async fn upcoming(
    State(state): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> Result<Json<Vec<UpcomingAssignment>>, AppError> {
    let days = params.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if days < 0 {
        return Err(AppError::Validation("days must be non-negative".to_string()));
    }
    let syllabi = repository::fetch_syllabi_in_creation_order(&state.db).await?;
    let upcoming = upcoming_assignments(&syllabi, Utc::now(), days, WindowBounds::default());
    Ok(Json(upcoming))
}
