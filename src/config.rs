use std::env;
use std::path::PathBuf;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://syllabus.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_OCR_LANG: &str = "eng";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub ocr_lang: String,
    pub max_upload_bytes: usize,
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));
        let ocr_lang = env::var("OCR_LANG").unwrap_or_else(|_| DEFAULT_OCR_LANG.to_string());
        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::BadRequest("MAX_UPLOAD_BYTES must be an integer".to_string()))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            bind_addr,
            upload_dir,
            ocr_lang,
            max_upload_bytes,
            allowed_origins,
        })
    }
}
