use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::extract::TextExtractor;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub extractor: Arc<dyn TextExtractor>,
    pub config: AppConfig,
}
