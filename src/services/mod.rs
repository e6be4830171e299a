pub mod ingest;

pub use ingest::{IngestService, StagedFile, UploadedDocument};
