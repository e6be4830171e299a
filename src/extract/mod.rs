//! Text-extraction capability behind a trait seam.
//!
//! PDF documents go through the `pdf-extract` crate on a blocking worker;
//! images go through the `tesseract` CLI as a child process reading stdin.
//! Both paths are cancellable: the blocking task is abandoned and the child
//! is killed when the caller drops the future.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::AppError;

pub const MEDIA_TYPE_PDF: &str = "application/pdf";

/// Media types the upload endpoint accepts. Anything else is rejected
/// before extraction is attempted.
pub fn is_supported_media_type(media_type: &str) -> bool {
    media_type == MEDIA_TYPE_PDF || media_type.starts_with("image/")
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8], media_type: &str) -> Result<String, AppError>;
}

/// Production extractor dispatching on the declared media type.
pub struct EngineTextExtractor {
    ocr_lang: String,
}

impl EngineTextExtractor {
    pub fn new(ocr_lang: impl Into<String>) -> Self {
        Self {
            ocr_lang: ocr_lang.into(),
        }
    }

    async fn extract_pdf(&self, bytes: &[u8]) -> Result<String, AppError> {
        let payload = bytes.to_vec();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&payload))
            .await
            .map_err(|e| AppError::Extraction(format!("pdf worker failed: {e}")))?
            .map_err(|e| AppError::Extraction(format!("pdf parsing failed: {e}")))
    }

    async fn recognize_image(&self, bytes: &[u8]) -> Result<String, AppError> {
        let mut child = Command::new("tesseract")
            .args(["stdin", "stdout", "-l", self.ocr_lang.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Extraction(format!("failed to start tesseract: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Extraction("tesseract stdin unavailable".to_string()))?;
        stdin
            .write_all(bytes)
            .await
            .map_err(|e| AppError::Extraction(format!("failed to feed tesseract: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AppError::Extraction(format!("tesseract did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Extraction(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextExtractor for EngineTextExtractor {
    async fn extract(&self, bytes: &[u8], media_type: &str) -> Result<String, AppError> {
        if media_type == MEDIA_TYPE_PDF {
            self.extract_pdf(bytes).await
        } else if media_type.starts_with("image/") {
            self.recognize_image(bytes).await
        } else {
            Err(AppError::UnsupportedMediaType)
        }
    }
}

/// Extractor returning a fixed text regardless of input. Used by tests
/// that exercise the ingest pipeline without a PDF/OCR engine.
pub struct StaticTextExtractor(pub String);

#[async_trait]
impl TextExtractor for StaticTextExtractor {
    async fn extract(&self, _bytes: &[u8], _media_type: &str) -> Result<String, AppError> {
        Ok(self.0.clone())
    }
}

/// Extractor that always fails, for exercising cleanup paths.
pub struct FailingTextExtractor;

#[async_trait]
impl TextExtractor for FailingTextExtractor {
    async fn extract(&self, _bytes: &[u8], _media_type: &str) -> Result<String, AppError> {
        Err(AppError::Extraction("engine unavailable".to_string()))
    }
}
