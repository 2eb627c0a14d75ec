use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use common::storage::{BoxReader, ObjectKey, ObjectStore, StoredObject};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::filename::{display_name, extension};

/// Accepted file types for one upload field. A file must match both by
/// extension and by declared MIME type.
#[derive(Debug)]
pub struct FileRule {
    pub extensions: &'static [&'static str],
    pub mime_types: &'static [&'static str],
    pub rejection: &'static str,
    pub missing: &'static str,
    pub folder: &'static str,
    pub prefix: &'static str,
}

pub const PRESENTATION: FileRule = FileRule {
    extensions: &["ppt", "pptx", "pdf"],
    mime_types: &[
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "application/pdf",
    ],
    rejection: "Invalid file type. Only PPT, PPTX, and PDF files are allowed.",
    missing: "No file uploaded. Please select a PPT, PPTX, or PDF file.",
    folder: "ppt-submissions",
    prefix: "ppt",
};

pub const SCREENSHOT: FileRule = FileRule {
    extensions: &["jpg", "jpeg", "png"],
    mime_types: &["image/jpeg", "image/jpg", "image/png"],
    rejection: "Invalid file type. Only JPG, JPEG, and PNG images are allowed.",
    missing: "Payment screenshot is required for payment verification",
    folder: "payment-screenshots",
    prefix: "payment",
};

/// File metadata accepted by a `FileRule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub original_name: String,
    pub extension: String,
    pub mime_type: String,
}

impl FileRule {
    pub fn accept(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<AcceptedFile, AppError> {
        let original_name = display_name(file_name.unwrap_or_default(), "");
        let ext = extension(&original_name)
            .filter(|ext| self.extensions.contains(&ext.as_str()))
            .ok_or_else(|| AppError::Validation(self.rejection.into()))?;
        let mime_type = content_type
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| self.mime_types.contains(&m.as_str()))
            .ok_or_else(|| AppError::Validation(self.rejection.into()))?;

        Ok(AcceptedFile {
            original_name,
            extension: ext,
            mime_type,
        })
    }
}

/// An upload that reached the object store.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub object: StoredObject,
    pub original_name: String,
    pub mime_type: String,
}

impl UploadedFile {
    /// Best-effort removal used when a later step of the request fails.
    pub async fn discard(&self, store: &dyn ObjectStore) {
        if let Err(e) = store.delete(&self.object.key).await {
            warn!(key = %self.object.key, error = %e, "Failed to delete orphaned upload");
        }
    }
}

/// Check a multipart file field against `rule`, then stream it into the store.
///
/// The type check happens before any byte is read, so rejected files are
/// never stored.
pub async fn store_field(
    field: Field<'_>,
    rule: &FileRule,
    store: &dyn ObjectStore,
    max_size: u64,
) -> Result<UploadedFile, AppError> {
    let accepted = rule.accept(field.file_name(), field.content_type())?;
    let key = ObjectKey::generate(rule.folder, rule.prefix, &accepted.extension)?;
    let object = stream_field_to_store(field, &key, store, max_size).await?;

    Ok(UploadedFile {
        object,
        original_name: accepted.original_name,
        mime_type: accepted.mime_type,
    })
}

/// A multipart form with at most one stored file.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    /// Trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Read every part of a form. Text parts are collected by name; the part
/// named `file_field` is checked against `rule` and stored. If reading fails
/// after the file was stored, the file is removed before returning.
pub async fn read_form(
    mut multipart: Multipart,
    file_field: &str,
    rule: &FileRule,
    store: &dyn ObjectStore,
    max_size: u64,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    let result = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field {
                // Browsers send an empty part when no file was chosen.
                if field.file_name().is_none_or(str::is_empty) || form.file.is_some() {
                    continue;
                }
                form.file = Some(store_field(field, rule, store, max_size).await?);
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
                form.fields.insert(name, text);
            }
        }
        Ok::<_, AppError>(())
    }
    .await;

    if let Err(e) = result {
        if let Some(file) = &form.file {
            file.discard(store).await;
        }
        return Err(e);
    }

    Ok(form)
}

/// Stream a multipart field to object storage via a temp file.
async fn stream_field_to_store(
    mut field: Field<'_>,
    key: &ObjectKey,
    store: &dyn ObjectStore,
    max_size: u64,
) -> Result<StoredObject, AppError> {
    let temp_path = std::env::temp_dir().join(format!("portal-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(too_large(max_size));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        Ok(store.put_stream(key, reader, max_size).await?)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}

pub fn too_large(max_size: u64) -> AppError {
    AppError::Validation(format!(
        "File too large. Maximum size allowed is {}MB.",
        max_size / (1024 * 1024)
    ))
}

/// Human-readable size in base-1024 units with at most two decimals,
/// e.g. `0 Bytes`, `512 Bytes`, `1.5 KB`, `10 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{scaled:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
