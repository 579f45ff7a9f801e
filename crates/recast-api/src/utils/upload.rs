//! Multipart upload helpers

use crate::error::HttpAppError;
use axum::body::Bytes;
use axum::extract::Multipart;
use recast_core::AppError;
use recast_processing::ValidationError;

const FILE_FIELD: &str = "file";
const TARGET_FORMAT_FIELD: &str = "target_format";

/// Fields of a conversion form.
#[derive(Debug)]
pub struct ConversionUpload {
    pub data: Bytes,
    /// Filename as declared by the client, before sanitization
    pub filename: String,
    pub target_format: Option<String>,
}

/// Read the conversion form. Exactly one field named "file" is accepted;
/// unknown fields are skipped.
pub async fn extract_conversion_upload(
    mut multipart: Multipart,
) -> Result<ConversionUpload, HttpAppError> {
    let mut file: Option<(Option<String>, Bytes)> = None;
    let mut target_format: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some(FILE_FIELD) => {
                if file.is_some() {
                    return Err(ValidationError::DuplicateFile.into());
                }
                let filename = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await?;
                file = Some((filename, data));
            }
            Some(TARGET_FORMAT_FIELD) => {
                let value = field.text().await?;
                target_format = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or(ValidationError::MissingFile)?;
    let filename = filename
        .filter(|name| !name.trim().is_empty())
        .ok_or(ValidationError::EmptyFilename)?;

    Ok(ConversionUpload {
        data,
        filename,
        target_format,
    })
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    const MAX_FILENAME_LENGTH: usize = 255;

    // Browsers on Windows may send full paths
    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['.', '_']).is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Invalid filename: {}",
            filename
        )));
    }

    Ok(sanitized)
}
