use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{extract_conversion_upload, sanitize_filename};
use anyhow::Context;
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, Response, StatusCode},
};
use recast_core::{extension_of, AppError};
use recast_processing::DispatchOptions;
use std::sync::Arc;

/// Convert one uploaded file and stream the result back as an attachment.
#[utoipa::path(
    post,
    path = "/convert/{conversion_type}",
    tag = "conversions",
    params(
        ("conversion_type" = String, Path, description = "Conversion token, e.g. json-csv, markdown-docx, image-format, image-to-text-ocr, image-to-searchable-pdf-ocr")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "`file` (required) and `target_format` (image-format only, default png)"),
    responses(
        (status = 200, description = "Converted file", content_type = "application/octet-stream"),
        (status = 400, description = "Missing file, unsupported conversion or unsupported format", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Conversion failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(conversion_type = %conversion_type, operation = "convert_file")
)]
pub async fn convert_file(
    State(state): State<Arc<AppState>>,
    Path(conversion_type): Path<String>,
    multipart: Multipart,
) -> Result<Response<Body>, HttpAppError> {
    let upload = extract_conversion_upload(multipart).await?;

    let filename = sanitize_filename(&upload.filename)?;
    state.validator.validate_all(&filename, upload.data.len())?;
    let extension = extension_of(&filename).unwrap_or_default();

    tracing::debug!(
        filename = %filename,
        size = upload.data.len(),
        target_format = ?upload.target_format,
        "Upload validated"
    );

    let input = state
        .engine
        .staging()
        .stage(&upload.data, &extension)
        .await
        .context("Failed to stage upload")?;

    let options = DispatchOptions {
        target_format: upload.target_format,
    };
    let outcome = state
        .engine
        .convert(&conversion_type, &input, &extension, &options)
        .await;

    if let Err(e) = input.release() {
        tracing::warn!(error = %e, "Failed to release staged input");
    }

    let artifact = outcome.into_result()?;
    let download_filename = artifact.download_filename;
    let media_type = artifact.media_type;

    let body_stream = artifact
        .file
        .into_stream()
        .await
        .context("Failed to open converted file")?;

    tracing::info!(
        download_filename = %download_filename,
        media_type = media_type,
        "Conversion succeeded"
    );

    let content_disposition = format!("attachment; filename=\"{}\"", download_filename);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media_type)
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
