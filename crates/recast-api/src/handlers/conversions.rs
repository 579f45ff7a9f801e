use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversionInfo {
    /// Token used in `POST /convert/{conversion_type}`
    pub conversion_type: String,
    /// Whether the output direction depends on which input format was sent
    pub bidirectional: bool,
    pub accepted_extensions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversionsResponse {
    pub conversions: Vec<ConversionInfo>,
    /// Values accepted by the `target_format` field of image-format
    pub image_target_formats: Vec<String>,
    pub default_image_format: String,
}

/// List the supported conversion tokens.
#[utoipa::path(
    get,
    path = "/conversions",
    tag = "conversions",
    responses(
        (status = 200, description = "Supported conversions", body = ConversionsResponse)
    )
)]
pub async fn list_conversions(State(state): State<Arc<AppState>>) -> Json<ConversionsResponse> {
    let conversions = state
        .engine
        .catalog()
        .into_iter()
        .map(|info| ConversionInfo {
            conversion_type: info.operation.to_string(),
            bidirectional: info.bidirectional,
            accepted_extensions: info
                .accepted_extensions
                .iter()
                .map(|e| e.to_string())
                .collect(),
        })
        .collect();

    Json(ConversionsResponse {
        conversions,
        image_target_formats: recast_core::IMAGE_TARGET_FORMATS
            .iter()
            .map(|f| f.to_string())
            .collect(),
        default_image_format: state.config.default_image_format().to_string(),
    })
}
