//! OpenAPI documentation, served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::setup::routes::health;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recast API",
        version = "0.1.0",
        description = "Stateless file conversion: JSON/CSV, Markdown/DOCX, image re-encoding and OCR. Every request uploads one file and receives the converted file as an attachment; nothing is kept after the response."
    ),
    paths(
        handlers::convert::convert_file,
        handlers::conversions::list_conversions,
        health::liveness_check,
    ),
    components(
        schemas(
            error::ErrorResponse,
            handlers::conversions::ConversionInfo,
            handlers::conversions::ConversionsResponse,
        )
    ),
    tags(
        (name = "conversions", description = "File conversion operations"),
        (name = "health", description = "Liveness probe"),
    )
)]
pub struct ApiDoc;
