//! Converter set
//!
//! Each converter turns one staged input file into one output file. They are
//! independent of each other and report every failure as a [`ConverterError`].

pub mod document;
pub mod image;
pub mod ocr;
pub mod tabular;

use async_trait::async_trait;
use std::path::Path;

pub use self::document::{DocxToMarkdownConverter, MarkdownToDocxConverter};
pub use self::image::ImageReencoder;
pub use self::ocr::{OcrOutput, TesseractOcr};
pub use self::tabular::{CsvToJsonConverter, JsonToCsvConverter};

/// Options resolved by the dispatch engine before a converter runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Lower-case image target (image re-encoding only)
    pub target_format: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] ::image::ImageError),

    #[error("document error: {0}")]
    Document(String),

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("converter aborted: {0}")]
    Aborted(String),
}

/// A single-purpose conversion from `input` to `output`.
///
/// On `Ok(())` the output file is complete. On error its content is undefined;
/// the caller owns both paths and deletes them either way.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        options: &ConverterOptions,
    ) -> Result<(), ConverterError>;
}

/// Run CPU-bound conversion work off the async workers.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ConverterError>
where
    F: FnOnce() -> Result<T, ConverterError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ConverterError::Aborted(e.to_string()))?
}

/// Read a UTF-8 text input, dropping a leading byte-order mark.
pub(crate) async fn read_text(input: &Path) -> Result<String, ConverterError> {
    let bytes = tokio::fs::read(input).await?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ConverterError::InvalidInput("input is not valid UTF-8 text".to_string()))?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}
