//! Dispatch engine
//!
//! Resolves a conversion token and the uploaded file's extension to a single
//! [`Route`], runs the converter registered for it, and folds every way that
//! can go wrong into a [`ConversionOutcome`].

use crate::converters::{
    Converter, ConverterOptions, CsvToJsonConverter, DocxToMarkdownConverter, ImageReencoder,
    JsonToCsvConverter, MarkdownToDocxConverter, OcrOutput, TesseractOcr,
};
use crate::operation::{Operation, Route};
use crate::outcome::{ConversionOutcome, ConvertedArtifact, FailureCategory};
use crate::staging::{StagedFile, StagingArea};
use recast_core::{is_image_target, media_type_for_extension, Config, FormatRegistry, IMAGE_TARGET_FORMATS};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Options taken from the request form, before validation.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    pub target_format: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchSetupError {
    #[error("no converter registered for route {0:?}")]
    MissingConverter(Route),
}

/// One entry of the supported-conversions listing.
#[derive(Debug, Clone, Serialize)]
pub struct OperationInfo {
    pub operation: Operation,
    pub bidirectional: bool,
    pub accepted_extensions: Vec<&'static str>,
}

pub struct DispatchEngine {
    registry: Arc<FormatRegistry>,
    staging: StagingArea,
    converters: HashMap<Route, Arc<dyn Converter>>,
    default_image_format: String,
}

impl DispatchEngine {
    /// Build an engine from an explicit route table. Fails if any route has no
    /// converter, so a missing entry surfaces at startup rather than per request.
    pub fn new(
        registry: Arc<FormatRegistry>,
        staging: StagingArea,
        converters: HashMap<Route, Arc<dyn Converter>>,
        default_image_format: impl Into<String>,
    ) -> Result<Self, DispatchSetupError> {
        if let Some(route) = Route::ALL.iter().find(|r| !converters.contains_key(r)) {
            return Err(DispatchSetupError::MissingConverter(*route));
        }

        Ok(Self {
            registry,
            staging,
            converters,
            default_image_format: default_image_format.into().to_lowercase(),
        })
    }

    /// Engine wired with the production converters.
    pub fn standard(
        registry: Arc<FormatRegistry>,
        staging: StagingArea,
        config: &Config,
    ) -> Result<Self, DispatchSetupError> {
        let mut converters: HashMap<Route, Arc<dyn Converter>> = HashMap::new();
        converters.insert(Route::JsonToCsv, Arc::new(JsonToCsvConverter));
        converters.insert(Route::CsvToJson, Arc::new(CsvToJsonConverter));
        converters.insert(Route::MarkdownToDocx, Arc::new(MarkdownToDocxConverter));
        converters.insert(Route::DocxToMarkdown, Arc::new(DocxToMarkdownConverter));
        converters.insert(Route::ImageReencode, Arc::new(ImageReencoder));
        converters.insert(
            Route::ImageToText,
            Arc::new(TesseractOcr::new(
                config.tesseract_path(),
                config.ocr_language(),
                OcrOutput::Text,
            )),
        );
        converters.insert(
            Route::ImageToSearchablePdf,
            Arc::new(TesseractOcr::new(
                config.tesseract_path(),
                config.ocr_language(),
                OcrOutput::SearchablePdf,
            )),
        );

        Self::new(registry, staging, converters, config.default_image_format())
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Every supported token with the input extensions it accepts.
    pub fn catalog(&self) -> Vec<OperationInfo> {
        Operation::ALL
            .iter()
            .map(|op| OperationInfo {
                operation: *op,
                bidirectional: op.is_bidirectional(),
                accepted_extensions: self.accepted_extensions(*op),
            })
            .collect()
    }

    fn accepted_extensions(&self, operation: Operation) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = Vec::new();
        for route in operation.routes() {
            for ext in self.registry.allowed_extensions(route.input_category()) {
                if !extensions.contains(ext) {
                    extensions.push(*ext);
                }
            }
        }
        extensions
    }

    fn select_route(&self, operation: Operation, extension: &str) -> Option<Route> {
        operation
            .routes()
            .iter()
            .find(|route| {
                self.registry
                    .accepts_extension(route.input_category(), extension)
            })
            .copied()
    }

    fn resolve_target(&self, options: &DispatchOptions) -> Result<String, ConversionOutcome> {
        let target = options
            .target_format
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.default_image_format.clone());

        if !is_image_target(&target) {
            return Err(ConversionOutcome::failure(
                FailureCategory::UnsupportedFormat,
                format!(
                    "Unsupported target format '{}'. Supported targets: {}",
                    target,
                    IMAGE_TARGET_FORMATS.join(", ")
                ),
            ));
        }
        Ok(target)
    }

    /// Convert a staged upload. The input is only read, never removed; the
    /// caller keeps ownership of it.
    pub async fn convert(
        &self,
        conversion_type: &str,
        input: &StagedFile,
        extension: &str,
        options: &DispatchOptions,
    ) -> ConversionOutcome {
        let operation = match conversion_type.parse::<Operation>() {
            Ok(op) => op,
            Err(message) => {
                return ConversionOutcome::failure(FailureCategory::UnsupportedOperation, message)
            }
        };

        let extension = extension.to_lowercase();
        let route = match self.select_route(operation, &extension) {
            Some(route) => route,
            None => {
                let supplied = if extension.is_empty() {
                    "File has no extension".to_string()
                } else {
                    format!("Unsupported file format '.{}'", extension)
                };
                return ConversionOutcome::failure(
                    FailureCategory::UnsupportedFormat,
                    format!(
                        "{} for {}. Accepted extensions: {}",
                        supplied,
                        operation,
                        self.accepted_extensions(operation).join(", ")
                    ),
                );
            }
        };

        let (output_extension, converter_options) = match route.output_extension() {
            Some(ext) => (ext.to_string(), ConverterOptions::default()),
            None => match self.resolve_target(options) {
                Ok(target) => (
                    target.clone(),
                    ConverterOptions {
                        target_format: Some(target),
                    },
                ),
                Err(outcome) => return outcome,
            },
        };

        let Some(converter) = self.converters.get(&route).cloned() else {
            return ConversionOutcome::failure(
                FailureCategory::ConversionError,
                format!("no converter registered for {:?}", route),
            );
        };

        let output = match self.staging.allocate(&output_extension) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(error = %e, "Failed to allocate output file");
                return ConversionOutcome::failure(
                    FailureCategory::ConversionError,
                    "could not allocate output file",
                );
            }
        };

        tracing::info!(
            operation = %operation,
            route = ?route,
            converter = converter.name(),
            "Dispatching conversion"
        );

        // The output guard moves into the task so a panic or an abandoned
        // request still deletes the partial file.
        let input_path = input.path().to_path_buf();
        let task = tokio::spawn(async move {
            let result = converter
                .convert(&input_path, output.path(), &converter_options)
                .await;
            (result, output)
        });

        let output = match task.await {
            Ok((Ok(()), output)) => output,
            Ok((Err(e), _output)) => {
                tracing::warn!(route = ?route, error = %e, "Converter failed");
                return ConversionOutcome::failure(FailureCategory::ConversionError, e.to_string());
            }
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    "converter panicked"
                } else {
                    "converter task was cancelled"
                };
                tracing::error!(route = ?route, "{}", reason);
                return ConversionOutcome::failure(FailureCategory::ConversionError, reason);
            }
        };

        ConversionOutcome::Success(ConvertedArtifact {
            file: output,
            download_filename: download_filename(&output_extension),
            media_type: media_type_for_extension(&output_extension),
        })
    }
}

/// `converted_<first 8 hex chars of a v4 uuid>.<extension>`
fn download_filename(extension: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("converted_{}.{}", &id[..8], extension)
}
