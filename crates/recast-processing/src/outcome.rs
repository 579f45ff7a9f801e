//! Uniform result of a dispatch

use crate::staging::StagedFile;
use recast_core::AppError;
use std::fmt;

/// Why a conversion did not produce an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// The conversion token is unknown
    UnsupportedOperation,
    /// The upload's extension (or the requested target) does not fit the operation
    UnsupportedFormat,
    /// The selected converter failed
    ConversionError,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureCategory::UnsupportedOperation => "UnsupportedOperation",
            FailureCategory::UnsupportedFormat => "UnsupportedFormat",
            FailureCategory::ConversionError => "ConversionError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub category: FailureCategory,
    pub message: String,
}

impl ConversionFailure {
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

impl From<ConversionFailure> for AppError {
    fn from(failure: ConversionFailure) -> Self {
        match failure.category {
            FailureCategory::UnsupportedOperation => AppError::UnsupportedOperation(failure.message),
            FailureCategory::UnsupportedFormat => AppError::UnsupportedFormat(failure.message),
            FailureCategory::ConversionError => AppError::ConversionFailed(failure.message),
        }
    }
}

/// A finished output file plus what the client needs to download it.
#[derive(Debug)]
pub struct ConvertedArtifact {
    pub file: StagedFile,
    /// `converted_<8-char id>.<ext>`
    pub download_filename: String,
    pub media_type: &'static str,
}

/// Exactly one of an artifact or a failure.
#[derive(Debug)]
pub enum ConversionOutcome {
    Success(ConvertedArtifact),
    Failure(ConversionFailure),
}

impl ConversionOutcome {
    pub fn failure(category: FailureCategory, message: impl Into<String>) -> Self {
        ConversionOutcome::Failure(ConversionFailure::new(category, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success(_))
    }

    pub fn into_result(self) -> Result<ConvertedArtifact, ConversionFailure> {
        match self {
            ConversionOutcome::Success(artifact) => Ok(artifact),
            ConversionOutcome::Failure(failure) => Err(failure),
        }
    }
}
