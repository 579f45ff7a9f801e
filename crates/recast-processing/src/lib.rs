//! Recast Conversion Library
//!
//! This crate provides the converters, the staged-file lifecycle and the
//! dispatch engine that ties a conversion request to one converter.

pub mod converters;
pub mod dispatch;
pub mod operation;
pub mod outcome;
pub mod staging;
pub mod validator;

// Re-export commonly used types
pub use converters::{Converter, ConverterError, ConverterOptions};
pub use dispatch::{DispatchEngine, DispatchOptions, DispatchSetupError, OperationInfo};
pub use operation::{Operation, Route};
pub use outcome::{ConversionFailure, ConversionOutcome, ConvertedArtifact, FailureCategory};
pub use staging::{StagedFile, StagingArea};
pub use validator::{UploadValidator, ValidationError};
