//! Recast Core Library
//!
//! This crate provides the format registry, error types and configuration
//! shared by the conversion engine and the HTTP API.

pub mod config;
pub mod error;
pub mod formats;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ConverterConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use formats::{
    extension_of, is_image_target, media_type_for_extension, FormatCategory, FormatRegistry,
    IMAGE_TARGET_FORMATS,
};
