//! Recast API Library
//!
//! This crate provides the HTTP handlers, error rendering and application setup
//! for the conversion service.

// Module declarations
mod api_doc;
mod handlers;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
