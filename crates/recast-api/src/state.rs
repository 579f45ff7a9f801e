//! Application state shared by every handler.
//!
//! Everything here is immutable after startup; requests share it through `Arc`.

use anyhow::Context;
use recast_core::{Config, FormatRegistry};
use recast_processing::{DispatchEngine, StagingArea, UploadValidator};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub engine: Arc<DispatchEngine>,
    pub validator: Arc<UploadValidator>,
}

impl AppState {
    /// Build the staging area and the production dispatch table.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let staging = StagingArea::new(config.staging_dir()).with_context(|| {
            format!(
                "Failed to create staging directory {}",
                config.staging_dir().display()
            )
        })?;

        let registry = Arc::new(FormatRegistry::standard());
        let engine = DispatchEngine::standard(registry, staging, &config)
            .context("Failed to build the conversion dispatch table")?;

        let validator = UploadValidator::new(config.max_upload_size_bytes());

        Ok(Self {
            config,
            engine: Arc::new(engine),
            validator: Arc::new(validator),
        })
    }
}
