//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use recast_core::Config;

/// Validate critical configuration values.
///
/// Hard errors stop startup. A missing OCR binary only warns, since every
/// other conversion still works without it.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if config.staging_dir().exists() && !config.staging_dir().is_dir() {
        return Err(anyhow::anyhow!(
            "STAGING_DIR {} exists but is not a directory",
            config.staging_dir().display()
        ));
    }

    let tesseract_found = std::process::Command::new(config.tesseract_path())
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok();
    if !tesseract_found {
        tracing::warn!(
            tesseract_path = %config.tesseract_path(),
            "tesseract binary not found - OCR conversions will fail"
        );
    }

    Ok(())
}
