//! Configuration module
//!
//! Server and converter settings, loaded from the environment (and `.env`
//! through dotenvy) once at startup.

use std::env;
use std::path::PathBuf;

use crate::formats::is_image_target;

const SERVER_PORT: u16 = 5000;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const TESSERACT_PATH: &str = "tesseract";
const OCR_LANGUAGE: &str = "chi_sim";
const DEFAULT_IMAGE_FORMAT: &str = "png";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Requests served at once; further requests wait
    pub http_concurrency_limit: usize,
}

/// Conversion service configuration
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    pub base: BaseConfig,
    pub max_upload_size_bytes: usize,
    /// Directory holding staged inputs and outputs while a request runs
    pub staging_dir: PathBuf,
    pub tesseract_path: String,
    pub ocr_language: String,
    /// Target used by image-format when the form omits `target_format`
    pub default_image_format: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ConverterConfig>);

impl Config {
    fn as_converter(&self) -> &ConverterConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_converter().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = ConverterConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_converter().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_converter().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_converter().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_converter().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_converter().base.http_concurrency_limit
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_converter().max_upload_size_bytes
    }

    pub fn staging_dir(&self) -> &std::path::Path {
        &self.as_converter().staging_dir
    }

    pub fn tesseract_path(&self) -> &str {
        &self.as_converter().tesseract_path
    }

    pub fn ocr_language(&self) -> &str {
        &self.as_converter().ocr_language
    }

    pub fn default_image_format(&self) -> &str {
        &self.as_converter().default_image_format
    }
}

impl ConverterConfig {
    /// Build the configuration from a key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let http_concurrency_limit = lookup("HTTP_CONCURRENCY_LIMIT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(HTTP_CONCURRENCY_LIMIT)
            .max(1);

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let max_upload_size_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?;

        let staging_dir = lookup("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("recast"));

        Ok(Self {
            base: BaseConfig {
                server_port,
                cors_origins,
                environment,
                http_concurrency_limit,
            },
            max_upload_size_bytes,
            staging_dir,
            tesseract_path: lookup("TESSERACT_PATH").unwrap_or_else(|| TESSERACT_PATH.to_string()),
            ocr_language: lookup("OCR_LANGUAGE").unwrap_or_else(|| OCR_LANGUAGE.to_string()),
            default_image_format: lookup("DEFAULT_IMAGE_FORMAT")
                .map(|f| f.trim().to_lowercase())
                .unwrap_or_else(|| DEFAULT_IMAGE_FORMAT.to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.ocr_language.trim().is_empty() {
            return Err(anyhow::anyhow!("OCR_LANGUAGE cannot be empty"));
        }

        if !is_image_target(&self.default_image_format) {
            return Err(anyhow::anyhow!(
                "DEFAULT_IMAGE_FORMAT '{}' is not a supported image target",
                self.default_image_format
            ));
        }

        Ok(())
    }
}
