//! OCR through the external `tesseract` binary

use super::{run_blocking, Converter, ConverterError, ConverterOptions};
use async_trait::async_trait;
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const TOOL: &str = "tesseract";

/// What tesseract should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrOutput {
    /// Plain UTF-8 text
    Text,
    /// Image with an invisible text layer
    SearchablePdf,
}

impl OcrOutput {
    /// tesseract config name, which is also the extension it appends
    fn config(self) -> &'static str {
        match self {
            OcrOutput::Text => "txt",
            OcrOutput::SearchablePdf => "pdf",
        }
    }
}

pub struct TesseractOcr {
    tesseract_path: String,
    language: String,
    output: OcrOutput,
}

impl TesseractOcr {
    pub fn new(tesseract_path: impl Into<String>, language: impl Into<String>, output: OcrOutput) -> Self {
        Self {
            tesseract_path: tesseract_path.into(),
            language: language.into(),
            output,
        }
    }

    /// Decode the upload and write it as PNG next to `output`.
    async fn normalize_input(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<tempfile::TempPath, ConverterError> {
        let bytes = tokio::fs::read(input).await?;
        let png = run_blocking(move || {
            let img = image::load_from_memory(&bytes)?;
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, ImageFormat::Png)?;
            Ok(out.into_inner())
        })
        .await?;

        let dir = output.parent().unwrap_or_else(|| Path::new("."));
        let scratch = tempfile::Builder::new()
            .prefix("recast-ocr-")
            .suffix(".png")
            .tempfile_in(dir)?
            .into_temp_path();
        tokio::fs::write(&scratch, png).await?;
        Ok(scratch)
    }

    /// tesseract takes an output base name and appends the config extension.
    fn output_base(&self, output: &Path) -> PathBuf {
        output.with_extension("")
    }
}

#[async_trait]
impl Converter for TesseractOcr {
    fn name(&self) -> &'static str {
        match self.output {
            OcrOutput::Text => "ocr-text",
            OcrOutput::SearchablePdf => "ocr-searchable-pdf",
        }
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        _options: &ConverterOptions,
    ) -> Result<(), ConverterError> {
        let scratch = self.normalize_input(input, output).await?;
        let base = self.output_base(output);

        tracing::debug!(
            language = %self.language,
            mode = self.output.config(),
            "Running tesseract"
        );

        let result = Command::new(&self.tesseract_path)
            .arg(scratch.as_os_str())
            .arg(base.as_os_str())
            .args(["-l", self.language.as_str(), self.output.config()])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ConverterError::Tool {
                tool: TOOL,
                message: format!("failed to execute {}: {}", self.tesseract_path, e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ConverterError::Tool {
                tool: TOOL,
                message: stderr.trim().to_string(),
            });
        }

        let expected = base.with_extension(self.output.config());
        if expected != output {
            tokio::fs::rename(&expected, output).await?;
        }
        Ok(())
    }
}
