//! Format registry
//!
//! Maps each logical file category to the extensions accepted for it. The
//! registry is built once at startup and shared read-only afterwards.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Logical file category understood by the converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatCategory {
    Json,
    Csv,
    Markdown,
    Docx,
    Image,
    Pdf,
}

impl FormatCategory {
    pub const ALL: [FormatCategory; 6] = [
        FormatCategory::Json,
        FormatCategory::Csv,
        FormatCategory::Markdown,
        FormatCategory::Docx,
        FormatCategory::Image,
        FormatCategory::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatCategory::Json => "json",
            FormatCategory::Csv => "csv",
            FormatCategory::Markdown => "markdown",
            FormatCategory::Docx => "docx",
            FormatCategory::Image => "image",
            FormatCategory::Pdf => "pdf",
        }
    }

    fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            FormatCategory::Json => &["json"],
            FormatCategory::Csv => &["csv"],
            FormatCategory::Markdown => &["md", "markdown"],
            FormatCategory::Docx => &["docx"],
            // Only formats the image decoder can read
            FormatCategory::Image => &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"],
            FormatCategory::Pdf => &["pdf"],
        }
    }
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable category → extension table.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    extensions: HashMap<FormatCategory, Vec<&'static str>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FormatRegistry {
    /// Registry with every category and its standard extension set.
    pub fn standard() -> Self {
        let extensions = FormatCategory::ALL
            .iter()
            .map(|category| (*category, category.default_extensions().to_vec()))
            .collect();
        Self { extensions }
    }

    /// Extensions accepted for `category`, lower-case, without the dot.
    pub fn allowed_extensions(&self, category: FormatCategory) -> &[&'static str] {
        self.extensions
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True iff `extension` (already extracted, any case) belongs to `category`.
    pub fn accepts_extension(&self, category: FormatCategory, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.allowed_extensions(category)
            .iter()
            .any(|allowed| *allowed == extension)
    }

    /// True iff `filename` has a dot-extension accepted for `category`.
    pub fn is_allowed(&self, filename: &str, category: FormatCategory) -> bool {
        extension_of(filename)
            .map(|ext| self.accepts_extension(category, &ext))
            .unwrap_or(false)
    }
}

/// Target formats the image re-encoder can produce.
pub const IMAGE_TARGET_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tiff"];

/// True iff `target` (any case) is an encodable image target.
pub fn is_image_target(target: &str) -> bool {
    let target = target.to_lowercase();
    IMAGE_TARGET_FORMATS.iter().any(|t| *t == target)
}

/// Lower-cased text after the last dot, if the filename has one.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Media type served for an output extension.
pub fn media_type_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "json" => "application/json",
        "csv" => "text/csv",
        "md" | "markdown" => "text/markdown",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}
