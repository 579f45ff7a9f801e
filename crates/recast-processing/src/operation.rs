//! Conversion operations and routes
//!
//! An [`Operation`] is what a client asks for in the request path. A [`Route`]
//! is one concrete input → output direction of an operation and maps to
//! exactly one converter.

use recast_core::FormatCategory;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Conversion token accepted by `POST /convert/{conversion_type}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    JsonCsv,
    MarkdownDocx,
    ImageFormat,
    ImageToTextOcr,
    ImageToSearchablePdfOcr,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::JsonCsv,
        Operation::MarkdownDocx,
        Operation::ImageFormat,
        Operation::ImageToTextOcr,
        Operation::ImageToSearchablePdfOcr,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Operation::JsonCsv => "json-csv",
            Operation::MarkdownDocx => "markdown-docx",
            Operation::ImageFormat => "image-format",
            Operation::ImageToTextOcr => "image-to-text-ocr",
            Operation::ImageToSearchablePdfOcr => "image-to-searchable-pdf-ocr",
        }
    }

    /// Directions this operation supports. Bidirectional operations list both;
    /// the uploaded file's extension picks one.
    pub fn routes(&self) -> &'static [Route] {
        match self {
            Operation::JsonCsv => &[Route::JsonToCsv, Route::CsvToJson],
            Operation::MarkdownDocx => &[Route::MarkdownToDocx, Route::DocxToMarkdown],
            Operation::ImageFormat => &[Route::ImageReencode],
            Operation::ImageToTextOcr => &[Route::ImageToText],
            Operation::ImageToSearchablePdfOcr => &[Route::ImageToSearchablePdf],
        }
    }

    pub fn is_bidirectional(&self) -> bool {
        self.routes().len() > 1
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .find(|op| op.token() == s)
            .copied()
            .ok_or_else(|| format!("Unsupported conversion type: {}", s))
    }
}

/// One concrete conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    JsonToCsv,
    CsvToJson,
    MarkdownToDocx,
    DocxToMarkdown,
    ImageReencode,
    ImageToText,
    ImageToSearchablePdf,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::JsonToCsv,
        Route::CsvToJson,
        Route::MarkdownToDocx,
        Route::DocxToMarkdown,
        Route::ImageReencode,
        Route::ImageToText,
        Route::ImageToSearchablePdf,
    ];

    pub fn input_category(&self) -> FormatCategory {
        match self {
            Route::JsonToCsv => FormatCategory::Json,
            Route::CsvToJson => FormatCategory::Csv,
            Route::MarkdownToDocx => FormatCategory::Markdown,
            Route::DocxToMarkdown => FormatCategory::Docx,
            Route::ImageReencode | Route::ImageToText | Route::ImageToSearchablePdf => {
                FormatCategory::Image
            }
        }
    }

    /// Fixed output extension. `None` for re-encoding, where the requested
    /// target format decides.
    pub fn output_extension(&self) -> Option<&'static str> {
        match self {
            Route::JsonToCsv => Some("csv"),
            Route::CsvToJson => Some("json"),
            Route::MarkdownToDocx => Some("docx"),
            Route::DocxToMarkdown => Some("md"),
            Route::ImageReencode => None,
            Route::ImageToText => Some("txt"),
            Route::ImageToSearchablePdf => Some("pdf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_parse_back() {
        for op in Operation::ALL {
            assert_eq!(op.token().parse::<Operation>().unwrap(), op);
        }
        assert!("video-gif".parse::<Operation>().is_err());
        assert!("JSON-CSV".parse::<Operation>().is_err());
    }

    #[test]
    fn test_every_route_belongs_to_one_operation() {
        for route in Route::ALL {
            let owners = Operation::ALL
                .iter()
                .filter(|op| op.routes().contains(&route))
                .count();
            assert_eq!(owners, 1, "{:?}", route);
        }
    }

    #[test]
    fn test_bidirectional_routes_have_distinct_inputs() {
        for op in Operation::ALL.iter().filter(|op| op.is_bidirectional()) {
            let [a, b] = op.routes() else {
                panic!("expected two routes for {}", op);
            };
            assert_ne!(a.input_category(), b.input_category());
        }
    }

    #[test]
    fn test_operation_serializes_as_token() {
        let json = serde_json::to_string(&Operation::ImageToSearchablePdfOcr).unwrap();
        assert_eq!(json, "\"image-to-searchable-pdf-ocr\"");
    }
}
