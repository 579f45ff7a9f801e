/// Upload validation errors, raised before anything is staged.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file part in the request")]
    MissingFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Only one file may be uploaded per request")]
    DuplicateFile,

    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },
}

/// Checks applied to every upload regardless of the requested conversion.
pub struct UploadValidator {
    max_file_size: usize,
}

impl UploadValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the declared filename (after sanitization).
    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::EmptyFilename);
        }
        if filename.trim_matches('.').is_empty() {
            return Err(ValidationError::InvalidFilename(filename.to_string()));
        }
        Ok(())
    }

    pub fn validate_all(&self, filename: &str, size: usize) -> Result<(), ValidationError> {
        self.validate_filename(filename)?;
        self.validate_file_size(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_size() {
        let validator = UploadValidator::new(1024);
        assert!(validator.validate_file_size(512).is_ok());
        assert_eq!(validator.validate_file_size(0), Err(ValidationError::EmptyFile));
        assert_eq!(
            validator.validate_file_size(2048),
            Err(ValidationError::FileTooLarge { size: 2048, max: 1024 })
        );
    }

    #[test]
    fn test_validate_filename() {
        let validator = UploadValidator::new(1024);
        assert!(validator.validate_filename("data.json").is_ok());
        assert!(validator.validate_filename("README").is_ok());
        assert_eq!(validator.validate_filename("  "), Err(ValidationError::EmptyFilename));
        assert!(matches!(
            validator.validate_filename(".."),
            Err(ValidationError::InvalidFilename(_))
        ));
    }
}
