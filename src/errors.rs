//! Defines the raised error types for the application.
//!
//! Only conditions that stop a conversion outright end up here. Everything
//! a conversion can survive is recorded as a [`ConversionError`] instead and
//! travels back inside the [`crate::diagnostics::ConversionResult`].

use crate::diagnostics::ConversionError;
use crate::version_detection::SbomFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    /// A Critical condition stopped the run. `errors` holds everything
    /// recorded up to that point, the Critical entry included.
    #[error("Conversion {source_format} -> {target_format} aborted: {reason}")]
    Aborted {
        source_format: SbomFormat,
        target_format: SbomFormat,
        reason: String,
        errors: Vec<ConversionError>,
    },

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Unsupported Conversion: {0}")]
    UnsupportedConversion(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("I/O Error: {1} - {0}")]
    Io(#[source] std::io::Error, String),
}

impl ConverterError {
    /// Errors collected before the run was aborted.
    pub fn errors(&self) -> &[ConversionError] {
        match self {
            ConverterError::Aborted { errors, .. } => errors,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for ConverterError {
    fn from(err: std::io::Error) -> Self {
        ConverterError::Io(err, "IO operation failed".to_string())
    }
}

/// Failure of a single fragment transform.
///
/// Never escapes the converter: it is recorded as an Error-severity
/// [`ConversionError`] and the affected field is left out of the target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    #[test]
    fn test_aborted_carries_errors() {
        let err = ConverterError::Aborted {
            source_format: SbomFormat::CycloneDx,
            target_format: SbomFormat::Spdx,
            reason: "bad marker".to_string(),
            errors: vec![ConversionError::new(
                Severity::Critical,
                "CdxToSpdxConverter",
                "Invalid bomFormat",
            )],
        };

        assert_eq!(err.errors().len(), 1);
        assert_eq!(
            err.to_string(),
            "Conversion CycloneDX -> SPDX aborted: bad marker"
        );
    }

    #[test]
    fn test_other_variants_have_no_errors() {
        let err = ConverterError::InvalidArgument("same format".to_string());
        assert!(err.errors().is_empty());
    }

    #[test]
    fn test_transform_error_display() {
        let err = TransformError::UnexpectedShape {
            expected: "an array",
            found: "a string",
        };
        assert_eq!(err.to_string(), "expected an array, found a string");
    }
}
