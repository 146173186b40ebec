//! Export error types.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Errors surfaced to export callers.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Malformed header forest, detected before any layout work.
    #[error("Invalid header shape at {path}: {reason}")]
    InvalidHeaderShape {
        /// Slash-separated node position, e.g. `2/1` for the first child of the second root.
        path: String,
        /// What is wrong with the node.
        reason: String,
    },

    /// Serialization or hand-off of the workbook failed.
    #[error("Export generation failed: {message}")]
    ExportGenerationFailed {
        /// Failing stage.
        message: String,
        /// Originating cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl ExportError {
    pub(crate) fn invalid_header(path: &[usize], reason: impl Into<String>) -> Self {
        Self::InvalidHeaderShape {
            path: format_node_path(path),
            reason: reason.into(),
        }
    }

    pub(crate) fn generation(message: impl Into<String>) -> Self {
        Self::ExportGenerationFailed {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn generation_from<E>(message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ExportGenerationFailed {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::generation_from("xlsx write error", err)
    }
}

fn format_node_path(path: &[usize]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|n_idx| (n_idx + 1).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Per-cell style evaluation failure. Recovered locally, never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum StyleEvalError {
    /// Numeric predicate applied to a value that is not a finite number.
    #[error("value {0:?} is not numeric")]
    NotNumeric(String),
    /// Rule is missing the threshold its operator needs.
    #[error("rule is missing its {0}")]
    MissingThreshold(&'static str),
    /// Style cannot be turned into a writer format.
    #[error("invalid style: {0}")]
    InvalidStyle(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_header_path_is_one_based() {
        let err = ExportError::invalid_header(&[1, 0], "span mismatch");
        assert_eq!(
            err.to_string(),
            "Invalid header shape at 2/1: span mismatch"
        );
    }

    #[test]
    fn test_generation_error_keeps_source() {
        let io = std::io::Error::other("disk full");
        let err = ExportError::generation_from("save failed", io);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
