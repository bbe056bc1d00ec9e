//! Error types for viewport operations
//!
//! Nothing in normal interaction produces an error: malformed input and
//! out-of-range requests are defaulted or clamped. Errors are reserved for
//! configuration problems and for calls made on a torn-down component.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the pan/zoom components and their configuration
#[derive(Debug, Error)]
pub enum ZoomPanError {
    /// A mutating call was made after `destroy()`
    #[error("{component} has been destroyed")]
    Destroyed { component: &'static str },

    /// The configuration record failed validation
    #[error("invalid zoom-pan config: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read
    #[error("failed to read config '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the record
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ZoomPanError {
    /// Create a destroyed error for the named component.
    pub fn destroyed(component: &'static str) -> Self {
        Self::Destroyed { component }
    }

    /// Create a validation error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ZoomPanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ZoomPanError::destroyed("Pan");
        assert_eq!(err.to_string(), "Pan has been destroyed");

        let err = ZoomPanError::invalid_config("zoomMin exceeds zoomMax");
        assert_eq!(err.to_string(), "invalid zoom-pan config: zoomMin exceeds zoomMax");
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ZoomPanError = parse.into();
        assert!(matches!(err, ZoomPanError::ConfigParse(_)));
    }
}
