//! Error types for a3s-mask

use thiserror::Error;

/// Errors that can occur while masking a response or loading configuration
///
/// Request-time variants never reach the HTTP client: the pipeline logs them
/// and transmits the original body instead.
#[derive(Debug, Error)]
pub enum MaskError {
    /// Body looked like a JSON object but did not parse
    #[error("Failed to parse response body as JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Rule set names a field category the masker does not know
    #[error("Unsupported masking category: {0}")]
    UnsupportedCategory(String),

    /// Rule entry has the wrong shape (e.g. field list is not an array of strings)
    #[error("Invalid masking rule '{key}': {reason}")]
    InvalidRule {
        key: String,
        reason: String,
    },

    /// Masking capability failed for any other reason
    #[error("Masking failed: {0}")]
    Masking(String),

    /// Masked value could not be serialized back to text
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stage panicked and was caught by the outer guard
    #[error("Unexpected failure: {0}")]
    Panic(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file is not valid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl MaskError {
    /// Name of the stage that produced this error, for structured logs
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::UnsupportedCategory(_) | Self::InvalidRule { .. } | Self::Masking(_) => "mask",
            Self::Serialization(_) => "serialize",
            Self::Panic(_) => "unexpected",
            Self::Config(_) | Self::Toml(_) => "config",
        }
    }
}

/// Result type alias for masking operations
pub type Result<T> = std::result::Result<T, MaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json}").unwrap_err();
        assert_eq!(MaskError::Parse(parse).stage(), "parse");
        assert_eq!(MaskError::UnsupportedCategory("x".into()).stage(), "mask");
        assert_eq!(
            MaskError::InvalidRule {
                key: "emailFields".into(),
                reason: "not an array".into(),
            }
            .stage(),
            "mask"
        );
        assert_eq!(MaskError::Panic("boom".into()).stage(), "unexpected");
        assert_eq!(MaskError::Config("bad".into()).stage(), "config");
    }

    #[test]
    fn test_display() {
        let err = MaskError::UnsupportedCategory("ssnFields".into());
        assert_eq!(err.to_string(), "Unsupported masking category: ssnFields");

        let err = MaskError::InvalidRule {
            key: "emailFields".into(),
            reason: "expected an array of strings".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid masking rule 'emailFields': expected an array of strings"
        );
    }
}
