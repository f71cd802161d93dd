//! Error types for the verification engine
//!
//! Only the edges of the crate (configuration loading, reading a submission
//! from disk, building the HTTP transport) hand these back to callers. Inside
//! the pipeline every `KycError` is folded into an `error`-status
//! [`AnalyzerResult`](crate::analysis::result::AnalyzerResult).

/// Errors that can occur while verifying a submission
#[derive(Debug, thiserror::Error)]
pub enum KycError {
    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Image or metadata decoding error
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Processing error during analysis
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// Reasoner transport failure (network, HTTP status, response body)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for KycError {
    fn from(err: image::ImageError) -> Self {
        KycError::DecodingError(err.to_string())
    }
}

impl From<reqwest::Error> for KycError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest embeds the full URL in its messages; strip it so query
        // credentials cannot leak into results or logs.
        KycError::TransportError(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for KycError {
    fn from(err: serde_json::Error) -> Self {
        KycError::ProcessingError(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for KycError {
    fn from(err: toml::de::Error) -> Self {
        KycError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KycError::InvalidInput("empty image".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty image");

        let err = KycError::TransportError("HTTP 503".to_string());
        assert_eq!(err.to_string(), "Transport error: HTTP 503");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.jpg");
        let err: KycError = io.into();
        assert!(matches!(err, KycError::Io(_)));
        assert!(err.to_string().contains("missing.jpg"));
    }
}
