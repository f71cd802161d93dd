//! Configuration parameters for document verification
//!
//! Read once at startup and shared read-only for the lifetime of the process.
//! Every struct implements `Default` with the calibrated values and can be
//! partially overridden from TOML.

use crate::error::KycError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default reasoner model when neither an endpoint nor a model is configured
pub const DEFAULT_REASONER_MODEL: &str = "gemini-1.5-flash";

const GENERATE_CONTENT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Top-level verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// External reasoner endpoint and retry policy
    pub reasoner: ReasonerConfig,

    /// Error-level analysis parameters
    pub ela: ElaConfig,

    /// Pixel forensics thresholds and weights
    pub forensics: ForensicsConfig,

    /// EXIF metadata expectations
    pub metadata: MetadataConfig,

    /// Run analyzers concurrently on the rayon pool (default: true)
    pub parallel_analyzers: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            reasoner: ReasonerConfig::default(),
            ela: ElaConfig::default(),
            forensics: ForensicsConfig::default(),
            metadata: MetadataConfig::default(),
            parallel_analyzers: true,
        }
    }
}

impl VerificationConfig {
    /// Parse a configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, KycError> {
        let config: VerificationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, KycError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML, taking every `[reasoner]` key the file leaves out from
    /// `fallback` (typically [`ReasonerConfig::from_env`])
    pub fn from_toml_str_over(text: &str, fallback: ReasonerConfig) -> Result<Self, KycError> {
        let mut config: VerificationConfig = toml::from_str(text)?;
        let table: toml::Table = toml::from_str(text)?;
        let reasoner = table.get("reasoner").and_then(toml::Value::as_table);
        let given = |key: &str| reasoner.is_some_and(|t| t.contains_key(key));

        if !given("endpoint") {
            config.reasoner.endpoint = fallback.endpoint;
        }
        if !given("api_key") {
            config.reasoner.api_key = fallback.api_key;
        }
        if !given("max_attempts") {
            config.reasoner.max_attempts = fallback.max_attempts;
        }
        if !given("retry_delay_ms") {
            config.reasoner.retry_delay_ms = fallback.retry_delay_ms;
        }
        if !given("request_timeout_ms") {
            config.reasoner.request_timeout_ms = fallback.request_timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file over reasoner fallbacks
    pub fn from_toml_file_over(
        path: impl AsRef<Path>,
        fallback: ReasonerConfig,
    ) -> Result<Self, KycError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str_over(&text, fallback)
    }

    /// Reject values the analyzers cannot work with
    pub fn validate(&self) -> Result<(), KycError> {
        if self.reasoner.max_attempts == 0 {
            return Err(KycError::ConfigError(
                "reasoner.max_attempts must be >= 1".to_string(),
            ));
        }
        if self.reasoner.endpoint.trim().is_empty() {
            return Err(KycError::ConfigError(
                "reasoner.endpoint must not be empty".to_string(),
            ));
        }
        for (key, quality) in [
            ("ela.quality", self.ela.quality),
            ("forensics.artifact_quality", self.forensics.artifact_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(KycError::ConfigError(format!(
                    "{} must be in [1, 100], got {}",
                    key, quality
                )));
            }
        }
        if self.ela.flag_threshold > self.ela.fail_threshold {
            return Err(KycError::ConfigError(format!(
                "ela.flag_threshold ({}) must not exceed ela.fail_threshold ({})",
                self.ela.flag_threshold, self.ela.fail_threshold
            )));
        }
        if self.forensics.flag_score > self.forensics.fail_score {
            return Err(KycError::ConfigError(format!(
                "forensics.flag_score ({}) must not exceed forensics.fail_score ({})",
                self.forensics.flag_score, self.forensics.fail_score
            )));
        }
        if self.forensics.clone_block_size == 0 {
            return Err(KycError::ConfigError(
                "forensics.clone_block_size must be > 0".to_string(),
            ));
        }
        if self.forensics.clone_max_dimension < self.forensics.clone_block_size {
            return Err(KycError::ConfigError(
                "forensics.clone_max_dimension must be >= clone_block_size".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reasoner endpoint, credential and retry policy
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Full `generateContent` URL of the reasoner
    pub endpoint: String,

    /// API credential, sent as a request header
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Attempts per request before giving up (default: 3)
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds (default: 2000)
    pub retry_delay_ms: u64,

    /// Per-request timeout in milliseconds (default: 60000)
    pub request_timeout_ms: u64,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoint_for_model(DEFAULT_REASONER_MODEL),
            api_key: None,
            max_attempts: 3,
            retry_delay_ms: 2000,
            request_timeout_ms: 60_000,
        }
    }
}

// Hand-written so the credential never reaches a log line.
impl std::fmt::Debug for ReasonerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonerConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl ReasonerConfig {
    /// Build from the process environment
    ///
    /// Recognized variables:
    /// - `KYC_REASONER_ENDPOINT`: full endpoint URL (overrides `GEMINI_MODEL`)
    /// - `GEMINI_MODEL`: model name used to build the default endpoint
    /// - `GEMINI_API_KEY`: credential
    /// - `KYC_REASONER_MAX_ATTEMPTS`, `KYC_REASONER_RETRY_DELAY_MS`
    pub fn from_env() -> Result<Self, KycError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, KycError> {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty("KYC_REASONER_ENDPOINT") {
            config.endpoint = endpoint;
        } else if let Some(model) = non_empty("GEMINI_MODEL") {
            config.endpoint = endpoint_for_model(model.trim());
        }
        config.api_key = non_empty("GEMINI_API_KEY");

        if let Some(raw) = non_empty("KYC_REASONER_MAX_ATTEMPTS") {
            config.max_attempts = raw.trim().parse().map_err(|_| {
                KycError::ConfigError(format!("KYC_REASONER_MAX_ATTEMPTS is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = non_empty("KYC_REASONER_RETRY_DELAY_MS") {
            config.retry_delay_ms = raw.trim().parse().map_err(|_| {
                KycError::ConfigError(format!("KYC_REASONER_RETRY_DELAY_MS is not a number: {}", raw))
            })?;
        }
        Ok(config)
    }

    /// Inter-attempt delay
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn endpoint_for_model(model: &str) -> String {
    format!("{}/{}:generateContent", GENERATE_CONTENT_BASE, model)
}

/// Error-level analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElaConfig {
    /// JPEG quality used for the re-encode (default: 90)
    pub quality: u8,

    /// Maximum difference at which the result becomes flag_for_review (default: 50)
    pub flag_threshold: u8,

    /// Maximum difference at which the result becomes fail (default: 150)
    pub fail_threshold: u8,
}

impl Default for ElaConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            flag_threshold: 50,
            fail_threshold: 150,
        }
    }
}

/// Per-sub-score values used by the forensics aggregate
///
/// The same shape carries thresholds, weights and measured scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForensicsMetrics {
    /// Clone (self-similarity) score
    pub cloning: f64,
    /// Noise residual magnitude
    pub noise: f64,
    /// Mean edge strength
    pub edge: f64,
    /// Structural loss under recompression
    pub artifact: f64,
}

/// Pixel forensics configuration
///
/// The thresholds and weights are empirical; they are kept configurable
/// rather than baked in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicsConfig {
    /// Sub-score thresholds; only the excess above these counts
    pub thresholds: ForensicsMetrics,

    /// Weights applied to each sub-score's excess
    pub weights: ForensicsMetrics,

    /// Aggregate at or above which the result is flag_for_review (default: 0.5)
    pub flag_score: f64,

    /// Aggregate at or above which the result is fail (default: 1.0)
    pub fail_score: f64,

    /// Side of the square blocks used by clone detection (default: 50)
    pub clone_block_size: usize,

    /// Longest side of the plane searched for clones (default: 256)
    ///
    /// At 256 px a 50 px block spans about a fifth of the card, so copy-moved
    /// regions much smaller than that go undetected. Raise this (at quadratic
    /// search cost) to catch smaller regions.
    pub clone_max_dimension: usize,

    /// JPEG quality of the synthetic recompression for the artifact score (default: 50)
    pub artifact_quality: u8,
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self {
            thresholds: ForensicsMetrics {
                cloning: 0.90,
                noise: 25.0,
                edge: 35.0,
                artifact: 0.10,
            },
            weights: ForensicsMetrics {
                cloning: 0.4,
                noise: 0.3,
                edge: 0.2,
                artifact: 0.1,
            },
            flag_score: 0.5,
            fail_score: 1.0,
            clone_block_size: 50,
            clone_max_dimension: 256,
            artifact_quality: 50,
        }
    }
}

/// EXIF expectations for the metadata analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Tags whose absence fails the analyzer outright
    pub required_fields: Vec<String>,

    /// Case-insensitive substrings of the `Software` tag that indicate an editor
    pub editing_software: Vec<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            required_fields: vec![
                "Make".to_string(),
                "Model".to_string(),
                "ExifVersion".to_string(),
            ],
            editing_software: [
                "photoshop",
                "gimp",
                "snapseed",
                "lightroom",
                "affinity",
                "pixlr",
                "paint.net",
                "picsart",
                "canva",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = VerificationConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.parallel_analyzers);
        assert_eq!(config.reasoner.max_attempts, 3);
        assert_eq!(config.reasoner.retry_delay_ms, 2000);
        assert_eq!(config.ela.quality, 90);
        assert_eq!(config.forensics.weights.cloning, 0.4);
        assert_eq!(config.forensics.clone_block_size, 50);
        assert_eq!(config.forensics.clone_max_dimension, 256);
    }

    #[test]
    fn test_toml_partial_override() {
        let config = VerificationConfig::from_toml_str(
            r#"
            parallel_analyzers = false

            [ela]
            quality = 85

            [forensics]
            flag_score = 0.6
            "#,
        )
        .unwrap();

        assert!(!config.parallel_analyzers);
        assert_eq!(config.ela.quality, 85);
        assert_eq!(config.ela.fail_threshold, 150);
        assert_eq!(config.forensics.flag_score, 0.6);
        assert_eq!(config.forensics.clone_block_size, 50);
    }

    #[test]
    fn test_toml_rejects_invalid_values() {
        assert!(VerificationConfig::from_toml_str("[ela]\nquality = 0").is_err());
        assert!(VerificationConfig::from_toml_str(
            "[ela]\nflag_threshold = 200\nfail_threshold = 100"
        )
        .is_err());
        assert!(VerificationConfig::from_toml_str("[reasoner]\nmax_attempts = 0").is_err());
        assert!(VerificationConfig::from_toml_str("not toml at all [").is_err());
    }

    #[test]
    fn test_reasoner_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_API_KEY", "secret"),
            ("KYC_REASONER_MAX_ATTEMPTS", "5"),
        ]
        .into_iter()
        .collect();

        let config = ReasonerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert!(config.endpoint.ends_with("/gemini-2.0-flash:generateContent"));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay_ms, 2000);
    }

    #[test]
    fn test_reasoner_endpoint_override_and_bad_number() {
        let config = ReasonerConfig::from_lookup(|k| match k {
            "KYC_REASONER_ENDPOINT" => Some("http://localhost:9000/judge".to_string()),
            "GEMINI_MODEL" => Some("ignored".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.endpoint, "http://localhost:9000/judge");

        let err = ReasonerConfig::from_lookup(|k| match k {
            "KYC_REASONER_RETRY_DELAY_MS" => Some("soon".to_string()),
            _ => None,
        });
        assert!(matches!(err, Err(KycError::ConfigError(_))));
    }

    #[test]
    fn test_toml_over_env_fills_unset_reasoner_keys() {
        let from_env = ReasonerConfig::from_lookup(|k| match k {
            "GEMINI_MODEL" => Some("gemini-2.0-pro".to_string()),
            "GEMINI_API_KEY" => Some("env-key".to_string()),
            "KYC_REASONER_MAX_ATTEMPTS" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();

        let config = VerificationConfig::from_toml_str_over(
            "[reasoner]\nmax_attempts = 2\n\n[ela]\nquality = 85\n",
            from_env.clone(),
        )
        .unwrap();
        assert_eq!(config.reasoner.max_attempts, 2);
        assert_eq!(config.reasoner.endpoint, from_env.endpoint);
        assert!(config.reasoner.endpoint.contains("gemini-2.0-pro"));
        assert_eq!(config.reasoner.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.ela.quality, 85);

        let without_table =
            VerificationConfig::from_toml_str_over("parallel_analyzers = false\n", from_env).unwrap();
        assert_eq!(without_table.reasoner.max_attempts, 5);
        assert!(!without_table.parallel_analyzers);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ReasonerConfig {
            api_key: Some("top-secret".to_string()),
            ..Default::default()
        };
        let shown = format!("{:?}", config);
        assert!(!shown.contains("top-secret"));
        assert!(shown.contains("<redacted>"));
    }
}
